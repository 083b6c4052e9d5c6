//! Subsystems built on top of the core LLM layer.

pub mod llm;
