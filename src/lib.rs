//! Chatbot service library: the LLM provider registry, its adapters, and
//! the config, logging and health plumbing around them.
//!
//! The binary entry point is `src/main.rs`.

pub mod bootstrap;
pub mod core;
pub mod llm;
pub mod subsystems;
pub mod supervisor;

pub use crate::core::error::AppError;
