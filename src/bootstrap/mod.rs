//! Bootstrap layer — modules that run before the provider registry is built.
//!
//! - **logger** — tracing-subscriber initialisation.

pub mod logger;
