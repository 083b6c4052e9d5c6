//! Process-level services shared by every subsystem.
//!
//! - **health** — push-based health registry fed by background checkers.

pub mod health;
