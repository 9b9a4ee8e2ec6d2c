//! Common utilities and types for toolshell
//!
//! This crate provides shared functionality used across the workspace:
//! the error type, command entries and their handlers, invocation contexts,
//! and registry key derivation.

pub mod context;
pub mod error;
pub mod handler;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use context::InvocationContext;
pub use error::{Error, Result};
pub use handler::{handler_fn, CommandHandler, FnHandler};
pub use models::*;
