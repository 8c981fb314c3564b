//! # leasewise-services
//!
//! External service plumbing for the leasewise advisor. Today that is
//! one thing: the search bridge, a supervised MCP (Model Context
//! Protocol) session over a child process's stdin/stdout, used for live
//! market pricing research.

pub mod error;
pub mod mcp;

pub use error::{Result, ServiceError};
pub use mcp::SearchBridge;
