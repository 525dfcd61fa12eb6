//! # braid-core
//!
//! Foundation types, errors, branded IDs, and logging setup for the Braid
//! context engine.
//!
//! This crate provides the shared vocabulary the other Braid crates depend on:
//!
//! - **Branded IDs**: `ThreadId`, `MessageId`, `ActionId` as newtypes for type safety
//! - **Messages**: `ContextMessage` records plus the `NewMessage` boundary input
//! - **Executions**: `ToolExecutionRecord` with digest, outcome, and sequence
//! - **Errors**: `EngineError` hierarchy via `thiserror`
//! - **Logging**: `init_subscriber` for the `tracing` stderr subscriber, plus
//!   `logging::capture_logs` for asserting on log output in tests

#![deny(unsafe_code)]

pub mod errors;
pub mod executions;
pub mod ids;
pub mod logging;
pub mod messages;

pub use errors::{EngineError, Result};
pub use executions::{ExecutionStatus, ToolExecutionRecord};
pub use ids::{ActionId, MessageId, ThreadId};
pub use messages::{ContextMessage, MessageKind, MessageSource, NewMessage};
