//! task-core library.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the store and lock seams;
//!   `anyhow::Result` for configuration helpers.
//! - **Logging**: `tracing` macros only. The binary installs the subscriber.

pub mod config;
pub mod error;
pub mod lock;
pub mod model;
pub mod store;

pub use model::{Status, Task, TaskUpdate};
pub use store::{StoreError, TaskStore};
