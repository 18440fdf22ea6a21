//! Logboard Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error types and logging initialization for the Logboard workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the [`LogboardError`] type and [`Result`] alias
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`],
//!   the tracing-based structured logging stack every binary initializes
//!   at startup
//!
//! # Example
//!
//! ```no_run
//! use logboard_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{LogboardError, Result};
