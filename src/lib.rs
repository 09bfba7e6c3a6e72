//! stocklog: log inventory events to a Google sheet and read them back.
//!
//! The `Inventory` is the entry point. It connects to one worksheet and offers `append`,
//! `load_all`, `search` and `refresh`. The `commands` module wraps these for the CLI and the MCP
//! server.

mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
mod inventory;
mod mcp;
pub mod model;
mod utils;

#[cfg(test)]
mod test;

pub use api::{Mode, StoreClient, TEST_MODE_ENV};
pub use config::{Config, SpreadsheetRef};
pub use error::{Error, ErrorType, Result};
pub use inventory::Inventory;
