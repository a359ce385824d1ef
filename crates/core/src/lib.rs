//! Core types and configuration for the order-book depth terminal.
//!
//! This crate provides shared types used across all other crates:
//! - Order-book rows, sides, snapshot keys and depth points
//! - Field parsing for timestamps and numeric columns
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod parse;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
