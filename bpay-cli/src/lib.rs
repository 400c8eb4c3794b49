//! Library side of the `bpay` command-line tool.
//!
//! - [`config`] - TOML configuration with environment fallback
//! - [`commands`] - The `balance` and `test-order` commands

pub mod commands;
pub mod config;
