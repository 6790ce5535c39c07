//! Core functionality for the TwoKey dual-authorization custody system.
//!
//! This crate provides the primitive types, configuration loading and
//! logging bootstrap shared by the custody crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{Config, LoggingConfig, VaultConfig};
pub use error::{CoreError, Result};
pub use types::{Amount, Nonce, PrincipalId};
