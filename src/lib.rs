//! Version lifecycle core for multi-package repositories
//!
//! - [`domain`] - semantic version parsing, precedence and bumps
//! - [`state`] - lock-guarded pre-release progress per package
//! - [`history`] - append-only release ledger and its read-side views
//! - [`release`] - orchestration over manifest adapters, state and ledger

pub mod config;
pub mod domain;
pub mod error;
pub mod fsutil;
pub mod history;
pub mod lock;
pub mod logging;
pub mod manifest;
pub mod release;
pub mod state;

pub use domain::{ChangeType, Version};
pub use error::{ReleaseError, Result};
