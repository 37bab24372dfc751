//!
//! # Ordo operator core
//!
//! Reconciles pod groups toward their declared replica count and template
//! revision, and manages the owner sets of shared auxiliary resources.
//!

mod error;

pub mod apps;
pub mod config;
pub mod controllers;

pub use error::{OperatorError, PhaseError};
pub use config::{OperatorConfig, RetryConfig};
