//! # ClinicDesk Shared
//!
//! Common types and interfaces used across all ClinicDesk access crates.

pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod role;

// Re-exports
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use identity::*;
pub use role::*;
