//! # ClinicDesk RBAC
//!
//! Role-Based Access Control for ClinicDesk.
//!
//! ## Components
//!
//! - `evaluator` - all-of / any-of capability matching and `RouteRequirement`
//! - `RoleRegistry` - role definitions and assignment rules

pub mod evaluator;
pub mod role_registry;

pub use evaluator::{satisfies_all, satisfies_any, RouteRequirement};
pub use role_registry::RoleRegistry;
