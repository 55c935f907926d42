//! # ClinicDesk Navigation
//!
//! Decides, for every navigable screen, whether the live session may enter
//! it, and builds the main menu from the same decision.
//!
//! ## Components
//!
//! - `GuardChain` - authentication gate then capability gate
//! - `ScreenRegistry` - screens and their declared requirements
//! - `menu` - menu entries derived from guard decisions
//! - `Navigator` - facade tying session, guard, screens and audit together

mod guard;
pub mod menu;
mod navigator;
mod screens;

pub use guard::{
    AuthenticationGate, CapabilityGate, Decision, DenyReason, Gate, GateOutcome, GuardChain,
    GuardStage, GuardTrace, GuardVerdict, RedirectIntent,
};
pub use menu::{MenuEntry, ScreenDecision};
pub use navigator::{Navigation, Navigator};
pub use screens::{Screen, ScreenAccess, ScreenRegistry};

// Re-export dependencies
pub use rbac::RouteRequirement;
pub use session::{SessionSnapshot, SessionStore};
