//! # ClinicDesk Session
//!
//! The live session: who is signed in, whether that is still being
//! resolved, and what the current role grants.
//!
//! ## Components
//!
//! - `IdentityService` - port to the backing identity/authorization service
//! - `SessionStore` - owned session state with serialized mutations
//! - `InMemoryIdentityService` - in-process adapter for tests and demos
//! - `SeedFile` - YAML seed for the in-memory adapter

mod in_memory;
mod seed;
mod service;
mod session_store;

pub use in_memory::InMemoryIdentityService;
pub use seed::{SeedAccount, SeedFile, DEMO_SEED};
pub use service::IdentityService;
pub use session_store::{SessionSnapshot, SessionStore};
