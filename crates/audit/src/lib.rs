//! # ClinicDesk Audit
//!
//! Bounded audit trail of sign-ins, sign-outs, refreshes and screen denials.

mod audit_logger;

pub use audit_logger::{AuditEntry, AuditEventType, AuditLogger, AuditStats};
