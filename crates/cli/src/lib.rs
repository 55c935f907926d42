//! # ClinicDesk CLI
//!
//! One-shot inspection commands and an interactive console that drives a
//! session against the in-memory identity service.

pub mod commands;
pub mod interactive;
