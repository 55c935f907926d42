//! AuditLogger - Access audit trail

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: String,
    pub event_type: AuditEventType,
    /// Identity id, absent for anonymous attempts
    pub identity: Option<String>,
    pub location: Option<String>,
    pub success: bool,
    pub reason: Option<String>,
}

/// Types of audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    SignIn,
    SignInFailed,
    SignOut,
    IdentityRefreshed,
    RefreshFailed,
    ScreenDenied,
}

/// Audit logger
#[derive(Debug)]
pub struct AuditLogger {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
}

impl AuditLogger {
    /// Create a new AuditLogger
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
        }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: AuditEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn entry(
        event_type: AuditEventType,
        identity: Option<&str>,
        location: Option<&str>,
        success: bool,
        reason: Option<&str>,
    ) -> AuditEntry {
        AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type,
            identity: identity.map(|s| s.to_string()),
            location: location.map(|s| s.to_string()),
            success,
            reason: reason.map(|s| s.to_string()),
        }
    }

    /// Log a successful sign-in
    pub fn log_sign_in(&mut self, identity: &str) {
        self.log(Self::entry(AuditEventType::SignIn, Some(identity), None, true, None));
    }

    /// Log a rejected or failed sign-in; only the username is known
    pub fn log_sign_in_failed(&mut self, username: &str, reason: &str) {
        self.log(Self::entry(
            AuditEventType::SignInFailed,
            None,
            None,
            false,
            Some(&format!("user '{}': {}", username, reason)),
        ));
    }

    pub fn log_sign_out(&mut self, identity: &str) {
        self.log(Self::entry(AuditEventType::SignOut, Some(identity), None, true, None));
    }

    pub fn log_refresh(&mut self, identity: &str, success: bool, reason: Option<&str>) {
        let event_type = if success {
            AuditEventType::IdentityRefreshed
        } else {
            AuditEventType::RefreshFailed
        };
        self.log(Self::entry(event_type, Some(identity), None, success, reason));
    }

    /// Log a guard denial for a location
    pub fn log_screen_denied(&mut self, identity: Option<&str>, location: &str, reason: &str) {
        self.log(Self::entry(
            AuditEventType::ScreenDenied,
            identity,
            Some(location),
            false,
            Some(reason),
        ));
    }

    /// Get recent entries, newest first
    pub fn get_recent(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Get recent unsuccessful entries, newest first
    pub fn get_recent_denials(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.success)
            .take(limit)
            .collect()
    }

    /// Get statistics
    pub fn get_stats(&self) -> AuditStats {
        let total = self.entries.len();
        let denials = self
            .entries
            .iter()
            .filter(|e| e.event_type == AuditEventType::ScreenDenied)
            .count();
        let failures = self.entries.iter().filter(|e| !e.success).count();

        AuditStats {
            total_entries: total,
            denial_count: denials,
            failure_count: failures,
        }
    }

    /// Export as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.entries.iter().collect::<Vec<_>>()).unwrap_or_default()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub total_entries: usize,
    /// Screen denials only
    pub denial_count: usize,
    /// Every unsuccessful entry, denials included
    pub failure_count: usize,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(1000)
    }
}
