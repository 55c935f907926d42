//! Navigator - Session, guard, screens and audit behind one facade

use audit::{AuditEntry, AuditLogger, AuditStats};
use rbac::RouteRequirement;
use session::{SessionSnapshot, SessionStore};
use shared::{
    AccessConfig, AccessError, Capability, Credentials, Identity, Logger, Result, RoutesConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::guard::{Decision, DenyReason, GuardChain, GuardVerdict, RedirectIntent};
use crate::menu::{self, MenuEntry, ScreenDecision};
use crate::screens::ScreenRegistry;

/// Where a navigation attempt ended up
#[derive(Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Render the screen
    Render { screen_id: String, location: String },
    /// Session still resolving; show a neutral placeholder
    Loading { location: String },
    /// Denied; go to `to` and carry `intent` to resume later
    Redirect {
        to: String,
        reason: DenyReason,
        intent: RedirectIntent,
    },
    /// No screen owns the location
    NotFound { location: String },
}

impl Navigation {
    pub fn screen_id(&self) -> Option<&str> {
        match self {
            Navigation::Render { screen_id, .. } => Some(screen_id),
            _ => None,
        }
    }
}

/// Navigator - what the shell talks to
pub struct Navigator {
    /// Logger
    logger: Arc<dyn Logger>,
    /// Live session
    session: Arc<SessionStore>,
    /// Known screens
    screens: ScreenRegistry,
    /// Guard chain
    guard: GuardChain,
    /// Audit logger
    audit_logger: Mutex<AuditLogger>,
}

impl Navigator {
    /// Build from configuration: screens from `config.screens` or the clinic defaults
    pub fn new(
        session: Arc<SessionStore>,
        config: &AccessConfig,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        let screens = ScreenRegistry::from_config(config)?;
        Self::with_screens(session, screens, config.routes.clone(), config.audit.capacity, logger)
    }

    pub fn with_screens(
        session: Arc<SessionStore>,
        screens: ScreenRegistry,
        routes: RoutesConfig,
        audit_capacity: usize,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        match screens.resolve(&routes.landing_path) {
            Some(screen) if !screen.is_public() => {}
            _ => {
                return Err(AccessError::Config(format!(
                    "Landing path '{}' must resolve to a signed-in screen",
                    routes.landing_path
                )))
            }
        }

        Ok(Self {
            logger,
            session,
            screens,
            guard: GuardChain::new(routes),
            audit_logger: Mutex::new(AuditLogger::new(audit_capacity)),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn screens(&self) -> &ScreenRegistry {
        &self.screens
    }

    pub fn routes(&self) -> &RoutesConfig {
        self.guard.routes()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.session.has_capability(capability)
    }

    /// Decide an arbitrary requirement against the live session
    pub fn evaluate(&self, requirement: &RouteRequirement) -> Decision {
        self.guard.decide(&self.session.snapshot(), requirement)
    }

    /// Run the guard for a location
    pub fn navigate(&self, location: &str) -> Navigation {
        let Some(screen) = self.screens.resolve(location) else {
            self.logger
                .debug(&format!("No screen for '{}'", location), None);
            return Navigation::NotFound {
                location: location.to_string(),
            };
        };

        let render = Navigation::Render {
            screen_id: screen.id.clone(),
            location: location.to_string(),
        };
        if screen.is_public() {
            return render;
        }

        let snapshot = self.session.snapshot();
        match self.guard.evaluate(&snapshot, location, &screen.requirement) {
            GuardVerdict::Allow => render,
            GuardVerdict::Pending => Navigation::Loading {
                location: location.to_string(),
            },
            GuardVerdict::Deny {
                reason,
                redirect_to,
                intent,
            } => {
                let identity = snapshot.identity().map(|i| i.id.to_string());
                let mut meta = HashMap::new();
                meta.insert("location".to_string(), location.to_string());
                meta.insert("reason".to_string(), reason.to_string());
                self.logger.info(
                    &format!("Denied '{}' ({}), redirecting to '{}'", screen.id, reason, redirect_to),
                    Some(&meta),
                );
                self.with_audit(|audit| {
                    audit.log_screen_denied(identity.as_deref(), location, &reason.to_string())
                });

                Navigation::Redirect {
                    to: redirect_to,
                    reason,
                    intent,
                }
            }
        }
    }

    /// Navigate once the session has finished resolving
    pub async fn navigate_when_resolved(&self, location: &str) -> Navigation {
        let mut rx = self.session.subscribe();
        // The sender lives in the session store, which we hold
        let _ = rx.wait_for(|snapshot| !snapshot.is_bootstrapping()).await;
        self.navigate(location)
    }

    /// Continue to the intended location, or the landing screen without one.
    /// Re-enters the guard.
    pub fn resume(&self, intent: Option<RedirectIntent>) -> Navigation {
        let location = intent.map(RedirectIntent::into_location);

        // Returning to sign-in or unauthorized would loop
        let location = match location {
            Some(location)
                if self
                    .screens
                    .resolve(&location)
                    .is_some_and(|screen| !screen.is_public()) =>
            {
                location
            }
            _ => self.routes().landing_path.clone(),
        };

        self.navigate(&location)
    }

    /// "Try again" from the unauthorized screen
    pub fn retry(&self, intent: RedirectIntent) -> Navigation {
        self.resume(Some(intent))
    }

    /// Resolve any persisted session at startup
    pub async fn bootstrap(&self) -> SessionSnapshot {
        self.session.bootstrap().await
    }

    /// Sign in, then resume. The pending intent is taken only on success, so
    /// a failed attempt leaves it in place for the next one.
    pub async fn sign_in(
        &self,
        credentials: &Credentials,
        pending: &mut Option<RedirectIntent>,
    ) -> Result<Navigation> {
        match self.session.sign_in(credentials).await {
            Ok(identity) => {
                self.with_audit(|audit| audit.log_sign_in(identity.id.as_str()));
                Ok(self.resume(pending.take()))
            }
            Err(e) => {
                self.with_audit(|audit| {
                    audit.log_sign_in_failed(&credentials.username, &e.to_string())
                });
                Err(e)
            }
        }
    }

    /// Clear the session and return to sign-in
    pub async fn sign_out(&self) -> Navigation {
        let previous = self.session.snapshot().identity().map(|i| i.id.to_string());
        self.session.sign_out().await;

        if let Some(identity) = previous {
            self.with_audit(|audit| audit.log_sign_out(&identity));
        }

        let sign_in = self.routes().sign_in_path.clone();
        self.navigate(&sign_in)
    }

    /// Re-fetch the identity so role changes show up
    pub async fn refresh_identity(&self) -> Result<Option<Identity>> {
        let current = self.session.snapshot().identity().map(|i| i.id.to_string());
        let result = self.session.refresh_identity().await;

        if let Some(identity) = current {
            match &result {
                Ok(_) => self.with_audit(|audit| audit.log_refresh(&identity, true, None)),
                Err(e) => {
                    let reason = e.to_string();
                    self.with_audit(|audit| audit.log_refresh(&identity, false, Some(&reason)))
                }
            }
        }

        result
    }

    /// Menu entries for the live session
    pub fn menu(&self) -> Vec<MenuEntry> {
        menu::build_menu(&self.screens, &self.guard, &self.session.snapshot())
    }

    /// Guard decision for every gated screen
    pub fn screen_decisions(&self) -> Vec<ScreenDecision<'_>> {
        menu::decide_screens(&self.screens, &self.guard, &self.session.snapshot())
    }

    // ============== Audit ==============

    fn with_audit<F: FnOnce(&mut AuditLogger)>(&self, f: F) {
        match self.audit_logger.lock() {
            Ok(mut audit) => f(&mut audit),
            Err(_) => self.logger.warn("Audit log unavailable", None),
        }
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit_logger
            .lock()
            .map(|audit| audit.get_stats())
            .unwrap_or_default()
    }

    pub fn recent_audit(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit_logger
            .lock()
            .map(|audit| audit.get_recent(limit).into_iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default()
    }

    pub fn recent_denials(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit_logger
            .lock()
            .map(|audit| {
                audit
                    .get_recent_denials(limit)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    }

    pub fn export_audit(&self) -> serde_json::Value {
        self.audit_logger
            .lock()
            .map(|audit| audit.export_json())
            .unwrap_or(serde_json::Value::Null)
    }
}
