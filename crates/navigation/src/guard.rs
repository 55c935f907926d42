//! Route guard chain
//!
//! Gates run in order against one session snapshot. The chain itself checks
//! the bootstrapping flag first: while the session is resolving no gate runs
//! and the verdict is `Pending`. Guards hold no state between attempts.

use rbac::RouteRequirement;
use session::SessionSnapshot;
use shared::RoutesConfig;
use std::fmt;

/// Why the guard refused entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity in the session
    Unauthenticated,
    /// Identity present but the requirement is not satisfied
    Forbidden,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => f.write_str("unauthenticated"),
            DenyReason::Forbidden => f.write_str("forbidden"),
        }
    }
}

/// The location originally requested. Not `Clone`: whoever resumes
/// navigation takes it by value, so it is consumed exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct RedirectIntent {
    location: String,
}

impl RedirectIntent {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn into_location(self) -> String {
        self.location
    }
}

/// Stages of one navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    Pending,
    Bootstrapping,
    Authenticating,
    Authorizing,
    Allowed,
    Denied(DenyReason),
}

/// Decision over a requirement, without redirect details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Session still resolving
    Pending,
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pending => f.write_str("pending"),
            Decision::Allow => f.write_str("allow"),
            Decision::Deny(reason) => write!(f, "deny ({})", reason),
        }
    }
}

/// Verdict for a navigation attempt
#[derive(Debug, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Render a neutral placeholder; neither allow nor redirect
    Pending,
    Allow,
    Deny {
        reason: DenyReason,
        redirect_to: String,
        intent: RedirectIntent,
    },
}

impl GuardVerdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, GuardVerdict::Allow)
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            GuardVerdict::Deny { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Outcome of a single gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    Deny(DenyReason),
}

/// A check applied to a navigation target
pub trait Gate: Send + Sync {
    /// Stage reported while this gate runs
    fn stage(&self) -> GuardStage;

    fn check(&self, session: &SessionSnapshot, requirement: &RouteRequirement) -> GateOutcome;
}

/// Is there a session at all
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationGate;

impl Gate for AuthenticationGate {
    fn stage(&self) -> GuardStage {
        GuardStage::Authenticating
    }

    fn check(&self, session: &SessionSnapshot, _requirement: &RouteRequirement) -> GateOutcome {
        if session.is_authenticated() {
            GateOutcome::Pass
        } else {
            GateOutcome::Deny(DenyReason::Unauthenticated)
        }
    }
}

/// Does the session satisfy the target's requirement under its declared policy
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityGate;

impl Gate for CapabilityGate {
    fn stage(&self) -> GuardStage {
        GuardStage::Authorizing
    }

    fn check(&self, session: &SessionSnapshot, requirement: &RouteRequirement) -> GateOutcome {
        if requirement.is_satisfied_by(|c| session.has_capability(c)) {
            GateOutcome::Pass
        } else {
            GateOutcome::Deny(DenyReason::Forbidden)
        }
    }
}

/// Stages an evaluation went through, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardTrace {
    stages: Vec<GuardStage>,
}

impl GuardTrace {
    pub fn stages(&self) -> &[GuardStage] {
        &self.stages
    }

    fn push(&mut self, stage: GuardStage) {
        self.stages.push(stage);
    }
}

/// Ordered gates plus the redirect targets for denials
pub struct GuardChain {
    gates: Vec<Box<dyn Gate>>,
    routes: RoutesConfig,
}

impl GuardChain {
    /// Authentication gate, then capability gate
    pub fn new(routes: RoutesConfig) -> Self {
        Self::with_gates(
            routes,
            vec![Box::new(AuthenticationGate), Box::new(CapabilityGate)],
        )
    }

    pub fn with_gates(routes: RoutesConfig, gates: Vec<Box<dyn Gate>>) -> Self {
        Self { gates, routes }
    }

    pub fn routes(&self) -> &RoutesConfig {
        &self.routes
    }

    /// Decide a requirement against a snapshot
    pub fn decide(&self, session: &SessionSnapshot, requirement: &RouteRequirement) -> Decision {
        self.decide_traced(session, requirement).0
    }

    pub fn decide_traced(
        &self,
        session: &SessionSnapshot,
        requirement: &RouteRequirement,
    ) -> (Decision, GuardTrace) {
        let mut trace = GuardTrace::default();
        trace.push(GuardStage::Pending);

        if session.is_bootstrapping() {
            trace.push(GuardStage::Bootstrapping);
            return (Decision::Pending, trace);
        }

        for gate in &self.gates {
            trace.push(gate.stage());
            if let GateOutcome::Deny(reason) = gate.check(session, requirement) {
                trace.push(GuardStage::Denied(reason));
                return (Decision::Deny(reason), trace);
            }
        }

        trace.push(GuardStage::Allowed);
        (Decision::Allow, trace)
    }

    /// Full verdict for an attempt to reach `location`, with redirect and intent on denial
    pub fn evaluate(
        &self,
        session: &SessionSnapshot,
        location: &str,
        requirement: &RouteRequirement,
    ) -> GuardVerdict {
        match self.decide(session, requirement) {
            Decision::Pending => GuardVerdict::Pending,
            Decision::Allow => GuardVerdict::Allow,
            Decision::Deny(reason) => GuardVerdict::Deny {
                reason,
                redirect_to: self.redirect_target(reason).to_string(),
                intent: RedirectIntent::new(location),
            },
        }
    }

    pub fn redirect_target(&self, reason: DenyReason) -> &str {
        match reason {
            DenyReason::Unauthenticated => &self.routes.sign_in_path,
            DenyReason::Forbidden => &self.routes.unauthorized_path,
        }
    }
}

impl Default for GuardChain {
    fn default() -> Self {
        Self::new(RoutesConfig::default())
    }
}
