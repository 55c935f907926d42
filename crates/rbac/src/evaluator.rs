//! Capability evaluator
//!
//! Both matchers are pure and total: no side effects, no ordering
//! dependence. They differ on the empty requirement: `satisfies_all` is
//! vacuously true, `satisfies_any` is vacuously false (nothing authorizes an
//! empty any-of requirement).

use shared::{Capability, CapabilitySet, RequirementConfig, RequirementPolicy};
use std::fmt;

/// True iff every required capability is a member
pub fn satisfies_all<F>(required: &CapabilitySet, membership: F) -> bool
where
    F: Fn(Capability) -> bool,
{
    required.iter().all(membership)
}

/// True iff at least one required capability is a member
pub fn satisfies_any<F>(required: &CapabilitySet, membership: F) -> bool
where
    F: Fn(Capability) -> bool,
{
    required.iter().any(membership)
}

/// What a screen needs before it can be entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Any signed-in identity may enter
    Open,
    Gated {
        policy: RequirementPolicy,
        capabilities: CapabilitySet,
    },
}

impl RouteRequirement {
    pub fn open() -> Self {
        RouteRequirement::Open
    }

    pub fn all_of(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        RouteRequirement::Gated {
            policy: RequirementPolicy::AllOf,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn any_of(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        RouteRequirement::Gated {
            policy: RequirementPolicy::AnyOf,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn policy(&self) -> Option<RequirementPolicy> {
        match self {
            RouteRequirement::Open => None,
            RouteRequirement::Gated { policy, .. } => Some(*policy),
        }
    }

    /// Declared capabilities (empty for open requirements)
    pub fn capabilities(&self) -> CapabilitySet {
        match self {
            RouteRequirement::Open => CapabilitySet::new(),
            RouteRequirement::Gated { capabilities, .. } => capabilities.clone(),
        }
    }

    /// Evaluate against a membership test under the declared policy
    pub fn is_satisfied_by<F>(&self, membership: F) -> bool
    where
        F: Fn(Capability) -> bool,
    {
        match self {
            RouteRequirement::Open => true,
            RouteRequirement::Gated {
                policy: RequirementPolicy::AllOf,
                capabilities,
            } => satisfies_all(capabilities, membership),
            RouteRequirement::Gated {
                policy: RequirementPolicy::AnyOf,
                capabilities,
            } => satisfies_any(capabilities, membership),
        }
    }

    /// Evaluate against a concrete grant set
    pub fn is_satisfied_by_set(&self, granted: &CapabilitySet) -> bool {
        self.is_satisfied_by(|c| granted.contains(c))
    }
}

impl Default for RouteRequirement {
    fn default() -> Self {
        RouteRequirement::Open
    }
}

impl From<RequirementConfig> for RouteRequirement {
    fn from(config: RequirementConfig) -> Self {
        RouteRequirement::Gated {
            policy: config.policy,
            capabilities: config.capabilities.into_iter().collect(),
        }
    }
}

impl From<Option<RequirementConfig>> for RouteRequirement {
    fn from(config: Option<RequirementConfig>) -> Self {
        config.map(Into::into).unwrap_or_default()
    }
}

impl fmt::Display for RouteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteRequirement::Open => f.write_str("open"),
            RouteRequirement::Gated {
                policy,
                capabilities,
            } => write!(f, "{} {}", policy, capabilities),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Capability::*;

    fn set(caps: &[Capability]) -> CapabilitySet {
        caps.iter().copied().collect()
    }

    // ============== satisfies_all Tests ==============

    #[test]
    fn test_all_of_requires_subset() {
        let g = set(&[OwnersRead]);

        assert!(!satisfies_all(&set(&[OwnersRead, AnimalsRead]), |c| g.contains(c)));
        assert!(satisfies_all(&set(&[OwnersRead]), |c| g.contains(c)));
    }

    #[test]
    fn test_all_of_empty_is_vacuously_true() {
        let nothing = CapabilitySet::new();
        assert!(satisfies_all(&CapabilitySet::new(), |c| nothing.contains(c)));
        assert!(satisfies_all(&CapabilitySet::new(), |_| false));
    }

    #[test]
    fn test_matchers_agree_with_set_algebra() {
        // Exhaustive over subsets of a three-tag universe
        let universe = [OwnersRead, AnimalsRead, UsersManage];
        let subsets: Vec<CapabilitySet> = (0u8..8)
            .map(|mask| {
                universe
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1u8 << *i) != 0)
                    .map(|(_, c)| *c)
                    .collect()
            })
            .collect();

        for r in &subsets {
            for g in &subsets {
                let is_subset = r.iter().all(|c| g.contains(c));
                assert_eq!(satisfies_all(r, |c| g.contains(c)), is_subset, "R={} G={}", r, g);

                let intersects = r.iter().any(|c| g.contains(c));
                assert_eq!(satisfies_any(r, |c| g.contains(c)), intersects, "R={} G={}", r, g);
            }
        }
    }

    // ============== satisfies_any Tests ==============

    #[test]
    fn test_any_of_requires_intersection() {
        let g = set(&[AnimalsRead]);

        assert!(satisfies_any(&set(&[OwnersRead, AnimalsRead]), |c| g.contains(c)));
        assert!(!satisfies_any(&set(&[OwnersRead, UsersManage]), |c| g.contains(c)));
    }

    #[test]
    fn test_any_of_empty_is_false_even_with_everything_granted() {
        let everything: CapabilitySet = Capability::ALL.into_iter().collect();
        assert!(!satisfies_any(&CapabilitySet::new(), |c| everything.contains(c)));
        assert!(!satisfies_any(&CapabilitySet::new(), |_| true));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let g = set(&[OwnersRead, ProductsRead]);
        let r = set(&[ProductsRead, CashierRead]);

        let first = satisfies_any(&r, |c| g.contains(c));
        for _ in 0..10 {
            assert_eq!(satisfies_any(&r, |c| g.contains(c)), first);
        }
    }

    // ============== RouteRequirement Tests ==============

    #[test]
    fn test_open_requirement_always_satisfied() {
        let requirement = RouteRequirement::open();
        assert!(requirement.is_satisfied_by_set(&CapabilitySet::new()));
        assert!(requirement.policy().is_none());
        assert!(requirement.capabilities().is_empty());
    }

    #[test]
    fn test_gated_requirement_uses_declared_policy() {
        let g = set(&[CashierRead]);

        let all = RouteRequirement::all_of([CashierRead, ProductsRead]);
        let any = RouteRequirement::any_of([CashierRead, ProductsRead]);

        assert!(!all.is_satisfied_by_set(&g));
        assert!(any.is_satisfied_by_set(&g));
    }

    #[test]
    fn test_empty_any_of_requirement_denies() {
        let requirement = RouteRequirement::any_of(std::iter::empty());
        let everything: CapabilitySet = Capability::ALL.into_iter().collect();
        assert!(!requirement.is_satisfied_by_set(&everything));
    }

    #[test]
    fn test_empty_all_of_requirement_allows() {
        let requirement = RouteRequirement::all_of(std::iter::empty());
        assert!(requirement.is_satisfied_by_set(&CapabilitySet::new()));
    }

    #[test]
    fn test_from_config() {
        let config: RequirementConfig = serde_json::from_str(
            r#"{"policy": "allOf", "capabilities": ["users:read", "users:manage", "users:read"]}"#,
        )
        .unwrap();

        let requirement = RouteRequirement::from(config);
        assert_eq!(requirement.policy(), Some(RequirementPolicy::AllOf));
        assert_eq!(requirement.capabilities().len(), 2);
        assert_eq!(RouteRequirement::from(None::<RequirementConfig>), RouteRequirement::Open);
    }

    #[test]
    fn test_display() {
        assert_eq!(RouteRequirement::open().to_string(), "open");
        assert_eq!(
            RouteRequirement::any_of([OwnersManage, OwnersRead]).to_string(),
            "any-of {owners:read, owners:manage}"
        );
    }
}
