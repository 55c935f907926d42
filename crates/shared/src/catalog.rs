//! Capability catalog
//!
//! The closed set of module tags (`<module>:<action>`) a role may grant.
//! Tags outside the catalog are rejected at parse time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownCapabilityError;

/// A grantable permission tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Capability {
    OwnersRead,
    OwnersManage,
    AnimalsRead,
    AnimalsManage,
    ServicesRead,
    ServicesManage,
    AppointmentsRead,
    AppointmentsManage,
    ProductsRead,
    ProductsManage,
    CashierRead,
    CashierManage,
    UsersRead,
    UsersManage,
    RolesManage,
}

impl Capability {
    /// Every capability in the catalog
    pub const ALL: [Capability; 15] = [
        Capability::OwnersRead,
        Capability::OwnersManage,
        Capability::AnimalsRead,
        Capability::AnimalsManage,
        Capability::ServicesRead,
        Capability::ServicesManage,
        Capability::AppointmentsRead,
        Capability::AppointmentsManage,
        Capability::ProductsRead,
        Capability::ProductsManage,
        Capability::CashierRead,
        Capability::CashierManage,
        Capability::UsersRead,
        Capability::UsersManage,
        Capability::RolesManage,
    ];

    /// The wire tag, e.g. `owners:read`
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::OwnersRead => "owners:read",
            Capability::OwnersManage => "owners:manage",
            Capability::AnimalsRead => "animals:read",
            Capability::AnimalsManage => "animals:manage",
            Capability::ServicesRead => "services:read",
            Capability::ServicesManage => "services:manage",
            Capability::AppointmentsRead => "appointments:read",
            Capability::AppointmentsManage => "appointments:manage",
            Capability::ProductsRead => "products:read",
            Capability::ProductsManage => "products:manage",
            Capability::CashierRead => "cashier:read",
            Capability::CashierManage => "cashier:manage",
            Capability::UsersRead => "users:read",
            Capability::UsersManage => "users:manage",
            Capability::RolesManage => "roles:manage",
        }
    }

    /// The module part of the tag (`owners` for `owners:read`)
    pub fn module(&self) -> &'static str {
        let tag = self.as_str();
        tag.split_once(':').map(|(module, _)| module).unwrap_or(tag)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = UnknownCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| UnknownCapabilityError { tag: tag.to_string() })
    }
}

impl TryFrom<String> for Capability {
    type Error = UnknownCapabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.as_str().to_string()
    }
}

/// How a set of required capabilities is matched against a grant set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequirementPolicy {
    /// Every required capability must be granted
    AllOf,
    /// At least one required capability must be granted
    AnyOf,
}

impl fmt::Display for RequirementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementPolicy::AllOf => f.write_str("all-of"),
            RequirementPolicy::AnyOf => f.write_str("any-of"),
        }
    }
}

/// An order-irrelevant set of capabilities; inserting a duplicate is a no-op
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the capability was already present
    pub fn insert(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    pub fn remove(&mut self, capability: Capability) -> bool {
        self.0.remove(&capability)
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Parse a list of wire tags, failing on the first unknown one
    pub fn parse_tags<I, S>(tags: I) -> Result<Self, UnknownCapabilityError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter().map(|t| t.as_ref().parse()).collect()
    }

    /// Tags in catalog order
    pub fn tags(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.as_str()).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(value: [Capability; N]) -> Self {
        value.into_iter().collect()
    }
}

impl Extend<Capability> for CapabilitySet {
    fn extend<T: IntoIterator<Item = Capability>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.tags().join(", "))
    }
}
