//! Access policy: the single capability check used at every entry point.
//!
//! Components hold an [`AccessPolicy`] listing which addresses hold which
//! [`Role`]; mutators call [`AccessPolicy::check`] first and nothing else.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::address::Address;

/// Capabilities an address can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May change governance parameters and promote oracles.
    Governor,
    /// May warp time and renounce god mode.
    GodMode,
    /// May mutate identity records (the consensus engine).
    RegistryWriter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Governor => "governor",
            Role::GodMode => "god-mode",
            Role::RegistryWriter => "registry-writer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{caller} does not hold role {role}")]
pub struct AccessDenied {
    pub caller: Address,
    pub role: Role,
}

/// Role → holders table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    grants: BTreeMap<Role, BTreeSet<Address>>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`grant`](Self::grant).
    pub fn with(mut self, role: Role, holder: Address) -> Self {
        self.grant(role, holder);
        self
    }

    pub fn grant(&mut self, role: Role, holder: Address) -> bool {
        self.grants.entry(role).or_default().insert(holder)
    }

    pub fn revoke(&mut self, role: Role, holder: &Address) -> bool {
        let Some(holders) = self.grants.get_mut(&role) else {
            return false;
        };
        let removed = holders.remove(holder);
        if holders.is_empty() {
            self.grants.remove(&role);
        }
        removed
    }

    /// Drop every holder of `role`.
    pub fn clear(&mut self, role: Role) {
        self.grants.remove(&role);
    }

    pub fn holds(&self, caller: &Address, role: Role) -> bool {
        !caller.is_zero() && self.grants.get(&role).is_some_and(|h| h.contains(caller))
    }

    pub fn holders(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.grants.get(&role).into_iter().flatten()
    }

    pub fn holder_count(&self, role: Role) -> usize {
        self.grants.get(&role).map_or(0, |h| h.len())
    }

    /// Allow or deny `caller` acting with `role`.
    pub fn check(&self, caller: &Address, role: Role) -> Result<(), AccessDenied> {
        if self.holds(caller, role) {
            Ok(())
        } else {
            Err(AccessDenied {
                caller: *caller,
                role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 32])
    }

    #[test]
    fn grant_check_revoke() {
        let mut policy = AccessPolicy::new().with(Role::Governor, addr(1));
        assert!(policy.check(&addr(1), Role::Governor).is_ok());
        assert!(policy.check(&addr(2), Role::Governor).is_err());
        assert!(policy.check(&addr(1), Role::GodMode).is_err());

        assert!(policy.revoke(Role::Governor, &addr(1)));
        assert!(policy.check(&addr(1), Role::Governor).is_err());
        assert_eq!(policy.holder_count(Role::Governor), 0);
    }

    #[test]
    fn zero_address_never_authorized() {
        let policy = AccessPolicy::new().with(Role::Governor, Address::ZERO);
        assert!(!policy.holds(&Address::ZERO, Role::Governor));
    }

    #[test]
    fn denial_names_role() {
        let err = AccessPolicy::new().check(&addr(3), Role::RegistryWriter).unwrap_err();
        assert_eq!(err.role, Role::RegistryWriter);
        assert!(err.to_string().contains("registry-writer"));
    }
}
