//! Per-address identity record.

use knomee_types::{Address, ClaimId, IdentityTier, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum byte length of a platform label.
pub const MAX_PLATFORM_LEN: usize = 32;

/// Maximum number of accounts a single primary may have linked.
pub const MAX_LINKED_ACCOUNTS: usize = 32;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub tier: IdentityTier,
    /// Self for primaries and oracles, the link target for linked accounts.
    pub primary_account: Option<Address>,
    /// Platform label → accounts linked under it (kept on the primary's record).
    pub linked_accounts: BTreeMap<String, Vec<Address>>,
    pub under_challenge: bool,
    /// The open duplicate-flag claim naming this address.
    pub challenge_claim: Option<ClaimId>,
    pub vouches_given: u64,
    pub vouches_received: u64,
    pub reputation_score: u64,
    pub verified_at: Option<Timestamp>,
    pub oracle_since: Option<Timestamp>,
}

impl Identity {
    /// Total accounts linked to this identity across all platforms.
    pub fn linked_count(&self) -> usize {
        self.linked_accounts.values().map(Vec::len).sum()
    }

    pub fn has_link(&self, platform: &str, account: &Address) -> bool {
        self.linked_accounts
            .get(platform)
            .is_some_and(|accounts| accounts.contains(account))
    }

    /// Remove `account` from every platform it appears under.
    pub(crate) fn detach(&mut self, account: &Address) {
        for accounts in self.linked_accounts.values_mut() {
            accounts.retain(|a| a != account);
        }
        self.linked_accounts.retain(|_, accounts| !accounts.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unverified() {
        let id = Identity::default();
        assert_eq!(id.tier, IdentityTier::Unverified);
        assert_eq!(id.primary_account, None);
        assert!(!id.under_challenge);
        assert_eq!(id.linked_count(), 0);
    }

    #[test]
    fn detach_drops_empty_platforms() {
        let a = Address::from_bytes([1; 32]);
        let b = Address::from_bytes([2; 32]);
        let mut id = Identity::default();
        id.linked_accounts.insert("github".into(), vec![a, b]);
        id.linked_accounts.insert("x".into(), vec![a]);

        id.detach(&a);
        assert_eq!(id.linked_count(), 1);
        assert!(id.has_link("github", &b));
        assert!(!id.linked_accounts.contains_key("x"));
    }
}
