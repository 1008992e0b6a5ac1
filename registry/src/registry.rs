//! Identity registry: the tier state machine.
//!
//! ```text
//! Unverified ──link──▶ Linked ──primary──▶ Primary ──promote──▶ Oracle
//!      ▲                                      │                    │
//!      └──────────────── downgrade ───────────┴────────────────────┘
//! ```
//!
//! Every mutator checks the caller against the access policy, then validates
//! the whole transition, and only then writes.

use crate::error::RegistryError;
use crate::identity::{Identity, MAX_LINKED_ACCOUNTS, MAX_PLATFORM_LEN};
use knomee_types::{AccessPolicy, Address, ClaimId, IdentityTier, Role, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRegistry {
    identities: BTreeMap<Address, Identity>,
    policy: AccessPolicy,
}

impl IdentityRegistry {
    /// Create an empty registry whose only authorized mutator is `writer`.
    pub fn new(writer: Address) -> Self {
        Self {
            identities: BTreeMap::new(),
            policy: AccessPolicy::new().with(Role::RegistryWriter, writer),
        }
    }

    // ── Views ───────────────────────────────────────────────────────────

    /// The record for `address`, or the zero-value record if none exists yet.
    pub fn get_identity(&self, address: &Address) -> Identity {
        self.identities.get(address).cloned().unwrap_or_default()
    }

    pub fn tier(&self, address: &Address) -> IdentityTier {
        self.identities
            .get(address)
            .map(|id| id.tier)
            .unwrap_or_default()
    }

    pub fn is_under_challenge(&self, address: &Address) -> bool {
        self.identities
            .get(address)
            .is_some_and(|id| id.under_challenge)
    }

    /// Number of addresses with a stored record.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Number of stored records at or above `tier`.
    pub fn count_at_least(&self, tier: IdentityTier) -> usize {
        self.identities.values().filter(|id| id.tier >= tier).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Identity)> {
        self.identities.iter()
    }

    fn record(&mut self, address: Address) -> &mut Identity {
        self.identities.entry(address).or_default()
    }

    // ── Tier transitions ────────────────────────────────────────────────

    /// Link `address` to `primary` under `platform`.
    ///
    /// Re-linking the identical (primary, platform, address) triple is a no-op
    /// and returns `Ok(false)`.
    pub fn upgrade_to_linked(
        &mut self,
        caller: &Address,
        address: Address,
        primary: Address,
        platform: &str,
        now: Timestamp,
    ) -> Result<bool, RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        validate_platform(platform)?;
        if address == primary {
            return Err(RegistryError::CannotLinkToSelf);
        }

        let target = self.get_identity(&primary);
        if !target.tier.is_primary() {
            return Err(RegistryError::NotAPrimaryId(primary));
        }
        let subject = self.get_identity(&address);
        if subject.tier.is_primary() {
            return Err(RegistryError::AlreadyPrimary(address));
        }
        match subject.primary_account {
            Some(existing) if existing != primary => {
                return Err(RegistryError::AlreadyLinked {
                    address,
                    primary: existing,
                });
            }
            Some(_) if target.has_link(platform, &address) => return Ok(false),
            _ => {}
        }
        if target.linked_count() >= MAX_LINKED_ACCOUNTS {
            return Err(RegistryError::MaxLinkedIdentitiesReached(primary));
        }

        self.record(primary)
            .linked_accounts
            .entry(platform.to_string())
            .or_default()
            .push(address);
        let subject = self.record(address);
        subject.tier = IdentityTier::Linked;
        subject.primary_account = Some(primary);
        subject.verified_at.get_or_insert(now);

        tracing::info!(
            address = %address.short(),
            primary = %primary.short(),
            platform,
            "identity linked"
        );
        Ok(true)
    }

    /// Raise `address` to primary. A linked account leaves its old primary's table.
    pub fn upgrade_to_primary(
        &mut self,
        caller: &Address,
        address: Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        let subject = self.get_identity(&address);
        if subject.tier.is_primary() {
            return Err(RegistryError::AlreadyPrimary(address));
        }

        if let Some(old_primary) = subject.primary_account {
            if let Some(record) = self.identities.get_mut(&old_primary) {
                record.detach(&address);
            }
        }
        let record = self.record(address);
        record.tier = IdentityTier::Primary;
        record.primary_account = Some(address);
        record.verified_at = Some(now);

        tracing::info!(address = %address.short(), "identity upgraded to primary");
        Ok(())
    }

    pub fn upgrade_to_oracle(
        &mut self,
        caller: &Address,
        address: Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        match self.tier(&address) {
            IdentityTier::Primary => {}
            IdentityTier::Oracle => return Err(RegistryError::AlreadyOracle(address)),
            _ => return Err(RegistryError::MustBePrimaryToUpgrade),
        }

        let record = self.record(address);
        record.tier = IdentityTier::Oracle;
        record.oracle_since = Some(now);

        tracing::info!(address = %address.short(), "identity upgraded to oracle");
        Ok(())
    }

    /// Lower `address` to `new_tier`.
    ///
    /// The target must be strictly lower. Valid targets are `Unverified` (from
    /// any tier) and `Primary` (from oracle); an address cannot be pushed down
    /// into `Linked` because that needs a link target.
    ///
    /// Dropping a primary or oracle to `Unverified` empties its link table and
    /// returns every account linked to it to `Unverified` as well.
    pub fn downgrade(
        &mut self,
        caller: &Address,
        address: Address,
        new_tier: IdentityTier,
    ) -> Result<(), RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        let subject = self.get_identity(&address);
        let allowed = new_tier < subject.tier && new_tier != IdentityTier::Linked;
        if !allowed {
            return Err(RegistryError::CannotDowngradeTier {
                from: subject.tier,
                to: new_tier,
            });
        }

        let mut released = 0;
        if new_tier == IdentityTier::Unverified {
            if let Some(primary) = subject.primary_account.filter(|p| *p != address) {
                if let Some(record) = self.identities.get_mut(&primary) {
                    record.detach(&address);
                }
            }
            // Accounts linked to a revoked primary lose their verification with it.
            for account in subject.linked_accounts.values().flatten() {
                if let Some(linked) = self.identities.get_mut(account) {
                    if linked.tier == IdentityTier::Linked && linked.primary_account == Some(address) {
                        linked.tier = IdentityTier::Unverified;
                        linked.primary_account = None;
                        linked.verified_at = None;
                        released += 1;
                    }
                }
            }
        }
        let record = self.record(address);
        record.tier = new_tier;
        record.oracle_since = None;
        if new_tier == IdentityTier::Unverified {
            record.primary_account = None;
            record.verified_at = None;
            record.linked_accounts.clear();
        }

        tracing::warn!(
            address = %address.short(),
            from = %subject.tier,
            to = %new_tier,
            released_links = released,
            "identity downgraded"
        );
        Ok(())
    }

    // ── Challenge flag ──────────────────────────────────────────────────

    /// Flag `address` as the target of the open duplicate claim `claim_id`.
    pub fn mark_under_challenge(
        &mut self,
        caller: &Address,
        address: Address,
        claim_id: ClaimId,
    ) -> Result<(), RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        if self.is_under_challenge(&address) {
            return Err(RegistryError::AlreadyUnderChallenge(address));
        }
        let record = self.record(address);
        record.under_challenge = true;
        record.challenge_claim = Some(claim_id);
        tracing::debug!(address = %address.short(), claim_id, "address under challenge");
        Ok(())
    }

    /// Clear the challenge flag. Returns false if it was not set.
    pub fn clear_challenge(&mut self, caller: &Address, address: Address) -> Result<bool, RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        let Some(record) = self.identities.get_mut(&address) else {
            return Ok(false);
        };
        let was_set = record.under_challenge;
        record.under_challenge = false;
        record.challenge_claim = None;
        if was_set {
            tracing::debug!(address = %address.short(), "challenge cleared");
        }
        Ok(was_set)
    }

    // ── Counters ────────────────────────────────────────────────────────

    /// Count a vouch by `voucher` on a claim made by `claimant`.
    ///
    /// Only supporting vouches count as received.
    pub fn record_vouch(
        &mut self,
        caller: &Address,
        voucher: Address,
        claimant: Address,
        as_support: bool,
    ) -> Result<(), RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        let record = self.record(voucher);
        record.vouches_given = record.vouches_given.saturating_add(1);
        if as_support {
            let record = self.record(claimant);
            record.vouches_received = record.vouches_received.saturating_add(1);
        }
        Ok(())
    }

    /// Add `delta` to the reputation score, saturating at zero.
    pub fn adjust_reputation(
        &mut self,
        caller: &Address,
        address: Address,
        delta: i64,
    ) -> Result<u64, RegistryError> {
        self.policy.check(caller, Role::RegistryWriter)?;
        let record = self.record(address);
        record.reputation_score = if delta >= 0 {
            record.reputation_score.saturating_add(delta.unsigned_abs())
        } else {
            record.reputation_score.saturating_sub(delta.unsigned_abs())
        };
        Ok(record.reputation_score)
    }
}

fn validate_platform(platform: &str) -> Result<(), RegistryError> {
    if platform.is_empty() || platform.len() > MAX_PLATFORM_LEN {
        return Err(RegistryError::InvalidPlatform {
            len: platform.len(),
            max: MAX_PLATFORM_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use knomee_types::ErrorKind;

    const ENGINE: Address = Address::from_bytes([0xEE; 32]);

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 32])
    }

    fn now() -> Timestamp {
        Timestamp::new(1_000)
    }

    fn with_primary(n: u8) -> IdentityRegistry {
        let mut reg = IdentityRegistry::new(ENGINE);
        reg.upgrade_to_primary(&ENGINE, addr(n), now()).unwrap();
        reg
    }

    #[test]
    fn unknown_address_reads_as_unverified() {
        let reg = IdentityRegistry::new(ENGINE);
        assert_eq!(reg.tier(&addr(1)), IdentityTier::Unverified);
        assert_eq!(reg.get_identity(&addr(1)), Identity::default());
        assert!(reg.is_empty());
    }

    #[test]
    fn only_the_writer_may_mutate() {
        let mut reg = IdentityRegistry::new(ENGINE);
        let err = reg.upgrade_to_primary(&addr(1), addr(1), now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(reg.mark_under_challenge(&addr(1), addr(2), 0).is_err());
        assert!(reg.adjust_reputation(&addr(1), addr(1), 5).is_err());
        assert_eq!(reg.tier(&addr(1)), IdentityTier::Unverified);
    }

    #[test]
    fn upgrade_to_primary_sets_self_reference() {
        let reg = with_primary(1);
        let id = reg.get_identity(&addr(1));
        assert_eq!(id.tier, IdentityTier::Primary);
        assert_eq!(id.primary_account, Some(addr(1)));
        assert_eq!(id.verified_at, Some(now()));
    }

    #[test]
    fn link_requires_primary_target() {
        let mut reg = IdentityRegistry::new(ENGINE);
        let err = reg
            .upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now())
            .unwrap_err();
        assert_eq!(err, RegistryError::NotAPrimaryId(addr(1)));
        assert_eq!(
            reg.upgrade_to_linked(&ENGINE, addr(1), addr(1), "github", now()),
            Err(RegistryError::CannotLinkToSelf)
        );
    }

    #[test]
    fn link_validates_platform() {
        let mut reg = with_primary(1);
        let long = "x".repeat(MAX_PLATFORM_LEN + 1);
        for platform in ["", long.as_str()] {
            let err = reg
                .upgrade_to_linked(&ENGINE, addr(2), addr(1), platform, now())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn relinking_same_triple_is_idempotent() {
        let mut reg = with_primary(1);
        assert!(reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap());
        assert!(!reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap());

        let primary = reg.get_identity(&addr(1));
        assert_eq!(primary.linked_accounts["github"], vec![addr(2)]);
        assert_eq!(reg.tier(&addr(2)), IdentityTier::Linked);
        assert_eq!(reg.get_identity(&addr(2)).primary_account, Some(addr(1)));
    }

    #[test]
    fn multiple_accounts_per_platform() {
        let mut reg = with_primary(1);
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap();
        reg.upgrade_to_linked(&ENGINE, addr(3), addr(1), "github", now()).unwrap();
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "discord", now()).unwrap();

        let primary = reg.get_identity(&addr(1));
        assert_eq!(primary.linked_accounts["github"], vec![addr(2), addr(3)]);
        assert_eq!(primary.linked_accounts["discord"], vec![addr(2)]);
        assert_eq!(primary.linked_count(), 3);
    }

    #[test]
    fn cannot_link_to_a_second_primary() {
        let mut reg = with_primary(1);
        reg.upgrade_to_primary(&ENGINE, addr(5), now()).unwrap();
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap();

        let before = reg.get_identity(&addr(5));
        let err = reg
            .upgrade_to_linked(&ENGINE, addr(2), addr(5), "github", now())
            .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyLinked { address: addr(2), primary: addr(1) });
        assert_eq!(reg.get_identity(&addr(5)), before);
    }

    #[test]
    fn primary_cannot_become_linked() {
        let mut reg = with_primary(1);
        reg.upgrade_to_primary(&ENGINE, addr(2), now()).unwrap();
        assert_eq!(
            reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()),
            Err(RegistryError::AlreadyPrimary(addr(2)))
        );
    }

    #[test]
    fn link_table_is_bounded() {
        let mut reg = with_primary(1);
        for n in 0..MAX_LINKED_ACCOUNTS as u8 {
            reg.upgrade_to_linked(&ENGINE, addr(100 + n), addr(1), "bots", now()).unwrap();
        }
        assert_eq!(
            reg.upgrade_to_linked(&ENGINE, addr(200), addr(1), "bots", now()),
            Err(RegistryError::MaxLinkedIdentitiesReached(addr(1)))
        );
    }

    #[test]
    fn linked_account_promoted_to_primary_leaves_old_table() {
        let mut reg = with_primary(1);
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap();
        reg.upgrade_to_primary(&ENGINE, addr(2), now()).unwrap();

        assert_eq!(reg.get_identity(&addr(1)).linked_count(), 0);
        assert_eq!(reg.get_identity(&addr(2)).primary_account, Some(addr(2)));
    }

    #[test]
    fn oracle_upgrade_rules() {
        let mut reg = with_primary(1);
        assert_eq!(
            reg.upgrade_to_oracle(&ENGINE, addr(2), now()),
            Err(RegistryError::MustBePrimaryToUpgrade)
        );
        reg.upgrade_to_oracle(&ENGINE, addr(1), now()).unwrap();
        assert_eq!(reg.tier(&addr(1)), IdentityTier::Oracle);
        assert_eq!(reg.get_identity(&addr(1)).oracle_since, Some(now()));
        assert_eq!(
            reg.upgrade_to_oracle(&ENGINE, addr(1), now()),
            Err(RegistryError::AlreadyOracle(addr(1)))
        );
    }

    #[test]
    fn downgrade_must_be_strictly_lower() {
        let mut reg = with_primary(1);
        for to in [IdentityTier::Primary, IdentityTier::Oracle, IdentityTier::Linked] {
            let err = reg.downgrade(&ENGINE, addr(1), to).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::State);
        }
        assert_eq!(reg.tier(&addr(1)), IdentityTier::Primary);
    }

    #[test]
    fn oracle_downgrades_to_primary() {
        let mut reg = with_primary(1);
        reg.upgrade_to_oracle(&ENGINE, addr(1), now()).unwrap();
        reg.downgrade(&ENGINE, addr(1), IdentityTier::Primary).unwrap();
        let id = reg.get_identity(&addr(1));
        assert_eq!(id.tier, IdentityTier::Primary);
        assert_eq!(id.oracle_since, None);
        assert_eq!(id.primary_account, Some(addr(1)));
    }

    #[test]
    fn downgrade_to_unverified_detaches_link() {
        let mut reg = with_primary(1);
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap();
        reg.downgrade(&ENGINE, addr(2), IdentityTier::Unverified).unwrap();

        let id = reg.get_identity(&addr(2));
        assert_eq!(id.tier, IdentityTier::Unverified);
        assert_eq!(id.primary_account, None);
        assert_eq!(id.verified_at, None);
        assert_eq!(reg.get_identity(&addr(1)).linked_count(), 0);
    }

    #[test]
    fn revoked_primary_releases_its_linked_accounts() {
        let mut reg = with_primary(1);
        reg.upgrade_to_primary(&ENGINE, addr(4), now()).unwrap();
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap();
        reg.upgrade_to_linked(&ENGINE, addr(3), addr(1), "x", now()).unwrap();

        reg.downgrade(&ENGINE, addr(1), IdentityTier::Unverified).unwrap();

        let revoked = reg.get_identity(&addr(1));
        assert_eq!(revoked.tier, IdentityTier::Unverified);
        assert_eq!(revoked.linked_count(), 0);
        for n in [2, 3] {
            let id = reg.get_identity(&addr(n));
            assert_eq!(id.tier, IdentityTier::Unverified);
            assert_eq!(id.primary_account, None);
            assert_eq!(id.verified_at, None);
        }
        assert_eq!(reg.count_at_least(IdentityTier::Linked), 1);

        // A released account may link to another primary.
        assert_eq!(
            reg.upgrade_to_linked(&ENGINE, addr(2), addr(4), "github", now()),
            Ok(true)
        );
    }

    #[test]
    fn challenge_flag_is_exclusive() {
        let mut reg = with_primary(1);
        reg.mark_under_challenge(&ENGINE, addr(1), 7).unwrap();
        assert!(reg.is_under_challenge(&addr(1)));
        assert_eq!(reg.get_identity(&addr(1)).challenge_claim, Some(7));
        assert_eq!(
            reg.mark_under_challenge(&ENGINE, addr(1), 8),
            Err(RegistryError::AlreadyUnderChallenge(addr(1)))
        );

        assert!(reg.clear_challenge(&ENGINE, addr(1)).unwrap());
        assert!(!reg.clear_challenge(&ENGINE, addr(1)).unwrap());
        assert_eq!(reg.get_identity(&addr(1)).challenge_claim, None);
    }

    #[test]
    fn vouch_counters() {
        let mut reg = IdentityRegistry::new(ENGINE);
        reg.record_vouch(&ENGINE, addr(1), addr(9), true).unwrap();
        reg.record_vouch(&ENGINE, addr(1), addr(9), false).unwrap();
        assert_eq!(reg.get_identity(&addr(1)).vouches_given, 2);
        assert_eq!(reg.get_identity(&addr(9)).vouches_received, 1);
    }

    #[test]
    fn reputation_saturates_at_zero() {
        let mut reg = IdentityRegistry::new(ENGINE);
        assert_eq!(reg.adjust_reputation(&ENGINE, addr(1), 2).unwrap(), 2);
        assert_eq!(reg.adjust_reputation(&ENGINE, addr(1), -5).unwrap(), 0);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut reg = with_primary(1);
        reg.upgrade_to_linked(&ENGINE, addr(2), addr(1), "github", now()).unwrap();
        let bytes = bincode::serialize(&reg).unwrap();
        let restored: IdentityRegistry = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.get_identity(&addr(1)), reg.get_identity(&addr(1)));
        assert_eq!(restored.tier(&addr(2)), IdentityTier::Linked);
    }
}
