use crate::error::{GovernanceError, Result};
use crate::escrow::VotingEscrow;
use crate::metrics;
use crate::types::LendingStatus;
use crate::whitelist::WhitelistManager;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_economics::{EmissionMinter, TessAmount};
use tessera_types::{
    epoch_start, AccountAddress, Clock, LendingId, LockId, SystemClock, VoteWeight, VotingPower,
};
use tokio::sync::RwLock;
use tracing::info;

/// Pure per-epoch accounting: magnitude consumption per lock, signed
/// tallies per market, aggregate engagement. Records are keyed by epoch
/// start and epochs never interact; history is append-only.
#[derive(Debug, Default)]
struct EpochLedger {
    power_used: HashMap<(LockId, i64), VotingPower>,
    lending_votes: HashMap<(LendingId, i64), i128>,
    total_power: HashMap<i64, VotingPower>,
}

impl EpochLedger {
    fn power_used(&self, lock_id: LockId, epoch: i64) -> VotingPower {
        self.power_used.get(&(lock_id, epoch)).copied().unwrap_or(0)
    }

    fn lending_votes(&self, lending_id: LendingId, epoch: i64) -> i128 {
        self.lending_votes
            .get(&(lending_id, epoch))
            .copied()
            .unwrap_or(0)
    }

    fn total_power(&self, epoch: i64) -> VotingPower {
        self.total_power.get(&epoch).copied().unwrap_or(0)
    }

    fn commit(&mut self, lock_id: LockId, epoch: i64, pairs: &[(LendingId, VoteWeight)]) {
        for &(lending_id, weight) in pairs {
            let magnitude = weight.unsigned_abs();

            let used = self.power_used.entry((lock_id, epoch)).or_insert(0);
            *used = used.saturating_add(magnitude);

            let votes = self.lending_votes.entry((lending_id, epoch)).or_insert(0);
            *votes = votes.saturating_add(weight);

            let total = self.total_power.entry(epoch).or_insert(0);
            *total = total.saturating_add(magnitude);
        }
    }
}

/// Distributes signed weighted support across whitelisted markets
/// inside weekly epochs.
///
/// A lock's magnitude consumption is capped by its voting power per
/// epoch, independent of the per-proposal caps in [`WhitelistManager`].
pub struct AllocationEngine {
    escrow: Arc<dyn VotingEscrow>,
    whitelist: Arc<WhitelistManager>,
    minter: Option<Arc<EmissionMinter>>,
    ledger: RwLock<EpochLedger>,
    clock: Arc<dyn Clock>,
}

impl AllocationEngine {
    pub fn new(escrow: Arc<dyn VotingEscrow>, whitelist: Arc<WhitelistManager>) -> Self {
        Self {
            escrow,
            whitelist,
            minter: None,
            ledger: RwLock::new(EpochLedger::default()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Attach the emission minter so epoch rewards are readable from
    /// here.
    pub fn with_minter(mut self, minter: Arc<EmissionMinter>) -> Self {
        self.minter = Some(minter);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allocate signed weighted support from `lock_id` across markets.
    ///
    /// `lending_ids` and `weights` are parallel arrays; the batch
    /// commits atomically or not at all. Magnitudes count against the
    /// lock's power for the current epoch only.
    pub async fn vote(
        &self,
        caller: AccountAddress,
        lock_id: LockId,
        lending_ids: &[LendingId],
        weights: &[VoteWeight],
    ) -> Result<()> {
        if lending_ids.len() != weights.len() {
            return Err(GovernanceError::BatchMismatch {
                ids: lending_ids.len(),
                weights: weights.len(),
            });
        }

        if !self.escrow.is_approved_or_owner(lock_id, &caller).await? {
            return Err(GovernanceError::NotLockController {
                lock_id,
                account: caller,
            });
        }

        let now = self.clock.now_unix();
        let epoch = epoch_start(now);
        let power = self.escrow.voting_power(lock_id).await?;

        let mut ledger = self.ledger.write().await;

        // Validate the whole batch before committing any of it
        let mut requested: VotingPower = 0;
        for (&lending_id, &weight) in lending_ids.iter().zip(weights) {
            if self.whitelist.lending_status(lending_id).await != LendingStatus::Approved {
                return Err(GovernanceError::LendingNotApproved(lending_id));
            }
            requested = requested.saturating_add(weight.unsigned_abs());
        }

        let used = ledger.power_used(lock_id, epoch);
        if used.saturating_add(requested) > power {
            return Err(GovernanceError::InsufficientVotingPower {
                lock_id,
                requested,
                available: power.saturating_sub(used),
            });
        }

        // Commit
        let pairs: Vec<(LendingId, VoteWeight)> = lending_ids
            .iter()
            .copied()
            .zip(weights.iter().copied())
            .collect();
        ledger.commit(lock_id, epoch, &pairs);

        metrics::ALLOCATION_VOTES_CAST.inc_by(pairs.len() as u64);

        info!(
            lock_id,
            epoch,
            voter = hex::encode(&caller.as_bytes()[..8]),
            markets = pairs.len(),
            power_used = ledger.power_used(lock_id, epoch),
            "🗳️ Allocation votes cast"
        );

        Ok(())
    }

    // ---- queries ----

    /// Start of the current epoch.
    pub fn active_epoch(&self) -> i64 {
        epoch_start(self.clock.now_unix())
    }

    /// Magnitude `lock_id` has committed in the current epoch.
    pub async fn power_used_in_active_epoch(&self, lock_id: LockId) -> VotingPower {
        self.power_used_in(lock_id, self.active_epoch()).await
    }

    /// Magnitude `lock_id` committed in the epoch starting at `epoch`.
    /// Past epochs read frozen, never-mutated records.
    pub async fn power_used_in(&self, lock_id: LockId, epoch: i64) -> VotingPower {
        self.ledger.read().await.power_used(lock_id, epoch)
    }

    /// Headroom `lock_id` still has in the current epoch.
    pub async fn remaining_power_in_active_epoch(&self, lock_id: LockId) -> Result<VotingPower> {
        let power = self.escrow.voting_power(lock_id).await?;
        let used = self.power_used_in_active_epoch(lock_id).await;
        Ok(power.saturating_sub(used))
    }

    /// Signed tally for a market in the current epoch.
    pub async fn lending_votes_in_active_epoch(&self, lending_id: LendingId) -> i128 {
        self.lending_votes_in(lending_id, self.active_epoch()).await
    }

    /// Signed tally for a market in the epoch starting at `epoch`.
    pub async fn lending_votes_in(&self, lending_id: LendingId, epoch: i64) -> i128 {
        self.ledger.read().await.lending_votes(lending_id, epoch)
    }

    /// Aggregate engagement magnitude in the current epoch.
    pub async fn total_power_in_active_epoch(&self) -> VotingPower {
        self.total_power_in(self.active_epoch()).await
    }

    /// Aggregate engagement magnitude in the epoch starting at `epoch`.
    pub async fn total_power_in(&self, epoch: i64) -> VotingPower {
        self.ledger.read().await.total_power(epoch)
    }

    /// Reward minted for `epoch`, when a minter is attached.
    pub async fn epoch_reward(&self, epoch: i64) -> Option<TessAmount> {
        match &self.minter {
            Some(minter) => Some(minter.minted_in(epoch).await),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::MemoryEscrow;
    use crate::types::WhitelistConfig;
    use tessera_economics::MemoryVault;
    use tessera_types::{ManualClock, EPOCH_SECONDS};

    const START: i64 = 1_700_000_000;

    fn addr(tag: u8) -> AccountAddress {
        AccountAddress::from_bytes([tag; 32])
    }

    struct Fixture {
        escrow: Arc<MemoryEscrow>,
        clock: Arc<ManualClock>,
        whitelist: Arc<WhitelistManager>,
        engine: AllocationEngine,
        admin: AccountAddress,
    }

    async fn setup() -> Fixture {
        let escrow = Arc::new(MemoryEscrow::new());
        let clock = Arc::new(ManualClock::new(START));
        let admin = addr(1);
        let whitelist = Arc::new(
            WhitelistManager::new(escrow.clone(), admin, WhitelistConfig::default())
                .with_clock(clock.clone()),
        );
        let engine = AllocationEngine::new(escrow.clone(), whitelist.clone())
            .with_clock(clock.clone());
        Fixture {
            escrow,
            clock,
            whitelist,
            engine,
            admin,
        }
    }

    /// Submit `lending_id` and run it through approval. Leaves the
    /// clock one epoch past `START`.
    async fn approve_market(fx: &Fixture, lending_id: LendingId) {
        let lock = fx.escrow.create_lock(fx.admin, 1).await;
        fx.whitelist
            .submit_lending(fx.admin, lending_id, lock)
            .await
            .unwrap();
        fx.clock.set(START + EPOCH_SECONDS);
        fx.whitelist.execute(lending_id).await.unwrap();
        assert_eq!(
            fx.whitelist.lending_status(lending_id).await,
            LendingStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_vote_requires_whitelisted_market() {
        let fx = setup().await;
        let lock = fx.escrow.create_lock(fx.admin, 1_000).await;

        let result = fx.engine.vote(fx.admin, lock, &[5], &[100]).await;
        assert!(matches!(result, Err(GovernanceError::LendingNotApproved(5))));
    }

    #[tokio::test]
    async fn test_vote_rejects_still_active_market() {
        let fx = setup().await;
        let lock = fx.escrow.create_lock(fx.admin, 1_000).await;
        fx.whitelist.submit_lending(fx.admin, 5, lock).await.unwrap();

        let result = fx.engine.vote(fx.admin, lock, &[5], &[100]).await;
        assert!(matches!(result, Err(GovernanceError::LendingNotApproved(5))));
    }

    #[tokio::test]
    async fn test_magnitudes_accumulate_while_net_cancels() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        let lock = fx.escrow.create_lock(fx.admin, 1_000).await;

        fx.engine.vote(fx.admin, lock, &[7], &[10]).await.unwrap();
        fx.engine.vote(fx.admin, lock, &[7], &[-10]).await.unwrap();

        assert_eq!(fx.engine.power_used_in_active_epoch(lock).await, 20);
        assert_eq!(fx.engine.lending_votes_in_active_epoch(7).await, 0);
        assert_eq!(fx.engine.total_power_in_active_epoch().await, 20);
    }

    #[tokio::test]
    async fn test_epoch_power_cap() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        let voter = addr(2);
        let lock = fx.escrow.create_lock(voter, 500).await;

        let result = fx.engine.vote(voter, lock, &[7], &[501]).await;
        assert!(matches!(
            result,
            Err(GovernanceError::InsufficientVotingPower {
                requested: 501,
                available: 500,
                ..
            })
        ));

        fx.engine.vote(voter, lock, &[7], &[500]).await.unwrap();
        assert_eq!(
            fx.engine.remaining_power_in_active_epoch(lock).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_cap_spans_markets_within_one_epoch() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        approve_market(&fx, 8).await;
        let voter = addr(2);
        let lock = fx.escrow.create_lock(voter, 500).await;

        fx.engine.vote(voter, lock, &[7], &[-300]).await.unwrap();
        let result = fx.engine.vote(voter, lock, &[8], &[201]).await;
        assert!(matches!(
            result,
            Err(GovernanceError::InsufficientVotingPower {
                requested: 201,
                available: 200,
                ..
            })
        ));

        fx.engine.vote(voter, lock, &[8], &[200]).await.unwrap();
        assert_eq!(fx.engine.lending_votes_in_active_epoch(7).await, -300);
        assert_eq!(fx.engine.lending_votes_in_active_epoch(8).await, 200);
        assert_eq!(fx.engine.total_power_in_active_epoch().await, 500);
    }

    #[tokio::test]
    async fn test_batch_commits_atomically() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        let lock = fx.escrow.create_lock(fx.admin, 1_000).await;

        // Market 9 was never whitelisted, so the whole batch fails
        let result = fx
            .engine
            .vote(fx.admin, lock, &[7, 9], &[100, 100])
            .await;
        assert!(matches!(result, Err(GovernanceError::LendingNotApproved(9))));
        assert_eq!(fx.engine.power_used_in_active_epoch(lock).await, 0);
        assert_eq!(fx.engine.lending_votes_in_active_epoch(7).await, 0);

        fx.engine
            .vote(fx.admin, lock, &[7, 7], &[100, 100])
            .await
            .unwrap();
        assert_eq!(fx.engine.lending_votes_in_active_epoch(7).await, 200);
    }

    #[tokio::test]
    async fn test_batch_length_mismatch() {
        let fx = setup().await;
        let lock = fx.escrow.create_lock(fx.admin, 1_000).await;

        let result = fx.engine.vote(fx.admin, lock, &[7], &[1, 2]).await;
        assert!(matches!(
            result,
            Err(GovernanceError::BatchMismatch { ids: 1, weights: 2 })
        ));
    }

    #[tokio::test]
    async fn test_vote_requires_lock_control() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        let owner = addr(2);
        let stranger = addr(3);
        let lock = fx.escrow.create_lock(owner, 500).await;

        let result = fx.engine.vote(stranger, lock, &[7], &[100]).await;
        assert!(matches!(
            result,
            Err(GovernanceError::NotLockController { .. })
        ));

        fx.escrow.approve(lock, stranger).await;
        fx.engine.vote(stranger, lock, &[7], &[100]).await.unwrap();
    }

    #[tokio::test]
    async fn test_epoch_rollover_resets_consumption_and_freezes_history() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        let voter = addr(2);
        let lock = fx.escrow.create_lock(voter, 500).await;

        let first_epoch = fx.engine.active_epoch();
        fx.engine.vote(voter, lock, &[7], &[500]).await.unwrap();
        assert_eq!(
            fx.engine.remaining_power_in_active_epoch(lock).await.unwrap(),
            0
        );

        fx.clock.advance(EPOCH_SECONDS);
        let second_epoch = fx.engine.active_epoch();
        assert_ne!(first_epoch, second_epoch);

        // Fresh headroom in the new epoch
        assert_eq!(fx.engine.power_used_in_active_epoch(lock).await, 0);
        fx.engine.vote(voter, lock, &[7], &[-200]).await.unwrap();

        // The old epoch's records are frozen, not zero
        assert_eq!(fx.engine.power_used_in(lock, first_epoch).await, 500);
        assert_eq!(fx.engine.lending_votes_in(7, first_epoch).await, 500);
        assert_eq!(fx.engine.total_power_in(first_epoch).await, 500);
        assert_eq!(fx.engine.lending_votes_in(7, second_epoch).await, -200);
    }

    #[tokio::test]
    async fn test_total_power_aggregates_across_locks() {
        let fx = setup().await;
        approve_market(&fx, 7).await;
        let voter2 = addr(2);
        let voter3 = addr(3);
        let lock2 = fx.escrow.create_lock(voter2, 500).await;
        let lock3 = fx.escrow.create_lock(voter3, 800).await;

        fx.engine.vote(voter2, lock2, &[7], &[400]).await.unwrap();
        fx.engine.vote(voter3, lock3, &[7], &[-600]).await.unwrap();

        assert_eq!(fx.engine.total_power_in_active_epoch().await, 1_000);
        assert_eq!(fx.engine.lending_votes_in_active_epoch(7).await, -200);
    }

    #[tokio::test]
    async fn test_epoch_reward_requires_minter() {
        let fx = setup().await;
        assert_eq!(fx.engine.epoch_reward(fx.engine.active_epoch()).await, None);

        let vault = Arc::new(MemoryVault::new());
        let minter = Arc::new(
            EmissionMinter::new(vault, fx.admin).with_clock(fx.clock.clone()),
        );
        minter
            .set_emission(fx.admin, TessAmount::from_tess(10.0))
            .await
            .unwrap();
        minter.mint().await.unwrap();

        let engine = AllocationEngine::new(fx.escrow.clone(), fx.whitelist.clone())
            .with_clock(fx.clock.clone())
            .with_minter(minter.clone());
        assert_eq!(
            engine.epoch_reward(engine.active_epoch()).await,
            Some(TessAmount::from_tess(10.0))
        );
        assert_eq!(
            engine.epoch_reward(engine.active_epoch() - EPOCH_SECONDS).await,
            Some(TessAmount::ZERO)
        );
    }
}
