use crate::error::{GovernanceError, Result};
use crate::escrow::VotingEscrow;
use crate::metrics;
use crate::types::{LendingProposal, LendingStatus, WhitelistConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_types::{
    AccountAddress, Clock, LendingId, LockId, SystemClock, VoteWeight, VotingPower,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Runs the submit → vote → execute lifecycle deciding which lending
/// markets are whitelisted.
///
/// Votes accrue while a proposal is `Active`; the window only gates
/// `execute`. Approval requires the magnitude tally to reach
/// `min_votes` and the signed tally to reach `min_support_votes`.
pub struct WhitelistManager {
    escrow: Arc<dyn VotingEscrow>,
    admin: AccountAddress,
    config: RwLock<WhitelistConfig>,
    proposals: RwLock<HashMap<LendingId, LendingProposal>>,
    clock: Arc<dyn Clock>,
}

impl WhitelistManager {
    pub fn new(
        escrow: Arc<dyn VotingEscrow>,
        admin: AccountAddress,
        config: WhitelistConfig,
    ) -> Self {
        Self {
            escrow,
            admin,
            config: RwLock::new(config),
            proposals: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Submit a candidate lending market, opening its voting window.
    pub async fn submit_lending(
        &self,
        caller: AccountAddress,
        lending_id: LendingId,
        lock_id: LockId,
    ) -> Result<()> {
        let now = self.clock.now_unix();

        // Check the caller controls the lock
        self.check_lock_controller(lock_id, &caller).await?;

        // Check submission power
        let power = self.escrow.voting_power(lock_id).await?;
        let min_submission_power = self.config.read().await.min_submission_power;
        if power < min_submission_power {
            return Err(GovernanceError::InsufficientSubmissionPower {
                required: min_submission_power,
                actual: power,
            });
        }

        // A market id is submitted at most once, ever
        let mut proposals = self.proposals.write().await;
        if proposals.contains_key(&lending_id) {
            return Err(GovernanceError::AlreadySubmitted(lending_id));
        }
        proposals.insert(lending_id, LendingProposal::new(lending_id, caller, now));

        metrics::LENDINGS_SUBMITTED.inc();
        metrics::ACTIVE_LENDINGS.inc();
        metrics::STATUS_TRANSITIONS
            .with_label_values(&["unsubmitted", "active"])
            .inc();

        info!(
            lending_id,
            lock_id,
            submitter = hex::encode(&caller.as_bytes()[..8]),
            voting_power = power,
            "📜 Lending submitted for whitelisting"
        );

        Ok(())
    }

    /// Cast weighted whitelist votes from the caller's locks.
    ///
    /// `lock_ids` and `weights` are parallel arrays; negative weights
    /// oppose the lending. The batch commits atomically or not at all,
    /// and a lock repeated within one batch accumulates against the
    /// same per-proposal cap.
    pub async fn vote(
        &self,
        caller: AccountAddress,
        lending_id: LendingId,
        lock_ids: &[LockId],
        weights: &[VoteWeight],
    ) -> Result<()> {
        if lock_ids.len() != weights.len() {
            return Err(GovernanceError::BatchMismatch {
                ids: lock_ids.len(),
                weights: weights.len(),
            });
        }

        let mut proposals = self.proposals.write().await;
        let proposal = match proposals.get_mut(&lending_id) {
            Some(p) if p.status == LendingStatus::Active => p,
            _ => return Err(GovernanceError::LendingNotActive(lending_id)),
        };

        // Validate the whole batch before committing any of it
        let mut added: HashMap<LockId, VotingPower> = HashMap::new();
        for (&lock_id, &weight) in lock_ids.iter().zip(weights) {
            self.check_lock_controller(lock_id, &caller).await?;

            let power = self.escrow.voting_power(lock_id).await?;
            let pending = added.entry(lock_id).or_insert(0);
            *pending = pending.saturating_add(weight.unsigned_abs());

            let used = proposal.power_used.get(&lock_id).copied().unwrap_or(0);
            if used.saturating_add(*pending) > power {
                return Err(GovernanceError::InsufficientVotingPower {
                    lock_id,
                    requested: *pending,
                    available: power.saturating_sub(used),
                });
            }
        }

        // Commit
        for (lock_id, magnitude) in added {
            let used = proposal.power_used.entry(lock_id).or_insert(0);
            *used = used.saturating_add(magnitude);
        }
        for &weight in weights {
            proposal.net_votes = proposal.net_votes.saturating_add(weight);
            proposal.total_votes = proposal.total_votes.saturating_add(weight.unsigned_abs());
        }

        metrics::WHITELIST_VOTES_CAST.inc_by(lock_ids.len() as u64);

        info!(
            lending_id,
            voter = hex::encode(&caller.as_bytes()[..8]),
            locks = lock_ids.len(),
            net_votes = proposal.net_votes,
            total_votes = proposal.total_votes,
            "🗳️ Whitelist votes cast"
        );

        Ok(())
    }

    /// Resolve an active proposal once its window has elapsed.
    ///
    /// The window is read from the current configuration, so an admin
    /// shortening it releases pending proposals earlier.
    pub async fn execute(&self, lending_id: LendingId) -> Result<LendingStatus> {
        let now = self.clock.now_unix();
        let config = self.config.read().await.clone();

        let mut proposals = self.proposals.write().await;
        let proposal = match proposals.get_mut(&lending_id) {
            Some(p) if p.status == LendingStatus::Active => p,
            _ => return Err(GovernanceError::LendingNotActive(lending_id)),
        };

        let elapsed = now - proposal.submitted_at;
        if elapsed < config.active_window_secs {
            return Err(GovernanceError::WindowNotElapsed {
                remaining_secs: config.active_window_secs - elapsed,
            });
        }

        let approved = proposal.total_votes >= config.min_votes
            && proposal.net_votes >= config.min_support_votes;
        let outcome = if approved {
            LendingStatus::Approved
        } else {
            LendingStatus::Rejected
        };
        proposal.status = outcome;

        metrics::ACTIVE_LENDINGS.dec();
        metrics::STATUS_TRANSITIONS
            .with_label_values(&["active", if approved { "approved" } else { "rejected" }])
            .inc();

        info!(
            lending_id,
            net_votes = proposal.net_votes,
            total_votes = proposal.total_votes,
            outcome = %outcome,
            "📊 Lending proposal executed"
        );

        Ok(outcome)
    }

    // ---- administration ----

    /// Set the quorum measured on the magnitude tally.
    pub async fn set_min_votes(&self, caller: AccountAddress, min_votes: u128) -> Result<()> {
        self.check_admin(&caller)?;
        self.config.write().await.min_votes = min_votes;
        info!(min_votes, "⚙️ min_votes updated");
        Ok(())
    }

    /// Set the net-support threshold.
    pub async fn set_min_support_votes(
        &self,
        caller: AccountAddress,
        min_support_votes: i128,
    ) -> Result<()> {
        self.check_admin(&caller)?;
        self.config.write().await.min_support_votes = min_support_votes;
        info!(min_support_votes, "⚙️ min_support_votes updated");
        Ok(())
    }

    /// Set how long proposals stay open before they can be executed.
    /// Applies to pending proposals as well; the window is read at
    /// execute time.
    pub async fn set_active_window(&self, caller: AccountAddress, secs: i64) -> Result<()> {
        self.check_admin(&caller)?;
        self.config.write().await.active_window_secs = secs;
        info!(active_window_secs = secs, "⚙️ active window updated");
        Ok(())
    }

    /// Set the minimum power required to submit a candidate market.
    pub async fn set_min_submission_power(
        &self,
        caller: AccountAddress,
        power: VotingPower,
    ) -> Result<()> {
        self.check_admin(&caller)?;
        self.config.write().await.min_submission_power = power;
        info!(min_submission_power = power, "⚙️ min_submission_power updated");
        Ok(())
    }

    pub async fn min_votes(&self) -> u128 {
        self.config.read().await.min_votes
    }

    pub async fn min_support_votes(&self) -> i128 {
        self.config.read().await.min_support_votes
    }

    pub async fn active_window_secs(&self) -> i64 {
        self.config.read().await.active_window_secs
    }

    pub async fn min_submission_power(&self) -> VotingPower {
        self.config.read().await.min_submission_power
    }

    // ---- queries ----

    /// Status of a market; `Unsubmitted` for ids never submitted.
    pub async fn lending_status(&self, lending_id: LendingId) -> LendingStatus {
        let proposals = self.proposals.read().await;
        proposals
            .get(&lending_id)
            .map_or(LendingStatus::Unsubmitted, |p| p.status)
    }

    /// Proposal record, if the market was ever submitted.
    pub async fn proposal(&self, lending_id: LendingId) -> Option<LendingProposal> {
        self.proposals.read().await.get(&lending_id).cloned()
    }

    /// Signed net tally for a market; zero if never submitted.
    pub async fn total_votes_of_lending(&self, lending_id: LendingId) -> i128 {
        let proposals = self.proposals.read().await;
        proposals.get(&lending_id).map_or(0, |p| p.net_votes)
    }

    /// Magnitude headroom a lock still has on a proposal. For a market
    /// never submitted this is the lock's full power.
    pub async fn remaining_vote_power(
        &self,
        lending_id: LendingId,
        lock_id: LockId,
    ) -> Result<VotingPower> {
        let power = self.escrow.voting_power(lock_id).await?;
        let proposals = self.proposals.read().await;
        Ok(proposals
            .get(&lending_id)
            .map_or(power, |p| p.remaining_power(lock_id, power)))
    }

    async fn check_lock_controller(
        &self,
        lock_id: LockId,
        account: &AccountAddress,
    ) -> Result<()> {
        if !self.escrow.is_approved_or_owner(lock_id, account).await? {
            return Err(GovernanceError::NotLockController {
                lock_id,
                account: *account,
            });
        }
        Ok(())
    }

    fn check_admin(&self, caller: &AccountAddress) -> Result<()> {
        if *caller != self.admin {
            metrics::UNAUTHORIZED_REJECTIONS.inc();
            warn!(
                caller = hex::encode(&caller.as_bytes()[..8]),
                "Rejected parameter change from non-admin"
            );
            return Err(GovernanceError::Unauthorized(*caller));
        }
        Ok(())
    }
}
