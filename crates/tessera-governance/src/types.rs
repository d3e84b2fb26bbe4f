use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tessera_types::{AccountAddress, LendingId, LockId, VotingPower, EPOCH_SECONDS};

/// Lifecycle status of a lending market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LendingStatus {
    /// Never submitted; the implicit status of any unknown market id.
    Unsubmitted,
    /// Submitted and collecting whitelist votes.
    Active,
    /// Resolved against whitelisting.
    Rejected,
    /// Resolved in favor of whitelisting.
    Approved,
}

impl LendingStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LendingStatus::Rejected | LendingStatus::Approved)
    }

    /// Whether a transition from `self` to `next` is legal.
    pub fn can_transition_to(&self, next: LendingStatus) -> bool {
        matches!(
            (*self, next),
            (LendingStatus::Unsubmitted, LendingStatus::Active)
                | (LendingStatus::Active, LendingStatus::Rejected)
                | (LendingStatus::Active, LendingStatus::Approved)
        )
    }
}

impl fmt::Display for LendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LendingStatus::Unsubmitted => "unsubmitted",
            LendingStatus::Active => "active",
            LendingStatus::Rejected => "rejected",
            LendingStatus::Approved => "approved",
        };
        write!(f, "{}", s)
    }
}

/// A candidate lending market in the whitelist lifecycle.
///
/// Carries two parallel tallies: `net_votes` (signed, resolves the
/// direction) and `total_votes` (magnitude, the quorum measure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingProposal {
    pub lending_id: LendingId,
    pub submitter: AccountAddress,
    /// Unix timestamp of submission; the execute window counts from here.
    pub submitted_at: i64,
    pub status: LendingStatus,
    /// Signed support tally.
    pub net_votes: i128,
    /// Magnitude tally.
    pub total_votes: u128,
    /// Magnitude each lock has committed to this proposal.
    pub power_used: HashMap<LockId, VotingPower>,
}

impl LendingProposal {
    pub fn new(lending_id: LendingId, submitter: AccountAddress, submitted_at: i64) -> Self {
        Self {
            lending_id,
            submitter,
            submitted_at,
            status: LendingStatus::Active,
            net_votes: 0,
            total_votes: 0,
            power_used: HashMap::new(),
        }
    }

    /// Magnitude headroom `lock_id` still has on this proposal, given
    /// the lock's total power.
    pub fn remaining_power(&self, lock_id: LockId, total: VotingPower) -> VotingPower {
        total.saturating_sub(self.power_used.get(&lock_id).copied().unwrap_or(0))
    }
}

/// Thresholds and timing for the whitelist lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistConfig {
    /// Minimum voting power to submit a candidate market.
    pub min_submission_power: VotingPower,
    /// Quorum, measured on the magnitude tally.
    pub min_votes: u128,
    /// Net-support threshold, measured on the signed tally.
    pub min_support_votes: i128,
    /// Seconds a proposal stays open before it can be executed.
    pub active_window_secs: i64,
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        Self {
            min_submission_power: 0,
            min_votes: 0,
            min_support_votes: 0,
            active_window_secs: EPOCH_SECONDS,
        }
    }
}

impl WhitelistConfig {
    pub fn with_min_submission_power(mut self, power: VotingPower) -> Self {
        self.min_submission_power = power;
        self
    }

    pub fn with_min_votes(mut self, votes: u128) -> Self {
        self.min_votes = votes;
        self
    }

    pub fn with_min_support_votes(mut self, votes: i128) -> Self {
        self.min_support_votes = votes;
        self
    }

    pub fn with_active_window(mut self, secs: i64) -> Self {
        self.active_window_secs = secs;
        self
    }
}
