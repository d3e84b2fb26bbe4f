use tessera_types::{AccountAddress, LendingId, LockId, VotingPower};
use thiserror::Error;

/// Governance operation result type
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Governance errors
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Caller {0} is not the governance admin")]
    Unauthorized(AccountAddress),

    #[error("Account {account} does not own and is not approved for lock {lock_id}")]
    NotLockController {
        lock_id: LockId,
        account: AccountAddress,
    },

    #[error("Lending {0} already submitted")]
    AlreadySubmitted(LendingId),

    #[error("Lending {0} has no active proposal")]
    LendingNotActive(LendingId),

    #[error("Lending {0} is not whitelisted")]
    LendingNotApproved(LendingId),

    #[error("Insufficient submission power: required {required}, actual {actual}")]
    InsufficientSubmissionPower {
        required: VotingPower,
        actual: VotingPower,
    },

    #[error("Insufficient voting power for lock {lock_id}: requested {requested}, available {available}")]
    InsufficientVotingPower {
        lock_id: LockId,
        requested: VotingPower,
        available: VotingPower,
    },

    #[error("Voting window not elapsed: {remaining_secs}s remaining")]
    WindowNotElapsed { remaining_secs: i64 },

    #[error("Batch length mismatch: {ids} ids, {weights} weights")]
    BatchMismatch { ids: usize, weights: usize },

    #[error("Escrow error: {0}")]
    Escrow(#[from] anyhow::Error),
}
