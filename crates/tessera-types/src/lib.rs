pub mod account;
pub mod clock;
pub mod epoch;

pub use account::AccountAddress;
pub use clock::{Clock, ManualClock, SystemClock};
pub use epoch::{epoch_start, next_epoch_start, EPOCH_SECONDS};

/// Identifier of a stake lock position, assigned by the escrow.
pub type LockId = u64;

/// Identifier of a candidate lending market.
pub type LendingId = u64;

/// Voting power attached to a lock, in base token units.
pub type VotingPower = u128;

/// Signed vote weight; negative weights oppose, positive support.
pub type VoteWeight = i128;
