/*!
# Tessera Governance Module

Lock-weighted governance for the Tessera lending protocol implementing:
- Candidate market whitelisting with timed voting windows
- Signed vote weights with per-lock magnitude caps
- Dual approval thresholds (engagement quorum and net support)
- Weekly epoch allocation voting with frozen historical ledgers
- Admin-tunable approval parameters

## Core Principles

- **Escrow-Backed Power**: Voting power comes from the escrow's lock positions, never from raw balances
- **Magnitude Accounting**: Opposition consumes power the same as support, so caps cannot be gamed by sign flips
- **Atomic Batches**: A vote batch commits in full or not at all
- **One-Way Lifecycle**: `Unsubmitted -> Active -> {Rejected, Approved}`, with terminal states sealed forever
- **Epoch Isolation**: Allocation records are keyed by epoch start; past epochs are read-only history

## Module Structure

- **types**: Core data structures (LendingProposal, LendingStatus, WhitelistConfig)
- **whitelist**: Candidate market lifecycle with capped signed voting
- **allocation**: Per-epoch weighted allocation ledger
- **escrow**: Voting escrow trait and in-memory implementation
- **error**: Governance-specific errors

## Example Usage

```rust
use tessera_governance::{LendingStatus, WhitelistConfig};

// Tune the approval thresholds for candidate markets
let config = WhitelistConfig::default()
    .with_min_votes(1_000)
    .with_min_support_votes(500)
    .with_active_window(7 * 24 * 3600);

assert_eq!(config.min_votes, 1_000);
assert_eq!(config.min_support_votes, 500);

// Proposals move through a one-way lifecycle
assert!(LendingStatus::Active.can_transition_to(LendingStatus::Approved));
assert!(!LendingStatus::Approved.can_transition_to(LendingStatus::Active));
assert!(LendingStatus::Rejected.is_terminal());
```
*/

pub mod allocation;
pub mod error;
pub mod escrow;
pub mod metrics;
pub mod types;
pub mod whitelist;

pub use allocation::AllocationEngine;
pub use error::{GovernanceError, Result};
pub use escrow::{LockPosition, MemoryEscrow, VotingEscrow};
pub use types::{LendingProposal, LendingStatus, WhitelistConfig};
pub use whitelist::WhitelistManager;
