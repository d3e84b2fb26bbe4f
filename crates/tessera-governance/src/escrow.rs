use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tessera_types::{AccountAddress, LockId, VotingPower};
use tokio::sync::RwLock;

/// Capability checks against the external lock ledger.
///
/// The governance core never stores lock ownership or power; every
/// operation consults the escrow at call time. Power decay over a
/// lock's lifetime is the escrow's concern, not modeled here.
#[async_trait]
pub trait VotingEscrow: Send + Sync {
    /// Whether `account` owns `lock_id` or is an approved operator for it.
    async fn is_approved_or_owner(
        &self,
        lock_id: LockId,
        account: &AccountAddress,
    ) -> Result<bool>;

    /// Voting power currently attached to `lock_id`; zero for unknown locks.
    async fn voting_power(&self, lock_id: LockId) -> Result<VotingPower>;
}

/// A lock position as tracked by the in-memory escrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockPosition {
    pub id: LockId,
    pub owner: AccountAddress,
    pub voting_power: VotingPower,
}

/// In-memory escrow for tests and embedding.
pub struct MemoryEscrow {
    locks: RwLock<HashMap<LockId, LockPosition>>,
    approvals: RwLock<HashMap<LockId, Vec<AccountAddress>>>,
    next_id: AtomicU64,
}

impl MemoryEscrow {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
            approvals: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a lock with fixed voting power, returning its id.
    pub async fn create_lock(&self, owner: AccountAddress, power: VotingPower) -> LockId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut locks = self.locks.write().await;
        locks.insert(
            id,
            LockPosition {
                id,
                owner,
                voting_power: power,
            },
        );
        id
    }

    /// Approve `operator` to act for `lock_id`.
    pub async fn approve(&self, lock_id: LockId, operator: AccountAddress) {
        let mut approvals = self.approvals.write().await;
        approvals.entry(lock_id).or_default().push(operator);
    }
}

impl Default for MemoryEscrow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VotingEscrow for MemoryEscrow {
    async fn is_approved_or_owner(
        &self,
        lock_id: LockId,
        account: &AccountAddress,
    ) -> Result<bool> {
        let locks = self.locks.read().await;
        let lock = match locks.get(&lock_id) {
            Some(lock) => lock,
            None => return Ok(false),
        };
        if lock.owner == *account {
            return Ok(true);
        }

        let approvals = self.approvals.read().await;
        Ok(approvals
            .get(&lock_id)
            .map_or(false, |operators| operators.contains(account)))
    }

    async fn voting_power(&self, lock_id: LockId) -> Result<VotingPower> {
        let locks = self.locks.read().await;
        Ok(locks.get(&lock_id).map_or(0, |lock| lock.voting_power))
    }
}
