use crate::types::TessAmount;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Destination for minted rewards.
///
/// The vault only custodies balance. Distribution policy, token
/// transfer mechanics, and access control on withdrawals live outside
/// this crate; the minter is trusted to credit at most once per
/// intended mint.
#[async_trait]
pub trait RewardVault: Send + Sync {
    /// Add `amount` to the vault balance.
    async fn credit(&self, amount: TessAmount) -> Result<()>;

    /// Current vault balance.
    async fn balance(&self) -> Result<TessAmount>;
}

/// In-memory vault for tests and embedding.
pub struct MemoryVault {
    balance: RwLock<TessAmount>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            balance: RwLock::new(TessAmount::ZERO),
        }
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RewardVault for MemoryVault {
    async fn credit(&self, amount: TessAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut balance = self.balance.write().await;
        *balance = balance.saturating_add(amount);

        debug!(amount = %amount, balance = %*balance, "Vault credited");
        Ok(())
    }

    async fn balance(&self) -> Result<TessAmount> {
        Ok(*self.balance.read().await)
    }
}
