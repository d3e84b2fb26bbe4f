use crate::types::TessAmount;
use crate::vault::RewardVault;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_types::{epoch_start, AccountAddress, Clock, SystemClock};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Per-epoch mint bookkeeping, keyed by epoch start timestamp.
///
/// Historical entries are never mutated; the map is append-only.
#[derive(Debug, Default)]
struct MintLedger {
    per_epoch: HashMap<i64, TessAmount>,
    total: TessAmount,
}

/// Mints the configured reward into the vault, at most once per weekly
/// epoch.
///
/// The once-per-epoch gate is enforced on the stored per-epoch amount,
/// not a flag: a mint that records zero leaves the epoch claimable, so
/// raising the emission mid-epoch still allows that epoch's mint.
pub struct EmissionMinter {
    vault: Arc<dyn RewardVault>,
    admin: AccountAddress,
    emission: RwLock<TessAmount>,
    ledger: RwLock<MintLedger>,
    clock: Arc<dyn Clock>,
}

impl EmissionMinter {
    pub fn new(vault: Arc<dyn RewardVault>, admin: AccountAddress) -> Self {
        Self {
            vault,
            admin,
            emission: RwLock::new(TessAmount::ZERO),
            ledger: RwLock::new(MintLedger::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the per-epoch mint amount.
    ///
    /// Takes effect from the next unminted epoch; epochs already minted
    /// keep their recorded amount.
    pub async fn set_emission(&self, caller: AccountAddress, amount: TessAmount) -> Result<()> {
        if caller != self.admin {
            bail!("Caller {} is not the emission admin", caller);
        }

        let mut emission = self.emission.write().await;
        let previous = *emission;
        *emission = amount;

        info!(previous = %previous, amount = %amount, "💰 Emission per epoch updated");
        Ok(())
    }

    /// Mint the configured emission for the current epoch.
    ///
    /// The first call in an epoch credits the vault and records the
    /// amount; later calls in the same epoch return zero without
    /// touching the vault. Callable by anyone.
    pub async fn mint(&self) -> Result<TessAmount> {
        let now = self.clock.now_unix();
        let epoch = epoch_start(now);

        let mut ledger = self.ledger.write().await;

        let recorded = ledger.per_epoch.get(&epoch).copied().unwrap_or(TessAmount::ZERO);
        if !recorded.is_zero() {
            debug!(epoch, amount = %recorded, "Epoch already minted, skipping");
            return Ok(TessAmount::ZERO);
        }

        let amount = *self.emission.read().await;
        self.vault.credit(amount).await?;

        ledger.per_epoch.insert(epoch, amount);
        ledger.total = ledger.total.saturating_add(amount);

        info!(
            epoch,
            amount = %amount,
            total_minted = %ledger.total,
            "💰 Epoch emission minted"
        );
        Ok(amount)
    }

    /// Per-epoch amount currently configured.
    pub async fn emission(&self) -> TessAmount {
        *self.emission.read().await
    }

    /// Amount recorded for the epoch starting at `epoch`; zero if that
    /// epoch never minted.
    pub async fn minted_in(&self, epoch: i64) -> TessAmount {
        let ledger = self.ledger.read().await;
        ledger.per_epoch.get(&epoch).copied().unwrap_or(TessAmount::ZERO)
    }

    /// Total minted across all epochs.
    pub async fn total_minted(&self) -> TessAmount {
        self.ledger.read().await.total
    }

    /// Start of the epoch containing the clock's current time.
    pub fn active_epoch(&self) -> i64 {
        epoch_start(self.clock.now_unix())
    }
}
