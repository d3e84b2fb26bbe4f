pub mod emission;
pub mod types;
pub mod vault;

pub use emission::EmissionMinter;
pub use types::{TessAmount, TESS_BASE_UNIT, TESS_DECIMALS};
pub use vault::{MemoryVault, RewardVault};

use std::sync::Arc;
use tessera_types::AccountAddress;

/// Economics wiring: the vault and the minter that feeds it.
pub struct EconomicsEngine {
    pub vault: Arc<dyn RewardVault>,
    pub minter: Arc<EmissionMinter>,
}

impl EconomicsEngine {
    pub fn new(vault: Arc<dyn RewardVault>, admin: AccountAddress) -> Self {
        let minter = Arc::new(EmissionMinter::new(vault.clone(), admin));
        Self { vault, minter }
    }
}
