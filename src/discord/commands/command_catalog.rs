// Discord commands module.
// Each feature gets its own command file.

pub mod bank;
pub mod economy;
pub mod invest;
pub mod moderation;
pub mod profile;
pub mod shop;

use crate::core::economy::{InvestService, LedgerService, ShopService};
use crate::core::moderation::ModerationService;
use crate::infra::economy::{SqliteAccountStore, SqliteInvestStore, SqliteShopStore};
use crate::infra::moderation::SqliteWarningStore;
use std::sync::Arc;

/// Shared state injected into every command.
pub struct Data {
    pub ledger: Arc<LedgerService<SqliteAccountStore>>,
    pub shop: Arc<ShopService<SqliteAccountStore, SqliteShopStore>>,
    pub invest: Arc<InvestService<SqliteAccountStore, SqliteInvestStore>>,
    pub moderation: Arc<ModerationService<SqliteWarningStore>>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
