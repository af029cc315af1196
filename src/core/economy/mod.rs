// Economy module - account ledger, cooldown gates, risk rolls, shop, and investments.

pub mod cooldown;
pub mod invest_service;
mod ledger_service;
pub mod risk;
pub mod shop_service;

pub use cooldown::CooldownKind;
pub use invest_service::{
    CollectedInvestment, InvestConfig, InvestService, InvestStatus, InvestStore, InvestTier,
    Investment, InvestmentReceipt, NewInvestment, TierProfile,
};
pub use ledger_service::{
    Account, AccountStore, CrimeOutcome, EarnOutcome, EconomyConfig, LedgerError, LedgerService,
    Transaction, TxKind,
};
pub use risk::{Dice, RiskConfig, RiskOutcome, RiskResolver};
pub use shop_service::{PurchaseOutcome, SaleOutcome, ShopItem, ShopService, ShopStore};
