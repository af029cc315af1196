// SQLite-backed stores for the economy feature.

pub mod sqlite_account_store;
pub mod sqlite_invest_store;
pub mod sqlite_shop_store;

pub use sqlite_account_store::SqliteAccountStore;
pub use sqlite_invest_store::SqliteInvestStore;
pub use sqlite_shop_store::SqliteShopStore;
