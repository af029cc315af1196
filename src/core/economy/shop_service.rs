// Shop and inventory - per-guild item catalog and user holdings.
//
// Purchases and sales go through the ledger so every price paid or
// refunded lands in the transaction journal. Items sell back at half the
// catalog price.

use super::ledger_service::{AccountStore, LedgerError, LedgerService, TxKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fraction of the catalog price refunded on sale, as a divisor.
const SELLBACK_DIVISOR: i64 = 2;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A catalog entry. Names are unique per guild (case-insensitive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: i64,
    pub guild_id: u64,
    pub name: String,
    pub price: i64,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a purchase.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub item: ShopItem,
    pub quantity: i64,
    pub total_cost: i64,
    pub new_wallet: i64,
}

/// Result of a sale.
#[derive(Debug, Clone)]
pub struct SaleOutcome {
    pub item: ShopItem,
    pub quantity: i64,
    pub proceeds: i64,
    pub new_wallet: i64,
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Trait for persisting the item catalog and user inventories.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// All catalog items for a guild, oldest first.
    async fn list_items(&self, guild_id: u64) -> Result<Vec<ShopItem>, LedgerError>;

    /// Find a catalog item by name, case-insensitive.
    async fn find_item(&self, guild_id: u64, name: &str)
        -> Result<Option<ShopItem>, LedgerError>;

    /// Add a catalog item. Returns `false` when the name already exists.
    async fn add_item(
        &self,
        guild_id: u64,
        name: &str,
        price: i64,
        emoji: &str,
    ) -> Result<bool, LedgerError>;

    /// Remove a catalog item by name. Returns `false` when not found.
    async fn remove_item(&self, guild_id: u64, name: &str) -> Result<bool, LedgerError>;

    /// Quantity of one item held by a user. Zero when absent.
    async fn item_quantity(
        &self,
        user_id: u64,
        guild_id: u64,
        item_id: i64,
    ) -> Result<i64, LedgerError>;

    /// Apply a signed delta to a holding, creating the row as needed and
    /// removing it at zero. Returns `false` (and changes nothing) when the
    /// quantity would go negative.
    async fn adjust_quantity(
        &self,
        user_id: u64,
        guild_id: u64,
        item_id: i64,
        delta: i64,
    ) -> Result<bool, LedgerError>;

    /// A user's holdings with their catalog items.
    async fn inventory(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<(ShopItem, i64)>, LedgerError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Service for the shop catalog and user inventories.
pub struct ShopService<A: AccountStore, S: ShopStore> {
    store: S,
    ledger: Arc<LedgerService<A>>,
}

impl<A: AccountStore, S: ShopStore> ShopService<A, S> {
    pub fn new(store: S, ledger: Arc<LedgerService<A>>) -> Self {
        Self { store, ledger }
    }

    /// The guild's catalog. An empty catalog gets the starter items so a
    /// fresh guild always has something to buy.
    pub async fn catalog(&self, guild_id: u64) -> Result<Vec<ShopItem>, LedgerError> {
        let items = self.store.list_items(guild_id).await?;
        if !items.is_empty() {
            return Ok(items);
        }

        for (name, price, emoji) in [("Cookie", 10, "🍪"), ("Coffee", 25, "☕"), ("Trophy", 100, "🏆")]
        {
            self.store.add_item(guild_id, name, price, emoji).await?;
        }
        self.store.list_items(guild_id).await
    }

    /// Buy `quantity` of a catalog item: debits the ledger, then increments
    /// the holding.
    pub async fn buy(
        &self,
        user_id: u64,
        guild_id: u64,
        name: &str,
        quantity: i64,
    ) -> Result<PurchaseOutcome, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let item = self
            .store
            .find_item(guild_id, name)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound(name.to_string()))?;

        let total_cost = item.price * quantity;
        let new_wallet = self
            .ledger
            .debit(
                user_id,
                guild_id,
                total_cost,
                TxKind::Purchase,
                format!("Bought {} x{}", item.name, quantity),
            )
            .await?;

        self.store
            .adjust_quantity(user_id, guild_id, item.id, quantity)
            .await?;

        Ok(PurchaseOutcome {
            item,
            quantity,
            total_cost,
            new_wallet,
        })
    }

    /// Sell `quantity` of a held item back to the shop at half price.
    pub async fn sell(
        &self,
        user_id: u64,
        guild_id: u64,
        name: &str,
        quantity: i64,
    ) -> Result<SaleOutcome, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let item = self
            .store
            .find_item(guild_id, name)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound(name.to_string()))?;

        let held = self.store.item_quantity(user_id, guild_id, item.id).await?;
        if held < quantity
            || !self
                .store
                .adjust_quantity(user_id, guild_id, item.id, -quantity)
                .await?
        {
            return Err(LedgerError::InsufficientInventory {
                requested: quantity,
                available: held,
            });
        }

        let proceeds = (item.price / SELLBACK_DIVISOR) * quantity;
        let new_wallet = if proceeds > 0 {
            self.ledger
                .credit(
                    user_id,
                    guild_id,
                    proceeds,
                    TxKind::Sale,
                    format!("Sold {} x{}", item.name, quantity),
                )
                .await?
        } else {
            // Items priced at 1 coin sell back for nothing.
            self.ledger.account(user_id, guild_id).await?.wallet
        };

        Ok(SaleOutcome {
            item,
            quantity,
            proceeds,
            new_wallet,
        })
    }

    pub async fn inventory(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<(ShopItem, i64)>, LedgerError> {
        self.store.inventory(user_id, guild_id).await
    }

    /// Admin: add a catalog item. Returns `false` on duplicate name.
    pub async fn add_item(
        &self,
        guild_id: u64,
        name: &str,
        price: i64,
        emoji: &str,
    ) -> Result<bool, LedgerError> {
        if price <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.store.add_item(guild_id, name, price, emoji).await
    }

    /// Admin: remove a catalog item. Returns `false` when not found.
    pub async fn remove_item(&self, guild_id: u64, name: &str) -> Result<bool, LedgerError> {
        self.store.remove_item(guild_id, name).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::economy::{EconomyConfig, RiskResolver};
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// In-memory shop store for testing.
    struct InMemoryShopStore {
        items: DashMap<i64, ShopItem>,
        holdings: DashMap<(u64, u64, i64), i64>,
        next_id: AtomicI64,
    }

    impl InMemoryShopStore {
        fn new() -> Self {
            Self {
                items: DashMap::new(),
                holdings: DashMap::new(),
                next_id: AtomicI64::new(1),
            }
        }
    }

    #[async_trait]
    impl ShopStore for InMemoryShopStore {
        async fn list_items(&self, guild_id: u64) -> Result<Vec<ShopItem>, LedgerError> {
            let mut items: Vec<ShopItem> = self
                .items
                .iter()
                .filter(|e| e.guild_id == guild_id)
                .map(|e| e.clone())
                .collect();
            items.sort_by_key(|i| i.id);
            Ok(items)
        }

        async fn find_item(
            &self,
            guild_id: u64,
            name: &str,
        ) -> Result<Option<ShopItem>, LedgerError> {
            Ok(self
                .items
                .iter()
                .find(|e| e.guild_id == guild_id && e.name.eq_ignore_ascii_case(name))
                .map(|e| e.clone()))
        }

        async fn add_item(
            &self,
            guild_id: u64,
            name: &str,
            price: i64,
            emoji: &str,
        ) -> Result<bool, LedgerError> {
            if self.find_item(guild_id, name).await?.is_some() {
                return Ok(false);
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.items.insert(
                id,
                ShopItem {
                    id,
                    guild_id,
                    name: name.to_string(),
                    price,
                    emoji: emoji.to_string(),
                    created_at: Utc::now(),
                },
            );
            Ok(true)
        }

        async fn remove_item(&self, guild_id: u64, name: &str) -> Result<bool, LedgerError> {
            match self.find_item(guild_id, name).await? {
                Some(item) => {
                    self.items.remove(&item.id);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn item_quantity(
            &self,
            user_id: u64,
            guild_id: u64,
            item_id: i64,
        ) -> Result<i64, LedgerError> {
            Ok(self
                .holdings
                .get(&(user_id, guild_id, item_id))
                .map(|q| *q)
                .unwrap_or(0))
        }

        async fn adjust_quantity(
            &self,
            user_id: u64,
            guild_id: u64,
            item_id: i64,
            delta: i64,
        ) -> Result<bool, LedgerError> {
            let key = (user_id, guild_id, item_id);
            let mut entry = self.holdings.entry(key).or_insert(0);
            if *entry + delta < 0 {
                return Ok(false);
            }
            *entry += delta;
            let now_zero = *entry == 0;
            drop(entry);
            if now_zero {
                self.holdings.remove(&key);
            }
            Ok(true)
        }

        async fn inventory(
            &self,
            user_id: u64,
            guild_id: u64,
        ) -> Result<Vec<(ShopItem, i64)>, LedgerError> {
            let mut rows = Vec::new();
            for entry in self.holdings.iter() {
                let (uid, gid, item_id) = *entry.key();
                if uid == user_id && gid == guild_id {
                    if let Some(item) = self.items.get(&item_id) {
                        rows.push((item.clone(), *entry.value()));
                    }
                }
            }
            rows.sort_by_key(|(item, _)| item.id);
            Ok(rows)
        }
    }

    type TestAccounts = crate::core::economy::ledger_service::tests::InMemoryAccountStore;
    type TestLedger = LedgerService<TestAccounts>;

    fn fixtures() -> (Arc<TestLedger>, ShopService<TestAccounts, InMemoryShopStore>) {
        let ledger = Arc::new(LedgerService::with_config(
            TestAccounts::new(),
            EconomyConfig::default(),
            RiskResolver::seeded(1),
        ));
        let shop = ShopService::new(InMemoryShopStore::new(), Arc::clone(&ledger));
        (ledger, shop)
    }

    #[tokio::test]
    async fn empty_catalog_gets_starter_items() {
        let (_, shop) = fixtures();

        let items = shop.catalog(1).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Cookie", "Coffee", "Trophy"]);
    }

    #[tokio::test]
    async fn buy_debits_wallet_and_adds_holding() {
        let (ledger, shop) = fixtures();
        shop.catalog(1).await.unwrap();
        ledger.credit(7, 1, 100, TxKind::AdminGrant, "g").await.unwrap();

        let outcome = shop.buy(7, 1, "coffee", 2).await.unwrap();
        assert_eq!(outcome.total_cost, 50);
        assert_eq!(outcome.new_wallet, 50);

        let inventory = shop.inventory(7, 1).await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].0.name, "Coffee");
        assert_eq!(inventory[0].1, 2);
    }

    #[tokio::test]
    async fn buy_unknown_item_fails() {
        let (ledger, shop) = fixtures();
        shop.catalog(1).await.unwrap();
        ledger.credit(7, 1, 100, TxKind::AdminGrant, "g").await.unwrap();

        let err = shop.buy(7, 1, "spaceship", 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn buy_without_funds_fails_and_changes_nothing() {
        let (ledger, shop) = fixtures();
        shop.catalog(1).await.unwrap();
        ledger.credit(7, 1, 5, TxKind::AdminGrant, "g").await.unwrap();

        let err = shop.buy(7, 1, "Trophy", 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert!(shop.inventory(7, 1).await.unwrap().is_empty());
        assert_eq!(ledger.account(7, 1).await.unwrap().wallet, 5);
    }

    #[tokio::test]
    async fn sell_more_than_held_fails() {
        let (ledger, shop) = fixtures();
        shop.catalog(1).await.unwrap();
        ledger.credit(7, 1, 100, TxKind::AdminGrant, "g").await.unwrap();
        shop.buy(7, 1, "Cookie", 3).await.unwrap();

        let err = shop.sell(7, 1, "Cookie", 4).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientInventory {
                requested: 4,
                available: 3
            }
        ));
    }

    #[tokio::test]
    async fn buy_then_sell_costs_exactly_the_spread() {
        let (ledger, shop) = fixtures();
        shop.catalog(1).await.unwrap();
        ledger.credit(7, 1, 200, TxKind::AdminGrant, "g").await.unwrap();

        shop.buy(7, 1, "Trophy", 1).await.unwrap();
        let sale = shop.sell(7, 1, "Trophy", 1).await.unwrap();

        // Bought at 100, sold back at 50.
        assert_eq!(sale.proceeds, 50);
        assert_eq!(ledger.account(7, 1).await.unwrap().wallet, 150);
        assert!(shop.inventory(7, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_catalog_name_is_rejected() {
        let (_, shop) = fixtures();

        assert!(shop.add_item(1, "Sword", 500, "⚔️").await.unwrap());
        assert!(!shop.add_item(1, "sword", 300, "🗡️").await.unwrap());
        // Same name in a different guild is fine.
        assert!(shop.add_item(2, "Sword", 500, "⚔️").await.unwrap());
    }

    #[tokio::test]
    async fn remove_item_reports_missing() {
        let (_, shop) = fixtures();

        assert!(shop.add_item(1, "Sword", 500, "⚔️").await.unwrap());
        assert!(shop.remove_item(1, "Sword").await.unwrap());
        assert!(!shop.remove_item(1, "Sword").await.unwrap());
    }
}
