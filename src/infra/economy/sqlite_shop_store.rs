// SQLite implementation of the ShopStore trait.
//
// Tables:
// - store_items: per-guild catalog, (guild_id, name) unique
// - inventory: per-user holdings, rows deleted at quantity zero

use crate::core::economy::{LedgerError, ShopItem, ShopStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

pub struct SqliteShopStore {
    pool: SqlitePool,
}

impl SqliteShopStore {
    /// Create a new shop store using an existing SQLite pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS store_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id INTEGER NOT NULL,
                name TEXT NOT NULL COLLATE NOCASE,
                price INTEGER NOT NULL,
                emoji TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                UNIQUE (guild_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inventory (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, guild_id, item_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Option<ShopItem> {
        let created_at: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .ok()?
            .with_timezone(&Utc);

        Some(ShopItem {
            id: row.get::<i64, _>("id"),
            guild_id: row.get::<i64, _>("guild_id") as u64,
            name: row.get::<String, _>("name"),
            price: row.get::<i64, _>("price"),
            emoji: row.get::<String, _>("emoji"),
            created_at,
        })
    }
}

#[async_trait]
impl ShopStore for SqliteShopStore {
    async fn list_items(&self, guild_id: u64) -> Result<Vec<ShopItem>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, guild_id, name, price, emoji, created_at
            FROM store_items
            WHERE guild_id = ?
            ORDER BY id
            "#,
        )
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(rows.iter().filter_map(Self::row_to_item).collect())
    }

    async fn find_item(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<ShopItem>, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT id, guild_id, name, price, emoji, created_at
            FROM store_items
            WHERE guild_id = ? AND name = ? COLLATE NOCASE
            "#,
        )
        .bind(guild_id as i64)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(row.as_ref().and_then(Self::row_to_item))
    }

    async fn add_item(
        &self,
        guild_id: u64,
        name: &str,
        price: i64,
        emoji: &str,
    ) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO store_items (guild_id, name, price, emoji, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(guild_id as i64)
        .bind(name)
        .bind(price)
        .bind(emoji)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(false),
            Err(e) => Err(LedgerError::Store(e.to_string())),
        }
    }

    async fn remove_item(&self, guild_id: u64, name: &str) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            DELETE FROM store_items
            WHERE guild_id = ? AND name = ? COLLATE NOCASE
            "#,
        )
        .bind(guild_id as i64)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn item_quantity(
        &self,
        user_id: u64,
        guild_id: u64,
        item_id: i64,
    ) -> Result<i64, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT quantity FROM inventory
            WHERE user_id = ? AND guild_id = ? AND item_id = ?
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(row.map(|r| r.get::<i64, _>("quantity")).unwrap_or(0))
    }

    async fn adjust_quantity(
        &self,
        user_id: u64,
        guild_id: u64,
        item_id: i64,
        delta: i64,
    ) -> Result<bool, LedgerError> {
        if delta >= 0 {
            sqlx::query(
                r#"
                INSERT INTO inventory (user_id, guild_id, item_id, quantity)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (user_id, guild_id, item_id)
                DO UPDATE SET quantity = quantity + excluded.quantity
                "#,
            )
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .bind(item_id)
            .bind(delta)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))?;
            return Ok(true);
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity + ?
            WHERE user_id = ? AND guild_id = ? AND item_id = ? AND quantity + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(item_id)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        if result.rows_affected() != 1 {
            return Ok(false);
        }

        // Holdings at zero disappear from the inventory view.
        sqlx::query(
            r#"
            DELETE FROM inventory
            WHERE user_id = ? AND guild_id = ? AND item_id = ? AND quantity = 0
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(true)
    }

    async fn inventory(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<(ShopItem, i64)>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.guild_id, s.name, s.price, s.emoji, s.created_at, i.quantity
            FROM inventory i
            JOIN store_items s ON s.id = i.item_id
            WHERE i.user_id = ? AND i.guild_id = ?
            ORDER BY s.id
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let item = Self::row_to_item(row)?;
                let quantity = row.get::<i64, _>("quantity");
                Some((item, quantity))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> (tempfile::TempDir, SqliteShopStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shop.db");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", path.to_str().unwrap()))
            .await
            .expect("pool");
        let store = SqliteShopStore::new(pool);
        store.migrate().await.expect("migrate");
        (dir, store)
    }

    #[tokio::test]
    async fn catalog_names_are_unique_per_guild() {
        let (_dir, store) = store().await;

        assert!(store.add_item(1, "Cookie", 10, "🍪").await.unwrap());
        assert!(!store.add_item(1, "cookie", 15, "🍪").await.unwrap());
        assert!(store.add_item(2, "Cookie", 10, "🍪").await.unwrap());

        let items = store.list_items(1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, 10);
    }

    #[tokio::test]
    async fn find_item_is_case_insensitive() {
        let (_dir, store) = store().await;
        store.add_item(1, "Trophy", 100, "🏆").await.unwrap();

        let item = store.find_item(1, "tRoPhY").await.unwrap().expect("item");
        assert_eq!(item.name, "Trophy");
        assert!(store.find_item(1, "Medal").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn holdings_guard_against_negative_quantities() {
        let (_dir, store) = store().await;
        store.add_item(1, "Cookie", 10, "🍪").await.unwrap();
        let item = store.find_item(1, "Cookie").await.unwrap().unwrap();

        assert!(store.adjust_quantity(7, 1, item.id, 3).await.unwrap());
        assert!(!store.adjust_quantity(7, 1, item.id, -4).await.unwrap());
        assert_eq!(store.item_quantity(7, 1, item.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn zero_quantity_rows_are_removed() {
        let (_dir, store) = store().await;
        store.add_item(1, "Cookie", 10, "🍪").await.unwrap();
        let item = store.find_item(1, "Cookie").await.unwrap().unwrap();

        store.adjust_quantity(7, 1, item.id, 2).await.unwrap();
        store.adjust_quantity(7, 1, item.id, -2).await.unwrap();

        assert_eq!(store.item_quantity(7, 1, item.id).await.unwrap(), 0);
        assert!(store.inventory(7, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inventory_joins_catalog_items() {
        let (_dir, store) = store().await;
        store.add_item(1, "Cookie", 10, "🍪").await.unwrap();
        store.add_item(1, "Coffee", 25, "☕").await.unwrap();
        let cookie = store.find_item(1, "Cookie").await.unwrap().unwrap();
        let coffee = store.find_item(1, "Coffee").await.unwrap().unwrap();

        store.adjust_quantity(7, 1, cookie.id, 2).await.unwrap();
        store.adjust_quantity(7, 1, coffee.id, 1).await.unwrap();

        let inventory = store.inventory(7, 1).await.unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].0.name, "Cookie");
        assert_eq!(inventory[0].1, 2);
        assert_eq!(inventory[1].0.name, "Coffee");
        assert_eq!(inventory[1].1, 1);
    }
}
