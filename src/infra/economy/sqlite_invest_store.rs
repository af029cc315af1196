// SQLite implementation of the InvestStore trait.

use crate::core::economy::{InvestStatus, InvestStore, InvestTier, Investment, LedgerError,
    NewInvestment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

pub struct SqliteInvestStore {
    pool: SqlitePool,
}

impl SqliteInvestStore {
    /// Create a new investment store using an existing SQLite pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                tier TEXT NOT NULL,
                expected_return REAL NOT NULL,
                actual_return REAL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                maturity_date TEXT NOT NULL,
                completed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_investments_user_status
            ON investments(user_id, guild_id, status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_investment(row: &sqlx::sqlite::SqliteRow) -> Option<Investment> {
        let tier = InvestTier::from_str(&row.get::<String, _>("tier"))?;
        let status = InvestStatus::from_str(&row.get::<String, _>("status"))?;

        let parse = |value: String| {
            DateTime::parse_from_rfc3339(&value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        };
        let created_at = parse(row.get::<String, _>("created_at"))?;
        let maturity_date = parse(row.get::<String, _>("maturity_date"))?;
        let completed_at = row.get::<Option<String>, _>("completed_at").and_then(parse);

        Some(Investment {
            id: row.get::<i64, _>("id"),
            user_id: row.get::<i64, _>("user_id") as u64,
            guild_id: row.get::<i64, _>("guild_id") as u64,
            amount: row.get::<i64, _>("amount"),
            tier,
            expected_return: row.get::<f64, _>("expected_return"),
            actual_return: row.get::<Option<f64>, _>("actual_return"),
            status,
            created_at,
            maturity_date,
            completed_at,
        })
    }
}

#[async_trait]
impl InvestStore for SqliteInvestStore {
    async fn create(&self, investment: NewInvestment) -> Result<i64, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO investments
                (user_id, guild_id, amount, tier, expected_return, status,
                 created_at, maturity_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(investment.user_id as i64)
        .bind(investment.guild_id as i64)
        .bind(investment.amount)
        .bind(investment.tier.as_str())
        .bind(investment.expected_return)
        .bind(InvestStatus::Active.as_str())
        .bind(investment.created_at.to_rfc3339())
        .bind(investment.maturity_date.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn investments(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<Investment>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, guild_id, amount, tier, expected_return,
                   actual_return, status, created_at, maturity_date, completed_at
            FROM investments
            WHERE user_id = ? AND guild_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(rows.iter().filter_map(Self::row_to_investment).collect())
    }

    async fn matured(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Investment>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, guild_id, amount, tier, expected_return,
                   actual_return, status, created_at, maturity_date, completed_at
            FROM investments
            WHERE user_id = ? AND guild_id = ? AND status = ? AND maturity_date <= ?
            ORDER BY id
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(InvestStatus::Active.as_str())
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(rows.iter().filter_map(Self::row_to_investment).collect())
    }

    async fn complete(
        &self,
        id: i64,
        actual_return: f64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            UPDATE investments
            SET actual_return = ?, status = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(actual_return)
        .bind(InvestStatus::Completed.as_str())
        .bind(completed_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> (tempfile::TempDir, SqliteInvestStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("invest.db");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", path.to_str().unwrap()))
            .await
            .expect("pool");
        let store = SqliteInvestStore::new(pool);
        store.migrate().await.expect("migrate");
        (dir, store)
    }

    fn position(maturity: DateTime<Utc>) -> NewInvestment {
        NewInvestment {
            user_id: 1,
            guild_id: 1,
            amount: 500,
            tier: InvestTier::Balanced,
            expected_return: 1.4,
            created_at: Utc::now(),
            maturity_date: maturity,
        }
    }

    #[tokio::test]
    async fn positions_round_trip() {
        let (_dir, store) = store().await;

        let id = store.create(position(Utc::now())).await.unwrap();
        let rows = store.investments(1, 1).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].tier, InvestTier::Balanced);
        assert_eq!(rows[0].status, InvestStatus::Active);
        assert!(rows[0].actual_return.is_none());
    }

    #[tokio::test]
    async fn matured_skips_future_and_completed_positions() {
        let (_dir, store) = store().await;
        let now = Utc::now();

        let past = store.create(position(now - Duration::hours(2))).await.unwrap();
        store.create(position(now + Duration::days(3))).await.unwrap();

        let matured = store.matured(1, 1, now).await.unwrap();
        assert_eq!(matured.len(), 1);
        assert_eq!(matured[0].id, past);

        store.complete(past, 1.4, now).await.unwrap();
        assert!(store.matured(1, 1, now).await.unwrap().is_empty());

        let rows = store.investments(1, 1).await.unwrap();
        let done = rows.iter().find(|i| i.id == past).unwrap();
        assert_eq!(done.status, InvestStatus::Completed);
        assert_eq!(done.actual_return, Some(1.4));
        assert!(done.completed_at.is_some());
    }
}
