// SQLite implementation of the AccountStore trait.
//
// Tables:
// - accounts: one row per (user, guild) with both balances and the
//   cooldown timestamps
// - transactions: append-only journal

use crate::core::economy::{Account, AccountStore, CooldownKind, LedgerError, Transaction, TxKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new account store with the given database path.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}?mode=rwc", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Shop and investment stores piggyback on the same database file.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Run database migrations to create tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                wallet INTEGER NOT NULL DEFAULT 0,
                bank INTEGER NOT NULL DEFAULT 0,
                experience INTEGER NOT NULL DEFAULT 0,
                total_earned INTEGER NOT NULL DEFAULT 0,
                total_spent INTEGER NOT NULL DEFAULT 0,
                last_work TEXT,
                last_daily TEXT,
                last_crime TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, guild_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                related_user_id INTEGER,
                kind TEXT NOT NULL,
                amount INTEGER NOT NULL,
                description TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_user_guild
            ON transactions(user_id, guild_id, timestamp DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert the account row if it doesn't exist yet.
    async fn ensure_account(&self, user_id: u64, guild_id: u64) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO accounts (user_id, guild_id)
            VALUES (?, ?)
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;
        Ok(())
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Account {
        Account {
            user_id: row.get::<i64, _>("user_id") as u64,
            guild_id: row.get::<i64, _>("guild_id") as u64,
            wallet: row.get::<i64, _>("wallet"),
            bank: row.get::<i64, _>("bank"),
            experience: row.get::<i64, _>("experience"),
            total_earned: row.get::<i64, _>("total_earned"),
            total_spent: row.get::<i64, _>("total_spent"),
            last_work: parse_timestamp(row.get("last_work")),
            last_daily: parse_timestamp(row.get("last_daily")),
            last_crime: parse_timestamp(row.get("last_crime")),
        }
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn get_account(&self, user_id: u64, guild_id: u64) -> Result<Account, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, guild_id, wallet, bank, experience,
                   total_earned, total_spent, last_work, last_daily, last_crime
            FROM accounts
            WHERE user_id = ? AND guild_id = ?
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        if let Some(row) = row {
            Ok(Self::row_to_account(&row))
        } else {
            // Create the account on first interaction.
            self.ensure_account(user_id, guild_id).await?;
            Ok(Account::empty(user_id, guild_id))
        }
    }

    async fn adjust_wallet(
        &self,
        user_id: u64,
        guild_id: u64,
        delta: i64,
    ) -> Result<bool, LedgerError> {
        self.ensure_account(user_id, guild_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET wallet = wallet + ?,
                total_earned = total_earned + CASE WHEN ? > 0 THEN ? ELSE 0 END,
                total_spent = total_spent + CASE WHEN ? < 0 THEN -? ELSE 0 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ? AND wallet + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(delta)
        .bind(delta)
        .bind(delta)
        .bind(delta)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn credit_bank(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.ensure_account(user_id, guild_id).await?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET bank = bank + ?,
                total_earned = total_earned + ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(())
    }

    async fn move_to_bank(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<bool, LedgerError> {
        self.ensure_account(user_id, guild_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET wallet = wallet - ?, bank = bank + ?, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ? AND wallet >= ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn move_to_wallet(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<bool, LedgerError> {
        self.ensure_account(user_id, guild_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET wallet = wallet + ?, bank = bank - ?, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ? AND bank >= ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn transfer_wallet(
        &self,
        from_user: u64,
        to_user: u64,
        guild_id: u64,
        amount: i64,
        entry: Transaction,
    ) -> Result<bool, LedgerError> {
        self.ensure_account(from_user, guild_id).await?;
        self.ensure_account(to_user, guild_id).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        let debited = sqlx::query(
            r#"
            UPDATE accounts
            SET wallet = wallet - ?, total_spent = total_spent + ?, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ? AND wallet >= ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(from_user as i64)
        .bind(guild_id as i64)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        if debited.rows_affected() != 1 {
            tx.rollback()
                .await
                .map_err(|e| LedgerError::Store(e.to_string()))?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE accounts
            SET wallet = wallet + ?, total_earned = total_earned + ?, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(to_user as i64)
        .bind(guild_id as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO transactions
                (user_id, guild_id, related_user_id, kind, amount, description, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id as i64)
        .bind(entry.guild_id as i64)
        .bind(entry.related_user_id.map(|id| id as i64))
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(entry.description.as_str())
        .bind(entry.timestamp.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(true)
    }

    async fn add_experience(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.ensure_account(user_id, guild_id).await?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET experience = experience + ?, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND guild_id = ?
            "#,
        )
        .bind(amount)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(())
    }

    async fn set_last_action(
        &self,
        user_id: u64,
        guild_id: u64,
        kind: CooldownKind,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_account(user_id, guild_id).await?;

        // Column names are fixed strings, not user input.
        let column = match kind {
            CooldownKind::Work => "last_work",
            CooldownKind::Daily => "last_daily",
            CooldownKind::Crime => "last_crime",
        };
        let query = format!(
            "UPDATE accounts SET {} = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE user_id = ? AND guild_id = ?",
            column
        );

        sqlx::query(&query)
            .bind(at.to_rfc3339())
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(())
    }

    async fn log_transaction(&self, entry: Transaction) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (user_id, guild_id, related_user_id, kind, amount, description, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id as i64)
        .bind(entry.guild_id as i64)
        .bind(entry.related_user_id.map(|id| id as i64))
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(entry.description)
        .bind(entry.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(())
    }

    async fn recent_transactions(
        &self,
        user_id: u64,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, guild_id, related_user_id, kind, amount, description, timestamp
            FROM transactions
            WHERE (user_id = ? OR related_user_id = ?) AND guild_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id as i64)
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        let transactions = rows
            .iter()
            .filter_map(|row| {
                let kind = TxKind::from_str(&row.get::<String, _>("kind"))?;
                let timestamp_str: String = row.get("timestamp");
                let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                    .ok()?
                    .with_timezone(&Utc);

                Some(Transaction {
                    user_id: row.get::<i64, _>("user_id") as u64,
                    guild_id: row.get::<i64, _>("guild_id") as u64,
                    related_user_id: row
                        .get::<Option<i64>, _>("related_user_id")
                        .map(|id| id as u64),
                    kind,
                    amount: row.get::<i64, _>("amount"),
                    description: row.get::<String, _>("description"),
                    timestamp,
                })
            })
            .collect();

        Ok(transactions)
    }

    async fn leaderboard(&self, guild_id: u64, limit: usize) -> Result<Vec<Account>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, guild_id, wallet, bank, experience,
                   total_earned, total_spent, last_work, last_daily, last_crime
            FROM accounts
            WHERE guild_id = ?
            ORDER BY wallet + bank DESC
            LIMIT ?
            "#,
        )
        .bind(guild_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_account).collect())
    }

    async fn accounts_with_bank(&self, guild_id: u64) -> Result<Vec<Account>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, guild_id, wallet, bank, experience,
                   total_earned, total_spent, last_work, last_daily, last_crime
            FROM accounts
            WHERE guild_id = ? AND bank > 0
            "#,
        )
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_account).collect())
    }
}
