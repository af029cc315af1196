// SQLite-backed moderation store.
//
// Tables:
// - warnings: append-only warning log, deactivated via the `active` flag
// - guild_bans: one marker row per (user, guild); the primary key makes
//   the auto-ban rule idempotent at the storage level

use crate::core::moderation::{BanRecord, ModerationError, ModerationStore, WarningRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

pub struct SqliteWarningStore {
    pool: SqlitePool,
}

impl SqliteWarningStore {
    /// Create a new moderation store using an existing SQLite pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS warnings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                moderator_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_warnings_user_guild
            ON warnings(user_id, guild_id, active)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_bans (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                banned_by INTEGER,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, guild_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_warning(row: &sqlx::sqlite::SqliteRow) -> Option<WarningRecord> {
        let created_at: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .ok()?
            .with_timezone(&Utc);

        Some(WarningRecord {
            id: row.get::<i64, _>("id"),
            user_id: row.get::<i64, _>("user_id") as u64,
            guild_id: row.get::<i64, _>("guild_id") as u64,
            moderator_id: row.get::<i64, _>("moderator_id") as u64,
            reason: row.get::<String, _>("reason"),
            active: row.get::<i64, _>("active") != 0,
            created_at,
        })
    }
}

#[async_trait]
impl ModerationStore for SqliteWarningStore {
    async fn add_warning(
        &self,
        user_id: u64,
        guild_id: u64,
        moderator_id: u64,
        reason: &str,
    ) -> Result<i64, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT INTO warnings (user_id, guild_id, moderator_id, reason, active, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(moderator_id as i64)
        .bind(reason)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::Store(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn warnings(
        &self,
        user_id: u64,
        guild_id: u64,
        active_only: bool,
    ) -> Result<Vec<WarningRecord>, ModerationError> {
        let query = if active_only {
            r#"
            SELECT id, user_id, guild_id, moderator_id, reason, active, created_at
            FROM warnings
            WHERE user_id = ? AND guild_id = ? AND active = 1
            ORDER BY id DESC
            "#
        } else {
            r#"
            SELECT id, user_id, guild_id, moderator_id, reason, active, created_at
            FROM warnings
            WHERE user_id = ? AND guild_id = ?
            ORDER BY id DESC
            "#
        };

        let rows = sqlx::query(query)
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ModerationError::Store(e.to_string()))?;

        Ok(rows.iter().filter_map(Self::row_to_warning).collect())
    }

    async fn active_warning_count(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<u32, ModerationError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM warnings
            WHERE user_id = ? AND guild_id = ? AND active = 1
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ModerationError::Store(e.to_string()))?;

        Ok(row.get::<i64, _>("count") as u32)
    }

    async fn deactivate_warning(
        &self,
        guild_id: u64,
        warning_id: i64,
    ) -> Result<bool, ModerationError> {
        let result = sqlx::query(
            r#"
            UPDATE warnings
            SET active = 0
            WHERE id = ? AND guild_id = ? AND active = 1
            "#,
        )
        .bind(warning_id)
        .bind(guild_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::Store(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_ban(&self, ban: BanRecord) -> Result<bool, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO guild_bans (user_id, guild_id, reason, banned_by, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(ban.user_id as i64)
        .bind(ban.guild_id as i64)
        .bind(ban.reason)
        .bind(ban.banned_by.map(|id| id as i64))
        .bind(ban.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_banned(&self, user_id: u64, guild_id: u64) -> Result<bool, ModerationError> {
        let row = sqlx::query(
            r#"
            SELECT 1 as present FROM guild_bans
            WHERE user_id = ? AND guild_id = ?
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ModerationError::Store(e.to_string()))?;

        Ok(row.is_some())
    }
}
