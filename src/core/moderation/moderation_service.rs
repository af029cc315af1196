// Moderation service - append-only warning log with a threshold-triggered
// auto-ban rule.
//
// The auto-ban must fire exactly once per (user, guild). The store's ban
// marker insert is the idempotency point: it reports whether the marker was
// actually created, and only the creating call gets the trigger.

use super::moderation_models::{AutoBan, BanRecord, ModerationConfig, WarnOutcome, WarningRecord};
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("warning not found")]
    WarningNotFound,

    #[error("storage error: {0}")]
    Store(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting warnings and ban markers.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Append a warning and return its id.
    async fn add_warning(
        &self,
        user_id: u64,
        guild_id: u64,
        moderator_id: u64,
        reason: &str,
    ) -> Result<i64, ModerationError>;

    /// Warnings for a user, newest first. `active_only` filters out
    /// deactivated ones.
    async fn warnings(
        &self,
        user_id: u64,
        guild_id: u64,
        active_only: bool,
    ) -> Result<Vec<WarningRecord>, ModerationError>;

    /// Count of active warnings.
    async fn active_warning_count(&self, user_id: u64, guild_id: u64)
        -> Result<u32, ModerationError>;

    /// Deactivate one warning. Returns `false` when the id doesn't exist in
    /// this guild.
    async fn deactivate_warning(&self, guild_id: u64, warning_id: i64)
        -> Result<bool, ModerationError>;

    /// Record a ban marker. Returns `false` when the user is already marked
    /// banned in this guild (and writes nothing).
    async fn record_ban(&self, ban: BanRecord) -> Result<bool, ModerationError>;

    /// Whether a ban marker exists.
    async fn is_banned(&self, user_id: u64, guild_id: u64) -> Result<bool, ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Service for the moderation log and the auto-ban rule.
pub struct ModerationService<S: ModerationStore> {
    store: S,
    config: ModerationConfig,
}

impl<S: ModerationStore> ModerationService<S> {
    #[allow(dead_code)]
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: ModerationConfig::default(),
        }
    }

    pub fn with_config(store: S, config: ModerationConfig) -> Self {
        Self { store, config }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Issue a warning. When the active count first reaches the threshold
    /// the outcome carries the auto-ban trigger; any later warning for an
    /// already-banned user does not.
    pub async fn warn(
        &self,
        user_id: u64,
        guild_id: u64,
        moderator_id: u64,
        reason: &str,
    ) -> Result<WarnOutcome, ModerationError> {
        let warning_id = self
            .store
            .add_warning(user_id, guild_id, moderator_id, reason)
            .await?;
        let active_count = self.store.active_warning_count(user_id, guild_id).await?;

        let auto_ban = if active_count >= self.config.auto_ban_threshold {
            let reason = format!("Auto-ban: reached {} warnings", active_count);
            let created = self
                .store
                .record_ban(BanRecord {
                    user_id,
                    guild_id,
                    reason: reason.clone(),
                    banned_by: None,
                    created_at: Utc::now(),
                })
                .await?;
            created.then_some(AutoBan { reason })
        } else {
            None
        };

        Ok(WarnOutcome {
            warning_id,
            active_count,
            auto_ban,
        })
    }

    /// All warnings for a user, newest first.
    pub async fn warnings(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<WarningRecord>, ModerationError> {
        self.store.warnings(user_id, guild_id, false).await
    }

    pub async fn active_warning_count(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<u32, ModerationError> {
        self.store.active_warning_count(user_id, guild_id).await
    }

    /// Deactivate a warning by id.
    pub async fn clear_warning(
        &self,
        guild_id: u64,
        warning_id: i64,
    ) -> Result<(), ModerationError> {
        if self.store.deactivate_warning(guild_id, warning_id).await? {
            Ok(())
        } else {
            Err(ModerationError::WarningNotFound)
        }
    }

    /// Record a manual ban. Returns `false` when the user was already
    /// marked banned.
    pub async fn record_manual_ban(
        &self,
        user_id: u64,
        guild_id: u64,
        moderator_id: u64,
        reason: &str,
    ) -> Result<bool, ModerationError> {
        self.store
            .record_ban(BanRecord {
                user_id,
                guild_id,
                reason: reason.to_string(),
                banned_by: Some(moderator_id),
                created_at: Utc::now(),
            })
            .await
    }

    #[allow(dead_code)]
    pub async fn is_banned(&self, user_id: u64, guild_id: u64) -> Result<bool, ModerationError> {
        self.store.is_banned(user_id, guild_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// In-memory store for testing.
    struct MockModerationStore {
        warnings: DashMap<i64, WarningRecord>,
        bans: DashMap<(u64, u64), BanRecord>,
        next_id: AtomicI64,
    }

    impl MockModerationStore {
        fn new() -> Self {
            Self {
                warnings: DashMap::new(),
                bans: DashMap::new(),
                next_id: AtomicI64::new(1),
            }
        }
    }

    #[async_trait]
    impl ModerationStore for MockModerationStore {
        async fn add_warning(
            &self,
            user_id: u64,
            guild_id: u64,
            moderator_id: u64,
            reason: &str,
        ) -> Result<i64, ModerationError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.warnings.insert(
                id,
                WarningRecord {
                    id,
                    user_id,
                    guild_id,
                    moderator_id,
                    reason: reason.to_string(),
                    active: true,
                    created_at: Utc::now(),
                },
            );
            Ok(id)
        }

        async fn warnings(
            &self,
            user_id: u64,
            guild_id: u64,
            active_only: bool,
        ) -> Result<Vec<WarningRecord>, ModerationError> {
            let mut rows: Vec<WarningRecord> = self
                .warnings
                .iter()
                .filter(|w| {
                    w.user_id == user_id && w.guild_id == guild_id && (!active_only || w.active)
                })
                .map(|w| w.clone())
                .collect();
            rows.sort_by_key(|w| -w.id);
            Ok(rows)
        }

        async fn active_warning_count(
            &self,
            user_id: u64,
            guild_id: u64,
        ) -> Result<u32, ModerationError> {
            Ok(self.warnings(user_id, guild_id, true).await?.len() as u32)
        }

        async fn deactivate_warning(
            &self,
            guild_id: u64,
            warning_id: i64,
        ) -> Result<bool, ModerationError> {
            match self.warnings.get_mut(&warning_id) {
                Some(mut w) if w.guild_id == guild_id && w.active => {
                    w.active = false;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn record_ban(&self, ban: BanRecord) -> Result<bool, ModerationError> {
            let key = (ban.user_id, ban.guild_id);
            if self.bans.contains_key(&key) {
                return Ok(false);
            }
            self.bans.insert(key, ban);
            Ok(true)
        }

        async fn is_banned(&self, user_id: u64, guild_id: u64) -> Result<bool, ModerationError> {
            Ok(self.bans.contains_key(&(user_id, guild_id)))
        }
    }

    #[tokio::test]
    async fn warnings_accumulate_below_threshold() {
        let service = ModerationService::new(MockModerationStore::new());

        for expected in 1..=4u32 {
            let outcome = service.warn(1, 1, 99, "spamming").await.unwrap();
            assert_eq!(outcome.active_count, expected);
            assert!(outcome.auto_ban.is_none());
        }
    }

    #[tokio::test]
    async fn auto_ban_fires_exactly_once_at_threshold() {
        let service = ModerationService::new(MockModerationStore::new());

        for _ in 0..4 {
            assert!(service.warn(1, 1, 99, "spam").await.unwrap().auto_ban.is_none());
        }

        // Fifth warning crosses the threshold.
        let outcome = service.warn(1, 1, 99, "spam").await.unwrap();
        assert_eq!(outcome.active_count, 5);
        assert!(outcome.auto_ban.is_some());
        assert!(service.is_banned(1, 1).await.unwrap());

        // Sixth and seventh never re-trigger.
        for _ in 0..2 {
            let outcome = service.warn(1, 1, 99, "still spamming").await.unwrap();
            assert!(outcome.auto_ban.is_none());
        }
    }

    #[tokio::test]
    async fn auto_ban_is_scoped_per_user_and_guild() {
        let config = ModerationConfig {
            auto_ban_threshold: 2,
        };
        let service = ModerationService::with_config(MockModerationStore::new(), config);

        service.warn(1, 1, 99, "a").await.unwrap();
        let outcome = service.warn(1, 1, 99, "b").await.unwrap();
        assert!(outcome.auto_ban.is_some());

        // A different user and a different guild are untouched.
        assert!(!service.is_banned(2, 1).await.unwrap());
        assert!(!service.is_banned(1, 2).await.unwrap());
        assert!(service.warn(2, 1, 99, "a").await.unwrap().auto_ban.is_none());
    }

    #[tokio::test]
    async fn cleared_warnings_do_not_count_toward_the_threshold() {
        let config = ModerationConfig {
            auto_ban_threshold: 3,
        };
        let service = ModerationService::with_config(MockModerationStore::new(), config);

        let first = service.warn(1, 1, 99, "a").await.unwrap();
        service.warn(1, 1, 99, "b").await.unwrap();
        service.clear_warning(1, first.warning_id).await.unwrap();

        // Two active warnings again, still below the threshold.
        let outcome = service.warn(1, 1, 99, "c").await.unwrap();
        assert_eq!(outcome.active_count, 2);
        assert!(outcome.auto_ban.is_none());

        // History keeps the deactivated record.
        let all = service.warnings(1, 1).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().filter(|w| w.active).count(), 2);
    }

    #[tokio::test]
    async fn clearing_unknown_warning_fails() {
        let service = ModerationService::new(MockModerationStore::new());

        let err = service.clear_warning(1, 12345).await.unwrap_err();
        assert!(matches!(err, ModerationError::WarningNotFound));
    }

    #[tokio::test]
    async fn manual_ban_preempts_auto_ban() {
        let config = ModerationConfig {
            auto_ban_threshold: 2,
        };
        let service = ModerationService::with_config(MockModerationStore::new(), config);

        assert!(service.record_manual_ban(1, 1, 99, "rule 1").await.unwrap());
        assert!(!service.record_manual_ban(1, 1, 99, "again").await.unwrap());

        // Crossing the threshold after a manual ban must not re-trigger.
        service.warn(1, 1, 99, "a").await.unwrap();
        let outcome = service.warn(1, 1, 99, "b").await.unwrap();
        assert!(outcome.auto_ban.is_none());
    }
}
