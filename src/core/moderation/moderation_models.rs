// Moderation domain models - pure data types, no Discord dependencies.
// The Discord layer translates these into guild actions (ban, DM, embed).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One warning issued to a user. Append-only: warnings are deactivated,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningRecord {
    pub id: i64,
    pub user_id: u64,
    pub guild_id: u64,
    pub moderator_id: u64,
    pub reason: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Persisted ban marker. One row per (user, guild); its existence is what
/// makes the auto-ban rule idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanRecord {
    pub user_id: u64,
    pub guild_id: u64,
    pub reason: String,
    /// Moderator who issued the ban; `None` for the automatic rule.
    pub banned_by: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Result of issuing a warning.
#[derive(Debug, Clone)]
pub struct WarnOutcome {
    pub warning_id: i64,
    /// Active warnings after this one.
    pub active_count: u32,
    /// Set exactly once, when the count first reaches the threshold.
    pub auto_ban: Option<AutoBan>,
}

/// Auto-ban trigger for the Discord layer to execute.
#[derive(Debug, Clone)]
pub struct AutoBan {
    pub reason: String,
}

/// Configuration for the moderation rules.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Active warning count at which the auto-ban fires.
    pub auto_ban_threshold: u32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            auto_ban_threshold: 5,
        }
    }
}
