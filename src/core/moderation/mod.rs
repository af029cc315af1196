// Moderation module - warning log and the auto-ban rule.

mod moderation_models;
mod moderation_service;

pub use moderation_models::{AutoBan, BanRecord, ModerationConfig, WarnOutcome, WarningRecord};
pub use moderation_service::{ModerationError, ModerationService, ModerationStore};
