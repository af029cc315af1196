// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "economy/mod.rs"]
pub mod economy;

#[path = "moderation/sqlite_warning_store.rs"]
pub mod moderation;
