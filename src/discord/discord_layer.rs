// Discord layer - commands and shared bot state.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "format.rs"]
pub mod format;

// Re-export command types for convenience
pub use commands::{Data, Error};
