// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (SQLite stores)
// - `discord/` = Discord-specific adapters (commands)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::economy::{
    EconomyConfig, InvestConfig, InvestService, LedgerService, RiskConfig, RiskResolver,
    ShopService,
};
use crate::core::moderation::{ModerationConfig, ModerationService};
use crate::discord::Data;
use crate::infra::economy::{SqliteAccountStore, SqliteInvestStore, SqliteShopStore};
use crate::infra::moderation::SqliteWarningStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Assemble the economy configuration from environment overrides.
fn economy_config() -> EconomyConfig {
    let defaults = EconomyConfig::default();
    let crime_defaults = RiskConfig::default();

    EconomyConfig {
        work_min: env_i64("EARN_MIN", defaults.work_min),
        work_max: env_i64("EARN_MAX", defaults.work_max),
        daily_min: env_i64("DAILY_BONUS_MIN", defaults.daily_min),
        daily_max: env_i64("DAILY_BONUS_MAX", defaults.daily_max),
        work_cooldown_secs: env_i64("WORK_COOLDOWN_SECS", defaults.work_cooldown_secs),
        daily_cooldown_secs: env_i64("DAILY_COOLDOWN_SECS", defaults.daily_cooldown_secs),
        crime_cooldown_secs: env_i64("CRIME_COOLDOWN_SECS", defaults.crime_cooldown_secs),
        crime: RiskConfig {
            success_rate: env_f64("CRIME_SUCCESS_RATE", crime_defaults.success_rate),
            reward_min: env_i64("CRIME_REWARD_MIN", crime_defaults.reward_min),
            reward_max: env_i64("CRIME_REWARD_MAX", crime_defaults.reward_max),
            penalty_min: env_i64("CRIME_FINE_MIN", crime_defaults.penalty_min),
            penalty_max: env_i64("CRIME_FINE_MAX", crime_defaults.penalty_max),
        },
        earn_xp: env_i64("EARN_XP", defaults.earn_xp),
        bank_interest_rate: env_f64("BANK_INTEREST_RATE", defaults.bank_interest_rate),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    std::fs::create_dir_all(&data_dir).expect("Failed to create data directory for SQLite files");
    let economy_db_path = format!("{}/economy.db", data_dir);
    let moderation_db_path = format!("{}/moderation.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    // Account store owns the economy pool; shop and investment stores share it.
    let account_store = SqliteAccountStore::new(&economy_db_path)
        .await
        .expect("Failed to initialize economy database");
    let economy_pool = account_store.pool();

    let shop_store = SqliteShopStore::new(economy_pool.clone());
    shop_store
        .migrate()
        .await
        .expect("Failed to migrate shop tables");

    let invest_store = SqliteInvestStore::new(economy_pool);
    invest_store
        .migrate()
        .await
        .expect("Failed to migrate investment tables");

    let moderation_pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", moderation_db_path))
        .await
        .expect("Failed to connect to moderation DB");
    let warning_store = SqliteWarningStore::new(moderation_pool);
    warning_store
        .migrate()
        .await
        .expect("Failed to migrate moderation DB");

    let ledger = Arc::new(LedgerService::with_config(
        account_store,
        economy_config(),
        RiskResolver::new(),
    ));

    let shop = Arc::new(ShopService::new(shop_store, Arc::clone(&ledger)));

    let invest_config = InvestConfig {
        min_amount: env_i64("INVESTMENT_MIN_AMOUNT", InvestConfig::default().min_amount),
        max_amount: env_i64("INVESTMENT_MAX_AMOUNT", InvestConfig::default().max_amount),
    };
    let invest = Arc::new(InvestService::with_config(
        invest_store,
        Arc::clone(&ledger),
        invest_config,
        crate::core::economy::Dice::new(),
    ));

    let moderation_config = ModerationConfig {
        auto_ban_threshold: env_i64("AUTO_BAN_THRESHOLD", 5) as u32,
    };
    let moderation = Arc::new(ModerationService::with_config(
        warning_store,
        moderation_config,
    ));

    // Create the data structure that will be shared across all commands
    let data = Data {
        ledger,
        shop,
        invest,
        moderation,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::economy::balance(),
                discord::commands::economy::work(),
                discord::commands::economy::daily(),
                discord::commands::economy::crime(),
                discord::commands::economy::give(),
                discord::commands::economy::leaderboard(),
                discord::commands::bank::deposit(),
                discord::commands::bank::withdraw(),
                discord::commands::bank::interest(),
                discord::commands::shop::shop(),
                discord::commands::shop::buy(),
                discord::commands::shop::sell(),
                discord::commands::shop::inventory(),
                discord::commands::invest::invest(),
                discord::commands::invest::portfolio(),
                discord::commands::invest::collect(),
                discord::commands::moderation::warn(),
                discord::commands::moderation::warnings(),
                discord::commands::moderation::clearwarn(),
                discord::commands::moderation::kick(),
                discord::commands::moderation::ban(),
                discord::commands::moderation::clear(),
                discord::commands::profile::profile(),
            ],
            // Domain errors are handled inside the commands; anything that
            // reaches here is unexpected and gets logged plus a generic reply.
            on_error: |error| {
                Box::pin(async move {
                    if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {}", e);
                    }
                })
            },
            // Hook to run after every command
            post_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        command = ctx.command().qualified_name.as_str(),
                        user_id = ctx.author().id.get(),
                        "Command completed"
                    );
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                // For faster development, use register_in_guild instead.
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Commands registered, bot is ready");
                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
