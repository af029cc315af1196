// Discord commands for the economy system
//
// Following the same pattern everywhere:
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response

use crate::core::economy::LedgerError;
use crate::discord::format::{format_duration, format_number};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

const JOBS: [&str; 8] = [
    "delivered packages 📦",
    "coded a website 💻",
    "walked some dogs 🐕",
    "tutored students 📚",
    "fixed computers 🔧",
    "designed graphics 🎨",
    "made coffee ☕",
    "cleaned houses 🧹",
];

const CRIMES: [&str; 6] = [
    "robbed a convenience store 🏪",
    "hacked a crypto wallet 💻",
    "pickpocketed a tourist 👜",
    "sold fake watches ⌚",
    "ran an illegal casino 🎰",
    "smuggled rare items 📦",
];

const CRIME_FAILS: [&str; 6] = [
    "got caught red-handed 🚔",
    "triggered the alarm 🚨",
    "were spotted by cameras 📹",
    "got tackled by security 🛡️",
    "left fingerprints everywhere 👮",
    "tripped and fell 🤕",
];

fn pick(options: &[&'static str]) -> &'static str {
    options[rand::random::<usize>() % options.len()]
}

/// Check your wallet and bank balance
#[poise::command(slash_command, guild_only)]
pub async fn balance(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    if target_user.bot {
        ctx.say("Bots don't have wallets! 🤖").await?;
        return Ok(());
    }

    let user_id = target_user.id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let account = ctx.data().ledger.account(user_id, guild_id).await?;
    let transactions = ctx
        .data()
        .ledger
        .recent_transactions(user_id, guild_id, 5)
        .await?;

    let transaction_text = if transactions.is_empty() {
        "No transactions yet".to_string()
    } else {
        transactions
            .iter()
            .map(|t| {
                // Transfer records are signed from the sender's side; flip
                // them when the viewer is the destination.
                let (amount, description) = if t.user_id == user_id {
                    (t.amount, t.description.clone())
                } else {
                    (-t.amount, format!("Transfer from {}", t.user_id))
                };
                let sign = if amount >= 0 { "+" } else { "" };
                format!("{}{} 🪙 — {}", sign, format_number(amount), description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("💰 {}'s Balance", target_user.name))
        .color(0xFFD700) // Gold
        .thumbnail(target_user.face())
        .field(
            "💵 Wallet",
            format!("🪙 {}", format_number(account.wallet)),
            true,
        )
        .field("🏦 Bank", format!("🪙 {}", format_number(account.bank)), true)
        .field(
            "💎 Net Worth",
            format!("🪙 {}", format_number(account.net_worth())),
            true,
        )
        .field("Recent Transactions", transaction_text, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Total Earned: {}",
            format_number(account.total_earned)
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Work to earn coins (5 minute cooldown)
#[poise::command(slash_command, guild_only)]
pub async fn work(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    match ctx.data().ledger.work(user_id, guild_id).await {
        Ok(outcome) => {
            let embed = serenity::CreateEmbed::new()
                .title("💼 Work Complete!")
                .description(format!(
                    "You {} and earned **{} coins**!",
                    pick(&JOBS),
                    format_number(outcome.amount)
                ))
                .color(0x00FF00) // Green
                .field(
                    "New Balance",
                    format!("🪙 {}", format_number(outcome.new_wallet)),
                    true,
                )
                .footer(serenity::CreateEmbedFooter::new("Come back in 5 minutes!"));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::CooldownActive(left)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("⏳ You're tired! Rest for {}", format_duration(left)))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Claim your daily bonus (24 hour cooldown)
#[poise::command(slash_command, guild_only)]
pub async fn daily(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    match ctx.data().ledger.claim_daily(user_id, guild_id).await {
        Ok(outcome) => {
            let embed = serenity::CreateEmbed::new()
                .title("🎁 Daily Bonus Claimed!")
                .description(format!(
                    "You received **{} coins**!",
                    format_number(outcome.amount)
                ))
                .color(0xFFD700) // Gold
                .field(
                    "New Balance",
                    format!("🪙 {}", format_number(outcome.new_wallet)),
                    true,
                )
                .field(
                    "Next Claim",
                    format!("<t:{}:R>", outcome.next_available.timestamp()),
                    true,
                )
                .footer(serenity::CreateEmbedFooter::new(
                    "Come back tomorrow for another bonus!",
                ));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::CooldownActive(left)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "⏰ Daily already claimed! Come back in {}",
                        format_duration(left)
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Commit a crime for coins - risky! (10 minute cooldown)
#[poise::command(slash_command, guild_only)]
pub async fn crime(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    match ctx.data().ledger.commit_crime(user_id, guild_id).await {
        Ok(outcome) => {
            let embed = if outcome.success {
                serenity::CreateEmbed::new()
                    .title("😈 Crime Successful!")
                    .description(format!(
                        "You {} and got away with **{} coins**!",
                        pick(&CRIMES),
                        format_number(outcome.amount)
                    ))
                    .color(0x00FF00) // Green
            } else {
                serenity::CreateEmbed::new()
                    .title("🚨 Crime Failed!")
                    .description(format!(
                        "You {} and paid a **{} coin** fine!",
                        pick(&CRIME_FAILS),
                        format_number(outcome.amount)
                    ))
                    .color(0xFF0000) // Red
            };

            let embed = embed
                .field(
                    "New Balance",
                    format!("🪙 {}", format_number(outcome.new_wallet)),
                    true,
                )
                .field(
                    "Next Attempt",
                    format!("<t:{}:R>", outcome.next_available.timestamp()),
                    true,
                )
                .footer(serenity::CreateEmbedFooter::new("Crime doesn't pay... usually."));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::CooldownActive(left)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "👮 The police are watching! Wait {}",
                        format_duration(left)
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Give coins to another user
#[poise::command(slash_command, guild_only)]
pub async fn give(
    ctx: Context<'_>,
    #[description = "User to give coins to"] user: serenity::User,
    #[description = "Amount to give"]
    #[min = 1]
    amount: i64,
) -> Result<(), Error> {
    if user.bot {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ You can't give coins to bots!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }
    if user.id == ctx.author().id {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ You can't give coins to yourself!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    match ctx
        .data()
        .ledger
        .transfer(ctx.author().id.get(), user.id.get(), guild_id, amount)
        .await
    {
        Ok(()) => {
            let embed = serenity::CreateEmbed::new()
                .title("💸 Transfer Complete")
                .description(format!(
                    "{} sent **{} coins** to {}!",
                    ctx.author(),
                    format_number(amount),
                    user
                ))
                .color(0x00FF00); // Green

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::InsufficientFunds { available, .. }) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "❌ Insufficient funds! You only have {} coins",
                        format_number(available)
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// View the wealth leaderboard
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let top = ctx.data().ledger.leaderboard(guild_id, 10).await?;
    if top.is_empty() {
        ctx.say("No one has any coins yet! Try /work to get started. 💼")
            .await?;
        return Ok(());
    }

    let mut description = String::new();
    for (idx, account) in top.iter().enumerate() {
        let rank = idx + 1;
        let medal = match rank {
            1 => "🥇".to_string(),
            2 => "🥈".to_string(),
            3 => "🥉".to_string(),
            n => format!("{}.", n),
        };

        description.push_str(&format!(
            "{} {} - 💰 {}\n💵 Wallet: {} | 🏦 Bank: {}\n",
            medal,
            display_name(&ctx, account.user_id),
            format_number(account.net_worth()),
            format_number(account.wallet),
            format_number(account.bank),
        ));
    }

    let embed = serenity::CreateEmbed::new()
        .title("💰 Wealth Leaderboard")
        .description(description)
        .color(0xFFD700) // Gold
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Showing top {} users",
            top.len()
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Resolve a display name from the cache, falling back to a mention that
/// Discord renders client-side.
fn display_name(ctx: &Context<'_>, user_id: u64) -> String {
    ctx.serenity_context()
        .cache
        .user(serenity::UserId::new(user_id))
        .map(|u| format!("**{}**", u.name))
        .unwrap_or_else(|| format!("<@{}>", user_id))
}
