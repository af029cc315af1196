// Discord commands for the bank - deposits, withdrawals, and the admin
// interest run.

use crate::core::economy::LedgerError;
use crate::discord::format::{format_number, parse_amount};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

/// Deposit coins into your bank account
#[poise::command(slash_command, guild_only, aliases("dep"))]
pub async fn deposit(
    ctx: Context<'_>,
    #[description = "Amount to deposit (or 'all')"] amount: String,
) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let account = ctx.data().ledger.account(user_id, guild_id).await?;
    let Some(amount) = parse_amount(&amount, account.wallet) else {
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "❌ Please specify a valid amount between 1 and {}, or 'all'.",
                    format_number(account.wallet)
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    if amount <= 0 {
        ctx.send(
            poise::CreateReply::default()
                .content("💰 You don't have any coins to deposit.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    match ctx.data().ledger.deposit(user_id, guild_id, amount).await {
        Ok((wallet, bank)) => {
            let embed = serenity::CreateEmbed::new()
                .title("🏦 Deposit Successful")
                .description(format!(
                    "You deposited **{} coins** into your bank account!",
                    format_number(amount)
                ))
                .color(0x00FF00) // Green
                .field("💵 Wallet", format!("🪙 {}", format_number(wallet)), true)
                .field("🏦 Bank", format!("🪙 {}", format_number(bank)), true)
                .footer(serenity::CreateEmbedFooter::new(
                    "Your money is safe in the bank!",
                ));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::InsufficientFunds { available, .. }) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "❌ Invalid amount! You only have {} coins in your wallet.",
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

/// Withdraw coins from your bank account
#[poise::command(slash_command, guild_only, aliases("with"))]
pub async fn withdraw(
    ctx: Context<'_>,
    #[description = "Amount to withdraw (or 'all')"] amount: String,
) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let account = ctx.data().ledger.account(user_id, guild_id).await?;
    let Some(amount) = parse_amount(&amount, account.bank) else {
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "❌ Please specify a valid amount between 1 and {}, or 'all'.",
                    format_number(account.bank)
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    if amount <= 0 {
        ctx.send(
            poise::CreateReply::default()
                .content("🏦 You don't have any coins in your bank account.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    match ctx.data().ledger.withdraw(user_id, guild_id, amount).await {
        Ok((wallet, bank)) => {
            let embed = serenity::CreateEmbed::new()
                .title("🏦 Withdrawal Successful")
                .description(format!(
                    "You withdrew **{} coins** from your bank account!",
                    format_number(amount)
                ))
                .color(0x00FF00) // Green
                .field("💵 Wallet", format!("🪙 {}", format_number(wallet)), true)
                .field("🏦 Bank", format!("🪙 {}", format_number(bank)), true)
                .footer(serenity::CreateEmbedFooter::new(
                    "Don't spend it all at once!",
                ));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::InsufficientBank { available, .. }) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "❌ Invalid amount! You only have {} coins in the bank.",
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

/// Pay interest on all bank balances (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn interest(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let rate = ctx.data().ledger.config().bank_interest_rate;
    let paid = ctx.data().ledger.apply_interest(guild_id, rate).await?;

    tracing::info!(guild_id, rate, accounts = paid, "Interest run completed");

    ctx.say(format!(
        "🏦 Paid {:.1}% interest to {} account(s).",
        rate * 100.0,
        paid
    ))
    .await?;

    Ok(())
}
