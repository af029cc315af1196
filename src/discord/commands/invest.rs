// Discord commands for the investment system

use crate::core::economy::{InvestStatus, InvestTier, LedgerError};
use crate::discord::format::format_number;
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum TierChoice {
    #[name = "Conservative Bonds 🛡️ (Low risk, steady returns)"]
    Conservative,
    #[name = "Balanced Portfolio ⚖️ (Medium risk, moderate returns)"]
    Balanced,
    #[name = "High-Risk Stocks 🚀 (High risk, high potential)"]
    Aggressive,
}

impl TierChoice {
    fn tier(self) -> InvestTier {
        match self {
            TierChoice::Conservative => InvestTier::Conservative,
            TierChoice::Balanced => InvestTier::Balanced,
            TierChoice::Aggressive => InvestTier::Aggressive,
        }
    }
}

/// Invest your coins for potential returns
#[poise::command(slash_command, guild_only)]
pub async fn invest(
    ctx: Context<'_>,
    #[description = "Amount to invest"]
    #[min = 1]
    amount: i64,
    #[description = "Investment type"] investment_type: TierChoice,
) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    match ctx
        .data()
        .invest
        .invest(user_id, guild_id, amount, investment_type.tier())
        .await
    {
        Ok(receipt) => {
            let profile = receipt.tier.profile();
            let profit = receipt.expected_payout - receipt.amount;

            let embed = serenity::CreateEmbed::new()
                .title(format!("{} Investment Created!", profile.emoji))
                .description(format!(
                    "You invested **{} coins** in **{}**",
                    format_number(receipt.amount),
                    profile.name
                ))
                .color(0x00FF00) // Green
                .field(
                    "💰 Expected Return",
                    format!(
                        "{} ({:.2}x)",
                        format_number(receipt.expected_payout),
                        receipt.expected_return
                    ),
                    true,
                )
                .field("📈 Potential Profit", format_number(profit), true)
                .field(
                    "⏰ Matures In",
                    format!(
                        "{} day(s) (<t:{}:R>)",
                        receipt.days_to_mature,
                        receipt.maturity_date.timestamp()
                    ),
                    true,
                )
                .field(
                    "🎯 Risk Level",
                    format!("{:.0}% chance of loss", profile.loss_chance * 100.0),
                    true,
                )
                .field("🆔 Investment ID", format!("`{}`", receipt.id), true)
                .footer(serenity::CreateEmbedFooter::new(
                    "Use /portfolio to check your investments and /collect to cash out",
                ));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::AmountOutOfRange { min, max }) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "❌ Investments must be between {} and {} coins.",
                        format_number(min),
                        format_number(max)
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(LedgerError::InsufficientFunds {
            required,
            available,
        }) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "💰 You need {} coins but only have {}.",
                        format_number(required),
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

/// View your investment portfolio
#[poise::command(slash_command, guild_only)]
pub async fn portfolio(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let investments = ctx.data().invest.portfolio(user_id, guild_id).await?;
    if investments.is_empty() {
        let embed = serenity::CreateEmbed::new()
            .title("📊 Investment Portfolio")
            .description("You don't have any investments yet. Use `/invest` to get started!")
            .color(0x7289DA); // Blurple

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let active: Vec<_> = investments
        .iter()
        .filter(|i| i.status == InvestStatus::Active)
        .collect();
    let completed: Vec<_> = investments
        .iter()
        .filter(|i| i.status == InvestStatus::Completed)
        .collect();

    let mut embed = serenity::CreateEmbed::new()
        .title("📊 Investment Portfolio")
        .color(0x7289DA); // Blurple

    if !active.is_empty() {
        let now = Utc::now();
        let total: i64 = active.iter().map(|i| i.amount).sum();
        let mut text = format!(
            "**Total Invested:** {}\n**Active Investments:** {}\n\n",
            format_number(total),
            active.len()
        );

        for inv in active.iter().take(5) {
            let profile = inv.tier.profile();
            let time_str = if inv.maturity_date <= now {
                "**READY TO COLLECT**".to_string()
            } else {
                format!("<t:{}:R>", inv.maturity_date.timestamp())
            };
            text.push_str(&format!(
                "{} **{}**\nAmount: {} → {}\nMatures: {}\n\n",
                profile.emoji,
                profile.name,
                format_number(inv.amount),
                format_number((inv.amount as f64 * inv.expected_return) as i64),
                time_str
            ));
        }
        if active.len() > 5 {
            text.push_str(&format!("*...and {} more*", active.len() - 5));
        }

        embed = embed.field("🟢 Active Investments", text, false);
    }

    if !completed.is_empty() {
        let invested: i64 = completed.iter().map(|i| i.amount).sum();
        let returned: i64 = completed
            .iter()
            .filter_map(|i| {
                i.actual_return
                    .map(|r| (i.amount as f64 * r) as i64)
            })
            .sum();

        embed = embed.field(
            "✅ Investment History",
            format!(
                "**Total Invested:** {}\n**Total Returned:** {}\n**Net Profit:** {}\n**Completed Investments:** {}",
                format_number(invested),
                format_number(returned),
                format_number(returned - invested),
                completed.len()
            ),
            false,
        );
    }

    let embed = embed.footer(serenity::CreateEmbedFooter::new(
        "Matured investments pay out when you run /collect",
    ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Collect your matured investments
#[poise::command(slash_command, guild_only)]
pub async fn collect(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let collected = ctx.data().invest.collect(user_id, guild_id).await?;
    if collected.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("📊 Nothing to collect yet. Check `/portfolio` for maturity dates.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let total_payout: i64 = collected.iter().map(|c| c.payout).sum();
    let total_staked: i64 = collected.iter().map(|c| c.investment.amount).sum();

    let mut embed = serenity::CreateEmbed::new()
        .title("💼 Investments Collected")
        .description(format!(
            "Collected **{}** position(s) for a total of **{} coins**",
            collected.len(),
            format_number(total_payout)
        ))
        .color(if total_payout >= total_staked {
            0x00FF00 // Green
        } else {
            0xFF0000 // Red
        });

    for c in collected.iter().take(10) {
        let profile = c.investment.tier.profile();
        let verdict = if c.payout >= c.investment.amount {
            "📈 Profit"
        } else {
            "📉 Loss"
        };
        embed = embed.field(
            format!("{} {}", profile.emoji, profile.name),
            format!(
                "{}: {} → {} ({:.2}x)",
                verdict,
                format_number(c.investment.amount),
                format_number(c.payout),
                c.actual_return
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
