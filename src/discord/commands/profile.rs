// Profile command - one card combining ledger stats and moderation state.

use crate::discord::format::format_number;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

/// View a user's profile
#[poise::command(slash_command, guild_only)]
pub async fn profile(
    ctx: Context<'_>,
    #[description = "User to view (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    if target_user.bot {
        ctx.say("Bots don't have profiles! 🤖").await?;
        return Ok(());
    }

    let user_id = target_user.id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let account = ctx.data().ledger.account(user_id, guild_id).await?;
    let warnings = ctx
        .data()
        .moderation
        .active_warning_count(user_id, guild_id)
        .await?;
    let items = ctx.data().shop.inventory(user_id, guild_id).await?;
    let item_count: i64 = items.iter().map(|(_, quantity)| quantity).sum();

    let embed = serenity::CreateEmbed::new()
        .title(format!("👤 {}'s Profile", target_user.name))
        .color(0x7289DA) // Blurple
        .thumbnail(target_user.face())
        .field(
            "💰 Economy",
            format!(
                "**Wallet:** {}\n**Bank:** {}\n**Net Worth:** {}",
                format_number(account.wallet),
                format_number(account.bank),
                format_number(account.net_worth())
            ),
            true,
        )
        .field(
            "📊 Statistics",
            format!(
                "**Experience:** {}\n**Items Owned:** {}\n**Warnings:** {}",
                format_number(account.experience),
                item_count,
                warnings
            ),
            true,
        )
        .field(
            "🏆 Records",
            format!(
                "**Total Earned:** {}\n**Total Spent:** {}",
                format_number(account.total_earned),
                format_number(account.total_spent)
            ),
            true,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
