// Moderation slash commands - warnings, kicks, bans, bulk delete.
//
// The warning log and auto-ban decision live in the core service; this
// layer only executes the resulting guild actions.

use crate::core::moderation::ModerationError;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

/// Warn a user
#[poise::command(slash_command, guild_only, required_permissions = "KICK_MEMBERS")]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "User to warn"] user: serenity::User,
    #[description = "Reason for warning"] reason: String,
) -> Result<(), Error> {
    if user.bot {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ You can't warn bots!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }
    if user.id == ctx.author().id {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ You can't warn yourself!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let outcome = ctx
        .data()
        .moderation
        .warn(user.id.get(), guild_id.get(), ctx.author().id.get(), &reason)
        .await?;

    tracing::info!(
        user_id = user.id.get(),
        guild_id = guild_id.get(),
        warning_id = outcome.warning_id,
        active_count = outcome.active_count,
        "Warning issued"
    );

    let mut embed = serenity::CreateEmbed::new()
        .title("⚠️ User Warned")
        .description(format!("{} has been warned", user))
        .color(0xFFA500) // Orange
        .field("Reason", reason.as_str(), false)
        .field("Warning Count", outcome.active_count.to_string(), true)
        .field("Warning ID", format!("#{}", outcome.warning_id), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Moderator: {}",
            ctx.author().name
        )));

    if let Some(auto_ban) = outcome.auto_ban {
        match guild_id
            .ban_with_reason(ctx.http(), user.id, 0, &auto_ban.reason)
            .await
        {
            Ok(()) => {
                tracing::warn!(
                    user_id = user.id.get(),
                    guild_id = guild_id.get(),
                    "Auto-ban executed"
                );
                embed = embed.field(
                    "🔨 Auto-Ban",
                    format!(
                        "User automatically banned for reaching {} warnings",
                        outcome.active_count
                    ),
                    false,
                );
            }
            Err(e) => {
                tracing::error!("Failed to execute auto-ban: {}", e);
                embed = embed.field("⚠️ Auto-Ban Failed", "Missing permissions to ban user", false);
            }
        }
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// View warnings for a user
#[poise::command(slash_command, guild_only, required_permissions = "KICK_MEMBERS")]
pub async fn warnings(
    ctx: Context<'_>,
    #[description = "User to check warnings for"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let warnings = ctx
        .data()
        .moderation
        .warnings(user.id.get(), guild_id)
        .await?;

    if warnings.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("{} has no warnings!", user))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let active = warnings.iter().filter(|w| w.active).count();
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("⚠️ Warnings for {}", user.name))
        .description(format!(
            "**Total:** {} | **Active:** {}",
            warnings.len(),
            active
        ))
        .color(0xFFA500); // Orange

    for warning in warnings.iter().take(10) {
        let status = if warning.active { "🟢" } else { "🔴" };
        embed = embed.field(
            format!("{} Warning #{}", status, warning.id),
            format!(
                "**Reason:** {}\n**Moderator:** <@{}>\n**Date:** <t:{}:R>",
                warning.reason,
                warning.moderator_id,
                warning.created_at.timestamp()
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove a warning
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn clearwarn(
    ctx: Context<'_>,
    #[description = "Warning ID to remove"] warning_id: i64,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    match ctx.data().moderation.clear_warning(guild_id, warning_id).await {
        Ok(()) => {
            let embed = serenity::CreateEmbed::new()
                .title("✅ Warning Cleared")
                .description(format!("Warning #{} has been deactivated", warning_id))
                .color(0x00FF00); // Green

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(ModerationError::WarningNotFound) => {
            ctx.send(
                poise::CreateReply::default()
                    .content("❌ Warning not found!")
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Kick a user from the server
#[poise::command(slash_command, guild_only, required_permissions = "KICK_MEMBERS")]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "User to kick"] user: serenity::User,
    #[description = "Reason for kick"] reason: Option<String>,
) -> Result<(), Error> {
    if user.bot {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ You can't kick bots!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());

    match guild_id
        .kick_with_reason(
            ctx.http(),
            user.id,
            &format!("{}: {}", ctx.author().name, reason),
        )
        .await
    {
        Ok(()) => {
            let embed = serenity::CreateEmbed::new()
                .title("🚪 User Kicked")
                .description(format!("{} has been kicked", user))
                .color(0xFF0000) // Red
                .field("Reason", reason, false)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Moderator: {}",
                    ctx.author().name
                )));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            tracing::error!("Kick failed: {}", e);
            ctx.send(
                poise::CreateReply::default()
                    .content("❌ Missing permissions to kick this user!")
                    .ephemeral(true),
            )
            .await?;
        }
    }

    Ok(())
}

/// Ban a user from the server
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: serenity::User,
    #[description = "Reason for ban"] reason: Option<String>,
    #[description = "Days of messages to delete (0-7)"]
    #[min = 0]
    #[max = 7]
    delete_messages: Option<u8>,
) -> Result<(), Error> {
    if user.bot {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ You can't ban bots!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());

    match guild_id
        .ban_with_reason(
            ctx.http(),
            user.id,
            delete_messages.unwrap_or(0),
            &format!("{}: {}", ctx.author().name, reason),
        )
        .await
    {
        Ok(()) => {
            // Mark the ban so the auto-ban rule never re-fires for this user.
            ctx.data()
                .moderation
                .record_manual_ban(user.id.get(), guild_id.get(), ctx.author().id.get(), &reason)
                .await?;

            let embed = serenity::CreateEmbed::new()
                .title("🔨 User Banned")
                .description(format!("{} has been banned", user))
                .color(0x8B0000) // Dark red
                .field("Reason", reason, false)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Moderator: {}",
                    ctx.author().name
                )));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            tracing::error!("Ban failed: {}", e);
            ctx.send(
                poise::CreateReply::default()
                    .content("❌ Missing permissions to ban this user!")
                    .ephemeral(true),
            )
            .await?;
        }
    }

    Ok(())
}

/// Bulk delete messages in this channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-100)"]
    #[min = 1]
    #[max = 100]
    amount: u8,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    let messages = channel_id
        .messages(ctx.http(), serenity::GetMessages::new().limit(amount))
        .await?;
    let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();

    if ids.is_empty() {
        ctx.say("❌ No messages to delete!").await?;
        return Ok(());
    }

    // The bulk endpoint rejects single-message batches.
    let result = if ids.len() == 1 {
        channel_id.delete_message(ctx.http(), ids[0]).await
    } else {
        channel_id.delete_messages(ctx.http(), ids.clone()).await
    };

    match result {
        Ok(()) => {
            ctx.say(format!("✅ Deleted {} messages!", ids.len())).await?;
        }
        Err(e) => {
            tracing::error!("Bulk delete failed: {}", e);
            ctx.say("❌ Missing permissions!").await?;
        }
    }

    Ok(())
}
