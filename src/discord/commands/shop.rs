// Discord commands for the shop system

use crate::core::economy::LedgerError;
use crate::discord::format::format_number;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

/// View or manage the server shop
#[poise::command(slash_command, guild_only, subcommands("list", "add", "remove"))]
pub async fn shop(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// View available items in the shop
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let items = ctx.data().shop.catalog(guild_id).await?;
    if items.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("🏬 The store is empty.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("🏬 Shop Listings")
        .description("Purchase items with your coins!")
        .color(0x5865F2); // Blurple

    for item in items {
        embed = embed.field(
            format!("{} {}", item.emoji, item.name),
            format!(
                "Price: 🪙 {} (sells back for {})",
                format_number(item.price),
                format_number(item.price / 2)
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Add an item to the shop (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Item name"] name: String,
    #[description = "Price in coins"]
    #[min = 1]
    price: i64,
    #[description = "Emoji for the item"] emoji: String,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    if ctx.data().shop.add_item(guild_id, &name, price, &emoji).await? {
        ctx.say(format!(
            "✅ Added **{} {}** for 🪙 {}",
            emoji,
            name,
            format_number(price)
        ))
        .await?;
    } else {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ That item already exists in the store.")
                .ephemeral(true),
        )
        .await?;
    }

    Ok(())
}

/// Remove an item from the shop (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Item name to remove"]
    #[autocomplete = "autocomplete_items"]
    name: String,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    if ctx.data().shop.remove_item(guild_id, &name).await? {
        ctx.say(format!("🗑️ Removed **{}** from the store.", name))
            .await?;
    } else {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ Item not found.")
                .ephemeral(true),
        )
        .await?;
    }

    Ok(())
}

/// Buy an item from the shop
#[poise::command(slash_command, guild_only)]
pub async fn buy(
    ctx: Context<'_>,
    #[description = "Item to purchase"]
    #[autocomplete = "autocomplete_items"]
    item: String,
    #[description = "Quantity (default: 1)"]
    #[min = 1]
    quantity: Option<i64>,
) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let quantity = quantity.unwrap_or(1);

    match ctx.data().shop.buy(user_id, guild_id, &item, quantity).await {
        Ok(outcome) => {
            let embed = serenity::CreateEmbed::new()
                .title("✅ Purchase Successful!")
                .description(format!(
                    "{} **{}** x{} purchased for **{} coins**!",
                    outcome.item.emoji,
                    outcome.item.name,
                    outcome.quantity,
                    format_number(outcome.total_cost)
                ))
                .color(0x00FF00) // Green
                .field(
                    "New Balance",
                    format!("🪙 {}", format_number(outcome.new_wallet)),
                    true,
                );

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::ItemNotFound(name)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ Item not found: {}", name))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(LedgerError::InsufficientFunds {
            required,
            available,
        }) => {
            let embed = serenity::CreateEmbed::new()
                .title("❌ Insufficient Funds")
                .description(format!(
                    "You need **{}** coins but only have **{}**.\n\n💡 Use /work or /daily to earn more!",
                    format_number(required),
                    format_number(available)
                ))
                .color(0xFF0000); // Red

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Sell an item back to the shop at 50% price
#[poise::command(slash_command, guild_only)]
pub async fn sell(
    ctx: Context<'_>,
    #[description = "Item to sell"]
    #[autocomplete = "autocomplete_items"]
    item: String,
    #[description = "Quantity (default: 1)"]
    #[min = 1]
    quantity: Option<i64>,
) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let quantity = quantity.unwrap_or(1);

    match ctx.data().shop.sell(user_id, guild_id, &item, quantity).await {
        Ok(outcome) => {
            let embed = serenity::CreateEmbed::new()
                .title("💰 Sale Complete")
                .description(format!(
                    "You sold {} **{}** x{} for **{} coins**",
                    outcome.item.emoji,
                    outcome.item.name,
                    outcome.quantity,
                    format_number(outcome.proceeds)
                ))
                .color(0x00FF00) // Green
                .field(
                    "New Balance",
                    format!("🪙 {}", format_number(outcome.new_wallet)),
                    true,
                );

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(LedgerError::ItemNotFound(name)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ That item is not sold in this store: {}", name))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(LedgerError::InsufficientInventory {
            requested,
            available,
        }) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "❌ You only have {} of this item (tried to sell {})!",
                        available, requested
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Show your inventory
#[poise::command(slash_command, guild_only)]
pub async fn inventory(ctx: Context<'_>) -> Result<(), Error> {
    let user = ctx.author();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let items = ctx.data().shop.inventory(user.id.get(), guild_id).await?;
    if items.is_empty() {
        let embed = serenity::CreateEmbed::new()
            .title("🎒 Your Inventory")
            .description("Your inventory is empty!\n\n💡 Use `/shop list` to see available items.")
            .color(0xFFA500); // Orange

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🎒 {}'s Inventory", user.name))
        .color(0x5865F2); // Blurple

    for (item, quantity) in items {
        embed = embed.field(
            format!("{} {}", item.emoji, item.name),
            format!(
                "**Quantity:** {} • sells for 🪙 {} each",
                quantity,
                format_number(item.price / 2)
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Autocomplete for catalog item names.
async fn autocomplete_items<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let guild_id = ctx.guild_id().map(|g| g.get()).unwrap_or(0);
    let items = ctx.data().shop.catalog(guild_id).await.unwrap_or_default();

    items
        .into_iter()
        .filter(move |item| item.name.to_lowercase().contains(&partial.to_lowercase()))
        .map(|item| item.name)
        .collect::<Vec<_>>()
        .into_iter()
}
