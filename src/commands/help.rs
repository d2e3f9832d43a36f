use serenity::builder::CreateEmbed;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use crate::commands::BotContext;

pub async fn execute(ctx: &Context, msg: &Message) -> Result<(), String> {
    let state = BotContext::from_ctx(ctx).await?;
    let base = state.rates.base_currency();

    let embed = CreateEmbed::default()
        .title("📖 Currency Rate Bot")
        .description(format!("Exchange rates for 1 {} from a cached daily snapshot.", base))
        .color(0x00b0f4)
        .field(
            "🎯 General",
            "`$start` - Start and show the «Get rate» button\n`$help` - Show this help message",
            false,
        )
        .field(
            "💱 Rates",
            "`$rate <CODE>` - Rate for a currency code, e.g. `$rate EUR`\nIn direct messages just send the code: `RUB`",
            false,
        )
        .field("📊 Admin", "`$visits` - Distinct users of the bot", false);

    msg.channel_id
        .send_message(ctx, serenity::builder::CreateMessage::default().embed(embed))
        .await
        .map_err(|e| format!("Failed to send help message: {}", e))?;

    Ok(())
}
