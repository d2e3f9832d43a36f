use serenity::model::channel::Message;
use serenity::prelude::Context;
use crate::commands::BotContext;
use crate::services::rate_service;

pub async fn execute(ctx: &Context, msg: &Message, text: &str) -> Result<(), String> {
    let state = BotContext::from_ctx(ctx).await?;
    let user_id = msg.author.id.get() as i64;

    let reply = rate_service::answer(&state.pool, &state.rates, state.config.locale, user_id, text).await?;

    msg.reply(ctx, reply).await.map_err(|e| e.to_string())?;

    Ok(())
}
