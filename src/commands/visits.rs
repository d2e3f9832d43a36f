use serenity::model::channel::Message;
use serenity::prelude::Context;
use tracing::warn;
use crate::commands::BotContext;
use crate::services::visit_service;

pub async fn execute(ctx: &Context, msg: &Message) -> Result<(), String> {
    let state = BotContext::from_ctx(ctx).await?;
    let user_id = msg.author.id.get() as i64;

    if !state.config.is_admin(user_id) {
        warn!("User {} tried to read visit stats", user_id);
        return Err("You are not allowed to use this command".to_string());
    }

    let stats = visit_service::get_visit_stats(&state.pool).await?;

    msg.channel_id
        .say(ctx, visit_service::create_visits_text(&stats))
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}
