use serenity::builder::{
    CreateActionRow, CreateButton, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage,
};
use serenity::model::application::{ButtonStyle, ComponentInteraction};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use tracing::info;
use crate::commands::BotContext;
use crate::services::visit_service;

/// Custom id of the "Get rate" button
pub const RATE_BUTTON_ID: &str = "rate";

pub async fn execute(ctx: &Context, msg: &Message) -> Result<(), String> {
    let state = BotContext::from_ctx(ctx).await?;
    let user_id = msg.author.id.get() as i64;

    visit_service::log_visit(&state.pool, user_id).await?;
    info!("User {} started the bot", user_id);

    let locale = state.config.locale;
    let button = CreateButton::new(RATE_BUTTON_ID)
        .label(locale.rate_button_label())
        .style(ButtonStyle::Primary);

    msg.channel_id
        .send_message(
            ctx,
            CreateMessage::default()
                .content(locale.greeting(&format!("<@{}>", user_id)))
                .components(vec![CreateActionRow::Buttons(vec![button])]),
        )
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}

/// Swap the greeting for the currency-code prompt
pub async fn handle_rate_button(ctx: &Context, component: &ComponentInteraction) -> Result<(), String> {
    let state = BotContext::from_ctx(ctx).await?;

    component
        .create_response(
            ctx,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .content(state.config.locale.currency_prompt())
                    .components(vec![]),
            ),
        )
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}
