pub mod help;
pub mod rate;
pub mod start;
pub mod visits;

use std::sync::Arc;
use serenity::model::application::ComponentInteraction;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, error};
use crate::config::Config;
use crate::services::rate_service::RateService;

pub const PREFIX: char = '$';

/// Shared state pulled out of the client's type map
pub struct BotContext {
    pub pool: SqlitePool,
    pub rates: Arc<RateService>,
    pub config: Arc<Config>,
}

impl BotContext {
    pub async fn from_ctx(ctx: &Context) -> Result<Self, String> {
        let data = ctx.data.read().await;
        let pool = data
            .get::<crate::DatabasePool>()
            .ok_or("Database not initialized".to_string())?
            .clone();
        let rates = data
            .get::<crate::RateServiceKey>()
            .ok_or("Rate service not initialized".to_string())?
            .clone();
        let config = data
            .get::<crate::ConfigKey>()
            .ok_or("Configuration not loaded".to_string())?
            .clone();

        Ok(BotContext { pool, rates, config })
    }
}

/// What a message asks the bot to do
#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    Start,
    Rate(&'a str),
    Visits,
    Help,
    /// Bare text in a direct message, read as a currency code
    FreeText(&'a str),
}

/// Decide how to handle a message; `None` means ignore it
pub fn route(content: &str, is_direct: bool) -> Option<Route<'_>> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    if !content.starts_with(PREFIX) {
        // In guild channels only explicit commands are answered
        return is_direct.then_some(Route::FreeText(content));
    }

    let (command, rest) = match content.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (content, ""),
    };

    match command {
        "$start" => Some(Route::Start),
        "$rate" => Some(Route::Rate(rest)),
        "$visits" => Some(Route::Visits),
        "$help" => Some(Route::Help),
        _ => None,
    }
}

pub async fn handle_message(ctx: &Context, msg: &Message) {
    if msg.author.bot {
        return;
    }

    let Some(route) = route(&msg.content, msg.guild_id.is_none()) else {
        return;
    };
    debug!("Routing message from {} as {:?}", msg.author.id, route);

    let result = match route {
        Route::Start => start::execute(ctx, msg).await,
        Route::Rate(text) => rate::execute(ctx, msg, text).await,
        Route::FreeText(text) => rate::execute(ctx, msg, text).await,
        Route::Visits => visits::execute(ctx, msg).await,
        Route::Help => help::execute(ctx, msg).await,
    };

    if let Err(e) = result {
        error!("Error handling message from {}: {}", msg.author.id, e);

        let embed = serenity::builder::CreateEmbed::default()
            .title("Command Error")
            .description(format!("❌ {}", e))
            .color(0xff0000);

        let _ = msg.channel_id
            .send_message(ctx, serenity::builder::CreateMessage::default().embed(embed))
            .await;
    }
}

pub async fn handle_component(ctx: &Context, component: &ComponentInteraction) {
    let result = match component.data.custom_id.as_str() {
        start::RATE_BUTTON_ID => start::handle_rate_button(ctx, component).await,
        other => {
            debug!("Ignoring unknown component {}", other);
            return;
        }
    };

    if let Err(e) = result {
        error!("Error handling button {}: {}", component.data.custom_id, e);
    }
}
