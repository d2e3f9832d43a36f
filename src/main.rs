use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn, error};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod db;
mod i18n;
mod models;
mod services;

use api::exchangerate::ExchangeRateClient;
use config::Config;
use services::rate_service::RateService;

struct Handler;

struct DatabasePool;

impl TypeMapKey for DatabasePool {
    type Value = SqlitePool;
}

struct RateServiceKey;

impl TypeMapKey for RateServiceKey {
    type Value = Arc<RateService>;
}

struct ConfigKey;

impl TypeMapKey for ConfigKey {
    type Value = Arc<Config>;
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        commands::handle_message(&ctx, &msg).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            commands::handle_component(&ctx, &component).await;
        }
    }

    async fn ready(&self, _: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["ratebot=debug", "serenity=warn"] {
        match directive.parse::<Directive>() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Invalid log directive {}: {}", directive, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    info!("🤖 Starting currency rate bot...");

    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };

    info!("Initializing database at {}...", config.database_url);
    let pool = match db::init_db(&config.database_url).await {
        Ok(p) => {
            info!("Database initialized successfully");
            p
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    match db::rates::count_rates(&pool).await {
        Ok(0) => info!("Rate cache is empty, first query will fetch from the provider"),
        Ok(n) => info!("Rate cache holds {} rates", n),
        Err(e) => warn!("Failed to inspect rate cache: {}", e),
    }

    let fetcher = match ExchangeRateClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create exchange rate client: {}", e);
            return;
        }
    };
    let rate_service = Arc::new(RateService::new(fetcher, config.base_currency.clone()));
    info!("Quoting rates against {} ({:?} locale)", config.base_currency, config.locale);

    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGES;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Handler)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create client: {}", e);
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<DatabasePool>(pool);
        data.insert::<RateServiceKey>(rate_service);
        data.insert::<ConfigKey>(config);
    }

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }
}
