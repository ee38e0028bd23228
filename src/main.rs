use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use std::time::Duration;
use tracing::{error, info};

mod db;
mod modules;
mod platform;
mod services;

use modules::invite_tracking::store::EventStore;
use platform::api::BotApi;
use services::authorizer::AuthService;
use services::config::BotConfig;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rollback the specified number of migrations and run all migrations again.
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    refresh_migrations: Option<u32>,
}

// Shared state passed to all update handlers
pub struct Data {
    pub store: EventStore,
    pub auth: AuthService,
}

pub type Error = anyhow::Error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt::init();

    info!("Starting chat guard bot...");

    let config = BotConfig::from_env().context("Failed to load configuration")?;

    let db = db::establish_connection()
        .await
        .context("Failed to connect to database")?;

    use sea_orm_migration::MigratorTrait;
    if let Some(depth) = args.refresh_migrations {
        info!("Refreshing migrations (down {}, then up)...", depth);
        db::migrations::Migrator::down(&db, Some(depth))
            .await
            .context("Failed to rollback migration")?;
    }

    db::migrations::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    if args.refresh_migrations.is_some() {
        info!("Migrations refreshed successfully.");
        std::process::exit(0);
    }

    let api = BotApi::new(config.bot_token.clone());
    let auth = AuthService::new(&config);
    let store = EventStore::new(db);

    let data = Data { store, auth };

    info!("Bot is ready, polling for updates");
    run(&api, &data).await
}

/// Long-polling loop. Each update is handled to completion before the next;
/// a handler failure aborts that single update only.
async fn run(api: &BotApi, data: &Data) -> anyhow::Result<()> {
    let mut offset: Option<i64> = None;

    loop {
        let updates = match api.get_updates(offset, 30).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("Failed to fetch updates: {e}");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            if let Err(e) = services::event_manager::dispatch(api, &update, data).await {
                error!("Error handling update {}: {e:?}", update.update_id);
            }
        }
    }
}
