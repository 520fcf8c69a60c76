use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::adapters::PostgresStore;
use crate::config::{Config, LogFormat};
use crate::services::bootstrap::{self, SeedOptions};
use crate::services::PriceFeed;

#[derive(Parser)]
#[command(name = "inditrad-core")]
#[command(about = "Inditrad Core - commodity trading ledger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Price feed commands
    #[command(subcommand)]
    Prices(PriceCommands),

    /// Seed commodities and bootstrap accounts
    Seed,

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum PriceCommands {
    /// Run a single price tick against the database
    Tick,
}

pub fn seed_options(config: &Config) -> SeedOptions {
    SeedOptions {
        superadmin_password: config.bootstrap_superadmin_password.clone(),
        sample_accounts: config.seed_sample_accounts,
    }
}

async fn postgres_store(config: &Config) -> anyhow::Result<Arc<PostgresStore>> {
    if config.uses_memory_store() {
        anyhow::bail!("this command needs a Postgres DATABASE_URL, not the in-memory store");
    }

    let pool = crate::db::create_pool(config).await?;
    Ok(Arc::new(PostgresStore::new(pool)))
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let store = postgres_store(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(store.pool()).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub async fn handle_prices_tick(config: &Config) -> anyhow::Result<()> {
    let store = postgres_store(config).await?;
    let mut rng = match config.price_feed_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let updated = PriceFeed::new(store).tick(&mut rng).await?;

    println!("✓ Updated prices for {} commodities", updated);
    Ok(())
}

pub async fn handle_seed(config: &Config) -> anyhow::Result<()> {
    let store = postgres_store(config).await?;
    let report = bootstrap::seed(store.as_ref(), &seed_options(config)).await?;

    println!("✓ Seed completed");
    println!("  Commodities created: {}", report.commodities);
    println!("  Super admin created: {}", report.superadmin);
    println!("  Sample accounts created: {}", report.sample_accounts);
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Database Max Connections: {}", config.database_max_connections);
    println!("  Price Tick: {}s", config.price_tick_secs);
    println!(
        "  Price Feed Seed: {}",
        config
            .price_feed_seed
            .map_or_else(|| "entropy".to_string(), |seed| seed.to_string())
    );
    println!("  Auth Token Secret: ****");
    println!("  Auth Token TTL: {}s", config.auth_token_ttl_secs);
    println!(
        "  Bootstrap Super Admin: {}",
        if config.bootstrap_superadmin_password.is_some() { "enabled" } else { "disabled" }
    );
    println!("  Seed Sample Accounts: {}", config.seed_sample_accounts);
    println!("  CORS Origins: {:?}", config.cors_allowed_origins);
    println!(
        "  Log Format: {}",
        match config.log_format {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    );

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
