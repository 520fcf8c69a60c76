use clap::Parser;
use inditrad_core::adapters::{MemoryStore, PostgresStore};
use inditrad_core::cli::{self, Cli, Commands, DbCommands, PriceCommands};
use inditrad_core::config::{Config, LogFormat};
use inditrad_core::ports::Store;
use inditrad_core::services::{bootstrap, TokenSigner};
use inditrad_core::{cors_layer, create_app, db, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    );
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    match cli.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::Db(DbCommands::Migrate)) => cli::handle_db_migrate(&config).await,
        Some(Commands::Prices(PriceCommands::Tick)) => cli::handle_prices_tick(&config).await,
        Some(Commands::Seed) => cli::handle_seed(&config).await,
        Some(Commands::Config) => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store; all data is lost on shutdown");
        return run_server(Arc::new(MemoryStore::new()), config).await;
    }

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;
    run_server(Arc::new(PostgresStore::new(pool)), config).await
}

async fn run_server<S: Store + 'static>(store: Arc<S>, config: Config) -> anyhow::Result<()> {
    let report = bootstrap::seed(store.as_ref(), &cli::seed_options(&config)).await?;
    tracing::info!(?report, "Data initialization completed");

    let signer = TokenSigner::new(&config.auth_token_secret, config.auth_token_ttl_secs);
    let state = AppState::new(store, signer);

    // Price feed runs independently of request handling
    tokio::spawn(
        state
            .prices
            .clone()
            .run(config.price_tick_interval(), config.price_feed_seed),
    );

    let app = create_app(state).layer(cors_layer(&config.cors_allowed_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
