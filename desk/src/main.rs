//! FXDesk Binary
//!
//! Telegram bot quoting and converting currencies at a locked rate.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxdesk_desk::{Desk, DeskConfig, DeskMetrics, SessionStore, TelegramFrontend};
use fxdesk_fx::{OpenExchangeRatesSource, QuoteEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting FXDesk");

    // Load configuration
    let config = match DeskConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, code = e.error_code(), "Invalid configuration");
            return Err(anyhow::anyhow!("Configuration error: {}", e));
        }
    };

    info!(
        pair = %config.quote.pair,
        spread = %config.quote.spread,
        fetch_timeout_secs = config.quote.fetch_timeout.as_secs(),
        "Configuration loaded"
    );

    let mut source =
        OpenExchangeRatesSource::with_timeout(config.api_key.clone(), config.quote.fetch_timeout);
    if let Some(endpoint) = &config.quote.rates_endpoint {
        info!(endpoint = %endpoint, "Using rate source override");
        source = source.with_endpoint(endpoint.clone());
    }
    let source = Arc::new(source);
    let engine = Arc::new(QuoteEngine::new(source, config.quote.engine_config()));
    let sessions = Arc::new(SessionStore::new());
    let metrics = Arc::new(DeskMetrics::new());

    if let Some(idle_ttl) = config.session.idle_ttl {
        tokio::spawn(sessions.clone().run_sweep_loop(
            idle_ttl,
            config.session.sweep_interval,
            metrics.clone(),
        ));
    }

    let desk = Arc::new(Desk::new(
        engine.clone(),
        sessions,
        metrics.clone(),
        config.quote.pair,
        config.session.clone(),
    ));

    // Runs until Ctrl+C
    TelegramFrontend::new(&config.bot_token).run(desk).await;

    let stats = engine.stats();
    info!(
        metrics = ?metrics.snapshot(),
        cache_hits = stats.cache.hits,
        cache_misses = stats.cache.misses,
        "FXDesk shutdown complete"
    );
    Ok(())
}
