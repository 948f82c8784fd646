use std::sync::{Arc, Mutex};

use finsight_agent::agents::{AnalysisEngine, LlmAnalyst};
use finsight_agent::api::{run_server, AnalystFactory, AppState};
use finsight_agent::bus::EventBus;
use finsight_agent::config::{AppConfig, PolicyStore};
use finsight_agent::constants::EVENT_BUS_CAPACITY;
use finsight_agent::data::{yahoo::YahooFinanceClient, MarketDataProvider};
use finsight_agent::exchange::factory::build_ledger;
use finsight_agent::llm::LLMClient;
use finsight_agent::services::{shutdown, ActivityReporter, AgentStatus, BusNotifier};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting FinSight Agent...");

    // Load Configuration
    let config = AppConfig::load()?;
    info!(
        "Loaded Configuration: watchlist={:?}, interval={}s, mode={:?}",
        config.watchlist, config.cycle_interval_secs, config.trading.mode
    );

    // Event bus + activity log
    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let reporter = ActivityReporter::new(config.notifier.log_path.clone());
    let _reporter_task = reporter.start(&event_bus);
    let notifier = Arc::new(BusNotifier::new(event_bus.clone()));

    // Collaborators
    let market: Arc<dyn MarketDataProvider> = Arc::new(YahooFinanceClient::new(
        config.market_data.base_url.clone(),
        config.market_data.news_limit,
    )?);
    let ledger = build_ledger(&config, market.clone())?;

    info!("Initializing AI Client...");
    let api_key = config.llm.api_key.clone().unwrap_or_default();
    let base_url = config.llm.base_url.clone();
    if let Some(url) = &base_url {
        info!("Using OpenAI-compatible Base URL: {}", url);
    }
    info!("Using LLM Model: {}", config.llm.model);
    let llm_client = LLMClient::new(api_key, base_url, config.llm.model.clone())
        .with_temperature(config.llm.temperature)
        .with_json_output(config.llm.json_output);
    let analyst_factory: AnalystFactory = Arc::new(move || {
        Box::new(LlmAnalyst::new(llm_client.clone())) as Box<dyn AnalysisEngine>
    });

    let app_state = Arc::new(AppState {
        trading_handle: Mutex::new(None),
        policy: PolicyStore::new(config.policy_path.clone()),
        config,
        market,
        ledger,
        notifier,
        analyst_factory,
        status: AgentStatus::new(),
        reporter,
    });

    // The agent runs from boot; /stop and /start control it afterwards
    app_state.start_loop();

    let (process_shutdown, server_shutdown) = shutdown::channel();
    let mut server = tokio::spawn(run_server(app_state.clone(), server_shutdown));

    let early_exit = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Ctrl-C received, shutting down...");
            None
        }
        res = &mut server => Some(res),
    };

    process_shutdown.trigger();
    app_state.stop_loop().await;

    let server_result = match early_exit {
        Some(res) => res,
        None => server.await,
    };
    match server_result {
        Ok(Err(e)) => error!("API server error: {}", e),
        Err(e) => error!("API server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("FinSight Agent stopped");
    Ok(())
}
