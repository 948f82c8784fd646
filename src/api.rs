use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::agents::AnalysisEngine;
use crate::config::{AgentPolicy, AppConfig, PolicyStore};
use crate::constants::schedule::STOP_GRACE;
use crate::data::MarketDataProvider;
use crate::exchange::{Ledger, OrderRequest, OrderResult, Side};
use crate::services::agent_loop::AgentLoop;
use crate::services::notifier::Notifier;
use crate::services::reporting::ActivityReporter;
use crate::services::shutdown::{self, ShutdownHandle, ShutdownListener};
use crate::services::status::AgentStatus;

pub type AnalystFactory = Arc<dyn Fn() -> Box<dyn AnalysisEngine> + Send + Sync>;

/// A spawned monitoring loop and the means to stop it.
pub struct LoopRunner {
    handle: JoinHandle<()>,
    shutdown: ShutdownHandle,
}

pub struct AppState {
    pub trading_handle: Mutex<Option<LoopRunner>>,
    pub config: AppConfig,
    pub market: Arc<dyn MarketDataProvider>,
    pub ledger: Arc<dyn Ledger>,
    pub notifier: Arc<dyn Notifier>,
    pub analyst_factory: AnalystFactory,
    pub policy: PolicyStore,
    pub status: AgentStatus,
    pub reporter: ActivityReporter,
}

impl AppState {
    pub fn build_loop(&self) -> AgentLoop {
        AgentLoop::new(
            self.config.watchlist.clone(),
            self.market.clone(),
            (self.analyst_factory)(),
            self.ledger.clone(),
            self.notifier.clone(),
            self.policy.clone(),
        )
        .with_status(self.status.clone())
        .with_cycle_interval(self.config.cycle_interval())
        .with_call_timeout(self.config.call_timeout())
    }

    pub fn is_running(&self) -> bool {
        self.trading_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|runner| !runner.handle.is_finished())
    }

    /// Spawns the loop unless one is already running.
    pub fn start_loop(&self) -> bool {
        let mut handle_lock = self.trading_handle.lock().unwrap_or_else(|e| e.into_inner());

        if handle_lock
            .as_ref()
            .is_some_and(|runner| !runner.handle.is_finished())
        {
            return false;
        }

        let (shutdown, listener) = shutdown::channel();
        let agent = self.build_loop();
        let handle = tokio::spawn(agent.run(listener));
        *handle_lock = Some(LoopRunner { handle, shutdown });
        info!("🚀 [API] Agent loop started");
        true
    }

    /// Signals the loop and waits up to `STOP_GRACE` before aborting it.
    pub async fn stop_loop(&self) -> bool {
        let runner = self
            .trading_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let Some(LoopRunner { mut handle, shutdown }) = runner else {
            return false;
        };

        shutdown.trigger();
        if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
            warn!("🛑 [API] Agent loop did not stop within {:?}, aborting", STOP_GRACE);
            handle.abort();
            self.status.set_running(false);
        }
        info!("🛑 [API] Agent loop stopped");
        true
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/start", post(start_trading))
        .route("/stop", post(stop_trading))
        .route("/config", get(get_config).put(put_config))
        .route("/account", get(get_account))
        .route("/history", get(get_history))
        .route("/report", get(get_report))
        .route("/orders", post(place_manual_order))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>, mut shutdown: ShutdownListener) -> std::io::Result<()> {
    let bind = state.config.api.bind.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🌐 [API] Server listening on {}", bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.recv().await })
        .await
}

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.status.snapshot();
    Json(json!({
        "running": state.is_running(),
        "cycles_completed": snapshot.cycles_completed,
        "active_model": snapshot.active_model,
        "watchlist": state.config.watchlist,
        "ledger": state.ledger.name(),
        "tickers": snapshot.tickers,
    }))
}

pub async fn start_trading(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.start_loop() {
        Json(json!({"status": "started"}))
    } else {
        Json(json!({"status": "already_running"}))
    }
}

pub async fn stop_trading(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.stop_loop().await {
        Json(json!({"status": "stopped"}))
    } else {
        Json(json!({"status": "not_running"}))
    }
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.policy.load())
}

pub async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(policy): Json<AgentPolicy>,
) -> impl IntoResponse {
    match state.policy.save(&policy) {
        Ok(()) => (StatusCode::OK, Json(json!(policy))).into_response(),
        Err(e) => {
            error!("⚙️ [API] Failed to save policy: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

pub async fn get_account(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.ledger.account().await {
        Ok(account) => (StatusCode::OK, Json(json!(account))).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.ledger.trade_history().await {
        Ok(history) => (StatusCode::OK, Json(json!(history))).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.reporter.summary())
}

#[derive(Debug, Deserialize)]
pub struct ManualOrder {
    pub ticker: String,
    pub qty: u64,
    pub side: Side,
}

/// Places an order attributed to the manual slice of the account.
pub async fn place_manual_order(
    State(state): State<Arc<AppState>>,
    Json(order): Json<ManualOrder>,
) -> impl IntoResponse {
    if order.qty == 0 || order.ticker.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "ticker and a positive qty are required"})),
        )
            .into_response();
    }

    let request = OrderRequest::manual(order.ticker.trim().to_uppercase(), order.qty, order.side);
    info!(
        "🧾 [API] Manual {} {} x{}",
        request.side, request.ticker, request.qty
    );

    match state.ledger.place_order(request).await {
        Ok(result @ OrderResult::Accepted(_)) => (StatusCode::OK, Json(json!(result))).into_response(),
        Ok(OrderResult::Rejected { reason }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": reason})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
