//! The autonomous decision-and-execution cycle.
//!
//! Each ticker runs FETCH -> ENRICH -> ANALYZE -> NOTIFY_ANALYSIS, then for a
//! BUY/SELL signal with trading enabled SIZE -> EXECUTE -> NOTIFY_TRADE.
//! Tickers run strictly one after another; a failing ticker is reported and
//! the loop moves on.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::agents::{AnalysisEngine, Signal};
use crate::config::{AgentPolicy, PolicyStore};
use crate::constants::schedule::{DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_CYCLE_INTERVAL_SECS};
use crate::data::{Enrichment, MarketDataProvider, MarketResult};
use crate::error::AgentError;
use crate::exchange::{Ledger, OrderRequest, OrderResult, Side};
use crate::services::notifier::{Notifier, SIMULATED_MARKER};
use crate::services::shutdown::ShutdownListener;
use crate::services::sizing::{resolve_quantity, SkipReason};
use crate::services::status::AgentStatus;

/// How one ticker's turn ended when nothing went wrong.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickerOutcome {
    /// No price data; nothing was analysed
    NoData,
    Hold,
    PolicyDisabled {
        signal: Signal,
    },
    Skipped {
        side: Side,
        reason: SkipReason,
    },
    Rejected {
        side: Side,
        qty: u64,
        reason: String,
    },
    Executed {
        side: Side,
        qty: u64,
        order_id: String,
        simulated: bool,
        /// Quantity came from the fallback rather than the sizer
        fallback_qty: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub struct AgentLoop {
    watchlist: Vec<String>,
    market: Arc<dyn MarketDataProvider>,
    analyst: Box<dyn AnalysisEngine>,
    /// Used whenever the policy names no model
    startup_model: String,
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    policy: PolicyStore,
    status: AgentStatus,
    cycle_interval: Duration,
    call_timeout: Duration,
}

impl AgentLoop {
    pub fn new(
        watchlist: Vec<String>,
        market: Arc<dyn MarketDataProvider>,
        analyst: Box<dyn AnalysisEngine>,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
        policy: PolicyStore,
    ) -> Self {
        let status = AgentStatus::new();
        status.set_model(analyst.model());
        Self {
            watchlist,
            market,
            startup_model: analyst.model().to_string(),
            analyst,
            ledger,
            notifier,
            policy,
            status,
            cycle_interval: Duration::from_secs(DEFAULT_CYCLE_INTERVAL_SECS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        status.set_model(self.analyst.model());
        self.status = status;
        self
    }

    pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = interval;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn status(&self) -> &AgentStatus {
        &self.status
    }

    pub fn analyst_model(&self) -> &str {
        self.analyst.model()
    }

    /// Runs cycles until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: ShutdownListener) {
        info!(
            "🚀 [LOOP] Starting background monitor for: {:?}",
            self.watchlist
        );
        self.status.set_running(true);

        loop {
            let summary = self.run_cycle(&mut shutdown).await;
            if summary.cancelled {
                break;
            }

            let cycles = self.status.cycle_completed();
            info!(
                "⏳ [LOOP] Cycle {} complete ({} ok, {} failed). Waiting {}s...",
                cycles,
                summary.succeeded,
                summary.failed,
                self.cycle_interval.as_secs()
            );

            tokio::select! {
                _ = tokio::time::sleep(self.cycle_interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        self.status.set_running(false);
        info!("🛑 [LOOP] Monitor stopped");
    }

    /// One pass over the watchlist. Stops early, without touching the
    /// remaining tickers, once shutdown is requested.
    pub async fn run_cycle(&mut self, shutdown: &mut ShutdownListener) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let watchlist = self.watchlist.clone();

        for ticker in &watchlist {
            if shutdown.is_shutdown() {
                info!("🛑 [LOOP] Shutdown requested, leaving cycle before {}", ticker);
                summary.cancelled = true;
                break;
            }

            summary.attempted += 1;
            let result = tokio::select! {
                res = self.run_ticker(ticker) => res,
                _ = shutdown.recv() => {
                    warn!("🛑 [LOOP] Shutdown requested while processing {}", ticker);
                    summary.cancelled = true;
                    break;
                }
            };

            match &result {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    info!("✅ [LOOP] {} finished: {:?}", ticker, outcome);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("❌ [LOOP] Error in monitor cycle for {}: {}", ticker, e);
                    self.notifier
                        .notify_failure(ticker, &format!("Monitor cycle error: {}", e));
                }
            }
            self.status.record(ticker, &result);
        }

        summary
    }

    /// Reloads the policy, hot-swaps the analyst model if it changed, then
    /// runs the ticker's turn against that policy.
    pub async fn run_ticker(&mut self, ticker: &str) -> Result<TickerOutcome, AgentError> {
        let policy = self.policy.load();
        self.sync_model(&policy);
        self.run_once(ticker, &policy).await
    }

    fn sync_model(&mut self, policy: &AgentPolicy) {
        let model = policy.model.as_deref().unwrap_or(&self.startup_model);
        if model != self.analyst.model() {
            info!("🔀 [LOOP] Switching analyst model to: {}", model);
            self.analyst.set_model(model.to_string());
        }
        self.status.set_model(self.analyst.model());
    }

    /// A single decision cycle for one ticker under an explicit policy.
    pub async fn run_once(
        &self,
        ticker: &str,
        policy: &AgentPolicy,
    ) -> Result<TickerOutcome, AgentError> {
        info!("🔄 [LOOP] --- Autonomous Cycle for {} ---", ticker);

        // FETCH
        let mut snapshot = self
            .bounded("market data", self.market.fetch_snapshot(ticker))
            .await?;
        if snapshot.price_data.is_none() {
            warn!("📉 [LOOP] Failed to fetch data for {}", ticker);
            return Ok(TickerOutcome::NoData);
        }

        // ENRICH
        info!("📰 [LOOP] Fetching latest news for {}...", ticker);
        snapshot.news = self.enrich(ticker, "news", self.market.fetch_news(ticker)).await;
        snapshot.stats = self
            .enrich(ticker, "stats", self.market.fetch_stats(ticker))
            .await;

        // ANALYZE
        info!("🧠 [LOOP] Analyzing {}...", ticker);
        let analysis = self
            .bounded("analysis", self.analyst.analyze(ticker, &snapshot))
            .await?;

        // NOTIFY_ANALYSIS
        self.notifier
            .notify_analysis(ticker, analysis.signal, &analysis.reasoning);

        // DECIDE_TRADE
        let Some(side) = analysis.signal.side() else {
            return Ok(TickerOutcome::Hold);
        };
        if !policy.autonomous_enabled {
            info!(
                "⏸️ [LOOP] Skipping autonomous trade for {}: Disabled in config.",
                ticker
            );
            return Ok(TickerOutcome::PolicyDisabled {
                signal: analysis.signal,
            });
        }
        info!("🎯 [LOOP] Autonomous decision: {} {}", analysis.signal, ticker);

        // SIZE
        let portfolio = self
            .bounded("agent portfolio", self.ledger.agent_portfolio())
            .await;
        let sized = match resolve_quantity(side, ticker, portfolio, snapshot.current_price()) {
            Ok(sized) => sized,
            Err(reason) => return Ok(TickerOutcome::Skipped { side, reason }),
        };

        // EXECUTE
        info!(
            "📤 [LOOP] Agent attempting to {} {} shares of {}...",
            side.as_str().to_uppercase(),
            sized.qty,
            ticker
        );
        let order = OrderRequest::agent(ticker, sized.qty, side);
        let result = self
            .bounded("order placement", self.ledger.place_order(order))
            .await?;

        let simulated = result.is_simulated();
        let fill = match result {
            OrderResult::Rejected { reason } => {
                warn!("🚫 [LOOP] Trade failed/rejected for {}: {}", ticker, reason);
                self.notifier.notify_failure(
                    ticker,
                    &format!(
                        "{} {} rejected: {}",
                        side.as_str().to_uppercase(),
                        sized.qty,
                        reason
                    ),
                );
                return Ok(TickerOutcome::Rejected {
                    side,
                    qty: sized.qty,
                    reason,
                });
            }
            OrderResult::Accepted(fill) => fill,
        };

        // NOTIFY_TRADE
        let marker = if simulated { SIMULATED_MARKER } else { "" };
        self.notifier.notify_trade(
            ticker,
            side,
            sized.qty,
            &format!("{}{}", analysis.reasoning, marker),
        );
        info!(
            "✅ [LOOP] Trade successful for {}: order {} ({})",
            ticker, fill.order_id, fill.status
        );

        Ok(TickerOutcome::Executed {
            side,
            qty: sized.qty,
            order_id: fill.order_id,
            simulated,
            fallback_qty: sized.fallback,
        })
    }

    async fn bounded<T, E, F>(&self, stage: &'static str, fut: F) -> Result<T, AgentError>
    where
        F: Future<Output = Result<T, E>>,
        AgentError: From<E>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => res.map_err(AgentError::from),
            Err(_) => Err(AgentError::Timeout {
                stage,
                secs: self.call_timeout.as_secs(),
            }),
        }
    }

    /// Best-effort side call; every failure becomes an `Unavailable` marker.
    async fn enrich<T, F>(&self, ticker: &str, what: &str, fut: F) -> Enrichment<T>
    where
        F: Future<Output = MarketResult<T>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => {
                if let Err(e) = &res {
                    warn!("📰 [LOOP] {} unavailable for {}: {}", what, ticker, e);
                }
                Enrichment::from_result(res)
            }
            Err(_) => {
                warn!("📰 [LOOP] {} for {} timed out", what, ticker);
                Enrichment::unavailable(format!(
                    "timed out after {}s",
                    self.call_timeout.as_secs()
                ))
            }
        }
    }
}
