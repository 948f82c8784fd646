//! In-memory collaborators for driving the agent loop without network,
//! brokerage or LLM access.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::agents::{AnalysisEngine, AnalysisResult, Signal};
use crate::data::{DetailedStats, MarketDataProvider, MarketResult, MarketSnapshot, NewsItem, PriceData};
use crate::error::{AnalysisError, LedgerError, MarketDataError};
use crate::exchange::{
    AccountSummary, ExecutionMode, Ledger, LedgerResult, OrderFill, OrderRequest, OrderResult,
    PortfolioView, TradeRecord,
};
use crate::services::notifier::Notifier;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shared, ordered record of calls across several mocks, e.g.
/// `"notify_analysis:AAPL"` then `"place_order:AAPL"`.
#[derive(Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: &str, ticker: &str) {
        lock(&self.entries).push(format!("{}:{}", call, ticker));
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }
}

// ============= Market data =============

#[derive(Default)]
pub struct MockMarketData {
    prices: Mutex<HashMap<String, f64>>,
    failing: Mutex<HashSet<String>>,
    news_fails: AtomicBool,
    snapshot_calls: Mutex<Vec<String>>,
    news_calls: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, ticker: &str, price: f64) -> Self {
        self.set_price(ticker, price);
        self
    }

    pub fn set_price(&self, ticker: &str, price: f64) {
        lock(&self.prices).insert(ticker.to_string(), price);
    }

    /// `fetch_snapshot` for this ticker fails at the transport level.
    pub fn fail_ticker(self, ticker: &str) -> Self {
        lock(&self.failing).insert(ticker.to_string());
        self
    }

    pub fn fail_news(self) -> Self {
        self.news_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn snapshot_calls(&self) -> Vec<String> {
        lock(&self.snapshot_calls).clone()
    }

    pub fn news_calls(&self) -> usize {
        self.news_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch_snapshot(&self, ticker: &str) -> MarketResult<MarketSnapshot> {
        lock(&self.snapshot_calls).push(ticker.to_string());
        if lock(&self.failing).contains(ticker) {
            return Err(MarketDataError::Unexpected(format!("{} feed unreachable", ticker)));
        }
        let price = lock(&self.prices).get(ticker).copied();
        Ok(match price {
            Some(current_price) => MarketSnapshot::new(
                ticker,
                Some(PriceData {
                    current_price,
                    previous_close: Some(current_price),
                    change_percent: 0.0,
                    day_high: None,
                    day_low: None,
                    volume: None,
                    currency: Some("USD".to_string()),
                }),
            ),
            None => MarketSnapshot::unavailable(ticker),
        })
    }

    async fn fetch_news(&self, ticker: &str) -> MarketResult<Vec<NewsItem>> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        if self.news_fails.load(Ordering::SeqCst) {
            return Err(MarketDataError::Http {
                status: 429,
                body: "Too Many Requests".to_string(),
            });
        }
        Ok(vec![NewsItem {
            title: format!("{} holds steady", ticker),
            publisher: "Mock Wire".to_string(),
        }])
    }

    async fn fetch_stats(&self, _ticker: &str) -> MarketResult<DetailedStats> {
        Ok(DetailedStats::default())
    }
}

// ============= Analysis =============

#[derive(Clone, Debug, PartialEq)]
pub struct AnalystCall {
    pub ticker: String,
    pub model: String,
    pub had_news: bool,
}

pub struct MockAnalyst {
    model: String,
    signals: HashMap<String, AnalysisResult>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<AnalystCall>>>,
}

impl MockAnalyst {
    /// Answers HOLD for every ticker unless told otherwise.
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            signals: HashMap::new(),
            failing: HashSet::new(),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_signal(mut self, ticker: &str, signal: Signal, reasoning: &str) -> Self {
        self.signals
            .insert(ticker.to_string(), AnalysisResult::new(signal, reasoning));
        self
    }

    pub fn failing_on(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared call log; stays readable after the analyst is boxed.
    pub fn calls(&self) -> Arc<Mutex<Vec<AnalystCall>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl AnalysisEngine for MockAnalyst {
    fn model(&self) -> &str {
        &self.model
    }

    fn set_model(&mut self, model: String) {
        self.model = model;
    }

    async fn analyze(
        &self,
        ticker: &str,
        snapshot: &MarketSnapshot,
    ) -> Result<AnalysisResult, AnalysisError> {
        lock(&self.calls).push(AnalystCall {
            ticker: ticker.to_string(),
            model: self.model.clone(),
            had_news: snapshot.news.data().is_some_and(|n| !n.is_empty()),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(ticker) {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(self.signals.get(ticker).cloned().unwrap_or_default())
    }
}

// ============= Ledger =============

#[derive(Clone, Debug, PartialEq)]
pub enum MockFill {
    Live,
    Simulated,
    Reject(String),
}

pub struct MockLedger {
    portfolio: Mutex<Result<PortfolioView, String>>,
    fill: Mutex<MockFill>,
    orders: Mutex<Vec<OrderRequest>>,
    portfolio_reads: AtomicUsize,
    journal: Option<CallJournal>,
}

impl MockLedger {
    pub fn new(portfolio: PortfolioView) -> Self {
        Self {
            portfolio: Mutex::new(Ok(portfolio)),
            fill: Mutex::new(MockFill::Live),
            orders: Mutex::new(Vec::new()),
            portfolio_reads: AtomicUsize::new(0),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_cash(cash: f64) -> Self {
        Self::new(PortfolioView {
            cash,
            ..Default::default()
        })
    }

    pub fn set_portfolio(&self, portfolio: PortfolioView) {
        *lock(&self.portfolio) = Ok(portfolio);
    }

    /// Every subsequent `agent_portfolio` call fails as malformed.
    pub fn break_portfolio(&self, reason: &str) {
        *lock(&self.portfolio) = Err(reason.to_string());
    }

    pub fn set_fill(&self, fill: MockFill) {
        *lock(&self.fill) = fill;
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        lock(&self.orders).clone()
    }

    pub fn portfolio_reads(&self) -> usize {
        self.portfolio_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn agent_portfolio(&self) -> LedgerResult<PortfolioView> {
        self.portfolio_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(journal) = &self.journal {
            journal.record("agent_portfolio", "agent");
        }
        lock(&self.portfolio).clone().map_err(LedgerError::Malformed)
    }

    async fn account(&self) -> LedgerResult<AccountSummary> {
        let agent = lock(&self.portfolio).clone().map_err(LedgerError::Malformed)?;
        Ok(AccountSummary {
            ledger: self.name().to_string(),
            equity: Some(agent.book_value()),
            cash: Some(agent.cash),
            buying_power: Some(agent.cash),
            agent_portfolio: agent,
            manual_portfolio: PortfolioView::default(),
        })
    }

    async fn place_order(&self, order: OrderRequest) -> LedgerResult<OrderResult> {
        if let Some(journal) = &self.journal {
            journal.record("place_order", &order.ticker);
        }
        lock(&self.orders).push(order.clone());
        let mode = match lock(&self.fill).clone() {
            MockFill::Reject(reason) => return Ok(OrderResult::rejected(reason)),
            MockFill::Live => ExecutionMode::Live,
            MockFill::Simulated => ExecutionMode::Simulation,
        };
        Ok(OrderResult::Accepted(OrderFill {
            order_id: format!("mock-{}", uuid::Uuid::new_v4()),
            ticker: order.ticker,
            side: order.side,
            qty: order.qty,
            price: None,
            source: order.source,
            status: "accepted".to_string(),
            mode,
            submitted_at: Utc::now(),
        }))
    }

    async fn trade_history(&self) -> LedgerResult<Vec<TradeRecord>> {
        Ok(Vec::new())
    }
}

// ============= Notifications =============

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Analysis {
        ticker: String,
        signal: Signal,
        reasoning: String,
    },
    Trade {
        ticker: String,
        side: crate::exchange::Side,
        qty: u64,
        reasoning: String,
    },
    Failure {
        ticker: String,
        detail: String,
    },
}

#[derive(Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
    journal: Option<CallJournal>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    fn push(&self, call: &str, notification: Notification) {
        if let Some(journal) = &self.journal {
            let ticker = match &notification {
                Notification::Analysis { ticker, .. }
                | Notification::Trade { ticker, .. }
                | Notification::Failure { ticker, .. } => ticker,
            };
            journal.record(call, ticker);
        }
        lock(&self.entries).push(notification);
    }

    pub fn entries(&self) -> Vec<Notification> {
        lock(&self.entries).clone()
    }

    pub fn analyses(&self) -> Vec<Notification> {
        self.entries()
            .into_iter()
            .filter(|n| matches!(n, Notification::Analysis { .. }))
            .collect()
    }

    pub fn trades(&self) -> Vec<Notification> {
        self.entries()
            .into_iter()
            .filter(|n| matches!(n, Notification::Trade { .. }))
            .collect()
    }

    pub fn failures(&self) -> Vec<Notification> {
        self.entries()
            .into_iter()
            .filter(|n| matches!(n, Notification::Failure { .. }))
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_analysis(&self, ticker: &str, signal: Signal, reasoning: &str) {
        self.push("notify_analysis", Notification::Analysis {
            ticker: ticker.to_string(),
            signal,
            reasoning: reasoning.to_string(),
        });
    }

    fn notify_trade(&self, ticker: &str, side: crate::exchange::Side, qty: u64, reasoning: &str) {
        self.push("notify_trade", Notification::Trade {
            ticker: ticker.to_string(),
            side,
            qty,
            reasoning: reasoning.to_string(),
        });
    }

    fn notify_failure(&self, ticker: &str, detail: &str) {
        self.push("notify_failure", Notification::Failure {
            ticker: ticker.to_string(),
            detail: detail.to_string(),
        });
    }
}
