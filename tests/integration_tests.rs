//! Integration tests for the trading agent.
//! These tests drive the agent loop against the paper ledger and the event
//! bus, with in-memory market data and analysis.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use finsight_agent::agents::Signal;
use finsight_agent::bus::EventBus;
use finsight_agent::config::PolicyStore;
use finsight_agent::error::{AgentError, LedgerError};
use finsight_agent::events::Event;
use finsight_agent::exchange::budget::BudgetBook;
use finsight_agent::exchange::paper::PaperLedger;
use finsight_agent::exchange::{
    ExecutionMode, Ledger, OrderRequest, OrderResult, OrderSource, Side,
};
use finsight_agent::mock::{MockAnalyst, MockMarketData};
use finsight_agent::services::sizing::SkipReason;
use finsight_agent::services::{shutdown, ActivityReporter, AgentLoop, BusNotifier, TickerOutcome};

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("finsight-it-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn paper_ledger(ws: &Workspace, market: Arc<MockMarketData>, agent_cash: f64) -> Arc<PaperLedger> {
    let book = BudgetBook::open(ws.path("ledger.json"), agent_cash, 50_000.0).unwrap();
    Arc::new(PaperLedger::new(book, market))
}

fn agent(
    ws: &Workspace,
    watchlist: &[&str],
    market: Arc<MockMarketData>,
    analyst: MockAnalyst,
    ledger: Arc<PaperLedger>,
    bus: &EventBus,
) -> AgentLoop {
    AgentLoop::new(
        watchlist.iter().map(|t| t.to_string()).collect(),
        market,
        Box::new(analyst),
        ledger,
        Arc::new(BusNotifier::new(bus.clone())),
        PolicyStore::new(ws.path("agent_config.json")),
    )
    .with_call_timeout(Duration::from_secs(5))
    .with_cycle_interval(Duration::from_secs(3600))
}

/// Buy then sell through the paper ledger: only the agent slice moves and
/// every trade is marked simulated on the bus.
#[tokio::test]
async fn test_paper_buy_then_sell_round_trip() {
    let ws = Workspace::new();
    let market = Arc::new(MockMarketData::new().with_price("AAPL", 100.0));
    let ledger = paper_ledger(&ws, market.clone(), 5000.0);
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();

    let buy = MockAnalyst::new("llama3.1").with_signal("AAPL", Signal::Buy, "Strong iPhone cycle");
    let mut buyer = agent(&ws, &["AAPL"], market.clone(), buy, ledger.clone(), &bus);
    let outcome = buyer.run_ticker("AAPL").await.unwrap();
    assert!(matches!(
        outcome,
        TickerOutcome::Executed { side: Side::Buy, qty: 10, simulated: true, .. }
    ));

    let account = ledger.account().await.unwrap();
    assert_eq!(account.agent_portfolio.cash, 4000.0);
    assert_eq!(account.agent_portfolio.held_qty("AAPL"), 10);
    assert_eq!(account.manual_portfolio.cash, 50_000.0);

    assert!(matches!(rx.recv().await.unwrap(), Event::Analysis(a) if a.signal == Signal::Buy));
    match rx.recv().await.unwrap() {
        Event::Trade(t) => {
            assert_eq!(t.qty, 10);
            assert_eq!(t.reasoning, "Strong iPhone cycle (SIMULATED)");
        }
        other => panic!("Expected Trade event, got {:?}", other),
    }

    market.set_price("AAPL", 120.0);
    let sell = MockAnalyst::new("llama3.1").with_signal("AAPL", Signal::Sell, "Take profit");
    let mut seller = agent(&ws, &["AAPL"], market.clone(), sell, ledger.clone(), &bus);
    let outcome = seller.run_ticker("AAPL").await.unwrap();
    assert!(matches!(
        outcome,
        TickerOutcome::Executed { side: Side::Sell, qty: 10, .. }
    ));

    let agent_view = ledger.agent_portfolio().await.unwrap();
    assert_eq!(agent_view.cash, 5200.0);
    assert_eq!(agent_view.held_qty("AAPL"), 0);

    let history = ledger.trade_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r.source == OrderSource::Agent));
    assert!(history.iter().all(|r| r.mode == ExecutionMode::Simulation));
}

/// Manually bought shares are not the agent's to sell.
#[tokio::test]
async fn test_manual_position_is_not_liquidated_by_agent() {
    let ws = Workspace::new();
    let market = Arc::new(MockMarketData::new().with_price("TSLA", 200.0));
    let ledger = paper_ledger(&ws, market.clone(), 1000.0);
    let bus = EventBus::new(64);

    let manual = ledger
        .place_order(OrderRequest::manual("TSLA", 5, Side::Buy))
        .await
        .unwrap();
    assert!(matches!(manual, OrderResult::Accepted(_)));

    let analyst = MockAnalyst::new("llama3.1").with_signal("TSLA", Signal::Sell, "Recall news");
    let mut agent = agent(&ws, &["TSLA"], market, analyst, ledger.clone(), &bus);
    let outcome = agent.run_ticker("TSLA").await.unwrap();

    assert_eq!(
        outcome,
        TickerOutcome::Skipped {
            side: Side::Sell,
            reason: SkipReason::NothingHeld
        }
    );
    let account = ledger.account().await.unwrap();
    assert_eq!(account.manual_portfolio.held_qty("TSLA"), 5);
    assert_eq!(account.agent_portfolio.cash, 1000.0);
}

/// A corrupt book drives the quantity fallback, and the resulting ledger
/// failure is contained to that ticker.
#[tokio::test]
async fn test_corrupt_book_is_isolated_to_the_ticker() {
    let ws = Workspace::new();
    let market = Arc::new(
        MockMarketData::new()
            .with_price("AAPL", 100.0)
            .with_price("NVDA", 100.0),
    );
    let ledger = paper_ledger(&ws, market.clone(), 5000.0);
    std::fs::write(ws.path("ledger.json"), "{\"agent\": [1, 2").unwrap();

    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let analyst = MockAnalyst::new("llama3.1")
        .with_signal("AAPL", Signal::Buy, "x")
        .with_signal("NVDA", Signal::Hold, "y");
    let mut agent = agent(&ws, &["AAPL", "NVDA"], market, analyst, ledger, &bus);

    let err = agent.run_ticker("AAPL").await.unwrap_err();
    assert!(matches!(err, AgentError::Ledger(LedgerError::Malformed(_))));

    let (_handle, mut listener) = shutdown::channel();
    let summary = agent.run_cycle(&mut listener).await;
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);

    let mut failures = 0;
    while let Ok(event) = rx.try_recv() {
        if let Event::Failure(f) = event {
            assert_eq!(f.ticker, "AAPL");
            failures += 1;
        }
    }
    assert_eq!(failures, 1);
}

/// The activity reporter sees everything the agent publishes.
#[tokio::test]
async fn test_activity_log_records_cycle() {
    let ws = Workspace::new();
    let market = Arc::new(
        MockMarketData::new()
            .with_price("AAPL", 100.0)
            .with_price("NVDA", 50.0),
    );
    let ledger = paper_ledger(&ws, market.clone(), 5000.0);
    let bus = EventBus::new(64);
    let reporter = ActivityReporter::new(ws.path("agent_activity.jsonl"));
    let _task = reporter.start(&bus);

    let analyst = MockAnalyst::new("llama3.1")
        .with_signal("AAPL", Signal::Buy, "a")
        .with_signal("NVDA", Signal::Hold, "n");
    let mut agent = agent(&ws, &["AAPL", "NVDA", "BTC-USD"], market, analyst, ledger, &bus);
    let (_handle, mut listener) = shutdown::channel();
    agent.run_cycle(&mut listener).await;

    tokio::time::timeout(Duration::from_secs(2), async {
        while reporter.summary().analyses < 2 || reporter.summary().trades < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let summary = reporter.summary();
    assert_eq!(summary.buy_signals, 1);
    assert_eq!(summary.hold_signals, 1);
    assert_eq!(summary.shares_bought, 10);
    assert!(!summary.per_ticker.contains_key("BTC-USD"));

    let lines = std::fs::read_to_string(ws.path("agent_activity.jsonl")).unwrap();
    assert_eq!(lines.lines().count(), 3);
}
