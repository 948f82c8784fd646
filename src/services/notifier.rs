use chrono::Utc;
use tracing::{error, info, warn};

use crate::agents::Signal;
use crate::bus::EventBus;
use crate::events::{AnalysisEvent, Event, FailureEvent, TradeEvent};
use crate::exchange::Side;

/// Appended to a trade's reasoning when the fill was simulated.
pub const SIMULATED_MARKER: &str = " (SIMULATED)";

/// Fire-and-forget sink for agent activity. Implementations must not fail the
/// caller.
pub trait Notifier: Send + Sync {
    fn notify_analysis(&self, ticker: &str, signal: Signal, reasoning: &str);

    fn notify_trade(&self, ticker: &str, side: Side, qty: u64, reasoning: &str);

    fn notify_failure(&self, ticker: &str, detail: &str);
}

pub fn analysis_message(ticker: &str, signal: Signal, reasoning: &str) -> String {
    format!("Analysis for {}: {}. Reasoning: {}", ticker, signal, reasoning)
}

pub fn trade_message(ticker: &str, side: Side, qty: u64, reasoning: &str) -> String {
    format!(
        "Trade Executed: {} {} shares of {}. Reasoning: {}",
        side.as_str().to_uppercase(),
        qty,
        ticker,
        reasoning
    )
}

/// Logs each notification and publishes it on the event bus.
#[derive(Clone)]
pub struct BusNotifier {
    bus: EventBus,
}

impl BusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn publish(&self, event: Event) {
        self.bus.emit(event);
    }
}

impl Notifier for BusNotifier {
    fn notify_analysis(&self, ticker: &str, signal: Signal, reasoning: &str) {
        info!("🔔 [NOTIFIER] {}", analysis_message(ticker, signal, reasoning));
        self.publish(Event::Analysis(AnalysisEvent {
            ts: Utc::now(),
            ticker: ticker.to_string(),
            signal,
            reasoning: reasoning.to_string(),
        }));
    }

    fn notify_trade(&self, ticker: &str, side: Side, qty: u64, reasoning: &str) {
        warn!(
            "🔔 [NOTIFIER] ACTION REQUIRED / TRADE EXECUTED: {}",
            trade_message(ticker, side, qty, reasoning)
        );
        self.publish(Event::Trade(TradeEvent {
            ts: Utc::now(),
            ticker: ticker.to_string(),
            side,
            qty,
            reasoning: reasoning.to_string(),
        }));
    }

    fn notify_failure(&self, ticker: &str, detail: &str) {
        error!("🔔 [NOTIFIER] Failure for {}: {}", ticker, detail);
        self.publish(Event::Failure(FailureEvent {
            ts: Utc::now(),
            ticker: ticker.to_string(),
            detail: detail.to_string(),
        }));
    }
}
