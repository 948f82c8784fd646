use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::Signal;
use crate::exchange::Side;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEvent {
    pub ts: DateTime<Utc>,
    pub ticker: String,
    pub signal: Signal,
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub ts: DateTime<Utc>,
    pub ticker: String,
    pub side: Side,
    pub qty: u64,
    /// Carries the simulated-execution marker when the fill was not live
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub ts: DateTime<Utc>,
    pub ticker: String,
    pub detail: String,
}

// Global Event Enum
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Analysis(AnalysisEvent),
    Trade(TradeEvent),
    Failure(FailureEvent),
}

impl Event {
    /// Matches the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Analysis(_) => "analysis",
            Event::Trade(_) => "trade",
            Event::Failure(_) => "failure",
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            Event::Analysis(e) => &e.ticker,
            Event::Trade(e) => &e.ticker,
            Event::Failure(e) => &e.ticker,
        }
    }

    pub fn ts(&self) -> DateTime<Utc> {
        match self {
            Event::Analysis(e) => e.ts,
            Event::Trade(e) => e.ts,
            Event::Failure(e) => e.ts,
        }
    }
}
