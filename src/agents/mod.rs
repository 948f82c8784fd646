pub mod analyst;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::MarketSnapshot;
use crate::error::AnalysisError;
use crate::exchange::Side;

pub use analyst::{AnalystAgent, LlmAnalyst};

pub trait Agent {
    fn name(&self) -> &str;
    fn system_prompt(&self) -> &str;
}

/// Discrete trade decision for one ticker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Case-insensitive; anything unrecognised is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(Signal::Buy),
            "SELL" => Some(Signal::Sell),
            "HOLD" => Some(Signal::Hold),
            _ => None,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::Hold => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub signal: Signal,
    pub reasoning: String,
}

impl AnalysisResult {
    pub fn new(signal: Signal, reasoning: impl Into<String>) -> Self {
        Self {
            signal,
            reasoning: reasoning.into(),
        }
    }
}

/// Signal-generation subsystem with a hot-swappable model.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    fn model(&self) -> &str;

    fn set_model(&mut self, model: String);

    async fn analyze(
        &self,
        ticker: &str,
        snapshot: &MarketSnapshot,
    ) -> Result<AnalysisResult, AnalysisError>;
}
