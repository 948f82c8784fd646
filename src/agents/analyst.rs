use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write as _;
use tracing::{info, warn};

use crate::agents::{Agent, AnalysisEngine, AnalysisResult, Signal};
use crate::data::{Enrichment, MarketSnapshot};
use crate::error::AnalysisError;
use crate::llm::LLMClient;

pub struct AnalystAgent;

impl Agent for AnalystAgent {
    fn name(&self) -> &str {
        "Financial-Analyst"
    }

    fn system_prompt(&self) -> &str {
        r#"You are a Financial Analyst AI. You receive a market snapshot for one ticker: the current price, the daily change, the intraday range, recent news headlines and key statistics.

Decide whether the ticker should be bought, sold or held right now.
Be conservative. If the data is ambiguous or weak, return "HOLD".
Missing news or statistics are not a reason to trade.

Output MUST be a valid JSON object with the following structure:
{
    "signal": "BUY" | "SELL" | "HOLD",
    "reasoning": "Your concise reasoning here..."
}
"#
    }
}

/// LLM-backed analysis engine.
pub struct LlmAnalyst {
    agent: AnalystAgent,
    llm: LLMClient,
}

impl LlmAnalyst {
    pub fn new(llm: LLMClient) -> Self {
        Self {
            agent: AnalystAgent,
            llm,
        }
    }
}

#[async_trait]
impl AnalysisEngine for LlmAnalyst {
    fn model(&self) -> &str {
        self.llm.model()
    }

    fn set_model(&mut self, model: String) {
        self.llm.set_model(model);
    }

    async fn analyze(
        &self,
        ticker: &str,
        snapshot: &MarketSnapshot,
    ) -> Result<AnalysisResult, AnalysisError> {
        let query = render_snapshot(ticker, snapshot);
        info!("🤖 [AGENT] Sending request to {}...", self.agent.name());
        let response = self.llm.chat(self.agent.system_prompt(), &query).await?;
        info!("🤖 [AGENT] Response from {}: {}", self.agent.name(), response);
        Ok(parse_analysis(&response))
    }
}

#[derive(Deserialize)]
struct RawAnalysis {
    signal: Option<String>,
    reasoning: Option<String>,
}

fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Missing or unknown fields default to HOLD and an empty reasoning; a
/// response with no JSON at all is HOLD with the raw text as reasoning.
pub fn parse_analysis(response: &str) -> AnalysisResult {
    let raw = extract_json(response).and_then(|json| serde_json::from_str::<RawAnalysis>(json).ok());

    let Some(raw) = raw else {
        warn!("🤖 [AGENT] Unparsable analysis, defaulting to HOLD");
        return AnalysisResult::new(Signal::Hold, response.trim());
    };

    let signal = match raw.signal.as_deref() {
        None => Signal::Hold,
        Some(s) => Signal::parse(s).unwrap_or_else(|| {
            warn!("🤖 [AGENT] Unknown signal '{}', defaulting to HOLD", s);
            Signal::Hold
        }),
    };

    AnalysisResult::new(signal, raw.reasoning.unwrap_or_default())
}

/// Renders the enriched snapshot as the analyst's user prompt.
pub fn render_snapshot(ticker: &str, snapshot: &MarketSnapshot) -> String {
    let mut out = format!("Ticker: {}\n", ticker);

    match &snapshot.price_data {
        Some(p) => {
            let _ = writeln!(
                out,
                "Current Price: {:.2} {}",
                p.current_price,
                p.currency.as_deref().unwrap_or("")
            );
            let _ = writeln!(out, "Change: {:+.2}%", p.change_percent);
            if let Some(prev) = p.previous_close {
                let _ = writeln!(out, "Previous Close: {:.2}", prev);
            }
            if let (Some(lo), Some(hi)) = (p.day_low, p.day_high) {
                let _ = writeln!(out, "Day Range: {:.2} - {:.2}", lo, hi);
            }
            if let Some(v) = p.volume {
                let _ = writeln!(out, "Volume: {}", v);
            }
        }
        None => out.push_str("Price data unavailable.\n"),
    }

    match &snapshot.news {
        Enrichment::Available { data } if !data.is_empty() => {
            out.push_str("Recent News:\n");
            for item in data {
                let _ = writeln!(out, "- {} ({})", item.title, item.publisher);
            }
        }
        Enrichment::Available { .. } => out.push_str("Recent News: none.\n"),
        Enrichment::Unavailable { reason } => {
            let _ = writeln!(out, "Recent News: unavailable ({}).", reason);
        }
        Enrichment::Pending => {}
    }

    if let Some(s) = snapshot.stats.data() {
        out.push_str("Key Stats:\n");
        let fields = [
            ("Market Cap", s.market_cap),
            ("Trailing P/E", s.trailing_pe),
            ("Forward P/E", s.forward_pe),
            ("Dividend Yield", s.dividend_yield),
            ("52w High", s.fifty_two_week_high),
            ("52w Low", s.fifty_two_week_low),
        ];
        for (label, value) in fields {
            if let Some(v) = value {
                let _ = writeln!(out, "- {}: {}", label, v);
            }
        }
    }

    out
}
