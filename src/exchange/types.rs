use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who an order is attributed to on the shared account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
    Agent,
    Manual,
}

impl fmt::Display for OrderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSource::Agent => f.write_str("agent"),
            OrderSource::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Live,
    Simulation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub ticker: String,
    pub qty: u64,
    pub side: Side,
    pub source: OrderSource,
}

impl OrderRequest {
    pub fn agent(ticker: impl Into<String>, qty: u64, side: Side) -> Self {
        Self {
            ticker: ticker.into(),
            qty,
            side,
            source: OrderSource::Agent,
        }
    }

    pub fn manual(ticker: impl Into<String>, qty: u64, side: Side) -> Self {
        Self {
            ticker: ticker.into(),
            qty,
            side,
            source: OrderSource::Manual,
        }
    }
}

/// Execution details echoed back for an accepted order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub order_id: String,
    pub ticker: String,
    pub side: Side,
    pub qty: u64,
    pub price: Option<f64>,
    pub source: OrderSource,
    pub status: String,
    pub mode: ExecutionMode,
    pub submitted_at: DateTime<Utc>,
}

/// An order is exactly accepted or rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum OrderResult {
    Accepted(OrderFill),
    Rejected { reason: String },
}

impl OrderResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        OrderResult::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, OrderResult::Accepted(fill) if fill.mode == ExecutionMode::Simulation)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub qty: u64,
    pub avg_price: f64,
}

/// One slice (agent or manual) of the shared brokerage account, in the
/// single canonical shape the decision logic consumes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub cash: f64,
    pub positions: BTreeMap<String, Holding>,
}

impl PortfolioView {
    pub fn held_qty(&self, ticker: &str) -> u64 {
        self.positions.get(ticker).map(|h| h.qty).unwrap_or(0)
    }

    /// Cost-basis value of cash plus holdings.
    pub fn book_value(&self) -> f64 {
        self.cash
            + self
                .positions
                .values()
                .map(|h| h.qty as f64 * h.avg_price)
                .sum::<f64>()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountSummary {
    pub ledger: String,
    pub equity: Option<f64>,
    pub cash: Option<f64>,
    pub buying_power: Option<f64>,
    pub agent_portfolio: PortfolioView,
    pub manual_portfolio: PortfolioView,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ts: DateTime<Utc>,
    pub order_id: String,
    pub ticker: String,
    pub side: Side,
    pub qty: u64,
    pub price: f64,
    pub source: OrderSource,
    pub mode: ExecutionMode,
}

impl TradeRecord {
    pub fn to_fill(&self, status: impl Into<String>) -> OrderFill {
        OrderFill {
            order_id: self.order_id.clone(),
            ticker: self.ticker.clone(),
            side: self.side,
            qty: self.qty,
            price: Some(self.price),
            source: self.source,
            status: status.into(),
            mode: self.mode,
            submitted_at: self.ts,
        }
    }
}
