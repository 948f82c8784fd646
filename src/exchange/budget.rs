//! File-backed book that splits one brokerage account into an agent slice
//! and a manual slice.
//!
//! Every operation re-reads the file so that the agent never sizes against a
//! stale view, even when another process edits the book.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::error::LedgerError;

use super::types::{
    ExecutionMode, OrderRequest, OrderSource, PortfolioView, Side, TradeRecord,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BookState {
    pub agent: PortfolioView,
    pub manual: PortfolioView,
    #[serde(default)]
    pub history: Vec<TradeRecord>,
}

impl BookState {
    pub fn new(agent_cash: f64, manual_cash: f64) -> Self {
        Self {
            agent: PortfolioView {
                cash: agent_cash,
                ..Default::default()
            },
            manual: PortfolioView {
                cash: manual_cash,
                ..Default::default()
            },
            history: Vec::new(),
        }
    }

    pub fn slice(&self, source: OrderSource) -> &PortfolioView {
        match source {
            OrderSource::Agent => &self.agent,
            OrderSource::Manual => &self.manual,
        }
    }

    fn slice_mut(&mut self, source: OrderSource) -> &mut PortfolioView {
        match source {
            OrderSource::Agent => &mut self.agent,
            OrderSource::Manual => &mut self.manual,
        }
    }

    /// Returns the refusal reason when `order` does not fit its slice.
    pub fn check(&self, order: &OrderRequest, price: f64) -> Option<String> {
        if order.qty == 0 {
            return Some("Quantity must be positive".to_string());
        }
        if !price.is_finite() || price <= 0.0 {
            return Some(format!("Invalid price {} for {}", price, order.ticker));
        }

        let slice = self.slice(order.source);
        match order.side {
            Side::Buy => {
                let cost = order.qty as f64 * price;
                if cost > slice.cash {
                    return Some(format!(
                        "Insufficient {} cash for {}: need ${:.2}, have ${:.2}",
                        order.source, order.ticker, cost, slice.cash
                    ));
                }
            }
            Side::Sell => {
                let held = slice.held_qty(&order.ticker);
                if order.qty > held {
                    return Some(format!(
                        "Insufficient {} shares of {}: requested {}, held {}",
                        order.source, order.ticker, order.qty, held
                    ));
                }
            }
        }
        None
    }

    /// Applies a fill to the order's slice without any affordability check.
    pub fn apply(
        &mut self,
        order: &OrderRequest,
        price: f64,
        order_id: String,
        mode: ExecutionMode,
    ) -> TradeRecord {
        let slice = self.slice_mut(order.source);
        let notional = order.qty as f64 * price;

        match order.side {
            Side::Buy => {
                slice.cash -= notional;
                let holding = slice.positions.entry(order.ticker.clone()).or_default();
                let total_qty = holding.qty + order.qty;
                holding.avg_price =
                    (holding.qty as f64 * holding.avg_price + notional) / total_qty as f64;
                holding.qty = total_qty;
            }
            Side::Sell => {
                slice.cash += notional;
                if let Some(holding) = slice.positions.get_mut(&order.ticker) {
                    holding.qty = holding.qty.saturating_sub(order.qty);
                    if holding.qty == 0 {
                        slice.positions.remove(&order.ticker);
                    }
                }
            }
        }

        let record = TradeRecord {
            ts: Utc::now(),
            order_id,
            ticker: order.ticker.clone(),
            side: order.side,
            qty: order.qty,
            price,
            source: order.source,
            mode,
        };
        self.history.push(record.clone());
        record
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FillOutcome {
    Filled(TradeRecord),
    Refused(String),
}

pub struct BudgetBook {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl BudgetBook {
    /// Opens the book at `path`, seeding it with the given cash balances if
    /// the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>, agent_cash: f64, manual_cash: f64) -> Result<Self, LedgerError> {
        let book = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };

        if !book.path.exists() {
            info!(
                "📒 [LEDGER] Creating budget book at {} (agent ${:.2}, manual ${:.2})",
                book.path.display(),
                agent_cash,
                manual_cash
            );
            book.write(&BookState::new(agent_cash, manual_cash))?;
        }
        Ok(book)
    }

    pub fn read(&self) -> Result<BookState, LedgerError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read_unlocked()
    }

    pub fn portfolio(&self, source: OrderSource) -> Result<PortfolioView, LedgerError> {
        let state = self.read()?;
        let view = state.slice(source).clone();
        if !view.cash.is_finite() {
            return Err(LedgerError::Malformed(format!(
                "{} cash is not a finite number",
                source
            )));
        }
        Ok(view)
    }

    pub fn check(&self, order: &OrderRequest, price: f64) -> Result<Option<String>, LedgerError> {
        Ok(self.read()?.check(order, price))
    }

    /// Validates and applies the fill under a single lock.
    pub fn fill_checked(
        &self,
        order: &OrderRequest,
        price: f64,
        order_id: String,
        mode: ExecutionMode,
    ) -> Result<FillOutcome, LedgerError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.read_unlocked()?;
        if let Some(reason) = state.check(order, price) {
            return Ok(FillOutcome::Refused(reason));
        }
        let record = state.apply(order, price, order_id, mode);
        self.write(&state)?;
        Ok(FillOutcome::Filled(record))
    }

    /// Records a fill the brokerage already executed.
    pub fn record(
        &self,
        order: &OrderRequest,
        price: f64,
        order_id: String,
        mode: ExecutionMode,
    ) -> Result<TradeRecord, LedgerError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.read_unlocked()?;
        if order.side == Side::Sell && state.slice(order.source).held_qty(&order.ticker) < order.qty {
            warn!(
                "📒 [LEDGER] Recording {} sell of {} {} beyond tracked holdings",
                order.source, order.qty, order.ticker
            );
        }
        let record = state.apply(order, price, order_id, mode);
        self.write(&state)?;
        Ok(record)
    }

    fn read_unlocked(&self) -> Result<BookState, LedgerError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, state: &BookState) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
