use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::data::MarketDataProvider;
use crate::error::LedgerError;

use super::{
    budget::{BudgetBook, FillOutcome},
    traits::{Ledger, LedgerResult},
    types::{
        AccountSummary, ExecutionMode, OrderRequest, OrderResult, OrderSource, PortfolioView,
        TradeRecord,
    },
};

/// Simulated ledger: fills at the current market price and never leaves the
/// process.
pub struct PaperLedger {
    book: BudgetBook,
    market: Arc<dyn MarketDataProvider>,
}

impl PaperLedger {
    pub fn new(book: BudgetBook, market: Arc<dyn MarketDataProvider>) -> Self {
        Self { book, market }
    }
}

#[async_trait]
impl Ledger for PaperLedger {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn agent_portfolio(&self) -> LedgerResult<PortfolioView> {
        self.book.portfolio(OrderSource::Agent)
    }

    async fn account(&self) -> LedgerResult<AccountSummary> {
        let state = self.book.read()?;
        let equity = state.agent.book_value() + state.manual.book_value();
        let cash = state.agent.cash + state.manual.cash;
        Ok(AccountSummary {
            ledger: self.name().to_string(),
            equity: Some(equity),
            cash: Some(cash),
            buying_power: Some(cash),
            agent_portfolio: state.agent,
            manual_portfolio: state.manual,
        })
    }

    async fn place_order(&self, order: OrderRequest) -> LedgerResult<OrderResult> {
        if order.qty == 0 {
            return Ok(OrderResult::rejected("Quantity must be positive"));
        }

        let snapshot = self
            .market
            .fetch_snapshot(&order.ticker)
            .await
            .map_err(LedgerError::from)?;
        let price = match snapshot.price_data {
            Some(p) if p.current_price > 0.0 => p.current_price,
            _ => {
                return Ok(OrderResult::rejected(format!(
                    "No price available for {}",
                    order.ticker
                )))
            }
        };

        let order_id = format!("sim-{}", uuid::Uuid::new_v4());
        match self
            .book
            .fill_checked(&order, price, order_id, ExecutionMode::Simulation)?
        {
            FillOutcome::Filled(record) => {
                info!(
                    "📝 [PAPER] Filled {} {} {} @ ${:.2} (source: {})",
                    record.side, record.qty, record.ticker, record.price, record.source
                );
                Ok(OrderResult::Accepted(record.to_fill("filled")))
            }
            FillOutcome::Refused(reason) => Ok(OrderResult::rejected(reason)),
        }
    }

    async fn trade_history(&self) -> LedgerResult<Vec<TradeRecord>> {
        Ok(self.book.read()?.history)
    }
}
