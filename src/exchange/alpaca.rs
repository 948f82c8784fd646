use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::data::alpaca::{parse_number, rejection_reason, AlpacaClient, OrderRequest as AlpacaOrderRequest};
use crate::data::MarketDataProvider;
use crate::error::LedgerError;

use super::{
    budget::BudgetBook,
    symbols::{is_crypto, to_alpaca_symbol},
    traits::{Ledger, LedgerResult},
    types::{
        AccountSummary, ExecutionMode, OrderFill, OrderRequest, OrderResult, OrderSource,
        PortfolioView, TradeRecord,
    },
};

/// Live ledger: orders go to Alpaca, attribution is kept in the budget book.
pub struct AlpacaLedger {
    inner: AlpacaClient,
    book: BudgetBook,
    market: Arc<dyn MarketDataProvider>,
}

impl AlpacaLedger {
    pub fn new(inner: AlpacaClient, book: BudgetBook, market: Arc<dyn MarketDataProvider>) -> Self {
        Self { inner, book, market }
    }

    async fn estimate_price(&self, ticker: &str) -> Option<f64> {
        match self.market.fetch_snapshot(ticker).await {
            Ok(snapshot) => snapshot.price_data.map(|p| p.current_price).filter(|p| *p > 0.0),
            Err(e) => {
                warn!("📒 [ALPACA] Price estimate failed for {}: {}", ticker, e);
                None
            }
        }
    }
}

#[async_trait]
impl Ledger for AlpacaLedger {
    fn name(&self) -> &'static str {
        "alpaca"
    }

    async fn agent_portfolio(&self) -> LedgerResult<PortfolioView> {
        self.book.portfolio(OrderSource::Agent)
    }

    async fn account(&self) -> LedgerResult<AccountSummary> {
        let a = self.inner.get_account().await?;
        let state = self.book.read()?;
        Ok(AccountSummary {
            ledger: self.name().to_string(),
            equity: a.equity.parse().ok(),
            cash: a.cash.parse().ok(),
            buying_power: a.buying_power.parse().ok(),
            agent_portfolio: state.agent,
            manual_portfolio: state.manual,
        })
    }

    async fn place_order(&self, order: OrderRequest) -> LedgerResult<OrderResult> {
        if order.qty == 0 {
            return Ok(OrderResult::rejected("Quantity must be positive"));
        }

        let estimate = self.estimate_price(&order.ticker).await;

        // Only the agent slice is budgeted locally; manual orders are bounded
        // by the brokerage alone.
        if order.source == OrderSource::Agent {
            let Some(price) = estimate else {
                return Ok(OrderResult::rejected(format!(
                    "No price available for {}",
                    order.ticker
                )));
            };
            if let Some(reason) = self.book.check(&order, price)? {
                return Ok(OrderResult::rejected(reason));
            }
        }

        let time_in_force = if is_crypto(&order.ticker) { "gtc" } else { "day" };
        let api_req = AlpacaOrderRequest {
            symbol: to_alpaca_symbol(&order.ticker),
            qty: order.qty.to_string(),
            side: order.side.as_str().to_string(),
            type_: "market".to_string(),
            time_in_force: time_in_force.to_string(),
            client_order_id: uuid::Uuid::new_v4().to_string(),
        };

        info!(
            "🚀 [ALPACA] Submitting {} {} {} (source: {})",
            order.side, order.qty, api_req.symbol, order.source
        );

        let raw = match self.inner.submit_order(&api_req).await {
            Ok(raw) => raw,
            Err(LedgerError::Http { status, body }) if (400..500).contains(&status) => {
                let reason = rejection_reason(&body);
                warn!("❌ [ALPACA] Order rejected ({}): {}", status, reason);
                return Ok(OrderResult::rejected(reason));
            }
            Err(e) => return Err(e),
        };

        let order_id = raw
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let price = parse_number(raw.get("filled_avg_price")).or(estimate);

        match price {
            Some(p) => {
                if let Err(e) = self.book.record(&order, p, order_id.clone(), ExecutionMode::Live) {
                    error!("📒 [ALPACA] Order {} placed but not recorded: {}", order_id, e);
                }
            }
            None => warn!(
                "📒 [ALPACA] Order {} placed without a price; budget book not updated",
                order_id
            ),
        }

        Ok(OrderResult::Accepted(OrderFill {
            order_id,
            ticker: order.ticker,
            side: order.side,
            qty: order.qty,
            price,
            source: order.source,
            status,
            mode: ExecutionMode::Live,
            submitted_at: Utc::now(),
        }))
    }

    async fn trade_history(&self) -> LedgerResult<Vec<TradeRecord>> {
        Ok(self.book.read()?.history)
    }
}
