use async_trait::async_trait;

use crate::error::LedgerError;

use super::types::{AccountSummary, OrderRequest, OrderResult, PortfolioView, TradeRecord};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Brokerage boundary with agent/manual capital attribution.
///
/// `Err` means the ledger could not be reached or its data could not be
/// interpreted. A brokerage-level refusal is `Ok(OrderResult::Rejected)`.
#[async_trait]
pub trait Ledger: Send + Sync {
    fn name(&self) -> &'static str;

    /// The agent's budget slice, read fresh on every call.
    async fn agent_portfolio(&self) -> LedgerResult<PortfolioView>;

    async fn account(&self) -> LedgerResult<AccountSummary>;

    async fn place_order(&self, order: OrderRequest) -> LedgerResult<OrderResult>;

    async fn trade_history(&self) -> LedgerResult<Vec<TradeRecord>>;
}
