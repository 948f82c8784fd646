pub mod budget;
pub mod factory;
pub mod traits;
pub mod types;

pub mod symbols;

pub mod alpaca;
pub mod paper;

pub use traits::{Ledger, LedgerResult};
pub use types::{
    AccountSummary, ExecutionMode, Holding, OrderFill, OrderRequest, OrderResult, OrderSource,
    PortfolioView, Side, TradeRecord,
};

#[cfg(test)]
mod budget_tests;
