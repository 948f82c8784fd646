pub mod alpaca;
pub mod types;
pub mod yahoo;

use async_trait::async_trait;

use crate::error::MarketDataError;

pub use types::{DetailedStats, Enrichment, MarketSnapshot, NewsItem, PriceData};

pub type MarketResult<T> = Result<T, MarketDataError>;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// A snapshot whose `price_data` is `None` means "unavailable"; `Err` is
    /// reserved for transport-level failures.
    async fn fetch_snapshot(&self, ticker: &str) -> MarketResult<MarketSnapshot>;

    async fn fetch_news(&self, ticker: &str) -> MarketResult<Vec<NewsItem>>;

    async fn fetch_stats(&self, _ticker: &str) -> MarketResult<DetailedStats> {
        Ok(DetailedStats::default())
    }
}
