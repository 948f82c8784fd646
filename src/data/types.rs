use serde::{Deserialize, Serialize};

/// Latest price information for a ticker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    pub current_price: f64,
    pub previous_close: Option<f64>,
    pub change_percent: f64,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedStats {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

/// Result of a best-effort side call.
///
/// Enrichment failures are expected and common, so they travel as data
/// rather than as errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Enrichment<T> {
    Available { data: T },
    Unavailable { reason: String },
    /// Enrichment was never attempted
    Pending,
}

impl<T> Enrichment<T> {
    pub fn available(data: T) -> Self {
        Enrichment::Available { data }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Enrichment::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::available(data),
            Err(e) => Self::unavailable(e.to_string()),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Enrichment::Available { data } => Some(data),
            _ => None,
        }
    }
}

/// Everything the analyst sees about a ticker in one turn. Built fresh every
/// time, never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub price_data: Option<PriceData>,
    pub news: Enrichment<Vec<NewsItem>>,
    pub stats: Enrichment<DetailedStats>,
}

impl MarketSnapshot {
    pub fn new(ticker: impl Into<String>, price_data: Option<PriceData>) -> Self {
        Self {
            ticker: ticker.into(),
            price_data,
            news: Enrichment::Pending,
            stats: Enrichment::Pending,
        }
    }

    pub fn unavailable(ticker: impl Into<String>) -> Self {
        Self::new(ticker, None)
    }

    /// `0.0` when there is no price data; sizing treats that as invalid.
    pub fn current_price(&self) -> f64 {
        self.price_data
            .as_ref()
            .map(|p| p.current_price)
            .unwrap_or(0.0)
    }
}
