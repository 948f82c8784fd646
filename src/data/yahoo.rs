use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::constants::market::USER_AGENT;
use crate::error::MarketDataError;

use super::{DetailedStats, MarketDataProvider, MarketResult, MarketSnapshot, NewsItem, PriceData};

/// Thin client over Yahoo Finance's public JSON endpoints.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    news_limit: usize,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>, news_limit: usize) -> Result<Self, MarketDataError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            news_limit,
        })
    }

    /// Each segment is percent-encoded, so a ticker can never add path
    /// components or a query of its own.
    pub fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url, MarketDataError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| MarketDataError::Unexpected(format!("unusable base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<(StatusCode, Value), MarketDataError> {
        debug!("📡 [MARKET] GET {}", url);
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok((status, Value::Null));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MarketDataError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let data: Value = resp.json().await?;
        Ok((status, data))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_snapshot(&self, ticker: &str) -> MarketResult<MarketSnapshot> {
        let url = self.endpoint(
            &["v8", "finance", "chart", ticker],
            &[("range", "1d"), ("interval", "1d")],
        )?;
        let (status, data) = self.get_json(url).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(MarketSnapshot::unavailable(ticker));
        }
        Ok(MarketSnapshot::new(ticker, parse_chart(&data)))
    }

    async fn fetch_news(&self, ticker: &str) -> MarketResult<Vec<NewsItem>> {
        let limit = self.news_limit.to_string();
        let url = self.endpoint(
            &["v1", "finance", "search"],
            &[("q", ticker), ("quotesCount", "0"), ("newsCount", limit.as_str())],
        )?;
        let (_, data) = self.get_json(url).await?;
        Ok(parse_news(&data, self.news_limit))
    }

    async fn fetch_stats(&self, ticker: &str) -> MarketResult<DetailedStats> {
        let url = self.endpoint(&["v7", "finance", "quote"], &[("symbols", ticker)])?;
        let (_, data) = self.get_json(url).await?;
        parse_quote_stats(&data)
            .ok_or_else(|| MarketDataError::Unexpected(format!("no quote stats for {}", ticker)))
    }
}

/// Extracts price data from a `/v8/finance/chart` response. `None` when the
/// response carries no usable price.
pub fn parse_chart(data: &Value) -> Option<PriceData> {
    let meta = data.pointer("/chart/result/0/meta")?;
    let current_price = meta.get("regularMarketPrice").and_then(Value::as_f64)?;
    let previous_close = meta
        .get("chartPreviousClose")
        .or_else(|| meta.get("previousClose"))
        .and_then(Value::as_f64);

    let change_percent = match previous_close {
        Some(prev) if prev > 0.0 => (current_price - prev) / prev * 100.0,
        _ => 0.0,
    };

    Some(PriceData {
        current_price,
        previous_close,
        change_percent,
        day_high: meta.get("regularMarketDayHigh").and_then(Value::as_f64),
        day_low: meta.get("regularMarketDayLow").and_then(Value::as_f64),
        volume: meta.get("regularMarketVolume").and_then(Value::as_u64),
        currency: meta
            .get("currency")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Simplifies search results to title + publisher for the analyst.
pub fn parse_news(data: &Value, limit: usize) -> Vec<NewsItem> {
    data.get("news")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|n| {
                    let title = n.get("title")?.as_str()?.to_string();
                    let publisher = n
                        .get("publisher")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    Some(NewsItem { title, publisher })
                })
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_quote_stats(data: &Value) -> Option<DetailedStats> {
    let q = data.pointer("/quoteResponse/result/0")?;
    let num = |key: &str| q.get(key).and_then(Value::as_f64);
    Some(DetailedStats {
        market_cap: num("marketCap"),
        trailing_pe: num("trailingPE"),
        forward_pe: num("forwardPE"),
        dividend_yield: num("dividendYield").or_else(|| num("trailingAnnualDividendYield")),
        fifty_two_week_high: num("fiftyTwoWeekHigh"),
        fifty_two_week_low: num("fiftyTwoWeekLow"),
    })
}
