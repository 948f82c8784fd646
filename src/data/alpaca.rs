use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::AlpacaConfig;
use crate::error::LedgerError;

#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Account {
    pub buying_power: String,
    pub cash: String,
    pub equity: String,
}

#[derive(Serialize, Debug)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: String,
    pub side: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub time_in_force: String,
    pub client_order_id: String,
}

impl AlpacaClient {
    pub fn new(config: &AlpacaConfig) -> Self {
        info!("Alpaca Client config: Base URL = {}", config.base_url);

        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
        }
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, LedgerError> {
        let resp = self.authed(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    pub async fn get_account(&self) -> Result<Account, LedgerError> {
        let url = format!("{}/v2/account", self.base_url);
        let data = self.send(self.client.get(&url)).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn submit_order(&self, order: &OrderRequest) -> Result<Value, LedgerError> {
        let url = format!("{}/v2/orders", self.base_url);
        let data = self.send(self.client.post(&url).json(order)).await?;
        if data.get("id").is_none() {
            return Err(LedgerError::Malformed(format!(
                "Order response without id: {}",
                data
            )));
        }
        Ok(data)
    }
}

/// Pulls the human-readable reason out of an Alpaca error body
/// (`{"code": 40310000, "message": "insufficient balance"}`).
pub fn rejection_reason(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Alpaca reports numbers as strings.
pub fn parse_number(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    v.as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| v.as_f64())
}
