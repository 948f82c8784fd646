use std::sync::Arc;

use tracing::info;

use crate::{
    config::{AppConfig, TradingMode},
    data::{alpaca::AlpacaClient, MarketDataProvider},
    error::ConfigError,
};

use super::{alpaca::AlpacaLedger, budget::BudgetBook, paper::PaperLedger, traits::Ledger};

pub fn build_ledger(
    config: &AppConfig,
    market: Arc<dyn MarketDataProvider>,
) -> Result<Arc<dyn Ledger>, ConfigError> {
    let trading = &config.trading;
    let book = BudgetBook::open(
        trading.ledger_path.clone(),
        trading.agent_budget,
        trading.manual_cash,
    )?;

    match trading.mode {
        TradingMode::Paper => {
            info!("📒 Ledger: paper (simulated fills)");
            Ok(Arc::new(PaperLedger::new(book, market)))
        }
        TradingMode::Alpaca => {
            let alpaca = config.alpaca.as_ref().ok_or_else(|| {
                ConfigError::Missing(
                    "alpaca credentials (config.yaml `alpaca` or APCA_API_KEY_ID/APCA_API_SECRET_KEY)"
                        .to_string(),
                )
            })?;
            info!("📒 Ledger: alpaca ({})", alpaca.base_url);
            let client = AlpacaClient::new(alpaca);
            Ok(Arc::new(AlpacaLedger::new(client, book, market)))
        }
    }
}
