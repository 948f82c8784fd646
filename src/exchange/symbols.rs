//! Simple symbol normalization helpers.
//!
//! Canonical ticker (used internally and by the market data provider):
//! - stocks: "AAPL"
//! - crypto: "BASE-USD" like "BTC-USD"
//!
//! Alpaca wants crypto pairs as "BTC/USD".

pub fn is_crypto(ticker: &str) -> bool {
    ticker.contains('/') || ticker.ends_with("-USD") || ticker.ends_with("-USDT")
}

pub fn to_alpaca_symbol(ticker: &str) -> String {
    if is_crypto(ticker) {
        ticker.replace('-', "/")
    } else {
        ticker.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_detection() {
        assert!(is_crypto("BTC-USD"));
        assert!(is_crypto("ETH/USD"));
        assert!(!is_crypto("AAPL"));
        assert!(!is_crypto("BRK-B"));
    }

    #[test]
    fn test_to_alpaca_symbol() {
        assert_eq!(to_alpaca_symbol("BTC-USD"), "BTC/USD");
        assert_eq!(to_alpaca_symbol("NVDA"), "NVDA");
        assert_eq!(to_alpaca_symbol("BRK-B"), "BRK-B");
    }
}
