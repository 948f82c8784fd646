//! Application-wide constants and magic numbers
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make the codebase easier to tune.

use std::time::Duration;

/// Position sizing constants
pub mod sizing {
    /// Share of agent cash committed to a single buy decision
    pub const BUY_ALLOCATION_PCT: f64 = 0.20;

    /// Quantity used when the agent portfolio view cannot be read or interpreted
    pub const FALLBACK_QTY: u64 = 1;
}

/// Monitoring loop scheduling
pub mod schedule {
    use super::*;

    /// Delay between two passes over the watchlist
    pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 30;

    /// Upper bound for any single call to an external collaborator
    pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;

    /// How long `/stop` waits for the loop to wind down before giving up on it
    pub const STOP_GRACE: Duration = Duration::from_secs(5);
}

/// Market data constants
pub mod market {
    pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

    /// Headlines attached to each snapshot
    pub const DEFAULT_NEWS_LIMIT: usize = 5;

    /// Yahoo rejects requests without a browser-like user agent
    pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) finsight-agent/0.1";
}

/// LLM defaults (Ollama's OpenAI-compatible endpoint)
pub mod llm {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
    pub const DEFAULT_MODEL: &str = "llama3.1";
    pub const DEFAULT_API_KEY: &str = "ollama";
    /// Low temperature keeps signals stable between cycles
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
}

/// Ledger defaults
pub mod ledger {
    pub const DEFAULT_LEDGER_PATH: &str = "./data/ledger.json";
    pub const DEFAULT_AGENT_BUDGET: f64 = 10_000.0;
    pub const DEFAULT_MANUAL_CASH: f64 = 90_000.0;
    pub const DEFAULT_ALPACA_BASE_URL: &str = "https://paper-api.alpaca.markets";
}

/// File locations
pub mod paths {
    pub const CONFIG_PATH: &str = "config.yaml";
    pub const DEFAULT_POLICY_PATH: &str = "agent_config.json";
    pub const DEFAULT_ACTIVITY_LOG: &str = "./data/agent_activity.jsonl";
    pub const DEFAULT_API_BIND: &str = "0.0.0.0:3000";
}

/// Event bus capacity
pub const EVENT_BUS_CAPACITY: usize = 1000;
