use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{ledger, llm, market, paths, schedule};
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    /// Ask the server for a JSON object response
    pub json_output: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: Some(llm::DEFAULT_API_KEY.to_string()),
            base_url: Some(llm::DEFAULT_BASE_URL.to_string()),
            model: llm::DEFAULT_MODEL.to_string(),
            temperature: Some(llm::DEFAULT_TEMPERATURE),
            json_output: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub news_limit: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: market::DEFAULT_YAHOO_BASE_URL.to_string(),
            news_limit: market::DEFAULT_NEWS_LIMIT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    /// In-process simulated fills against the budget book
    Paper,
    /// Orders routed to Alpaca
    Alpaca,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub mode: TradingMode,
    pub ledger_path: PathBuf,
    /// Starting cash of the agent slice when no ledger file exists yet
    pub agent_budget: f64,
    /// Starting cash of the manual slice when no ledger file exists yet
    pub manual_cash: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            mode: TradingMode::Paper,
            ledger_path: PathBuf::from(ledger::DEFAULT_LEDGER_PATH),
            agent_budget: ledger::DEFAULT_AGENT_BUDGET,
            manual_cash: ledger::DEFAULT_MANUAL_CASH,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub secret_key: String,
    #[serde(default = "default_alpaca_base_url")]
    pub base_url: String,
}

fn default_alpaca_base_url() -> String {
    ledger::DEFAULT_ALPACA_BASE_URL.to_string()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub log_path: PathBuf,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(paths::DEFAULT_ACTIVITY_LOG),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: paths::DEFAULT_API_BIND.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watchlist: Vec<String>,
    pub cycle_interval_secs: u64,
    pub call_timeout_secs: u64,
    pub policy_path: PathBuf,

    pub llm: LlmConfig,
    pub market_data: MarketDataConfig,
    pub trading: TradingConfig,
    pub alpaca: Option<AlpacaConfig>,
    pub notifier: NotifierConfig,
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watchlist: ["AAPL", "NVDA", "BTC-USD", "TSLA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cycle_interval_secs: schedule::DEFAULT_CYCLE_INTERVAL_SECS,
            call_timeout_secs: schedule::DEFAULT_CALL_TIMEOUT_SECS,
            policy_path: PathBuf::from(paths::DEFAULT_POLICY_PATH),
            llm: LlmConfig::default(),
            market_data: MarketDataConfig::default(),
            trading: TradingConfig::default(),
            alpaca: None,
            notifier: NotifierConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `config.yaml` from the working directory, then applies
    /// environment overrides for secrets.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new(paths::CONFIG_PATH))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("⚠️ {} not found, using built-in defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = Some(url);
        }

        let key_id = lookup("APCA_API_KEY_ID");
        let secret = lookup("APCA_API_SECRET_KEY");
        let base_url = lookup("APCA_API_BASE_URL");

        match (&mut self.alpaca, key_id, secret) {
            (Some(alpaca), key_id, secret) => {
                if let Some(k) = key_id {
                    alpaca.api_key = k;
                }
                if let Some(s) = secret {
                    alpaca.secret_key = s;
                }
                if let Some(u) = base_url {
                    alpaca.base_url = u;
                }
            }
            (None, Some(api_key), Some(secret_key)) => {
                self.alpaca = Some(AlpacaConfig {
                    api_key,
                    secret_key,
                    base_url: base_url.unwrap_or_else(default_alpaca_base_url),
                });
            }
            _ => {}
        }
    }

    pub fn cycle_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.call_timeout_secs)
    }
}

/// The live policy document, re-read at the start of every ticker's turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPolicy {
    /// `None` falls back to the model the agent started with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_autonomous_enabled")]
    pub autonomous_enabled: bool,
}

fn default_autonomous_enabled() -> bool {
    true
}

impl Default for AgentPolicy {
    fn default() -> Self {
        Self {
            model: None,
            autonomous_enabled: true,
        }
    }
}

impl AgentPolicy {
    /// Lenient per-key read of a policy document.
    pub fn from_document(doc: &serde_json::Value) -> Self {
        if !doc.is_object() {
            warn!("⚙️ [POLICY] Policy document is not an object. Using defaults.");
            return Self::default();
        }

        let model = match doc.get("model") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(m)) if !m.is_empty() => Some(m.clone()),
            Some(other) => {
                warn!("⚙️ [POLICY] Ignoring invalid model: {}", other);
                None
            }
        };

        let autonomous_enabled = match doc.get("autonomous_enabled") {
            None => default_autonomous_enabled(),
            Some(serde_json::Value::Bool(b)) => *b,
            Some(other) => {
                warn!(
                    "⚙️ [POLICY] Ignoring invalid autonomous_enabled: {}",
                    other
                );
                default_autonomous_enabled()
            }
        };

        Self {
            model,
            autonomous_enabled,
        }
    }
}

/// File-backed source of [`AgentPolicy`].
#[derive(Clone, Debug)]
pub struct PolicyStore {
    path: PathBuf,
}

impl PolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Never fails: a missing or unparseable document yields the default
    /// policy, and each key that is absent or of the wrong type falls back on
    /// its own.
    pub fn load(&self) -> AgentPolicy {
        match self.try_load() {
            Ok(policy) => policy,
            Err(e) => {
                warn!("⚙️ [POLICY] Config read error: {}. Using defaults.", e);
                AgentPolicy::default()
            }
        }
    }

    fn try_load(&self) -> Result<AgentPolicy, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        let doc: serde_json::Value = serde_json::from_str(content)?;
        Ok(AgentPolicy::from_document(&doc))
    }

    pub fn save(&self, policy: &AgentPolicy) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(policy)?;
        fs::write(&self.path, body).map_err(io_err)?;
        info!(
            "⚙️ [POLICY] Saved policy (model: {:?}, autonomous: {})",
            policy.model, policy.autonomous_enabled
        );
        Ok(())
    }
}
