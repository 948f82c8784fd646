//! Unit tests for configuration structures and parsing.

#[cfg(test)]
mod config_tests {
    use crate::config::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("finsight-{}-{}", uuid::Uuid::new_v4(), name))
    }

    // ============= Defaults Tests =============

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.watchlist, vec!["AAPL", "NVDA", "BTC-USD", "TSLA"]);
        assert_eq!(config.cycle_interval_secs, 30);
        assert_eq!(config.call_timeout_secs, 60);
        assert_eq!(config.policy_path, PathBuf::from("agent_config.json"));
        assert_eq!(config.llm.model, "llama3.1");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.llm.temperature, Some(0.2));
        assert!(config.llm.json_output);
        assert_eq!(config.market_data.news_limit, 5);
        assert_eq!(config.trading.mode, TradingMode::Paper);
        assert_eq!(config.trading.agent_budget, 10_000.0);
        assert!(config.alpaca.is_none());
        assert_eq!(config.api.bind, "0.0.0.0:3000");
    }

    // ============= YAML Parsing Tests =============

    #[test]
    fn test_from_yaml_partial_uses_defaults() {
        let yaml = r#"
watchlist: [MSFT, ETH-USD]
cycle_interval_secs: 300
trading:
  mode: alpaca
  agent_budget: 2500
alpaca:
  api_key: "PK123"
  secret_key: "SK456"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.watchlist, vec!["MSFT", "ETH-USD"]);
        assert_eq!(config.cycle_interval().as_secs(), 300);
        assert_eq!(config.call_timeout().as_secs(), 60);
        assert_eq!(config.trading.mode, TradingMode::Alpaca);
        assert_eq!(config.trading.agent_budget, 2500.0);
        assert_eq!(config.trading.manual_cash, 90_000.0);

        let alpaca = config.alpaca.unwrap();
        assert_eq!(alpaca.api_key, "PK123");
        assert_eq!(alpaca.base_url, "https://paper-api.alpaca.markets");
    }

    #[test]
    fn test_from_yaml_strips_bom() {
        let config = AppConfig::from_yaml("\u{feff}cycle_interval_secs: 5\n").unwrap();
        assert_eq!(config.cycle_interval_secs, 5);
    }

    #[test]
    fn test_from_yaml_rejects_bad_mode() {
        assert!(AppConfig::from_yaml("trading:\n  mode: margin\n").is_err());
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let config = AppConfig::load_from(&temp_path("config.yaml")).unwrap();
        assert_eq!(config.cycle_interval_secs, 30);
    }

    // ============= Environment Override Tests =============

    #[test]
    fn test_env_overrides_create_alpaca_section() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-live"),
            ("APCA_API_KEY_ID", "PKENV"),
            ("APCA_API_SECRET_KEY", "SKENV"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-live"));
        let alpaca = config.alpaca.unwrap();
        assert_eq!(alpaca.api_key, "PKENV");
        assert_eq!(alpaca.secret_key, "SKENV");
        assert_eq!(alpaca.base_url, "https://paper-api.alpaca.markets");
    }

    #[test]
    fn test_env_overrides_need_both_alpaca_keys() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| (k == "APCA_API_KEY_ID").then(|| "PK".to_string()));
        assert!(config.alpaca.is_none());
    }

    // ============= Policy Tests =============

    #[test]
    fn test_policy_defaults_when_missing() {
        let store = PolicyStore::new(temp_path("policy.json"));
        assert_eq!(store.load(), AgentPolicy::default());
        assert!(store.load().autonomous_enabled);
    }

    #[test]
    fn test_policy_ignores_unknown_keys() {
        let path = temp_path("policy.json");
        std::fs::write(&path, r#"{"model": "qwen2", "theme": "dark"}"#).unwrap();

        let policy = PolicyStore::new(&path).load();
        assert_eq!(policy.model.as_deref(), Some("qwen2"));
        assert!(policy.autonomous_enabled);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_policy_corrupt_file_yields_defaults() {
        let path = temp_path("policy.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert_eq!(PolicyStore::new(&path).load(), AgentPolicy::default());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_policy_bad_key_only_defaults_itself() {
        let path = temp_path("policy.json");
        std::fs::write(&path, r#"{"model": 3, "autonomous_enabled": false}"#).unwrap();

        let policy = PolicyStore::new(&path).load();
        assert_eq!(policy.model, None);
        assert!(!policy.autonomous_enabled);

        std::fs::write(&path, r#"{"model": "phi3", "autonomous_enabled": "no"}"#).unwrap();
        let policy = PolicyStore::new(&path).load();
        assert_eq!(policy.model.as_deref(), Some("phi3"));
        assert!(policy.autonomous_enabled);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_policy_non_object_document_yields_defaults() {
        assert_eq!(
            AgentPolicy::from_document(&serde_json::json!([1, 2])),
            AgentPolicy::default()
        );
        assert_eq!(
            AgentPolicy::from_document(&serde_json::json!({"model": null})),
            AgentPolicy::default()
        );
    }

    #[test]
    fn test_policy_save_then_load() {
        let path = temp_path("nested").join("policy.json");
        let store = PolicyStore::new(&path);
        let policy = AgentPolicy {
            model: Some("mistral".to_string()),
            autonomous_enabled: false,
        };

        store.save(&policy).unwrap();
        assert_eq!(store.load(), policy);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
