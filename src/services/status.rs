use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::AgentError;
use crate::services::agent_loop::TickerOutcome;

#[derive(Clone, Debug, Serialize)]
pub struct TickerStatus {
    pub at: DateTime<Utc>,
    pub outcome: Option<TickerOutcome>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub cycles_completed: u64,
    pub active_model: String,
    pub tickers: BTreeMap<String, TickerStatus>,
}

/// Live view of the agent loop, shared with the control API.
#[derive(Clone, Default)]
pub struct AgentStatus {
    running: Arc<AtomicBool>,
    cycles: Arc<AtomicU64>,
    model: Arc<RwLock<String>>,
    tickers: Arc<DashMap<String, TickerStatus>>,
}

impl AgentStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cycle_completed(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    pub fn set_model(&self, model: &str) {
        let mut guard = self.model.write().unwrap_or_else(|e| e.into_inner());
        if *guard != model {
            *guard = model.to_string();
        }
    }

    pub fn model(&self) -> String {
        self.model.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn record(&self, ticker: &str, result: &Result<TickerOutcome, AgentError>) {
        let status = match result {
            Ok(outcome) => TickerStatus {
                at: Utc::now(),
                outcome: Some(outcome.clone()),
                error: None,
            },
            Err(e) => TickerStatus {
                at: Utc::now(),
                outcome: None,
                error: Some(e.to_string()),
            },
        };
        self.tickers.insert(ticker.to_string(), status);
    }

    pub fn ticker(&self, ticker: &str) -> Option<TickerStatus> {
        self.tickers.get(ticker).map(|entry| entry.value().clone())
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            running: self.is_running(),
            cycles_completed: self.cycles_completed(),
            active_model: self.model(),
            tickers: self
                .tickers
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        }
    }
}
