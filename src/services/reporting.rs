use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{agents::Signal, bus::EventBus, events::Event, exchange::Side};

type ReportResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerActivity {
    pub analyses: u64,
    pub trades: u64,
    pub failures: u64,
    pub last_signal: Option<Signal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub analyses: u64,
    pub buy_signals: u64,
    pub sell_signals: u64,
    pub hold_signals: u64,

    pub trades: u64,
    pub buys: u64,
    pub sells: u64,
    pub shares_bought: u64,
    pub shares_sold: u64,

    pub failures: u64,

    pub per_ticker: HashMap<String, TickerActivity>,

    pub last_event_at: Option<DateTime<Utc>>,
}

impl ActivitySummary {
    pub fn apply(&mut self, event: &Event) {
        let entry = self.per_ticker.entry(event.ticker().to_string()).or_default();
        match event {
            Event::Analysis(a) => {
                self.analyses += 1;
                match a.signal {
                    Signal::Buy => self.buy_signals += 1,
                    Signal::Sell => self.sell_signals += 1,
                    Signal::Hold => self.hold_signals += 1,
                }
                entry.analyses += 1;
                entry.last_signal = Some(a.signal);
            }
            Event::Trade(t) => {
                self.trades += 1;
                match t.side {
                    Side::Buy => {
                        self.buys += 1;
                        self.shares_bought += t.qty;
                    }
                    Side::Sell => {
                        self.sells += 1;
                        self.shares_sold += t.qty;
                    }
                }
                entry.trades += 1;
            }
            Event::Failure(_) => {
                self.failures += 1;
                entry.failures += 1;
            }
        }
        self.last_event_at = Some(event.ts());
    }
}

/// Persists every bus event as a JSON line and keeps a rolling summary next
/// to it (`activity_summary.json`).
#[derive(Clone)]
pub struct ActivityReporter {
    summary: Arc<Mutex<ActivitySummary>>,
    log_path: PathBuf,
}

impl ActivityReporter {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            summary: Arc::new(Mutex::new(ActivitySummary::default())),
            log_path,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn summary_path(&self) -> PathBuf {
        summary_path_for(&self.log_path)
    }

    pub fn summary(&self) -> ActivitySummary {
        self.summary
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Subscribes before returning, so nothing published afterwards is missed.
    pub fn start(&self, event_bus: &EventBus) -> JoinHandle<()> {
        let mut rx = event_bus.subscribe();
        let reporter = self.clone();

        tokio::spawn(async move {
            info!(
                "📈 [REPORT] ActivityReporter started (log: {})",
                reporter.log_path.display()
            );

            loop {
                match rx.recv().await {
                    Ok(event) => reporter.handle(&event),
                    Err(RecvError::Lagged(n)) => {
                        warn!("📈 [REPORT] Reporter lagged, {} events dropped", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Records one event; I/O problems are logged, never returned.
    pub fn handle(&self, event: &Event) {
        if let Err(e) = self.append_jsonl(event) {
            error!("📈 [REPORT] Failed to append activity log: {}", e);
        }

        self.summary
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(event);

        if let Err(e) = self.flush_summary() {
            error!("📈 [REPORT] Failed to flush summary: {}", e);
        }
    }

    fn append_jsonl(&self, event: &Event) -> ReportResult<()> {
        use std::io::Write;

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let line = serde_json::to_string(event)?;
        writeln!(f, "{}", line)?;
        Ok(())
    }

    fn flush_summary(&self) -> ReportResult<()> {
        let summary_path = self.summary_path();

        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let s = self.summary();
        std::fs::write(summary_path, serde_json::to_vec_pretty(&s)?)?;
        Ok(())
    }
}

pub fn summary_path_for(log_path: &Path) -> PathBuf {
    log_path.with_file_name("activity_summary.json")
}

/// Reads the persisted summary, if any.
pub fn load_summary(log_path: &Path) -> Option<ActivitySummary> {
    let txt = std::fs::read_to_string(summary_path_for(log_path)).ok()?;
    serde_json::from_str(&txt).ok()
}
