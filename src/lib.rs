//! FinSight - autonomous trading agent
//!
//! Polls a watchlist, asks an LLM analyst for a BUY/SELL/HOLD signal and,
//! when the live policy allows it, turns the signal into a sized order
//! against the agent's own slice of a shared brokerage account.

pub mod agents;
pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod exchange;
pub mod llm;
pub mod mock;
pub mod services;

// Re-export commonly used types
pub use bus::EventBus;
pub use config::{AgentPolicy, AppConfig, PolicyStore};
pub use error::AgentError;
pub use events::Event;
pub use services::{AgentLoop, TickerOutcome};

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod events_tests;
