pub mod agent_loop;
pub mod notifier;
pub mod reporting;
pub mod shutdown;
pub mod sizing;
pub mod status;

pub use agent_loop::{AgentLoop, CycleSummary, TickerOutcome};
pub use notifier::{BusNotifier, Notifier};
pub use reporting::ActivityReporter;
pub use shutdown::{ShutdownHandle, ShutdownListener};
pub use status::AgentStatus;

#[cfg(test)]
mod reporting_tests;
