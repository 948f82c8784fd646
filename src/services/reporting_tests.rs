//! Unit tests for the reporting module - activity log and summary.

#[cfg(test)]
mod reporting_tests {
    use crate::agents::Signal;
    use crate::bus::EventBus;
    use crate::events::{AnalysisEvent, Event, FailureEvent, TradeEvent};
    use crate::exchange::Side;
    use crate::services::reporting::*;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::time::Duration;

    fn temp_log() -> PathBuf {
        std::env::temp_dir()
            .join(format!("finsight-report-{}", uuid::Uuid::new_v4()))
            .join("agent_activity.jsonl")
    }

    fn analysis(ticker: &str, signal: Signal) -> Event {
        Event::Analysis(AnalysisEvent {
            ts: Utc::now(),
            ticker: ticker.to_string(),
            signal,
            reasoning: "r".to_string(),
        })
    }

    fn trade(ticker: &str, side: Side, qty: u64) -> Event {
        Event::Trade(TradeEvent {
            ts: Utc::now(),
            ticker: ticker.to_string(),
            side,
            qty,
            reasoning: "r".to_string(),
        })
    }

    // ============= ActivitySummary Tests =============

    #[test]
    fn test_activity_summary_default() {
        let summary = ActivitySummary::default();
        assert_eq!(summary.analyses, 0);
        assert_eq!(summary.trades, 0);
        assert_eq!(summary.failures, 0);
        assert!(summary.per_ticker.is_empty());
        assert!(summary.last_event_at.is_none());
    }

    #[test]
    fn test_activity_summary_counts() {
        let mut summary = ActivitySummary::default();
        summary.apply(&analysis("AAPL", Signal::Buy));
        summary.apply(&trade("AAPL", Side::Buy, 10));
        summary.apply(&analysis("TSLA", Signal::Sell));
        summary.apply(&trade("TSLA", Side::Sell, 7));
        summary.apply(&analysis("NVDA", Signal::Hold));
        summary.apply(&Event::Failure(FailureEvent {
            ts: Utc::now(),
            ticker: "BTC-USD".to_string(),
            detail: "timeout".to_string(),
        }));

        assert_eq!(summary.analyses, 3);
        assert_eq!((summary.buy_signals, summary.sell_signals, summary.hold_signals), (1, 1, 1));
        assert_eq!((summary.buys, summary.sells), (1, 1));
        assert_eq!(summary.shares_bought, 10);
        assert_eq!(summary.shares_sold, 7);
        assert_eq!(summary.failures, 1);

        let aapl = &summary.per_ticker["AAPL"];
        assert_eq!(aapl.analyses, 1);
        assert_eq!(aapl.trades, 1);
        assert_eq!(aapl.last_signal, Some(Signal::Buy));
        assert_eq!(summary.per_ticker["BTC-USD"].failures, 1);
    }

    // ============= ActivityReporter Tests =============

    #[test]
    fn test_handle_writes_jsonl_and_summary() {
        let log = temp_log();
        let reporter = ActivityReporter::new(log.clone());

        reporter.handle(&analysis("AAPL", Signal::Buy));
        reporter.handle(&trade("AAPL", Side::Buy, 3));

        let content = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert!(matches!(first, Event::Analysis(_)));

        let persisted = load_summary(&log).unwrap();
        assert_eq!(persisted.trades, 1);
        assert_eq!(persisted, reporter.summary());

        let _ = std::fs::remove_dir_all(log.parent().unwrap());
    }

    #[test]
    fn test_load_summary_missing() {
        assert!(load_summary(&temp_log()).is_none());
    }

    #[tokio::test]
    async fn test_reporter_consumes_bus_events() {
        let log = temp_log();
        let bus = EventBus::new(16);
        let reporter = ActivityReporter::new(log.clone());
        let _task = reporter.start(&bus);

        bus.publish(analysis("NVDA", Signal::Hold)).unwrap();
        bus.publish(trade("NVDA", Side::Buy, 1)).unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while reporter.summary().trades < 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(reporter.summary().analyses, 1);
        let _ = std::fs::remove_dir_all(log.parent().unwrap());
    }
}
