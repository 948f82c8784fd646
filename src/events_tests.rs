//! Unit tests for Events - the notification payloads carried on the bus.

#[cfg(test)]
mod events_tests {
    use crate::agents::Signal;
    use crate::events::*;
    use crate::exchange::Side;
    use chrono::Utc;

    fn trade() -> Event {
        Event::Trade(TradeEvent {
            ts: Utc::now(),
            ticker: "NVDA".to_string(),
            side: Side::Buy,
            qty: 3,
            reasoning: "Momentum (SIMULATED)".to_string(),
        })
    }

    #[test]
    fn test_event_ticker_accessor() {
        let analysis = Event::Analysis(AnalysisEvent {
            ts: Utc::now(),
            ticker: "AAPL".to_string(),
            signal: Signal::Hold,
            reasoning: String::new(),
        });
        let failure = Event::Failure(FailureEvent {
            ts: Utc::now(),
            ticker: "TSLA".to_string(),
            detail: "boom".to_string(),
        });

        assert_eq!(analysis.ticker(), "AAPL");
        assert_eq!(trade().ticker(), "NVDA");
        assert_eq!(failure.ticker(), "TSLA");
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let json = serde_json::to_value(trade()).unwrap();
        assert_eq!(json["kind"], trade().kind());
        assert_eq!(json["kind"], "trade");
        assert_eq!(json["side"], "buy");
        assert_eq!(json["qty"], 3);
        assert_eq!(json["reasoning"], "Momentum (SIMULATED)");
    }

    #[test]
    fn test_analysis_signal_serializes_uppercase() {
        let event = Event::Analysis(AnalysisEvent {
            ts: Utc::now(),
            ticker: "BTC-USD".to_string(),
            signal: Signal::Sell,
            reasoning: "Overbought".to_string(),
        });
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains(r#""kind":"analysis""#));
        assert!(line.contains(r#""signal":"SELL""#));

        let back: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(back, event);
    }
}
