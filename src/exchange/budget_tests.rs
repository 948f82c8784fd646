//! Unit tests for the budget book - agent/manual capital attribution.

#[cfg(test)]
mod budget_tests {
    use crate::exchange::budget::{BookState, BudgetBook, FillOutcome};
    use crate::exchange::types::{ExecutionMode, OrderRequest, OrderSource, Side};
    use std::path::PathBuf;

    fn temp_book_path() -> PathBuf {
        std::env::temp_dir().join(format!("finsight-book-{}.json", uuid::Uuid::new_v4()))
    }

    // ============= BookState Tests =============

    #[test]
    fn test_buy_deducts_only_the_order_slice() {
        let mut state = BookState::new(1000.0, 5000.0);
        state.apply(
            &OrderRequest::agent("AAPL", 2, Side::Buy),
            100.0,
            "o1".to_string(),
            ExecutionMode::Simulation,
        );

        assert_eq!(state.agent.cash, 800.0);
        assert_eq!(state.manual.cash, 5000.0);
        assert_eq!(state.agent.held_qty("AAPL"), 2);
        assert_eq!(state.manual.held_qty("AAPL"), 0);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].source, OrderSource::Agent);
    }

    #[test]
    fn test_average_price_accumulates() {
        let mut state = BookState::new(10_000.0, 0.0);
        let buy = OrderRequest::agent("NVDA", 1, Side::Buy);
        state.apply(&buy, 100.0, "a".into(), ExecutionMode::Simulation);
        state.apply(
            &OrderRequest::agent("NVDA", 3, Side::Buy),
            200.0,
            "b".into(),
            ExecutionMode::Simulation,
        );

        let holding = &state.agent.positions["NVDA"];
        assert_eq!(holding.qty, 4);
        assert!((holding.avg_price - 175.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_sell_removes_position_and_credits_cash() {
        let mut state = BookState::new(1000.0, 0.0);
        state.apply(
            &OrderRequest::agent("TSLA", 3, Side::Buy),
            100.0,
            "b".into(),
            ExecutionMode::Simulation,
        );
        state.apply(
            &OrderRequest::agent("TSLA", 3, Side::Sell),
            120.0,
            "s".into(),
            ExecutionMode::Simulation,
        );

        assert!(!state.agent.positions.contains_key("TSLA"));
        assert_eq!(state.agent.cash, 1060.0);
    }

    #[test]
    fn test_check_rejects_unaffordable_buy() {
        let state = BookState::new(100.0, 1_000_000.0);
        let reason = state
            .check(&OrderRequest::agent("AAPL", 1, Side::Buy), 150.0)
            .unwrap();
        assert!(reason.contains("Insufficient agent cash"));
    }

    #[test]
    fn test_check_rejects_selling_manual_shares_as_agent() {
        let mut state = BookState::new(0.0, 1000.0);
        state.apply(
            &OrderRequest::manual("AMD", 2, Side::Buy),
            100.0,
            "m".into(),
            ExecutionMode::Simulation,
        );

        let reason = state
            .check(&OrderRequest::agent("AMD", 1, Side::Sell), 100.0)
            .unwrap();
        assert!(reason.contains("Insufficient agent shares"));
        assert!(state
            .check(&OrderRequest::manual("AMD", 2, Side::Sell), 100.0)
            .is_none());
    }

    #[test]
    fn test_check_rejects_zero_quantity_and_bad_price() {
        let state = BookState::new(1000.0, 0.0);
        assert!(state
            .check(&OrderRequest::agent("AAPL", 0, Side::Buy), 10.0)
            .is_some());
        assert!(state
            .check(&OrderRequest::agent("AAPL", 1, Side::Buy), 0.0)
            .is_some());
        assert!(state
            .check(&OrderRequest::agent("AAPL", 1, Side::Buy), f64::NAN)
            .is_some());
    }

    // ============= BudgetBook (file) Tests =============

    #[test]
    fn test_open_seeds_missing_file() {
        let path = temp_book_path();
        let book = BudgetBook::open(&path, 2500.0, 7500.0).unwrap();

        let view = book.portfolio(OrderSource::Agent).unwrap();
        assert_eq!(view.cash, 2500.0);
        assert_eq!(book.portfolio(OrderSource::Manual).unwrap().cash, 7500.0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_open_keeps_existing_file() {
        let path = temp_book_path();
        {
            let book = BudgetBook::open(&path, 1000.0, 0.0).unwrap();
            book.record(
                &OrderRequest::agent("AAPL", 1, Side::Buy),
                100.0,
                "x".into(),
                ExecutionMode::Live,
            )
            .unwrap();
        }

        let reopened = BudgetBook::open(&path, 99_999.0, 0.0).unwrap();
        let view = reopened.portfolio(OrderSource::Agent).unwrap();
        assert_eq!(view.cash, 900.0);
        assert_eq!(view.held_qty("AAPL"), 1);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_fill_checked_refuses_without_mutating() {
        let path = temp_book_path();
        let book = BudgetBook::open(&path, 50.0, 0.0).unwrap();

        let outcome = book
            .fill_checked(
                &OrderRequest::agent("AAPL", 1, Side::Buy),
                100.0,
                "x".into(),
                ExecutionMode::Simulation,
            )
            .unwrap();

        assert!(matches!(outcome, FillOutcome::Refused(_)));
        let state = book.read().unwrap();
        assert_eq!(state.agent.cash, 50.0);
        assert!(state.history.is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_corrupt_file_is_malformed() {
        let path = temp_book_path();
        let book = BudgetBook::open(&path, 100.0, 0.0).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = book.portfolio(OrderSource::Agent).unwrap_err();
        assert!(matches!(err, crate::error::LedgerError::Malformed(_)));

        let _ = std::fs::remove_file(path);
    }
}
