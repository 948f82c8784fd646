//! Position sizing for agent orders.
//!
//! Buys spend at most `BUY_ALLOCATION_PCT` of the agent's cash on a single
//! trade, rounding up to one share when one is affordable. Sells liquidate
//! the whole agent-held position.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::constants::sizing::{BUY_ALLOCATION_PCT, FALLBACK_QTY};
use crate::exchange::{PortfolioView, Side};

/// Why sizing produced no order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidPrice,
    InsufficientFunds,
    NothingHeld,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidPrice => f.write_str("invalid price"),
            SkipReason::InsufficientFunds => f.write_str("insufficient agent funds"),
            SkipReason::NothingHeld => f.write_str("agent holds no shares"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizedOrder {
    pub qty: u64,
    /// Quantity is the fixed fallback because the portfolio view was unusable
    pub fallback: bool,
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Pure sizing rule. Returns `0` whenever no order should be placed.
pub fn size_order(side: Side, agent_cash: f64, held_qty: u64, current_price: f64) -> u64 {
    if !valid_price(current_price) {
        return 0;
    }

    match side {
        Side::Buy => {
            if !agent_cash.is_finite() || agent_cash <= 0.0 {
                return 0;
            }
            let qty = (agent_cash * BUY_ALLOCATION_PCT / current_price).floor() as u64;
            if qty == 0 && agent_cash >= current_price {
                1
            } else {
                qty
            }
        }
        Side::Sell => held_qty,
    }
}

/// Sizes an order against a portfolio view, classifying the zero case.
pub fn plan_order(
    side: Side,
    ticker: &str,
    portfolio: &PortfolioView,
    current_price: f64,
) -> Result<u64, SkipReason> {
    if !valid_price(current_price) {
        return Err(SkipReason::InvalidPrice);
    }

    let held = portfolio.held_qty(ticker);
    match size_order(side, portfolio.cash, held, current_price) {
        0 => match side {
            Side::Buy => Err(SkipReason::InsufficientFunds),
            Side::Sell => Err(SkipReason::NothingHeld),
        },
        qty => Ok(qty),
    }
}

/// Resolves the order quantity for one decision.
///
/// A portfolio view that could not be obtained or interpreted does not abort
/// the decision: the quantity falls back to `FALLBACK_QTY`. An invalid price
/// is always a skip.
pub fn resolve_quantity<E: fmt::Display>(
    side: Side,
    ticker: &str,
    portfolio: Result<PortfolioView, E>,
    current_price: f64,
) -> Result<SizedOrder, SkipReason> {
    if !valid_price(current_price) {
        warn!("📐 [SIZER] Invalid price for {}: {}", ticker, current_price);
        return Err(SkipReason::InvalidPrice);
    }

    let view = match portfolio {
        Ok(view) if view.cash.is_finite() => view,
        Ok(view) => {
            warn!(
                "📐 [SIZER] Error calculating quantity for {}: non-finite agent cash {}. Defaulting to {}.",
                ticker, view.cash, FALLBACK_QTY
            );
            return Ok(SizedOrder {
                qty: FALLBACK_QTY,
                fallback: true,
            });
        }
        Err(e) => {
            warn!(
                "📐 [SIZER] Error calculating quantity for {}: {}. Defaulting to {}.",
                ticker, e, FALLBACK_QTY
            );
            return Ok(SizedOrder {
                qty: FALLBACK_QTY,
                fallback: true,
            });
        }
    };

    match plan_order(side, ticker, &view, current_price) {
        Ok(qty) => {
            info!(
                "📐 [SIZER] {} {} x{} (cash ${:.2}, held {}, price ${:.2})",
                side,
                ticker,
                qty,
                view.cash,
                view.held_qty(ticker),
                current_price
            );
            Ok(SizedOrder {
                qty,
                fallback: false,
            })
        }
        Err(reason) => {
            info!(
                "📐 [SIZER] Skipping {} for {}: {} (cash ${:.2}, held {}, price ${:.2})",
                side,
                ticker,
                reason,
                view.cash,
                view.held_qty(ticker),
                current_price
            );
            Err(reason)
        }
    }
}
