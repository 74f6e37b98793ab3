//! [`InFlightOrder`]: the record the lifecycle processor (C10) owns for
//! every order it believes is open at a venue, plus the state machine
//! that governs its transitions.

use super::order::{OrderType, Side, Tags};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Spot,
    Linear,
    Inverse,
}

/// The lifecycle of an order at a venue. Transitions are validated by
/// [`validate_transition`] rather than encoded as distinct Rust types
/// (unlike the order book's hot-path order objects, in-flight orders are
/// driven by asynchronous venue events the compiler can't see coming, so
/// the state machine has to be checked at runtime, not at compile time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderState {
    /// Terminal states trigger pruning from the in-flight table.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Canceled | OrderState::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal order state transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: OrderState,
    pub to: OrderState,
}

/// Enforces a no-backwards-transitions invariant: `new -> {partially_filled,
/// filled, canceled, rejected}`, `partially_filled -> {partially_filled, filled,
/// canceled}`, and no transition out of a terminal state.
pub fn validate_transition(from: OrderState, to: OrderState) -> Result<(), IllegalTransition> {
    use OrderState::*;
    let allowed = match (from, to) {
        (New, New) => true,
        (New, PartiallyFilled | Filled | Canceled | Rejected) => true,
        (PartiallyFilled, PartiallyFilled | Filled | Canceled) => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

#[derive(Debug, Clone)]
pub struct TradeFill {
    pub exec_id: String,
    pub price: Decimal,
    pub size: Decimal,
    pub ts_ns: u64,
}

/// Bound on the number of fills retained inline on an [`InFlightOrder`]
/// before older ones are summarized into `cumulative_filled` only.
pub const MAX_INLINE_FILLS: usize = 64;

#[derive(Debug, Clone)]
pub struct InFlightOrder {
    pub client_order_id: String,
    pub exchange_order_id: Option<String>,
    pub venue: String,
    pub category: Category,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub size: Decimal,
    pub price: Option<Decimal>,
    pub reduce_only: bool,
    pub creation_ts_ns: u64,
    pub last_update_ts_ns: u64,
    pub state: OrderState,
    pub cumulative_filled: Decimal,
    pub average_fill_price: Option<Decimal>,
    pub fills: Vec<TradeFill>,
    pub tags: Tags,
}

impl InFlightOrder {
    pub fn new_pending(
        client_order_id: String,
        venue: String,
        category: Category,
        symbol: String,
        side: Side,
        order_type: OrderType,
        size: Decimal,
        price: Option<Decimal>,
        reduce_only: bool,
        ts_ns: u64,
        tags: Tags,
    ) -> Self {
        Self {
            client_order_id,
            exchange_order_id: None,
            venue,
            category,
            symbol,
            side,
            order_type,
            size,
            price,
            reduce_only,
            creation_ts_ns: ts_ns,
            last_update_ts_ns: ts_ns,
            state: OrderState::New,
            cumulative_filled: Decimal::ZERO,
            average_fill_price: None,
            fills: Vec::new(),
            tags,
        }
    }

    /// Apply a venue fill, updating cumulative size and the running
    /// average fill price. Caller is responsible for exec_id dedup
    /// (done once, at the lifecycle-processor boundary, so this method
    /// stays a pure data update).
    pub fn apply_fill(&mut self, fill: TradeFill) {
        let prior_notional = self.average_fill_price.unwrap_or(Decimal::ZERO) * self.cumulative_filled;
        let new_notional = prior_notional + fill.price * fill.size;
        self.cumulative_filled += fill.size;
        self.cumulative_filled = self.cumulative_filled.min(self.size);
        if self.cumulative_filled > Decimal::ZERO {
            self.average_fill_price = Some(new_notional / self.cumulative_filled);
        }
        self.last_update_ts_ns = self.last_update_ts_ns.max(fill.ts_ns);
        if self.fills.len() >= MAX_INLINE_FILLS {
            self.fills.remove(0);
        }
        self.fills.push(fill);
    }

    pub fn remaining(&self) -> Decimal {
        (self.size - self.cumulative_filled).max(Decimal::ZERO)
    }

    pub fn transition(&mut self, to: OrderState, ts_ns: u64) -> Result<(), IllegalTransition> {
        validate_transition(self.state, to)?;
        self.state = to;
        self.last_update_ts_ns = self.last_update_ts_ns.max(ts_ns);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(validate_transition(OrderState::New, OrderState::PartiallyFilled).is_ok());
        assert!(validate_transition(OrderState::PartiallyFilled, OrderState::Filled).is_ok());
    }

    #[test]
    fn backwards_transitions_are_rejected() {
        assert!(validate_transition(OrderState::Filled, OrderState::New).is_err());
        assert!(validate_transition(OrderState::Canceled, OrderState::PartiallyFilled).is_err());
    }

    #[test]
    fn terminal_states_have_no_outgoing_transition() {
        for terminal in [OrderState::Filled, OrderState::Canceled, OrderState::Rejected] {
            for to in [OrderState::New, OrderState::PartiallyFilled, OrderState::Filled, OrderState::Canceled, OrderState::Rejected] {
                if terminal != to {
                    assert!(validate_transition(terminal, to).is_err());
                }
            }
        }
    }

    #[test]
    fn cumulative_filled_never_exceeds_size() {
        let mut order = InFlightOrder::new_pending(
            "A1".into(), "bybit".into(), Category::Spot, "ETH-USDT".into(),
            Side::Buy, OrderType::Limit, Decimal::new(10, 1), Some(Decimal::new(25000, 1)),
            false, 0, Tags::default(),
        );
        order.apply_fill(TradeFill { exec_id: "X1".into(), price: Decimal::new(25000, 1), size: Decimal::new(4, 1), ts_ns: 1 });
        order.apply_fill(TradeFill { exec_id: "X2".into(), price: Decimal::new(25000, 1), size: Decimal::new(6, 1), ts_ns: 2 });
        assert_eq!(order.cumulative_filled, order.size);
        assert_eq!(order.remaining(), Decimal::ZERO);
    }
}
