//! Wire and runtime data types shared across the crate: ingress orders
//! (`order`), egress reports (`report`), and the lifecycle processor's
//! in-memory order record (`inflight_order`).

mod inflight_order;
mod order;
mod report;

pub use inflight_order::{
    Category, IllegalTransition, InFlightOrder, OrderState, TradeFill, MAX_INLINE_FILLS,
    validate_transition,
};
pub use order::{
    Action, AmmSwapDetails, CancelDetails, CexOrderDetails, ClmmSwapDetails, ExecutionOrder,
    MarginMode, OrderDetails, OrderType, ProductType, ReplaceDetails, Side, Tags, TimeInForce,
    TransferDetails, VenueType, MAX_TAGS,
};
pub use report::{ExecutionReport, Fill, Liquidity, PublishMessage, ReasonCode, ReportStatus};
