//! Lifecycle processor (C10): the single place that turns an
//! [`ExecutionOrder`] or an adapter callback into zero or one published
//! messages. Runs on `T_lifecycle`, fed by a funnel that merges ingress
//! orders and every registered adapter's async callbacks through one
//! short critical section before the logical SPSC handoff, since a
//! strict single-producer ring can't otherwise absorb callbacks arriving
//! from N adapter I/O threads.

use crate::adapter::{ExchangeAdapter, FillData, ModifyRequest, OrderUpdate, PlaceRequest};
use crate::dispatch::dispatch_action;
use crate::error::{reason_text, CoreError};
use crate::inflight::InFlightTable;
use crate::journal::{AsyncJournal, JournalEvent};
use crate::model::{
    Category, ExecutionReport, Fill, InFlightOrder, Liquidity, OrderState, OrderType,
    ProductType, PublishMessage, ReasonCode, ReportStatus, Side, Tags, TimeInForce, TradeFill,
};
use crate::model::{CexOrderDetails, ExecutionOrder};
use crate::normalize::{is_terminal_raw_status, normalize};
use crate::perf::pools::ObjectPool;
use crate::perf::queue::RingQueue;
use crate::router::VenueRouter;
use crate::stats::Stats;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Validate a CEX order's fields before it ever reaches an adapter.
/// Every branch here maps to a specific `CoreError` variant so the
/// rejection report carries a precise reason code, not a generic
/// catch-all.
fn validate_cex(details: &CexOrderDetails, product_type: ProductType) -> Result<(), CoreError> {
    if details.size <= Decimal::ZERO {
        return Err(CoreError::NonPositiveSize(details.size));
    }
    if details.symbol.trim().is_empty() {
        return Err(CoreError::UnresolvableSymbol(details.symbol.clone()));
    }
    if details.order_type.requires_price() && details.price.is_none() {
        return Err(CoreError::PriceRequired(details.order_type));
    }
    if details.order_type.requires_stop_price() && details.stop_price.is_none() {
        return Err(CoreError::StopPriceRequired(details.order_type));
    }
    if details.reduce_only && product_type == ProductType::Spot {
        return Err(CoreError::ReduceOnlyOnSpot);
    }
    if !details.time_in_force.is_recognized() {
        return Err(CoreError::InvalidEnum {
            field: "time_in_force",
            value: details.time_in_force.to_string(),
        });
    }
    Ok(())
}

fn category_for(product_type: ProductType) -> Category {
    match product_type {
        ProductType::Spot => Category::Spot,
        // The envelope carries no linear/inverse distinction beyond
        // product_type; every non-spot CEX order this processor handles
        // is a linear perpetual until a venue module proves otherwise.
        _ => Category::Linear,
    }
}

pub struct LifecycleProcessor {
    router: Arc<VenueRouter>,
    inflight: Arc<InFlightTable>,
    publish_queue: RingQueue<PublishMessage>,
    report_pool: ObjectPool<ExecutionReport>,
    fill_pool: ObjectPool<Fill>,
    stats: Arc<Stats>,
    journal: Option<Arc<AsyncJournal>>,
}

impl LifecycleProcessor {
    pub fn new(
        router: Arc<VenueRouter>,
        inflight: Arc<InFlightTable>,
        publish_queue: RingQueue<PublishMessage>,
        report_pool: ObjectPool<ExecutionReport>,
        fill_pool: ObjectPool<Fill>,
        stats: Arc<Stats>,
    ) -> Self {
        Self { router, inflight, publish_queue, report_pool, fill_pool, stats, journal: None }
    }

    /// Attach a journal so every report/fill this processor publishes is
    /// also appended off the hot path. Optional: a process run without
    /// `--journal-path` skips this and journaling is a no-op.
    pub fn with_journal(mut self, journal: Arc<AsyncJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    fn journal_report(&self, report: &ExecutionReport) {
        let Some(journal) = &self.journal else { return };
        let event = match report.status {
            ReportStatus::Accepted => JournalEvent::Accepted(report.clone()),
            ReportStatus::Rejected => JournalEvent::Rejected(report.clone()),
            ReportStatus::Canceled => JournalEvent::Canceled(report.clone()),
            ReportStatus::Replaced => JournalEvent::Replaced(report.clone()),
        };
        journal.record(event);
    }

    fn journal_fill(&self, fill: &Fill) {
        if let Some(journal) = &self.journal {
            journal.record(JournalEvent::Fill(fill.clone()));
        }
    }

    /// Entry point for `T_lifecycle`'s ingress side: one parsed envelope
    /// in, at most one publish in return.
    pub fn handle_order(&self, order: ExecutionOrder) {
        self.stats.inc_orders_received();
        match dispatch_action(order.action) {
            crate::model::Action::Place => self.handle_place(order),
            crate::model::Action::Cancel => self.handle_cancel(order),
            crate::model::Action::Replace => self.handle_replace(order),
        }
    }

    fn handle_place(&self, order: ExecutionOrder) {
        // Idempotent dedup: a cl_id already tracked is either a retry of
        // an order we've already accepted or a collision; either way the
        // second `place` is dropped rather than acted on.
        if self.inflight.contains(&order.cl_id) {
            debug!(cl_id = %order.cl_id, "duplicate place for known cl_id, dropping");
            return;
        }

        let Some(cex) = order.details.as_cex_order() else {
            self.reject(&order.cl_id, ReasonCode::InvalidParams, "place requires cex_order details", order.ts_ns, &order.tags);
            return;
        };

        if let Err(e) = validate_cex(cex, order.product_type) {
            self.reject(&order.cl_id, e.reason_code(), reason_text(&e), order.ts_ns, &order.tags);
            return;
        }

        let venue = order.venue_key();
        let adapter = match self.router.resolve(&venue) {
            Ok(a) => a,
            Err(e) => {
                self.reject(&order.cl_id, e.reason_code(), reason_text(&e), order.ts_ns, &order.tags);
                return;
            }
        };

        // Inserted before the adapter call returns, so a crash or a slow
        // venue round trip never leaves an accepted order untracked.
        let pending = InFlightOrder::new_pending(
            order.cl_id.clone(),
            venue,
            category_for(order.product_type),
            cex.symbol.clone(),
            cex.side,
            cex.order_type,
            cex.size,
            cex.price,
            cex.reduce_only,
            order.ts_ns,
            order.tags.clone(),
        );
        self.inflight.insert(pending);

        let resp = adapter.place_order(&PlaceRequest {
            client_order_id: order.cl_id.clone(),
            details: cex.clone(),
        });

        if resp.success {
            if let Some(exch_id) = &resp.exchange_order_id {
                self.inflight.attach_exchange_id(&order.cl_id, &order.venue_key(), exch_id);
            }
            self.stats.inc_orders_accepted();
            self.publish_report(ExecutionReport::accepted(
                order.cl_id,
                resp.exchange_order_id,
                order.ts_ns,
                order.tags,
            ));
        } else {
            self.inflight.remove(&order.cl_id);
            self.stats.inc_orders_rejected();
            self.publish_report(ExecutionReport::rejected(
                order.cl_id,
                resp.reason_code,
                resp.reason_text,
                order.ts_ns,
                order.tags,
            ));
        }
    }

    fn handle_cancel(&self, order: ExecutionOrder) {
        let Some(cancel) = order.details.as_cancel() else {
            self.reject(&order.cl_id, ReasonCode::InvalidParams, "cancel requires cancel details", order.ts_ns, &order.tags);
            return;
        };

        let adapter = match self.router.resolve(&order.venue_key()) {
            Ok(a) => a,
            Err(e) => {
                self.reject(&cancel.cl_id_to_cancel, e.reason_code(), reason_text(&e), order.ts_ns, &order.tags);
                return;
            }
        };

        let resp = adapter.cancel_order(
            &cancel.cl_id_to_cancel,
            cancel.symbol.as_deref(),
            cancel.exchange_order_id.as_deref(),
        );

        if resp.success {
            // A cancel of a cl_id the venue never had (already filled,
            // already canceled, or simply unknown) is still a success —
            // the caller's desired end state (no open order) already
            // holds.
            let removed = self.inflight.remove(&cancel.cl_id_to_cancel);
            let exchange_order_id = removed.and_then(|o| o.exchange_order_id).or(resp.exchange_order_id);
            self.publish_report(ExecutionReport::canceled_ok(
                cancel.cl_id_to_cancel.clone(),
                exchange_order_id,
                order.ts_ns,
                order.tags,
            ));
        } else {
            self.publish_report(ExecutionReport::rejected(
                cancel.cl_id_to_cancel.clone(),
                resp.reason_code,
                resp.reason_text,
                order.ts_ns,
                order.tags,
            ));
        }
    }

    fn handle_replace(&self, order: ExecutionOrder) {
        let Some(replace) = order.details.as_replace() else {
            self.reject(&order.cl_id, ReasonCode::InvalidParams, "replace requires replace details", order.ts_ns, &order.tags);
            return;
        };

        let adapter = match self.router.resolve(&order.venue_key()) {
            Ok(a) => a,
            Err(e) => {
                self.reject(&replace.cl_id_to_replace, e.reason_code(), reason_text(&e), order.ts_ns, &order.tags);
                return;
            }
        };

        let resp = adapter.modify_order(
            &replace.cl_id_to_replace,
            &ModifyRequest { new_size: replace.new_size, new_price: replace.new_price },
        );

        if resp.success {
            self.inflight.with_mut(&replace.cl_id_to_replace, |o| {
                if let Some(size) = replace.new_size {
                    o.size = size;
                }
                if let Some(price) = replace.new_price {
                    o.price = Some(price);
                }
                o.last_update_ts_ns = o.last_update_ts_ns.max(order.ts_ns);
            });
            self.publish_report(ExecutionReport::replaced_ok(
                replace.cl_id_to_replace.clone(),
                resp.exchange_order_id,
                order.ts_ns,
                order.tags,
            ));
        } else {
            self.publish_report(ExecutionReport::rejected(
                replace.cl_id_to_replace.clone(),
                resp.reason_code,
                resp.reason_text,
                order.ts_ns,
                order.tags,
            ));
        }
    }

    /// Resolve a callback's `cl_id` either directly or via the
    /// exchange-key index, for adapters that only echo back their own
    /// order id.
    fn resolve_cl_id(&self, venue: &str, client_order_id: Option<&str>, exchange_order_id: Option<&str>) -> Option<String> {
        if let Some(id) = client_order_id {
            return Some(id.to_string());
        }
        let exch_id = exchange_order_id?;
        self.inflight.get_by_exchange_key(venue, exch_id).map(|o| o.client_order_id)
    }

    /// Entry point for an adapter's `on_order_update` callback, invoked
    /// from whatever I/O thread that adapter serializes its events on.
    pub fn handle_order_update(&self, venue: &str, adapter: &dyn ExchangeAdapter, update: OrderUpdate) {
        let Some(cl_id) = self.resolve_cl_id(venue, update.client_order_id.as_deref(), update.exchange_order_id.as_deref()) else {
            debug!(venue, "order update has no resolvable cl_id, dropping");
            return;
        };

        if !self.inflight.contains(&cl_id) {
            // One-shot lazy rehydration: confirm the venue still knows
            // about this cl_id before tracking it again. `query_order`
            // only confirms liveness, not full order detail, so the
            // rehydrated record is a placeholder that later updates and
            // fills fill in.
            let resp = adapter.query_order(&cl_id);
            if !resp.success {
                let reason = normalize(&update.raw_status, update.raw_reason.as_deref())
                    .map(|(_, reason)| reason)
                    .unwrap_or(ReasonCode::VenueReject);
                self.publish_report(ExecutionReport::rejected(
                    cl_id,
                    reason,
                    "unknown cl_id, rehydration failed",
                    update.ts_ns,
                    Tags::default(),
                ));
                return;
            }
            let placeholder = InFlightOrder::new_pending(
                cl_id.clone(),
                venue.to_string(),
                Category::Linear,
                String::new(),
                Side::Buy,
                OrderType::Limit,
                Decimal::ZERO,
                None,
                false,
                update.ts_ns,
                Tags::default(),
            );
            self.inflight.insert(placeholder);
            if let Some(exch_id) = &resp.exchange_order_id {
                self.inflight.attach_exchange_id(&cl_id, venue, exch_id);
            }
        }

        let Some((status, reason)) = normalize(&update.raw_status, update.raw_reason.as_deref()) else {
            return;
        };

        let terminal = is_terminal_raw_status(&update.raw_status);
        let new_state = match status {
            ReportStatus::Canceled => OrderState::Canceled,
            ReportStatus::Rejected => OrderState::Rejected,
            ReportStatus::Accepted if terminal => OrderState::Filled,
            ReportStatus::Accepted => OrderState::PartiallyFilled,
            // Replace reports are only ever produced synchronously from
            // `handle_replace`; a venue that reports "amended" async has
            // nothing more specific for us to record here.
            ReportStatus::Replaced => return,
        };

        let outcome = self.inflight.with_mut(&cl_id, |o| {
            if let Some(eid) = &update.exchange_order_id {
                o.exchange_order_id = Some(eid.clone());
            }
            let _ = o.transition(new_state, update.ts_ns);
            (o.exchange_order_id.clone(), o.tags.clone())
        });
        let (exchange_order_id, tags) = outcome.unwrap_or((None, Tags::default()));

        let report = match status {
            ReportStatus::Rejected => ExecutionReport::rejected(
                cl_id.clone(),
                reason,
                update.raw_reason.clone().unwrap_or_default(),
                update.ts_ns,
                tags,
            ),
            ReportStatus::Canceled => ExecutionReport::canceled_ok(cl_id.clone(), exchange_order_id, update.ts_ns, tags),
            _ => ExecutionReport::accepted(cl_id.clone(), exchange_order_id, update.ts_ns, tags),
        };
        self.publish_report(report);

        if terminal {
            self.inflight.remove(&cl_id);
        }
    }

    /// Entry point for an adapter's `on_fill` callback. Adapters already
    /// dedup by `exec_id` within their own boundary; the exec_id check
    /// here is a second, cheap backstop, not the primary dedup
    /// mechanism.
    pub fn handle_fill(&self, venue: &str, fill: FillData) {
        let Some(cl_id) = self.resolve_cl_id(venue, fill.client_order_id.as_deref(), Some(&fill.exchange_order_id)) else {
            debug!(venue, exec_id = %fill.exec_id, "fill has no resolvable cl_id, dropping");
            return;
        };

        let outcome = self.inflight.with_mut(&cl_id, |o| {
            if o.fills.iter().any(|f| f.exec_id == fill.exec_id) {
                return (true, o.tags.clone());
            }
            o.apply_fill(TradeFill {
                exec_id: fill.exec_id.clone(),
                price: fill.price,
                size: fill.size,
                ts_ns: fill.ts_ns,
            });
            (false, o.tags.clone())
        });

        let tags = match outcome {
            Some((true, _)) => return,
            None => {
                debug!(cl_id = %cl_id, exec_id = %fill.exec_id, "fill for untracked cl_id, dropping");
                return;
            }
            Some((false, tags)) => tags,
        };

        let liquidity = if fill.is_maker { Liquidity::Maker } else { Liquidity::Taker };
        self.publish_fill(Fill {
            cl_id,
            exchange_order_id: fill.exchange_order_id,
            exec_id: fill.exec_id,
            symbol_or_pair: fill.symbol_or_pair,
            price: fill.price,
            size: fill.size,
            fee_currency: fill.fee_currency,
            fee_amount: fill.fee_amount,
            liquidity,
            ts_ns: fill.ts_ns,
            tags,
        });
    }

    fn reject(&self, cl_id: &str, reason_code: ReasonCode, reason_text: impl Into<String>, ts_ns: u64, tags: &Tags) {
        self.stats.inc_orders_rejected();
        self.publish_report(ExecutionReport::rejected(cl_id.to_string(), reason_code, reason_text, ts_ns, tags.clone()));
    }

    fn publish_report(&self, report: ExecutionReport) {
        self.journal_report(&report);
        match self.report_pool.acquire() {
            Some(mut slot) => {
                slot = report;
                self.push_or_release(PublishMessage::Report(slot));
            }
            None => self.stats.inc_pool_exhausted(),
        }
    }

    fn publish_fill(&self, fill: Fill) {
        self.journal_fill(&fill);
        match self.fill_pool.acquire() {
            Some(mut slot) => {
                slot = fill;
                self.push_or_release(PublishMessage::Fill(slot));
            }
            None => self.stats.inc_pool_exhausted(),
        }
    }

    fn push_or_release(&self, msg: PublishMessage) {
        if let Err(msg) = self.publish_queue.push(msg) {
            self.stats.inc_queue_full();
            match msg {
                PublishMessage::Report(r) => self.report_pool.release(r),
                PublishMessage::Fill(f) => self.fill_pool.release(f),
            }
        }
    }
}
