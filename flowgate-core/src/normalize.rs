//! Reason & status normalizer (C9): maps a venue's raw `(status, reason)`
//! strings onto the canonical `(ReportStatus, ReasonCode)` pair.
//! Table-driven and pure — no venue lookup, no I/O — so every adapter
//! routes its callbacks through the same classification instead of each
//! inventing its own mapping.

use crate::model::{ReasonCode, ReportStatus};

/// Canonical status for a raw venue status string. Unrecognized statuses
/// return `None`; the caller should treat that as "no report transition",
/// not as a rejection (a venue may emit bookkeeping statuses the core
/// doesn't model).
pub fn normalize_status(raw_status: &str) -> Option<ReportStatus> {
    match raw_status.to_ascii_lowercase().as_str() {
        "new" | "partially_filled" | "filled" | "accepted" => Some(ReportStatus::Accepted),
        "cancelled" | "canceled" | "partially_filled_canceled" | "inactive" | "deactivated" => {
            Some(ReportStatus::Canceled)
        }
        "rejected" => Some(ReportStatus::Rejected),
        "amended" | "replaced" => Some(ReportStatus::Replaced),
        _ => None,
    }
}

/// Classify a rejection's raw reason text into a canonical reason code by
/// substring match, falling back to `venue_reject`.
pub fn normalize_reject_reason(raw_reason: &str) -> ReasonCode {
    let lower = raw_reason.to_ascii_lowercase();
    if lower.contains("balance") || lower.contains("margin") || lower.contains("insufficient") {
        ReasonCode::InsufficientBalance
    } else if lower.contains("min_size") || lower.contains("minimum size") || lower.contains("min size") {
        ReasonCode::MinSize
    } else if lower.contains("price") && (lower.contains("bound") || lower.contains("limit") || lower.contains("band")) {
        ReasonCode::PriceOutOfBounds
    } else if lower.contains("rate limit") || lower.contains("too many requests") {
        ReasonCode::RateLimited
    } else {
        ReasonCode::VenueReject
    }
}

/// Whether a raw venue status represents a terminal order state for
/// pruning purposes. Note this is richer than the canonical
/// `ReportStatus` the raw status maps to: a raw `"filled"` status
/// normalizes to the wire-visible `ReportStatus::Accepted` (per the
/// table above) but is still terminal internally, since `InFlightOrder`
/// tracks a `filled` state the wire `ReportStatus` enum has no slot for.
pub fn is_terminal_raw_status(raw_status: &str) -> bool {
    matches!(
        raw_status.to_ascii_lowercase().as_str(),
        "filled"
            | "cancelled"
            | "canceled"
            | "partially_filled_canceled"
            | "inactive"
            | "deactivated"
            | "rejected"
    )
}

/// Full (status, reason_code) pair for a raw venue event. `raw_reason` is
/// only consulted when `raw_status` normalizes to `rejected`.
pub fn normalize(raw_status: &str, raw_reason: Option<&str>) -> Option<(ReportStatus, ReasonCode)> {
    let status = normalize_status(raw_status)?;
    let reason_code = match status {
        ReportStatus::Rejected => raw_reason.map(normalize_reject_reason).unwrap_or(ReasonCode::VenueReject),
        _ => ReasonCode::Ok,
    };
    Some((status, reason_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_order_statuses_normalize_to_accepted() {
        for raw in ["new", "partially_filled", "filled", "accepted"] {
            assert_eq!(normalize_status(raw), Some(ReportStatus::Accepted));
        }
    }

    #[test]
    fn cancellation_variants_normalize_to_canceled() {
        for raw in ["cancelled", "canceled", "partially_filled_canceled", "inactive", "deactivated"] {
            assert_eq!(normalize_status(raw), Some(ReportStatus::Canceled));
        }
    }

    #[test]
    fn rejection_reason_classifies_by_substring() {
        assert_eq!(normalize_reject_reason("Insufficient balance for order"), ReasonCode::InsufficientBalance);
        assert_eq!(normalize_reject_reason("order below min_size"), ReasonCode::MinSize);
        assert_eq!(normalize_reject_reason("price out of bound"), ReasonCode::PriceOutOfBounds);
        assert_eq!(normalize_reject_reason("rate limit exceeded"), ReasonCode::RateLimited);
        assert_eq!(normalize_reject_reason("unknown symbol"), ReasonCode::VenueReject);
    }

    #[test]
    fn status_normalization_is_idempotent() {
        let once = normalize_status("filled").unwrap();
        let stringified = match once {
            ReportStatus::Accepted => "accepted",
            ReportStatus::Rejected => "rejected",
            ReportStatus::Canceled => "canceled",
            ReportStatus::Replaced => "replaced",
        };
        assert_eq!(normalize_status(stringified), Some(once));
    }

    #[test]
    fn unknown_status_yields_none() {
        assert_eq!(normalize_status("some_unmodeled_bookkeeping_status"), None);
    }
}
