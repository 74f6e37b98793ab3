//! Symbol & time-in-force normalization (C1).
//!
//! Two total functions carry a raw venue symbol to the two canonical forms
//! the rest of the core agrees on: `compact` (`ETHUSDT`) and `hyphen`
//! (`ETH-USDT` / `ETH-USDT-PERP`). Both are pure string transforms — no
//! venue lookup, no I/O — so they stay on the hot path.

use crate::model::{ProductType, TimeInForce};

/// Quote currencies considered when splitting a compact symbol into base/quote.
/// Order matters for longest-match: a prefix like `USD` must not shadow `USDT`/`USDC`.
const QUOTE_CURRENCIES: &[&str] = &["USDT", "USDC", "FDUSD", "BTC", "ETH", "USD", "EUR", "DAI"];

/// Strip a `:SETTLE` suffix (ccxt-style unified symbols, e.g. `ETH/USDT:USDT`).
fn strip_settle_suffix(raw: &str) -> &str {
    match raw.find(':') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Collapse any non-alphanumeric separator and uppercase.
fn strip_separators_upper(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Canonical compact form: `ETH/USDT:USDT`, `ETH-USDT-PERP`, and `ethusdt`
/// all normalize to `ETHUSDT`.
///
/// Idempotent: `compact(compact(s, p), p) == compact(s, p)` for any `(s, p)`,
/// since the transform only removes characters that are already absent once
/// applied.
pub fn compact(raw_symbol: &str, product_type: ProductType) -> String {
    let no_settle = strip_settle_suffix(raw_symbol);
    let upper = strip_separators_upper(no_settle);
    let without_perp = if matches!(product_type, ProductType::Perpetual) {
        upper.strip_suffix("PERP").unwrap_or(&upper).to_string()
    } else {
        upper
    };
    without_perp
}

/// Canonical hyphenated form: split a compact symbol on the longest
/// matching quote currency suffix, and append `-PERP` when `is_perp`.
pub fn hyphen(compact_symbol: &str, is_perp: bool) -> String {
    let base_quote = split_base_quote(compact_symbol);
    match base_quote {
        Some((base, quote)) => {
            if is_perp {
                format!("{base}-{quote}-PERP")
            } else {
                format!("{base}-{quote}")
            }
        }
        None => compact_symbol.to_string(),
    }
}

/// Split a compact symbol into `(base, quote)` using the longest matching
/// entry in [`QUOTE_CURRENCIES`]. Returns `None` if no known quote matches,
/// in which case the caller should treat the symbol as opaque.
fn split_base_quote(compact_symbol: &str) -> Option<(String, String)> {
    let mut best: Option<&str> = None;
    for quote in QUOTE_CURRENCIES {
        if compact_symbol.ends_with(quote) && compact_symbol.len() > quote.len() {
            match best {
                Some(b) if b.len() >= quote.len() => {}
                _ => best = Some(quote),
            }
        }
    }
    best.map(|quote| {
        let base = &compact_symbol[..compact_symbol.len() - quote.len()];
        (base.to_string(), quote.to_string())
    })
}

/// Canonical form for a raw symbol: compact, then re-hyphenate. This is
/// the function callers should use end-to-end; `compact`/`hyphen` are
/// exposed separately so each half is independently testable against
/// its own round-trip law.
pub fn canonical(raw_symbol: &str, product_type: ProductType) -> String {
    let c = compact(raw_symbol, product_type);
    hyphen(&c, matches!(product_type, ProductType::Perpetual))
}

/// Normalize a raw time-in-force token. Case-insensitive; unknown values
/// are passed through unchanged (the caller sees `None` and keeps the raw
/// string so downstream validation can flag it).
pub fn normalize_tif(raw: &str) -> Option<TimeInForce> {
    match raw.to_ascii_lowercase().as_str() {
        "gtc" => Some(TimeInForce::GTC),
        "ioc" => Some(TimeInForce::IOC),
        "fok" => Some(TimeInForce::FOK),
        "po" | "post_only" | "postonly" => Some(TimeInForce::PostOnly),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn compact_unifies_equivalent_spot_symbols() {
        assert_eq!(compact("ETH/USDT:USDT", ProductType::Spot), "ETHUSDT");
        assert_eq!(compact("ethusdt", ProductType::Spot), "ETHUSDT");
    }

    #[test]
    fn compact_strips_perp_suffix_only_for_perpetual() {
        assert_eq!(compact("ETH-USDT-PERP", ProductType::Perpetual), "ETHUSDT");
        assert_eq!(compact("ETH-USDT-PERP", ProductType::Spot), "ETHUSDTPERP");
    }

    #[test]
    fn hyphen_longest_match_prefers_usdt_over_usd() {
        assert_eq!(hyphen("ETHUSDT", false), "ETH-USDT");
    }

    #[test]
    fn hyphen_appends_perp_suffix() {
        assert_eq!(hyphen("ETHUSDT", true), "ETH-USDT-PERP");
    }

    #[test]
    fn tif_normalizes_case_insensitively() {
        assert_eq!(normalize_tif("Gtc"), Some(TimeInForce::GTC));
        assert_eq!(normalize_tif("POST_ONLY"), Some(TimeInForce::PostOnly));
        assert_eq!(normalize_tif("po"), Some(TimeInForce::PostOnly));
    }

    #[test]
    fn tif_passes_through_unknown_values() {
        assert_eq!(normalize_tif("good-til-date"), None);
    }

    proptest! {
        #[test]
        fn compact_is_idempotent(s in "[A-Za-z0-9/:_-]{1,24}") {
            let once = compact(&s, ProductType::Spot);
            let twice = compact(&once, ProductType::Spot);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn hyphen_round_trips_through_compact_for_known_quotes(
            base in "[A-Z]{2,5}", quote_idx in 0..QUOTE_CURRENCIES.len()
        ) {
            let quote = QUOTE_CURRENCIES[quote_idx];
            let sym = format!("{base}{quote}");
            let c = compact(&sym, ProductType::Spot);
            prop_assert_eq!(hyphen(&c, false), format!("{base}-{quote}"));
        }
    }
}
