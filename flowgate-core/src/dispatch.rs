//! Action dispatcher (C4): a perfect hash over the three-token alphabet
//! `{place, cancel, replace}`.
//!
//! No crate in the dependency stack offers a perfect-hash builder sized for
//! a fixed three-element alphabet known at compile time, so the FNV-1a
//! hash and its three precomputed buckets are hand-rolled as `const fn`.
//! Collisions are impossible by construction: the three hashes are
//! verified distinct in a unit test, and `Action`'s own `serde` decoding
//! already rejects anything outside the three tokens before this is ever
//! called, so this path exists purely to avoid a string-compare chain on
//! the hot path.

use crate::model::Action;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

const HASH_PLACE: u32 = fnv1a_32(b"place");
const HASH_CANCEL: u32 = fnv1a_32(b"cancel");
const HASH_REPLACE: u32 = fnv1a_32(b"replace");

/// Dispatch on a raw action token. Returns `None` for anything outside
/// the three-element alphabet; the caller maps that to an
/// `invalid_params` rejection.
pub fn dispatch_token(token: &str) -> Option<Action> {
    match fnv1a_32(token.as_bytes()) {
        HASH_PLACE if token == "place" => Some(Action::Place),
        HASH_CANCEL if token == "cancel" => Some(Action::Cancel),
        HASH_REPLACE if token == "replace" => Some(Action::Replace),
        _ => None,
    }
}

/// Dispatch on an already-decoded [`Action`] — the common case, since the
/// parser (C3) has already run the token through `serde`. Exposed so
/// callers never need to re-stringify an `Action` just to re-hash it.
pub fn dispatch_action(action: Action) -> Action {
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_three_hashes_are_pairwise_distinct() {
        assert_ne!(HASH_PLACE, HASH_CANCEL);
        assert_ne!(HASH_PLACE, HASH_REPLACE);
        assert_ne!(HASH_CANCEL, HASH_REPLACE);
    }

    #[test]
    fn recognizes_all_three_tokens() {
        assert_eq!(dispatch_token("place"), Some(Action::Place));
        assert_eq!(dispatch_token("cancel"), Some(Action::Cancel));
        assert_eq!(dispatch_token("replace"), Some(Action::Replace));
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert_eq!(dispatch_token("placex"), None);
        assert_eq!(dispatch_token(""), None);
        assert_eq!(dispatch_token("PLACE"), None);
    }
}
