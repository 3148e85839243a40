//! ID prefixes for every stored record type.
//!
//! IDs are `{prefix}-{8 hex chars}`, e.g. `dck-a3f8b2c1`. The random part is
//! generated by the database (see `ForgeDb::generate_id`).

pub const PREFIX_DECK: &str = "dck";
pub const PREFIX_CARD: &str = "crd";
pub const PREFIX_DECK_VERSION: &str = "dkv";
pub const PREFIX_CARD_VERSION: &str = "cdv";

/// Every prefix in use, for tests and ID sanity checks.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_DECK,
    PREFIX_CARD,
    PREFIX_DECK_VERSION,
    PREFIX_CARD_VERSION,
];

/// Whether `id` looks like `{prefix}-{8 hex}`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_unique() {
        let mut sorted = ALL_PREFIXES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ALL_PREFIXES.len());
    }

    #[test]
    fn has_prefix_checks_shape() {
        assert!(has_prefix("dck-a3f8b2c1", PREFIX_DECK));
        assert!(!has_prefix("dck-a3f8b2c", PREFIX_DECK));
        assert!(!has_prefix("crd-a3f8b2c1", PREFIX_DECK));
        assert!(!has_prefix("dck-zzzzzzzz", PREFIX_DECK));
    }
}
