use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DeckStatus;
use crate::ids::{PREFIX_DECK, PREFIX_DECK_VERSION};
use crate::version::Versioned;

/// Narrative theme applied to every card of a deck.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfiguration {
    #[schemars(length(min = 1, max = 100))]
    pub name: String,
    #[schemars(length(min = 1, max = 1000))]
    pub description: String,
    #[schemars(length(min = 1, max = 10))]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    /// Per-card requests, e.g. "make Lightning Bolt reference the Death Star".
    #[serde(default)]
    pub specifics: Vec<CardSpecification>,
}

/// A thematic reference requested for one card by name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CardSpecification {
    #[schemars(length(min = 1))]
    pub card_name: String,
    #[schemars(length(min = 1))]
    pub thematic_reference: String,
}

impl ThemeConfiguration {
    /// Case-insensitive lookup of the specific reference for `card_name`.
    #[must_use]
    pub fn reference_for(&self, card_name: &str) -> Option<&str> {
        self.specifics
            .iter()
            .find(|s| s.card_name.eq_ignore_ascii_case(card_name))
            .map(|s| s.thematic_reference.as_str())
    }
}

/// Domain fields of a deck.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeckFields {
    /// Owner identity (opaque user id).
    #[schemars(length(min = 1))]
    pub user_id: String,
    #[schemars(length(min = 1, max = 100))]
    pub name: String,
    pub theme: ThemeConfiguration,
    pub status: DeckStatus,
    /// Sharing control: public decks are listed for every user.
    #[serde(default)]
    pub is_public: bool,
}

impl Versioned for DeckFields {
    const COLLECTION: &'static str = "decks";
    const HISTORY_COLLECTION: &'static str = "deck_versions";
    const SCHEMA: &'static str = "deck";
    const VERSION_SCHEMA: &'static str = "deck_version";
    const ID_PREFIX: &'static str = PREFIX_DECK;
    const VERSION_ID_PREFIX: &'static str = PREFIX_DECK_VERSION;
}
