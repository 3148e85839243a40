use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ProxyStatus, RerollAspect};
use crate::ids::{PREFIX_CARD, PREFIX_CARD_VERSION};
use crate::version::Versioned;

/// Mechanics of the source card as returned by the card-lookup service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OriginalCard {
    #[schemars(length(min = 1))]
    pub id: String,
    #[schemars(length(min = 1))]
    pub name: String,
    #[schemars(length(min = 1))]
    pub oracle_id: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub toughness: Option<String>,
    #[serde(default)]
    pub loyalty: Option<String>,
}

/// Generated theme content for one card.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ThemedCard {
    #[schemars(length(min = 1, max = 100))]
    pub thematic_name: String,
    #[schemars(length(min = 1, max = 500))]
    pub flavor_text: String,
    #[schemars(length(min = 1, max = 1000))]
    pub art_prompt: String,
}

impl ThemedCard {
    pub const MAX_NAME_LEN: usize = 100;
    pub const MAX_FLAVOR_LEN: usize = 500;
    pub const MAX_ART_PROMPT_LEN: usize = 1000;
}

/// Domain fields of a themed proxy card.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CardFields {
    #[schemars(length(min = 1))]
    pub deck_id: String,
    pub original_card: OriginalCard,
    pub status: ProxyStatus,
    #[serde(default)]
    #[schemars(length(min = 1, max = 100))]
    pub thematic_name: Option<String>,
    #[serde(default)]
    #[schemars(length(min = 1, max = 500))]
    pub flavor_text: Option<String>,
    #[serde(default)]
    #[schemars(length(min = 1, max = 1000))]
    pub art_prompt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Aspects regenerated by the most recent reroll.
    #[serde(default)]
    pub reroll_aspects: Vec<RerollAspect>,
    /// Last generation failure, cleared on success.
    #[serde(default)]
    pub error: Option<String>,
}

impl CardFields {
    /// A fresh, not-yet-themed card.
    #[must_use]
    pub fn pending(deck_id: impl Into<String>, original_card: OriginalCard) -> Self {
        Self {
            deck_id: deck_id.into(),
            original_card,
            status: ProxyStatus::Pending,
            thematic_name: None,
            flavor_text: None,
            art_prompt: None,
            image_url: None,
            reroll_aspects: Vec::new(),
            error: None,
        }
    }

    /// The themed content, if all three parts have been generated.
    #[must_use]
    pub fn themed(&self) -> Option<ThemedCard> {
        Some(ThemedCard {
            thematic_name: self.thematic_name.clone()?,
            flavor_text: self.flavor_text.clone()?,
            art_prompt: self.art_prompt.clone()?,
        })
    }
}

impl Versioned for CardFields {
    const COLLECTION: &'static str = "cards";
    const HISTORY_COLLECTION: &'static str = "card_versions";
    const SCHEMA: &'static str = "card";
    const VERSION_SCHEMA: &'static str = "card_version";
    const ID_PREFIX: &'static str = PREFIX_CARD;
    const VERSION_ID_PREFIX: &'static str = PREFIX_CARD_VERSION;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolt() -> OriginalCard {
        OriginalCard {
            id: "e3285e6b".into(),
            name: "Lightning Bolt".into(),
            oracle_id: "4457ed35".into(),
            type_line: "Instant".into(),
            oracle_text: "Lightning Bolt deals 3 damage to any target.".into(),
            mana_cost: Some("{R}".into()),
            power: None,
            toughness: None,
            loyalty: None,
        }
    }

    #[test]
    fn pending_card_has_no_theme() {
        let card = CardFields::pending("dck-00000001", bolt());
        assert_eq!(card.status, ProxyStatus::Pending);
        assert!(card.themed().is_none());
    }

    #[test]
    fn themed_requires_all_parts() {
        let mut card = CardFields::pending("dck-00000001", bolt());
        card.thematic_name = Some("Force Lightning".into());
        card.flavor_text = Some("Unlimited power!".into());
        assert!(card.themed().is_none());
        card.art_prompt = Some("a sith lord casting lightning --ar 3:5".into());
        assert_eq!(card.themed().unwrap().thematic_name, "Force Lightning");
    }
}
