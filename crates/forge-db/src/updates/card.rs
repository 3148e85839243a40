//! Card update builder.

use serde::Serialize;

use forge_core::entities::ThemedCard;
use forge_core::enums::{ProxyStatus, RerollAspect};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProxyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thematic_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art_prompt: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reroll_aspects: Option<Vec<RerollAspect>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Option<String>>,
}

#[derive(Default)]
pub struct CardUpdateBuilder(CardUpdate);

impl CardUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(mut self, val: ProxyStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    #[must_use]
    pub fn thematic_name(mut self, val: Option<String>) -> Self {
        self.0.thematic_name = Some(val);
        self
    }

    #[must_use]
    pub fn flavor_text(mut self, val: Option<String>) -> Self {
        self.0.flavor_text = Some(val);
        self
    }

    #[must_use]
    pub fn art_prompt(mut self, val: Option<String>) -> Self {
        self.0.art_prompt = Some(val);
        self
    }

    #[must_use]
    pub fn image_url(mut self, val: Option<String>) -> Self {
        self.0.image_url = Some(val);
        self
    }

    #[must_use]
    pub fn reroll_aspects(mut self, val: Vec<RerollAspect>) -> Self {
        self.0.reroll_aspects = Some(val);
        self
    }

    #[must_use]
    pub fn error(mut self, val: Option<String>) -> Self {
        self.0.error = Some(val);
        self
    }

    /// Set all three themed parts at once.
    #[must_use]
    pub fn themed(self, card: ThemedCard) -> Self {
        self.thematic_name(Some(card.thematic_name))
            .flavor_text(Some(card.flavor_text))
            .art_prompt(Some(card.art_prompt))
    }

    #[must_use]
    pub fn build(self) -> CardUpdate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn some_none_serializes_as_null() {
        let update = CardUpdateBuilder::new()
            .status(ProxyStatus::Completed)
            .error(None)
            .build();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"status": "completed", "error": null})
        );
    }

    #[test]
    fn themed_sets_three_parts() {
        let update = CardUpdateBuilder::new()
            .themed(ThemedCard {
                thematic_name: "Force Lightning".into(),
                flavor_text: "Unlimited power!".into(),
                art_prompt: "a sith lord".into(),
            })
            .build();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["thematic_name"], "Force Lightning");
        assert_eq!(json["flavor_text"], "Unlimited power!");
        assert_eq!(json["art_prompt"], "a sith lord");
        assert!(json.get("status").is_none());
    }
}
