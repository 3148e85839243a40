//! Deck update builder.

use serde::Serialize;

use forge_core::entities::ThemeConfiguration;
use forge_core::enums::DeckStatus;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeckStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl DeckUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.theme.is_none() && self.status.is_none() && self.is_public.is_none()
    }
}

#[derive(Default)]
pub struct DeckUpdateBuilder(DeckUpdate);

impl DeckUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn theme(mut self, val: ThemeConfiguration) -> Self {
        self.0.theme = Some(val);
        self
    }

    #[must_use]
    pub fn status(mut self, val: DeckStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    #[must_use]
    pub fn is_public(mut self, val: bool) -> Self {
        self.0.is_public = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> DeckUpdate {
        self.0
    }
}
