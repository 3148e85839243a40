//! Card repository: adding source cards to a deck and recording generated
//! theme content, rerolls and failures.

use forge_core::entities::{CardFields, OriginalCard, ThemedCard};
use forge_core::enums::{ProxyStatus, RerollAspect};
use forge_core::version::{Document, HistoryOptions, VersionHistory, VersionedUpdateOptions};

use crate::error::DatabaseError;
use crate::filter::{DocumentFilter, ListOrder};
use crate::service::ForgeService;
use crate::updates::card::{CardUpdate, CardUpdateBuilder};

/// Change reason recorded for a reroll, e.g. `"Reroll: name, flavor"`.
fn reroll_reason(aspects: &[RerollAspect]) -> String {
    let names: Vec<&str> = aspects.iter().map(|a| a.as_str()).collect();
    format!("Reroll: {}", names.join(", "))
}

impl ForgeService {
    /// Add a pending card to an existing deck.
    ///
    /// # Errors
    ///
    /// `NotFound` if the deck does not exist, `Validation` if the card fails
    /// the card schema.
    pub async fn add_card(
        &self,
        deck_id: &str,
        original_card: OriginalCard,
        actor_id: &str,
    ) -> Result<Document<CardFields>, DatabaseError> {
        self.get_deck(deck_id).await?;
        self.cards()
            .create(
                CardFields::pending(deck_id, original_card),
                &VersionedUpdateOptions::by(actor_id),
            )
            .await
    }

    /// # Errors
    ///
    /// `NotFound` if no card has this id.
    pub async fn get_card(&self, id: &str) -> Result<Document<CardFields>, DatabaseError> {
        self.cards().get(id).await
    }

    /// Cards of a deck in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_cards_for_deck(
        &self,
        deck_id: &str,
    ) -> Result<Vec<Document<CardFields>>, DatabaseError> {
        self.cards()
            .list(
                &DocumentFilter::new().field("deck_id", deck_id),
                ListOrder::Created,
                None,
            )
            .await
    }

    /// # Errors
    ///
    /// `NotFound` if the card does not exist, `Conflict` if concurrent
    /// writers kept winning.
    pub async fn mark_card_processing(
        &self,
        id: &str,
        actor_id: &str,
    ) -> Result<Document<CardFields>, DatabaseError> {
        let update = CardUpdateBuilder::new()
            .status(ProxyStatus::Processing)
            .build();
        self.update_card(id, &update, actor_id, "Generation started").await
    }

    /// Store generated content and mark the card completed.
    ///
    /// # Errors
    ///
    /// `NotFound` if the card does not exist, `Validation` if the content
    /// exceeds the themed-card limits.
    pub async fn apply_themed_card(
        &self,
        id: &str,
        themed: ThemedCard,
        actor_id: &str,
    ) -> Result<Document<CardFields>, DatabaseError> {
        let update = CardUpdateBuilder::new()
            .themed(themed)
            .status(ProxyStatus::Completed)
            .error(None)
            .build();
        self.update_card(id, &update, actor_id, "Themed card generated").await
    }

    /// Replace only the chosen aspects with freshly generated content.
    ///
    /// Rerolling the art clears any rendered image.
    ///
    /// # Errors
    ///
    /// `Validation` if `aspects` is empty or the content exceeds the
    /// themed-card limits, `NotFound` if the card does not exist.
    pub async fn reroll_card(
        &self,
        id: &str,
        themed: ThemedCard,
        aspects: &[RerollAspect],
        actor_id: &str,
    ) -> Result<Document<CardFields>, DatabaseError> {
        let mut aspects = aspects.to_vec();
        aspects.sort_unstable();
        aspects.dedup();
        if aspects.is_empty() {
            return Err(DatabaseError::Validation(
                "reroll needs at least one aspect".into(),
            ));
        }

        let mut builder = CardUpdateBuilder::new();
        for aspect in &aspects {
            builder = match aspect {
                RerollAspect::Name => builder.thematic_name(Some(themed.thematic_name.clone())),
                RerollAspect::Flavor => builder.flavor_text(Some(themed.flavor_text.clone())),
                RerollAspect::Art => builder
                    .art_prompt(Some(themed.art_prompt.clone()))
                    .image_url(None),
            };
        }
        let reason = reroll_reason(&aspects);
        let update = builder
            .status(ProxyStatus::Completed)
            .reroll_aspects(aspects)
            .error(None)
            .build();
        self.update_card(id, &update, actor_id, &reason).await
    }

    /// Record a generation failure.
    ///
    /// # Errors
    ///
    /// `NotFound` if the card does not exist.
    pub async fn mark_card_failed(
        &self,
        id: &str,
        message: &str,
        actor_id: &str,
    ) -> Result<Document<CardFields>, DatabaseError> {
        let update = CardUpdateBuilder::new()
            .status(ProxyStatus::Error)
            .error(Some(message.to_string()))
            .build();
        self.update_card(id, &update, actor_id, "Generation failed").await
    }

    /// Card history, paged by the configured default limit when none is given.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a record is malformed.
    pub async fn card_history(
        &self,
        id: &str,
        mut options: HistoryOptions,
    ) -> Result<VersionHistory<CardFields>, DatabaseError> {
        options.limit = options.limit.or(Some(self.history_limit()));
        self.cards().get_history(id, &options).await
    }

    async fn update_card(
        &self,
        id: &str,
        update: &CardUpdate,
        actor_id: &str,
        reason: &str,
    ) -> Result<Document<CardFields>, DatabaseError> {
        self.cards()
            .update(
                &DocumentFilter::by_id(id),
                update,
                &VersionedUpdateOptions::by(actor_id).reason(reason),
            )
            .await
    }
}
