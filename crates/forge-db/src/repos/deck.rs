//! Deck repository: creation, edits, sharing and publication state.

use forge_core::entities::{DeckFields, ThemeConfiguration};
use forge_core::enums::DeckStatus;
use forge_core::version::{
    Document, HistoryOptions, RollbackOptions, VersionHistory, VersionedUpdateOptions,
};

use crate::error::DatabaseError;
use crate::filter::{DocumentFilter, ListOrder};
use crate::service::ForgeService;
use crate::updates::deck::{DeckUpdate, DeckUpdateBuilder};

impl ForgeService {
    /// Create a private draft deck at version 1.
    ///
    /// # Errors
    ///
    /// `Validation` if the name or theme fails the deck schema, or if
    /// `actor_id` is blank; `WriteFailure` if a write is rejected.
    pub async fn create_deck(
        &self,
        user_id: &str,
        name: &str,
        theme: ThemeConfiguration,
        actor_id: &str,
    ) -> Result<Document<DeckFields>, DatabaseError> {
        let fields = DeckFields {
            user_id: user_id.to_string(),
            name: name.to_string(),
            theme,
            status: DeckStatus::Draft,
            is_public: false,
        };
        self.decks()
            .create(fields, &VersionedUpdateOptions::by(actor_id))
            .await
    }

    /// # Errors
    ///
    /// `NotFound` if no deck has this id.
    pub async fn get_deck(&self, id: &str) -> Result<Document<DeckFields>, DatabaseError> {
        self.decks().get(id).await
    }

    /// Apply `update`. An empty update returns the deck without a new version.
    ///
    /// # Errors
    ///
    /// `NotFound` if the deck does not exist, `Validation` if the result
    /// fails the deck schema, `Conflict` if concurrent writers kept winning.
    pub async fn update_deck(
        &self,
        id: &str,
        update: DeckUpdate,
        actor_id: &str,
        reason: Option<&str>,
    ) -> Result<Document<DeckFields>, DatabaseError> {
        if update.is_empty() {
            return self.get_deck(id).await;
        }
        let mut options = VersionedUpdateOptions::by(actor_id);
        options.change_reason = reason.map(String::from);
        self.decks()
            .update(&DocumentFilter::by_id(id), &update, &options)
            .await
    }

    /// Share the deck publicly or make it private.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_deck`].
    pub async fn set_deck_visibility(
        &self,
        id: &str,
        public: bool,
        actor_id: &str,
    ) -> Result<Document<DeckFields>, DatabaseError> {
        let reason = if public { "Shared publicly" } else { "Made private" };
        self.update_deck(
            id,
            DeckUpdateBuilder::new().is_public(public).build(),
            actor_id,
            Some(reason),
        )
        .await
    }

    /// Move a draft deck to `published`. Archived decks cannot be published.
    ///
    /// # Errors
    ///
    /// `InvalidState` for an archived deck; otherwise as
    /// [`Self::update_deck`].
    pub async fn publish_deck(
        &self,
        id: &str,
        actor_id: &str,
    ) -> Result<Document<DeckFields>, DatabaseError> {
        let deck = self.get_deck(id).await?;
        if deck.fields.status == DeckStatus::Archived {
            return Err(DatabaseError::InvalidState(format!(
                "deck {id} is archived and cannot be published"
            )));
        }
        self.update_deck(
            id,
            DeckUpdateBuilder::new().status(DeckStatus::Published).build(),
            actor_id,
            Some("Published"),
        )
        .await
    }

    /// # Errors
    ///
    /// Same as [`Self::update_deck`].
    pub async fn archive_deck(
        &self,
        id: &str,
        actor_id: &str,
    ) -> Result<Document<DeckFields>, DatabaseError> {
        self.update_deck(
            id,
            DeckUpdateBuilder::new().status(DeckStatus::Archived).build(),
            actor_id,
            Some("Archived"),
        )
        .await
    }

    /// Restore `target_version` as a new version.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown deck, `VersionNotFound` for an unknown
    /// target version.
    pub async fn rollback_deck(
        &self,
        id: &str,
        target_version: u32,
        actor_id: &str,
    ) -> Result<Document<DeckFields>, DatabaseError> {
        self.decks()
            .rollback(
                &DocumentFilter::by_id(id),
                &RollbackOptions::to(target_version, actor_id),
            )
            .await
    }

    /// Deck history, paged by the configured default limit when none is given.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a record is malformed.
    pub async fn deck_history(
        &self,
        id: &str,
        mut options: HistoryOptions,
    ) -> Result<VersionHistory<DeckFields>, DatabaseError> {
        options.limit = options.limit.or(Some(self.history_limit()));
        self.decks().get_history(id, &options).await
    }

    /// A user's decks, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_decks_for_user(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Document<DeckFields>>, DatabaseError> {
        self.decks()
            .list(
                &DocumentFilter::new().field("user_id", user_id),
                ListOrder::RecentlyUpdated,
                limit,
            )
            .await
    }

    /// Decks shared publicly, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_public_decks(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<Document<DeckFields>>, DatabaseError> {
        self.decks()
            .list(
                &DocumentFilter::new().field("is_public", true),
                ListOrder::RecentlyUpdated,
                limit,
            )
            .await
    }

    /// Remove a deck and its cards from the live collections. History stays.
    ///
    /// # Errors
    ///
    /// `NotFound` if the deck does not exist, `WriteFailure` if a delete is
    /// rejected. Cards already deleted stay deleted.
    pub async fn delete_deck(&self, id: &str) -> Result<Document<DeckFields>, DatabaseError> {
        let deck = self.get_deck(id).await?;
        for card in self.list_cards_for_deck(id).await? {
            self.cards().delete(&DocumentFilter::by_id(&card.id)).await?;
        }
        self.decks().delete(&DocumentFilter::by_id(&deck.id)).await
    }
}
