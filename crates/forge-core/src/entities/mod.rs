//! Domain field structs for all ProxyForge records.
//!
//! Deck and card structs hold domain fields only; version-control metadata is
//! carried by `Document<F>` / `VersionRecord<F>` in [`crate::version`]. All
//! structs derive `JsonSchema` so `forge-schema` can validate writes.

mod card;
mod deck;
mod migration;

pub use card::{CardFields, OriginalCard, ThemedCard};
pub use deck::{CardSpecification, DeckFields, ThemeConfiguration};
pub use migration::MigrationRecord;
