//! Update builder types for deck and card mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some`
//! fields are serialized, so the struct is a `$set` patch for
//! `VersionControlManager::update`. `Option<Option<T>>` fields clear a value
//! when set to `Some(None)`.

pub mod card;
pub mod deck;
