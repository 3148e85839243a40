//! # forge-core
//!
//! Core types, ID prefixes, and error types for ProxyForge.
//!
//! This crate provides the foundational types shared across all ProxyForge crates:
//! - Domain field structs for decks and cards, plus the migration record
//! - Status enums (deck, proxy card, migration) and reroll aspects
//! - ID prefix constants
//! - The version-control record shapes: live [`version::Document`] and
//!   immutable [`version::VersionRecord`], tied together by [`version::Versioned`]
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod version;
