//! # forge-services
//!
//! Plumbing shared by the ProxyForge collaborators that talk to the card
//! lookup and generation services: a token-bucket rate limiter, an in-process
//! TTL cache, a strict parser for generated theme text, and batching.
//!
//! Each piece is constructed once at startup and passed by reference (or
//! `Arc`) to whatever needs it.

pub mod batch;
pub mod cache;
pub mod error;
pub mod rate_limit;
pub mod theme;

pub use batch::chunked;
pub use cache::TtlCache;
pub use error::{ParseError, ServiceError};
pub use rate_limit::TokenBucket;
pub use theme::parse_theme_response;
