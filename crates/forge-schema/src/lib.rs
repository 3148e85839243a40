//! # forge-schema
//!
//! Schema/validation layer for ProxyForge.
//!
//! Entity types are defined in `forge-core` with `#[derive(JsonSchema)]`. This
//! crate builds their JSON Schemas once, compiles a validator per schema, and
//! validates arbitrary JSON values before they reach storage.

mod error;
mod registry;

pub use error::SchemaError;
pub use registry::SchemaRegistry;
