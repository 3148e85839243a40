//! Central schema registry for all ProxyForge record types.
//!
//! The `SchemaRegistry` builds JSON Schemas from forge-core types at construction
//! time using [`schemars::schema_for!`] and validates values via `jsonschema`.
//! Each schema is compiled on its first validation and the validator is kept.

use std::collections::HashMap;
use std::sync::OnceLock;

use forge_core::entities::{
    CardFields, DeckFields, MigrationRecord, OriginalCard, ThemeConfiguration, ThemedCard,
};
use forge_core::version::VersionRecord;
use schemars::{JsonSchema, schema_for};

use crate::error::SchemaError;

/// Central store of all JSON Schemas in the ProxyForge system.
///
/// Built from forge-core types via [`schemars::schema_for!`]. Provides lookup
/// by name and validation of arbitrary JSON values against registered schemas.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, Entry>,
}

struct Entry {
    schema: serde_json::Value,
    validator: OnceLock<jsonschema::Validator>,
}

impl Entry {
    fn new(schema: serde_json::Value) -> Self {
        Self {
            schema,
            validator: OnceLock::new(),
        }
    }

    fn validator(&self) -> Result<&jsonschema::Validator, SchemaError> {
        if let Some(validator) = self.validator.get() {
            return Ok(validator);
        }
        let compiled = jsonschema::validator_for(&self.schema)
            .map_err(|e| SchemaError::Generation(format!("{e}")))?;
        Ok(self.validator.get_or_init(|| compiled))
    }
}

macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert($name, Entry::new(schema_for!($ty).to_value()));
    };
}

impl SchemaRegistry {
    /// Build a registry containing every live, history, and collaborator schema.
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();

        // --- Live document fields (2) ---
        register!(schemas, "deck", DeckFields);
        register!(schemas, "card", CardFields);

        // --- History records (2) ---
        register!(schemas, "deck_version", VersionRecord<DeckFields>);
        register!(schemas, "card_version", VersionRecord<CardFields>);

        // --- Nested / collaborator payloads (3) ---
        register!(schemas, "theme_configuration", ThemeConfiguration);
        register!(schemas, "original_card", OriginalCard);
        register!(schemas, "themed_card", ThemedCard);

        // --- Bookkeeping (1) ---
        register!(schemas, "migration_record", MigrationRecord);

        Self { schemas }
    }

    /// Register (or replace) the schema of an additional type under `name`.
    ///
    /// Used for versioned types defined outside forge-core.
    pub fn register<T: JsonSchema>(&mut self, name: &'static str) {
        self.schemas
            .insert(name, Entry::new(schema_for!(T).to_value()));
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name).map(|entry| &entry.schema)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown, or
    /// `SchemaError::ValidationFailed` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), SchemaError> {
        let validator = self
            .schemas
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?
            .validator()?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(schema = name, count = errors.len(), "validation rejected value");
            Err(SchemaError::ValidationFailed { errors })
        }
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
