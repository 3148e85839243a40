//! Index declarations for every collection.
//!
//! Keys are either metadata columns or paths into the JSON `fields` column.
//! Field keys become `SQLite` expression indexes over
//! `json_extract(fields, '$.<path>')`, the same expression `DocumentFilter`
//! emits, so filtered reads can use them.

use crate::ForgeDb;
use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One component of a (possibly compound) index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKey {
    /// A dedicated column such as `current_version` or `updated_at`.
    Column(&'static str, SortOrder),
    /// A dotted path into the JSON `fields` column, e.g. `theme.name`.
    Field(&'static str, SortOrder),
}

impl IndexKey {
    fn to_sql(self) -> String {
        let (expr, order) = match self {
            Self::Column(name, order) => (name.to_string(), order),
            Self::Field(path, order) => (json_field_expr(path), order),
        };
        match order {
            SortOrder::Asc => expr,
            SortOrder::Desc => format!("{expr} DESC"),
        }
    }
}

/// SQL expression reading a dotted path out of the `fields` column.
pub(crate) fn json_field_expr(path: &str) -> String {
    format!("json_extract(fields, '$.{path}')")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub keys: &'static [IndexKey],
    pub unique: bool,
}

impl IndexSpec {
    const fn new(name: &'static str, keys: &'static [IndexKey]) -> Self {
        Self {
            name,
            keys,
            unique: false,
        }
    }

    const fn unique(name: &'static str, keys: &'static [IndexKey]) -> Self {
        Self {
            name,
            keys,
            unique: true,
        }
    }

    /// Index name as created in the database: `idx_<table>_<name>`.
    #[must_use]
    pub fn qualified_name(&self, table: &str) -> String {
        format!("idx_{table}_{}", self.name)
    }

    #[must_use]
    pub fn create_sql(&self, table: &str) -> String {
        let keys: Vec<String> = self.keys.iter().map(|k| k.to_sql()).collect();
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {table} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.qualified_name(table),
            keys.join(", ")
        )
    }
}

use IndexKey::{Column, Field};
use SortOrder::{Asc, Desc};

pub const DECK_INDEXES: &[IndexSpec] = &[
    IndexSpec::new("user_status", &[Field("user_id", Asc), Field("status", Asc)]),
    IndexSpec::new("name", &[Field("name", Asc)]),
    IndexSpec::new("current_version", &[Column("current_version", Desc)]),
    IndexSpec::new("theme_name", &[Field("theme.name", Asc)]),
    IndexSpec::new("updated_at", &[Column("updated_at", Desc)]),
    IndexSpec::new("user_updated", &[Field("user_id", Asc), Column("updated_at", Desc)]),
    IndexSpec::new("status_updated", &[Field("status", Asc), Column("updated_at", Desc)]),
    IndexSpec::new("is_public", &[Field("is_public", Asc)]),
];

pub const CARD_INDEXES: &[IndexSpec] = &[
    IndexSpec::new("deck_id", &[Field("deck_id", Asc)]),
    IndexSpec::new("status", &[Field("status", Asc)]),
    IndexSpec::new("current_version", &[Column("current_version", Desc)]),
    IndexSpec::new("original_card_id", &[Field("original_card.id", Asc)]),
    IndexSpec::new("oracle_id", &[Field("original_card.oracle_id", Asc)]),
    IndexSpec::new("deck_status", &[Field("deck_id", Asc), Field("status", Asc)]),
    IndexSpec::new("deck_version", &[Field("deck_id", Asc), Column("current_version", Desc)]),
];

/// Indexes for live collections without a dedicated declaration.
pub const LIVE_INDEXES: &[IndexSpec] = &[
    IndexSpec::new("current_version", &[Column("current_version", Desc)]),
    IndexSpec::new("updated_at", &[Column("updated_at", Desc)]),
];

/// Shared by every history collection.
pub const HISTORY_INDEXES: &[IndexSpec] = &[
    IndexSpec::new("document_id", &[Column("document_id", Asc)]),
    IndexSpec::new("version", &[Column("version", Desc)]),
    IndexSpec::new("timestamp", &[Column("timestamp", Desc)]),
    IndexSpec::new("changed_by", &[Column("changed_by", Asc)]),
    IndexSpec::new("document_version", &[Column("document_id", Asc), Column("version", Desc)]),
    IndexSpec::new(
        "document_timestamp",
        &[Column("document_id", Asc), Column("timestamp", Desc)],
    ),
];

pub const MIGRATION_INDEXES: &[IndexSpec] = &[
    IndexSpec::unique("version", &[Column("version", Asc)]),
    IndexSpec::new("status", &[Column("status", Asc)]),
];

/// Create every index in `indexes` on `table`. Returns how many were declared.
///
/// # Errors
///
/// Returns `DatabaseError::WriteFailure` naming the first index that could not
/// be created.
pub async fn ensure_indexes(
    db: &ForgeDb,
    table: &str,
    indexes: &[IndexSpec],
) -> Result<usize, DatabaseError> {
    for index in indexes {
        let name = index.qualified_name(table);
        if let Err(e) = db.conn().execute(&index.create_sql(table), ()).await {
            tracing::error!(table, index = %name, error = %e, "failed to create index");
            return Err(DatabaseError::WriteFailure(format!("index {name}: {e}")));
        }
        tracing::debug!(table, index = %name, "index ensured");
    }
    Ok(indexes.len())
}
