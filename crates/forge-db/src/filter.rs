//! Document filters.
//!
//! A filter selects live documents by id and/or by equality on JSON field
//! paths. Paths are inlined into SQL as `json_extract` expressions (matching
//! the declared expression indexes), so they are restricted to
//! `[A-Za-z0-9_.]` segments. Values are always bound parameters.

use std::fmt;

use serde_json::Value;

use crate::error::DatabaseError;
use crate::indexes::json_field_expr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    id: Option<String>,
    fields: Vec<(String, Value)>,
}

/// Result ordering for `list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// Oldest first by `created_at`, ties in insertion order.
    #[default]
    Created,
    /// Most recently updated first.
    RecentlyUpdated,
}

impl ListOrder {
    pub(crate) const fn to_sql(self) -> &'static str {
        match self {
            Self::Created => "created_at ASC, rowid ASC",
            Self::RecentlyUpdated => "updated_at DESC, rowid DESC",
        }
    }
}

impl DocumentFilter {
    /// Matches every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().id(id)
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Require the field at dotted `path` to equal `value`.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    #[must_use]
    pub fn id_value(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Render as a SQL condition (without `WHERE`) plus bound parameters,
    /// numbering placeholders from `?{first_param}`.
    pub(crate) fn to_sql(
        &self,
        first_param: usize,
    ) -> Result<(String, Vec<libsql::Value>), DatabaseError> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut idx = first_param;

        if let Some(id) = &self.id {
            clauses.push(format!("id = ?{idx}"));
            params.push(libsql::Value::Text(id.clone()));
            idx += 1;
        }

        for (path, value) in &self.fields {
            validate_path(path)?;
            let expr = json_field_expr(path);
            let bound = match value {
                Value::Null => {
                    clauses.push(format!("{expr} IS NULL"));
                    continue;
                }
                Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
                Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => libsql::Value::Integer(i),
                    (None, Some(f)) => libsql::Value::Real(f),
                    (None, None) => {
                        return Err(DatabaseError::Validation(format!(
                            "filter value for '{path}' is not representable: {n}"
                        )));
                    }
                },
                Value::String(s) => libsql::Value::Text(s.clone()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(DatabaseError::Validation(format!(
                        "filter value for '{path}' must be a scalar"
                    )));
                }
            };
            clauses.push(format!("{expr} = ?{idx}"));
            params.push(bound);
            idx += 1;
        }

        if clauses.is_empty() {
            return Ok(("1 = 1".to_string(), params));
        }
        Ok((clauses.join(" AND "), params))
    }
}

fn validate_path(path: &str) -> Result<(), DatabaseError> {
    let valid = !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(DatabaseError::Validation(format!(
            "invalid field path '{path}'"
        )))
    }
}

impl fmt::Display for DocumentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = &self.id {
            parts.push(format!("id = {id}"));
        }
        for (path, value) in &self.fields {
            parts.push(format!("{path} = {value}"));
        }
        if parts.is_empty() {
            f.write_str("{}")
        } else {
            write!(f, "{{{}}}", parts.join(", "))
        }
    }
}
