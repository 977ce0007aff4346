//! # Schema Graph Error Types
//!
//! - **NotFound**: a table, node, column, foreign key name or foreign key column
//!   set is missing where the caller expected it
//! - **NotJoinable** / **Ambiguous**: a bare table reference could not be resolved
//!   to exactly one node of a tree
//! - **UnconfiguredTable**: a root was requested for a table outside the
//!   configured catalog schemas
//!
//! None of these are transient; they indicate a mismatch between the caller
//! and the schema and are never retried.

use std::fmt;

use thiserror::Error;

use crate::catalog::errors::CatalogError;
use crate::utils::keyed_cache::LockPoisoned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Table,
    Node,
    Column,
    ForeignKeyName,
    ForeignKeyColumns,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            LookupKind::Table => "table",
            LookupKind::Node => "node",
            LookupKind::Column => "column",
            LookupKind::ForeignKeyName => "foreign key",
            LookupKind::ForeignKeyColumns => "foreign key on columns",
        };
        f.write_str(kind)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaGraphError {
    #[error("No {kind} `{name}` found on `{table}`")]
    NotFound {
        kind: LookupKind,
        name: String,
        table: String,
    },
    #[error("Table `{table}` cannot be joined into the tree rooted at `{root}`: no occurrence reachable")]
    NotJoinable { table: String, root: String },
    #[error("Table `{table}` occurs {count} times in the tree rooted at `{root}`; use a column taken from the intended node instead")]
    Ambiguous {
        table: String,
        root: String,
        count: usize,
    },
    #[error("Table `{table}` is not part of the configured catalog (schemas: {schemas})")]
    UnconfiguredTable { table: String, schemas: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<LockPoisoned> for SchemaGraphError {
    fn from(e: LockPoisoned) -> Self {
        SchemaGraphError::Catalog(e.into())
    }
}

impl SchemaGraphError {
    pub fn not_found(kind: LookupKind, name: impl Into<String>, table: impl ToString) -> Self {
        SchemaGraphError::NotFound {
            kind,
            name: name.into(),
            table: table.to_string(),
        }
    }
}
