//! Normalized schema + table key.
//!
//! Catalog drivers are inconsistent about identifier case (`PUBLIC.ORDERS` vs
//! `public.orders`), so every comparison, hash and ordering goes through the
//! lowercased form while the spelling the driver reported is kept for display
//! and for rendering SQL.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawIdentity", into = "RawIdentity")]
pub struct TableIdentity {
    schema: String,
    name: String,
    schema_key: String,
    name_key: String,
}

#[derive(Serialize, Deserialize)]
struct RawIdentity {
    schema: String,
    name: String,
}

impl From<RawIdentity> for TableIdentity {
    fn from(raw: RawIdentity) -> Self {
        TableIdentity::new(raw.schema, raw.name)
    }
}

impl From<TableIdentity> for RawIdentity {
    fn from(id: TableIdentity) -> Self {
        RawIdentity {
            schema: id.schema,
            name: id.name,
        }
    }
}

impl TableIdentity {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        let schema = schema.into();
        let name = name.into();
        TableIdentity {
            schema_key: regularize(&schema),
            name_key: regularize(&name),
            schema,
            name,
        }
    }

    /// Parse `schema.table`. The schema part is required.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (schema, name) = qualified.trim().split_once('.')?;
        if schema.is_empty() || name.is_empty() || name.contains('.') {
            return None;
        }
        Some(TableIdentity::new(schema, name))
    }

    /// Schema name as reported by the catalog
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Table name as reported by the catalog
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_key(&self) -> &str {
        &self.schema_key
    }

    pub fn name_key(&self) -> &str {
        &self.name_key
    }
}

/// Case-fold an identifier for lookups (table names, column names, foreign key names).
pub fn regularize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

impl PartialEq for TableIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.schema_key == other.schema_key && self.name_key == other.name_key
    }
}

impl Eq for TableIdentity {}

impl Hash for TableIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_key.hash(state);
        self.name_key.hash(state);
    }
}

impl PartialOrd for TableIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TableIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.schema_key
            .cmp(&other.schema_key)
            .then_with(|| self.name_key.cmp(&other.name_key))
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
