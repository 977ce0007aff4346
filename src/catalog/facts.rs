//! Raw catalog facts as reported by a driver.
//!
//! These are immutable once fetched. The graph builder consumes them through
//! the metadata cache and never mutates them.

use serde::{Deserialize, Serialize};

use super::table_identity::{regularize, TableIdentity};
use super::value_type::ValueType;

/// One physical column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFact {
    pub name: String,
    /// Driver type code (standard `Types` numbering)
    pub type_code: i32,
    /// Driver type name, e.g. "varchar", "int4"
    pub type_name: String,
    pub nullable: bool,
    /// 1-based ordinal position in the table
    pub position: u32,
    /// Type already mapped by the layer that reported the column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

impl ColumnFact {
    pub fn new(name: impl Into<String>, type_code: i32, type_name: impl Into<String>) -> Self {
        ColumnFact {
            name: name.into(),
            type_code,
            type_name: type_name.into(),
            nullable: true,
            position: 0,
            value_type: None,
        }
    }
}

/// Primary key column set of a table, in key sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyFact {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// A single column pairing inside a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPair {
    /// Column on the referenced (primary key) table
    pub pk_column: String,
    /// Column on the referencing (foreign key) table
    pub fk_column: String,
}

/// One foreign key relationship between a referencing table and the table it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceFact {
    /// Foreign key constraint name
    pub fk_name: String,
    /// Referenced table
    pub pk_table: TableIdentity,
    /// Referencing table
    pub fk_table: TableIdentity,
    /// Column pairings in key sequence order
    pub columns: Vec<ColumnPair>,
}

impl CrossReferenceFact {
    /// Lookup key for the constraint name
    pub fn regularized_name(&self) -> String {
        regularize(&self.fk_name)
    }

    /// Sorted, case-folded referencing column names
    ///
    /// Two spellings of the same column set produce the same key regardless of order.
    pub fn fk_column_key(&self) -> Vec<String> {
        column_set_key(self.columns.iter().map(|pair| pair.fk_column.as_str()))
    }

    /// Identity of this relationship, used to de-duplicate facts from several providers.
    pub fn dedup_key(&self) -> (String, TableIdentity, TableIdentity) {
        (
            self.regularized_name(),
            self.fk_table.clone(),
            self.pk_table.clone(),
        )
    }
}

pub fn column_set_key<'a>(columns: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut key: Vec<String> = columns.into_iter().map(regularize).collect();
    key.sort();
    key
}
