use std::fmt;

use crate::catalog::TableIdentity;
use crate::schema_graph::Column;

/// A column named against a bare table, before any tree exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundColumn {
    pub table: TableIdentity,
    pub column: String,
}

impl UnboundColumn {
    pub fn new(table: TableIdentity, column: impl Into<String>) -> Self {
        UnboundColumn {
            table,
            column: column.into(),
        }
    }

    /// Parse `schema.table.column`
    pub fn parse(qualified: &str) -> Option<Self> {
        let (table, column) = qualified.trim().rsplit_once('.')?;
        if column.is_empty() {
            return None;
        }
        Some(UnboundColumn::new(TableIdentity::parse(table)?, column))
    }
}

impl fmt::Display for UnboundColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A column reference held by a clause slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Unbound(UnboundColumn),
    Bound(Column),
}

impl ColumnRef {
    pub fn table(&self) -> &TableIdentity {
        match self {
            ColumnRef::Unbound(u) => &u.table,
            ColumnRef::Bound(c) => c.table(),
        }
    }

    pub fn column_name(&self) -> &str {
        match self {
            ColumnRef::Unbound(u) => &u.column,
            ColumnRef::Bound(c) => c.name(),
        }
    }

    pub fn bound(&self) -> Option<&Column> {
        match self {
            ColumnRef::Bound(c) => Some(c),
            ColumnRef::Unbound(_) => None,
        }
    }
}

impl From<Column> for ColumnRef {
    fn from(column: Column) -> Self {
        ColumnRef::Bound(column)
    }
}

impl From<&Column> for ColumnRef {
    fn from(column: &Column) -> Self {
        ColumnRef::Bound(column.clone())
    }
}

impl From<UnboundColumn> for ColumnRef {
    fn from(column: UnboundColumn) -> Self {
        ColumnRef::Unbound(column)
    }
}
