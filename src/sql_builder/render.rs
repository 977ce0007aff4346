//! Rendering primitives shared by clauses, the FROM list and queries.

use serde::{Deserialize, Serialize};

use crate::schema_graph::Column;

/// Rendering mode of column references.
///
/// `Bare` renders `` `name` `` and is only valid for single-table statements.
/// `Joined` renders `` `alias`.`name` ``.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    Bare,
    Joined,
}

impl RenderMode {
    pub(crate) fn index(self) -> usize {
        match self {
            RenderMode::Bare => 0,
            RenderMode::Joined => 1,
        }
    }
}

impl From<bool> for RenderMode {
    fn from(joined: bool) -> Self {
        if joined {
            RenderMode::Joined
        } else {
            RenderMode::Bare
        }
    }
}

pub fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

pub fn column_sql(column: &Column, mode: RenderMode) -> String {
    match mode {
        RenderMode::Bare => quote_identifier(column.name()),
        RenderMode::Joined => format!(
            "{}.{}",
            quote_identifier(column.node_alias()),
            quote_identifier(column.name())
        ),
    }
}
