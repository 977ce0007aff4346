use thiserror::Error;

use crate::schema_graph::SchemaGraphError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlBuildError {
    #[error(transparent)]
    Graph(#[from] SchemaGraphError),

    #[error("Column `{table}.{column}` is not bound to a tree; call adjust_columns first")]
    UnboundColumn { table: String, column: String },

    #[error("Column `{column}` belongs to {column_tree}, but the query is built on {query_tree}")]
    ForeignTree {
        column: String,
        column_tree: String,
        query_tree: String,
    },

    #[error("Template `{template}` references column {{{index}}} but only {supplied} columns were supplied")]
    PlaceholderOutOfRange {
        template: String,
        index: usize,
        supplied: usize,
    },

    #[error("Template `{template}` has {expected} bind markers but {supplied} values were supplied")]
    BindCountMismatch {
        template: String,
        expected: usize,
        supplied: usize,
    },

    #[error("No Select items.")]
    MissingSelectItems,

    #[error("Bare rendering needs a single table but {tables} tables are joined")]
    BareModeRequiresSingleTable { tables: usize },
}
