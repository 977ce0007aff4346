//! # Clause Composer
//!
//! Builds SQL text over a `SchemaTree`. Clauses collect columns and templates,
//! `adjust_columns` binds bare table references into the tree, and rendering
//! grows the FROM list with every node a clause touches.

pub mod clause;
pub mod column_ref;
pub mod errors;
pub mod join_set;
pub mod query;
pub mod render;
mod template;
pub mod value;

pub use clause::{Clause, ClauseKind};
pub use column_ref::{ColumnRef, UnboundColumn};
pub use errors::SqlBuildError;
pub use join_set::JoinSet;
pub use query::{RenderedQuery, SelectQuery, SortOrder};
pub use render::{quote_identifier, RenderMode};
pub use value::BindValue;
