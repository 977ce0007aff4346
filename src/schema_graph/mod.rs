pub mod builder;
pub mod column;
pub mod errors;
pub mod tree;

#[cfg(test)]
pub mod testing;

pub use builder::{AliasNamespace, SchemaGraph};
pub use column::Column;
pub use errors::{LookupKind, SchemaGraphError};
pub use tree::{Lineage, Node, NodeHandle, SchemaTree, TreeId, Truncation};
