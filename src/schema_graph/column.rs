use std::sync::Arc;

use super::tree::{NodeHandle, TreeId};
use crate::catalog::{TableIdentity, ValueType};

/// Handle to one physical column inside one node of one tree.
///
/// A `Column` is only ever created by the tree builder and is never shared
/// between trees. It keeps the table identity it came from so clauses can
/// re-bind it into another tree.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) tree: TreeId,
    pub(crate) node: NodeHandle,
    pub(crate) index: usize,
    pub(crate) table: TableIdentity,
    pub(crate) node_alias: Arc<str>,
    pub(crate) name: String,
    pub(crate) sequence: String,
    pub(crate) alias: String,
    pub(crate) value_type: ValueType,
    pub(crate) type_name: String,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
}

impl Column {
    pub fn tree_id(&self) -> TreeId {
        self.tree
    }

    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Position within the node's column array
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &TableIdentity {
        &self.table
    }

    pub fn node_alias(&self) -> &str {
        &self.node_alias
    }

    /// Physical column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-padded position within the node
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Tree-unique alias, used as the result label in joined rendering
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree && self.node == other.node && self.index == other.index
    }
}

impl Eq for Column {}
