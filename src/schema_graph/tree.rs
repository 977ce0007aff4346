//! Arena representation of one table's foreign-key tree.
//!
//! A `SchemaTree` owns every `Node` reachable from its root in a flat vector;
//! nodes refer to each other (parent, children) through `NodeHandle` indices.
//! The ambiguity index (table identity → every node with that identity) lives
//! on the tree itself, so all nodes of one tree share exactly one index.
//!
//! Handle 0 is always the root. Trees are immutable once the builder returns
//! them and are shared as `Arc<SchemaTree>`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::column::Column;
use super::errors::{LookupKind, SchemaGraphError};
use crate::catalog::facts::column_set_key;
use crate::catalog::table_identity::regularize;
use crate::catalog::{CrossReferenceFact, TableIdentity};

/// Process-unique identity of one built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(pub(crate) u64);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// Index of a node within its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) usize);

impl NodeHandle {
    pub const ROOT: NodeHandle = NodeHandle(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Why a node's foreign keys were not expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// An ancestor already has this node's table
    Cycle,
    /// The node sits at the configured maximum depth
    MaxDepth,
}

/// One occurrence of a table inside a tree.
///
/// Two nodes are equal when their aliases are equal; the same physical table
/// may occupy several nodes of one tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) handle: NodeHandle,
    pub(crate) alias: Arc<str>,
    pub(crate) table: TableIdentity,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) reference: Option<Arc<CrossReferenceFact>>,
    pub(crate) depth: usize,
    pub(crate) columns: Vec<Column>,
    pub(crate) column_index: HashMap<String, usize>,
    pub(crate) primary_key: Vec<usize>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) children_by_fk_name: HashMap<String, NodeHandle>,
    pub(crate) children_by_fk_columns: HashMap<Vec<String>, NodeHandle>,
    pub(crate) truncation: Option<Truncation>,
}

impl Node {
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Tree-unique alias (`t003`, `t003_1`, ...), emitted as the SQL table alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn table(&self) -> &TableIdentity {
        &self.table
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Always the tree's root handle; the root is its own root.
    pub fn root(&self) -> NodeHandle {
        NodeHandle::ROOT
    }

    pub fn is_root(&self) -> bool {
        self.handle == NodeHandle::ROOT
    }

    /// Foreign key of the parent that leads to this node
    pub fn reference(&self) -> Option<&CrossReferenceFact> {
        self.reference.as_deref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index
            .get(&regularize(name))
            .map(|&index| &self.columns[index])
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> + '_ {
        self.primary_key.iter().map(move |&index| &self.columns[index])
    }

    /// Direct children in foreign key order
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias
    }
}

impl Eq for Node {}

#[derive(Debug)]
pub struct SchemaTree {
    pub(crate) id: TreeId,
    pub(crate) nodes: Vec<Node>,
    pub(crate) occurrences: HashMap<TableIdentity, Vec<NodeHandle>>,
}

impl SchemaTree {
    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeHandle::ROOT.0]
    }

    /// Node behind `handle`; a handle from a larger tree is `NotFound`.
    pub fn node(&self, handle: NodeHandle) -> Result<&Node, SchemaGraphError> {
        self.get(handle).ok_or_else(|| {
            SchemaGraphError::not_found(LookupKind::Node, handle.0.to_string(), &self.root().table)
        })
    }

    /// Handles stored inside this tree always index its arena.
    pub(crate) fn at(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.0]
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.0)
    }

    /// Nodes in build (breadth-first) order, root first
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| &*node.alias == alias)
    }

    /// `handle` followed by each of its ancestors up to and including the root
    pub fn lineage(&self, handle: NodeHandle) -> Lineage<'_> {
        Lineage {
            tree: self,
            next: Some(handle),
        }
    }

    /// Every node of `table` in this tree, in build order
    pub fn occurrences(&self, table: &TableIdentity) -> &[NodeHandle] {
        self.occurrences
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a bare table reference to its single occurrence in this tree.
    pub fn convert(&self, target: &TableIdentity) -> Result<&Node, SchemaGraphError> {
        match self.occurrences(target) {
            [] => Err(SchemaGraphError::NotJoinable {
                table: target.to_string(),
                root: self.root().table.to_string(),
            }),
            [only] => Ok(self.at(*only)),
            many => Err(SchemaGraphError::Ambiguous {
                table: target.to_string(),
                root: self.root().table.to_string(),
                count: many.len(),
            }),
        }
    }

    pub fn child_by_fk_name(
        &self,
        handle: NodeHandle,
        fk_name: &str,
    ) -> Result<&Node, SchemaGraphError> {
        let node = self.node(handle)?;
        node.children_by_fk_name
            .get(&regularize(fk_name))
            .map(|&child| self.at(child))
            .ok_or_else(|| {
                SchemaGraphError::not_found(LookupKind::ForeignKeyName, fk_name, &node.table)
            })
    }

    /// Child reached through the foreign key made of exactly `fk_columns`, in any order.
    pub fn child_by_fk_columns(
        &self,
        handle: NodeHandle,
        fk_columns: &[&str],
    ) -> Result<&Node, SchemaGraphError> {
        let node = self.node(handle)?;
        node.children_by_fk_columns
            .get(&column_set_key(fk_columns.iter().copied()))
            .map(|&child| self.at(child))
            .ok_or_else(|| {
                SchemaGraphError::not_found(
                    LookupKind::ForeignKeyColumns,
                    fk_columns.join(", "),
                    &node.table,
                )
            })
    }

    pub fn column(&self, handle: NodeHandle, name: &str) -> Result<&Column, SchemaGraphError> {
        let node = self.node(handle)?;
        node.column(name)
            .ok_or_else(|| SchemaGraphError::not_found(LookupKind::Column, name, &node.table))
    }

    pub fn columns_of(&self, handle: NodeHandle) -> Result<&[Column], SchemaGraphError> {
        Ok(self.node(handle)?.columns())
    }
}

pub struct Lineage<'a> {
    tree: &'a SchemaTree,
    next: Option<NodeHandle>,
}

impl Iterator for Lineage<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|node| node.parent);
        Some(current)
    }
}
