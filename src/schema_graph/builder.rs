//! Schema Graph Builder
//!
//! Turns foreign-key metadata into one alias-stable tree per root table.
//!
//! ## Aliasing
//!
//! Every table of every configured schema is listed once, sorted, and given a
//! root alias `t{ordinal}`. A child reached through the `seq`-th foreign key of
//! its parent is aliased `{parent}_{seq}`. Aliases therefore depend only on
//! the catalog, never on build order, and are unique within a tree.
//!
//! ## Expansion
//!
//! The tree is built breadth-first from an explicit work queue. A node's
//! foreign keys are expanded unless
//! - one of its ancestors already has the same table (cycle truncation), or
//! - it sits at `max_depth` (depth truncation).
//!
//! Both are silent; the node is kept with its columns but without children.
//! Because every cycle must revisit a table already on the lineage, the
//! ancestor rule alone terminates on any schema; the depth guard bounds the
//! size of trees on wide, diamond-shaped schemas.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use super::column::Column;
use super::errors::{LookupKind, SchemaGraphError};
use super::tree::{Node, NodeHandle, SchemaTree, TreeId, Truncation};
use crate::catalog::table_identity::regularize;
use crate::catalog::{CatalogProvider, CrossReferenceFact, MetadataCache, TableIdentity};
use crate::config::GraphConfig;
use crate::utils::alias_naming::{child_alias, column_alias, pad_width, padded, root_alias};
use crate::utils::keyed_cache::KeyedCache;

pub type Result<T> = std::result::Result<T, SchemaGraphError>;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Catalog-wide root alias assignment.
#[derive(Debug)]
pub struct AliasNamespace {
    aliases: HashMap<TableIdentity, String>,
    tables: Vec<TableIdentity>,
}

impl AliasNamespace {
    fn new(mut tables: Vec<TableIdentity>) -> Self {
        tables.sort();
        tables.dedup();
        let aliases = tables
            .iter()
            .enumerate()
            .map(|(ordinal, table)| (table.clone(), root_alias(ordinal, tables.len())))
            .collect();
        AliasNamespace { aliases, tables }
    }

    /// Catalog spelling of `table` together with its alias
    pub fn lookup(&self, table: &TableIdentity) -> Option<(&TableIdentity, &str)> {
        self.aliases
            .get_key_value(table)
            .map(|(identity, alias)| (identity, alias.as_str()))
    }

    /// Every aliased table in alias order
    pub fn tables(&self) -> &[TableIdentity] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builds and memoizes schema trees.
///
/// Shared across threads for the process lifetime. Root lookups for the same
/// table are serialized so each tree is built once; different roots build in
/// parallel.
pub struct SchemaGraph {
    config: GraphConfig,
    metadata: MetadataCache,
    namespace: KeyedCache<(), Arc<AliasNamespace>>,
    roots: KeyedCache<TableIdentity, Arc<SchemaTree>>,
}

impl SchemaGraph {
    pub fn new(provider: Arc<dyn CatalogProvider>, config: GraphConfig) -> Self {
        SchemaGraph {
            config,
            metadata: MetadataCache::new(provider),
            namespace: KeyedCache::new("alias namespace"),
            roots: KeyedCache::new("tree roots"),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    /// Lazily list the configured catalog and assign root aliases.
    pub fn alias_namespace(&self) -> Result<Arc<AliasNamespace>> {
        self.namespace.get_or_try_insert_with(&(), || -> Result<Arc<AliasNamespace>> {
            let mut tables = Vec::new();
            for schema in &self.config.schemas {
                tables.extend(self.metadata.tables(schema)?.iter().cloned());
            }
            let namespace = AliasNamespace::new(tables);
            if namespace.is_empty() {
                warn!(
                    "No tables found in schemas [{}]; every root will be rejected",
                    self.config.schemas.join(", ")
                );
            }
            info!(
                "Alias namespace: {} tables across schemas [{}]",
                namespace.len(),
                self.config.schemas.join(", ")
            );
            Ok(Arc::new(namespace))
        })
    }

    /// Tree rooted at `table`, built on first request and memoized until `clear_cache`.
    pub fn build_or_get_root(&self, table: &TableIdentity) -> Result<Arc<SchemaTree>> {
        if let Some(tree) = self.roots.peek(table) {
            return Ok(tree);
        }
        self.roots
            .get_or_try_insert_with(table, || self.build_tree(table).map(Arc::new))
    }

    /// Single occurrence of `target` in `tree`.
    pub fn convert(&self, tree: &SchemaTree, target: &TableIdentity) -> Result<NodeHandle> {
        tree.convert(target).map(Node::handle)
    }

    /// Foreign keys on other tables that reference `table`
    pub fn exported_keys_of(&self, table: &TableIdentity) -> Result<Arc<Vec<CrossReferenceFact>>> {
        Ok(self.metadata.exported_keys(table)?)
    }

    pub fn cross_references_between(
        &self,
        referenced: &TableIdentity,
        referencing: &TableIdentity,
    ) -> Result<Arc<Vec<CrossReferenceFact>>> {
        Ok(self.metadata.cross_references(referenced, referencing)?)
    }

    /// Drop all metadata, the alias namespace and every memoized tree.
    ///
    /// Trees already handed out stay valid; later requests rebuild. Roots go
    /// last, after the metadata they are built from.
    pub fn clear_cache(&self) -> Result<()> {
        self.metadata.clear()?;
        self.namespace.clear()?;
        self.roots.clear()?;
        info!("Schema graph caches cleared");
        Ok(())
    }

    fn build_tree(&self, root_table: &TableIdentity) -> Result<SchemaTree> {
        let namespace = self.alias_namespace()?;
        let (root_table, alias) = namespace
            .lookup(root_table)
            .ok_or_else(|| SchemaGraphError::UnconfiguredTable {
                table: root_table.to_string(),
                schemas: self.config.schemas.join(", "),
            })?;

        let id = TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed));
        info!("Building schema tree {} for {} ({})", id, root_table, alias);

        let mut builder = TreeBuilder {
            graph: self,
            id,
            nodes: Vec::new(),
            occurrences: HashMap::new(),
        };
        builder.add_node(root_table, Arc::from(alias), None, None)?;

        let mut queue = VecDeque::from([NodeHandle::ROOT]);
        while let Some(handle) = queue.pop_front() {
            queue.extend(builder.expand(handle)?);
        }

        debug!(
            "Schema tree {} for {}: {} nodes, {} distinct tables",
            id,
            root_table,
            builder.nodes.len(),
            builder.occurrences.len()
        );
        Ok(SchemaTree {
            id,
            nodes: builder.nodes,
            occurrences: builder.occurrences,
        })
    }
}

/// Mutable state of one tree build.
struct TreeBuilder<'g> {
    graph: &'g SchemaGraph,
    id: TreeId,
    nodes: Vec<Node>,
    occurrences: HashMap<TableIdentity, Vec<NodeHandle>>,
}

impl TreeBuilder<'_> {
    fn add_node(
        &mut self,
        table: &TableIdentity,
        alias: Arc<str>,
        parent: Option<NodeHandle>,
        reference: Option<Arc<CrossReferenceFact>>,
    ) -> Result<NodeHandle> {
        let graph = self.graph;
        let metadata = &graph.metadata;
        let handle = NodeHandle(self.nodes.len());
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);

        let facts = metadata.columns(table)?;
        let primary_key = metadata.primary_key(table)?;
        let pk_keys: Vec<String> = primary_key
            .as_ref()
            .map(|pk| pk.columns.iter().map(|c| regularize(c)).collect())
            .unwrap_or_default();

        let width = pad_width(facts.len());
        let mut columns = Vec::with_capacity(facts.len());
        let mut column_index = HashMap::with_capacity(facts.len());
        for (index, fact) in facts.iter().enumerate() {
            let key = regularize(&fact.name);
            let sequence = padded(index, width);
            columns.push(Column {
                tree: self.id,
                node: handle,
                index,
                table: table.clone(),
                node_alias: Arc::clone(&alias),
                name: fact.name.clone(),
                alias: column_alias(&alias, &sequence),
                sequence,
                value_type: metadata.value_type(fact),
                type_name: fact.type_name.clone(),
                nullable: fact.nullable,
                primary_key: pk_keys.contains(&key),
            });
            column_index.insert(key, index);
        }

        let mut pk_columns = Vec::with_capacity(pk_keys.len());
        for key in &pk_keys {
            let index = column_index
                .get(key)
                .ok_or_else(|| SchemaGraphError::not_found(LookupKind::Column, key.as_str(), table))?;
            pk_columns.push(*index);
        }

        self.nodes.push(Node {
            handle,
            alias,
            table: table.clone(),
            parent,
            reference,
            depth,
            columns,
            column_index,
            primary_key: pk_columns,
            children: Vec::new(),
            children_by_fk_name: HashMap::new(),
            children_by_fk_columns: HashMap::new(),
            truncation: None,
        });
        self.occurrences
            .entry(table.clone())
            .or_default()
            .push(handle);
        Ok(handle)
    }

    fn has_ancestor_table(&self, handle: NodeHandle) -> bool {
        let table = &self.nodes[handle.0].table;
        let mut next = self.nodes[handle.0].parent;
        while let Some(ancestor) = next {
            let node = &self.nodes[ancestor.0];
            if &node.table == table {
                return true;
            }
            next = node.parent;
        }
        false
    }

    /// Create the children of `handle` and return them for the work queue.
    fn expand(&mut self, handle: NodeHandle) -> Result<Vec<NodeHandle>> {
        if self.has_ancestor_table(handle) {
            debug!(
                "Cycle truncation at {} ({})",
                self.nodes[handle.0].alias, self.nodes[handle.0].table
            );
            self.nodes[handle.0].truncation = Some(Truncation::Cycle);
            return Ok(Vec::new());
        }
        if self.nodes[handle.0].depth >= self.graph.config.max_depth as usize {
            debug!(
                "Depth truncation at {} ({})",
                self.nodes[handle.0].alias, self.nodes[handle.0].table
            );
            self.nodes[handle.0].truncation = Some(Truncation::MaxDepth);
            return Ok(Vec::new());
        }

        let table = self.nodes[handle.0].table.clone();
        let mut keys: Vec<CrossReferenceFact> =
            self.graph.metadata.imported_keys(&table)?.iter().cloned().collect();
        keys.sort_by(|a, b| {
            a.regularized_name()
                .cmp(&b.regularized_name())
                .then_with(|| a.pk_table.cmp(&b.pk_table))
        });

        let parent_alias = Arc::clone(&self.nodes[handle.0].alias);
        let mut children = Vec::with_capacity(keys.len());
        let sibling_count = keys.len();
        for (seq, fact) in keys.into_iter().enumerate() {
            let alias: Arc<str> = Arc::from(child_alias(&parent_alias, seq, sibling_count));
            let name_key = fact.regularized_name();
            let column_key = fact.fk_column_key();
            let pk_table = fact.pk_table.clone();
            let child = self.add_node(&pk_table, alias, Some(handle), Some(Arc::new(fact)))?;

            let parent = &mut self.nodes[handle.0];
            if parent.children_by_fk_name.contains_key(&name_key) {
                warn!(
                    "Duplicate foreign key name `{}` on {}; keeping the first",
                    name_key, parent.table
                );
            } else {
                parent.children_by_fk_name.insert(name_key, child);
            }
            if parent.children_by_fk_columns.contains_key(&column_key) {
                warn!(
                    "Two foreign keys on {} use columns [{}]; keeping the first",
                    parent.table,
                    column_key.join(", ")
                );
            } else {
                parent.children_by_fk_columns.insert(column_key, child);
            }
            parent.children.push(child);
            children.push(child);
        }
        Ok(children)
    }
}
