use std::collections::HashSet;

use log::debug;

use super::errors::SqlBuildError;
use super::render::{quote_identifier, RenderMode};
use crate::catalog::TableIdentity;
use crate::schema_graph::{Node, NodeHandle, SchemaTree, TreeId};

/// Nodes of one tree that a query joins, in join order.
///
/// The root is always present and always first. Including any node pulls in
/// its whole lineage so every join only references aliases already in scope.
#[derive(Debug, Clone)]
pub struct JoinSet {
    tree: TreeId,
    nodes: Vec<NodeHandle>,
    included: HashSet<NodeHandle>,
}

fn table_sql(table: &TableIdentity) -> String {
    format!(
        "{}.{}",
        quote_identifier(table.schema()),
        quote_identifier(table.name())
    )
}

fn join_sql(tree: &SchemaTree, node: &Node) -> String {
    let mut sql = format!(
        "LEFT OUTER JOIN {} AS {}",
        table_sql(node.table()),
        quote_identifier(node.alias())
    );

    let (Some(parent), Some(reference)) = (node.parent(), node.reference()) else {
        return sql;
    };
    let parent_alias = quote_identifier(tree.at(parent).alias());
    let child_alias = quote_identifier(node.alias());
    let conditions: Vec<String> = reference
        .columns
        .iter()
        .map(|pair| {
            format!(
                "{}.{} = {}.{}",
                child_alias,
                quote_identifier(&pair.pk_column),
                parent_alias,
                quote_identifier(&pair.fk_column)
            )
        })
        .collect();
    if !conditions.is_empty() {
        sql.push_str(" ON ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql
}

impl JoinSet {
    pub fn new(tree: &SchemaTree) -> Self {
        let mut included = HashSet::new();
        included.insert(NodeHandle::ROOT);
        JoinSet {
            tree: tree.id(),
            nodes: vec![NodeHandle::ROOT],
            included,
        }
    }

    /// Add `handle` and its ancestors. Returns the number of newly joined nodes.
    pub fn include(&mut self, tree: &SchemaTree, handle: NodeHandle) -> Result<usize, SqlBuildError> {
        if tree.id() != self.tree {
            return Err(SqlBuildError::ForeignTree {
                column: format!("node {}", handle.index()),
                column_tree: tree.id().to_string(),
                query_tree: self.tree.to_string(),
            });
        }

        tree.node(handle)?;

        let missing: Vec<NodeHandle> = tree
            .lineage(handle)
            .take_while(|h| !self.included.contains(h))
            .collect();
        for h in missing.iter().rev() {
            let node = tree.at(*h);
            debug!("Joining {} ({})", node.alias(), node.table());
            self.included.insert(*h);
            self.nodes.push(*h);
        }
        Ok(missing.len())
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.included.contains(&handle)
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true; the root is always joined.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `FROM` clause including the keyword.
    pub fn render(&self, tree: &SchemaTree, mode: RenderMode) -> Result<String, SqlBuildError> {
        let root = tree.root();
        match mode {
            RenderMode::Bare => {
                if self.nodes.len() > 1 {
                    return Err(SqlBuildError::BareModeRequiresSingleTable {
                        tables: self.nodes.len(),
                    });
                }
                Ok(format!("FROM {}", table_sql(root.table())))
            }
            RenderMode::Joined => {
                let mut parts = vec![format!(
                    "FROM {} AS {}",
                    table_sql(root.table()),
                    quote_identifier(root.alias())
                )];
                parts.extend(
                    self.nodes
                        .iter()
                        .skip(1)
                        .map(|h| join_sql(tree, tree.at(*h))),
                );
                Ok(parts.join(" "))
            }
        }
    }
}
