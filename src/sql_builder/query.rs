//! SELECT statement assembly over one schema tree.
//!
//! A `SelectQuery` owns one `Clause` per kind and a `JoinSet`. Every bound
//! column the clauses reference pulls its node (and that node's ancestors)
//! into the join set before the FROM list is rendered, in clause order and
//! then slot order, so the emitted join list is deterministic.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::clause::{Clause, ClauseKind};
use super::column_ref::ColumnRef;
use super::errors::SqlBuildError;
use super::join_set::JoinSet;
use super::render::RenderMode;
use super::value::BindValue;
use crate::schema_graph::{Column, NodeHandle, SchemaTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// Final artifact handed to the statement layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    /// Values for each `?` in the order they appear in `sql`
    pub bind_values: Vec<BindValue>,
    /// Plain column items of the select list, in result order
    pub result_columns: Vec<Column>,
}

/// Clause order for join growth, adjustment and bind values
const CLAUSE_ORDER: [ClauseKind; 5] = [
    ClauseKind::Select,
    ClauseKind::Where,
    ClauseKind::GroupBy,
    ClauseKind::Having,
    ClauseKind::OrderBy,
];

#[derive(Debug, Clone)]
pub struct SelectQuery {
    tree: Arc<SchemaTree>,
    joins: JoinSet,
    distinct: bool,
    select: Clause,
    filter: Clause,
    group_by: Clause,
    having: Clause,
    order_by: Clause,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    pub fn new(tree: Arc<SchemaTree>) -> Self {
        let joins = JoinSet::new(&tree);
        SelectQuery {
            tree,
            joins,
            distinct: false,
            select: Clause::new(ClauseKind::Select),
            filter: Clause::new(ClauseKind::Where),
            group_by: Clause::new(ClauseKind::GroupBy),
            having: Clause::new(ClauseKind::Having),
            order_by: Clause::new(ClauseKind::OrderBy),
            limit: None,
            offset: None,
        }
    }

    pub fn tree(&self) -> &Arc<SchemaTree> {
        &self.tree
    }

    pub fn joins(&self) -> &JoinSet {
        &self.joins
    }

    pub fn clause(&self, kind: ClauseKind) -> &Clause {
        match kind {
            ClauseKind::Select => &self.select,
            ClauseKind::Where => &self.filter,
            ClauseKind::GroupBy => &self.group_by,
            ClauseKind::Having => &self.having,
            ClauseKind::OrderBy => &self.order_by,
        }
    }

    pub fn clause_mut(&mut self, kind: ClauseKind) -> &mut Clause {
        match kind {
            ClauseKind::Select => &mut self.select,
            ClauseKind::Where => &mut self.filter,
            ClauseKind::GroupBy => &mut self.group_by,
            ClauseKind::Having => &mut self.having,
            ClauseKind::OrderBy => &mut self.order_by,
        }
    }

    fn clauses(&self) -> [&Clause; 5] {
        CLAUSE_ORDER.map(|kind| self.clause(kind))
    }

    pub fn select(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.select.add_column(column);
        self
    }

    /// Select an expression, e.g. `count({0})`. Expression items are not labelled.
    pub fn select_expression<I, C>(&mut self, template: &str, columns: I) -> Result<&mut Self, SqlBuildError>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.select.add_template(template, columns)?;
        Ok(self)
    }

    /// Select every column of `node`, in column order.
    pub fn select_all(&mut self, node: NodeHandle) -> Result<&mut Self, SqlBuildError> {
        let tree = Arc::clone(&self.tree);
        for column in tree.columns_of(node)? {
            self.select.add_column(column);
        }
        Ok(self)
    }

    /// Add a WHERE predicate; several predicates are joined with `AND`.
    pub fn filter<I, C, V>(&mut self, template: &str, columns: I, values: V) -> Result<&mut Self, SqlBuildError>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
        V: IntoIterator,
        V::Item: Into<BindValue>,
    {
        self.filter.add_template_with_values(template, columns, values)?;
        Ok(self)
    }

    pub fn group_by(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.group_by.add_column(column);
        self
    }

    pub fn having<I, C, V>(&mut self, template: &str, columns: I, values: V) -> Result<&mut Self, SqlBuildError>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
        V: IntoIterator,
        V::Item: Into<BindValue>,
    {
        self.having.add_template_with_values(template, columns, values)?;
        Ok(self)
    }

    pub fn order_by(&mut self, column: impl Into<ColumnRef>, order: SortOrder) -> Result<&mut Self, SqlBuildError> {
        let template = format!("{{0}} {}", order);
        self.order_by.add_template(&template, [column.into()])?;
        Ok(self)
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Bind every bare table reference of every clause into this query's tree,
    /// then grow the join set. Returns the number of rebound references.
    ///
    /// Either every clause is rebound or, on the first failure, none is.
    pub fn adjust_columns(&mut self) -> Result<usize, SqlBuildError> {
        let tree = Arc::clone(&self.tree);
        let mut plans = Vec::with_capacity(CLAUSE_ORDER.len());
        for clause in self.clauses() {
            plans.push(clause.plan_rebinding(&tree)?);
        }

        let mut rebound = 0;
        for (kind, plan) in CLAUSE_ORDER.into_iter().zip(plans) {
            rebound += self.clause_mut(kind).apply_rebinding(plan);
        }
        self.grow_joins()?;
        Ok(rebound)
    }

    /// Add the node of every bound column (with its ancestors) to the join set.
    fn grow_joins(&mut self) -> Result<usize, SqlBuildError> {
        let tree = Arc::clone(&self.tree);
        let mut pending = Vec::new();
        for clause in self.clauses() {
            for column in clause.bound_columns() {
                if column.tree_id() != tree.id() {
                    return Err(SqlBuildError::ForeignTree {
                        column: format!("{}.{}", column.table(), column.name()),
                        column_tree: column.tree_id().to_string(),
                        query_tree: tree.id().to_string(),
                    });
                }
                if !self.joins.contains(column.node()) {
                    pending.push(column.node());
                }
            }
        }

        let mut added = 0;
        for node in pending {
            added += self.joins.include(&tree, node)?;
        }
        if added > 0 {
            debug!("Join set on {} grew by {} node(s)", tree.root().table(), added);
        }
        Ok(added)
    }

    pub fn render(&mut self, mode: RenderMode) -> Result<RenderedQuery, SqlBuildError> {
        if self.select.is_empty() {
            return Err(SqlBuildError::MissingSelectItems);
        }
        self.grow_joins()?;
        let tree = Arc::clone(&self.tree);
        let from = self.joins.render(&tree, mode)?;

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(self.select.render(mode)?);
        sql.push(' ');
        sql.push_str(&from);

        for clause in [
            &mut self.filter,
            &mut self.group_by,
            &mut self.having,
            &mut self.order_by,
        ] {
            if clause.is_empty() {
                continue;
            }
            let keyword = clause.kind().keyword();
            let text = clause.render(mode)?;
            sql.push(' ');
            sql.push_str(keyword);
            sql.push(' ');
            sql.push_str(text);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        let bind_values = self
            .clauses()
            .into_iter()
            .flat_map(|clause| clause.bind_values().cloned())
            .collect();
        let result_columns = self
            .select
            .item_columns()
            .filter_map(ColumnRef::bound)
            .cloned()
            .collect();

        Ok(RenderedQuery {
            sql,
            bind_values,
            result_columns,
        })
    }

    /// Render bare when only the root is joined, with aliases otherwise.
    pub fn to_sql(&mut self) -> Result<RenderedQuery, SqlBuildError> {
        self.grow_joins()?;
        let mode = RenderMode::from(self.joins.len() > 1);
        self.render(mode)
    }
}
