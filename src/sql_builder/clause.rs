//! Clause Composer
//!
//! A `Clause` is an ordered list of items; each item is either a single column
//! reference or a template with its own columns and bind values. Rendering is
//! memoized per `RenderMode` and any mutation drops both cached strings.

use log::debug;

use super::column_ref::ColumnRef;
use super::errors::SqlBuildError;
use super::render::{column_sql, quote_identifier, RenderMode};
use super::template::{Template, TemplatePart};
use super::value::BindValue;
use crate::schema_graph::{Column, LookupKind, SchemaGraphError, SchemaTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Select,
    Where,
    GroupBy,
    Having,
    OrderBy,
}

impl ClauseKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClauseKind::Select => "SELECT",
            ClauseKind::Where => "WHERE",
            ClauseKind::GroupBy => "GROUP BY",
            ClauseKind::Having => "HAVING",
            ClauseKind::OrderBy => "ORDER BY",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            ClauseKind::Where | ClauseKind::Having => " AND ",
            _ => ", ",
        }
    }

    fn is_predicate(self) -> bool {
        matches!(self, ClauseKind::Where | ClauseKind::Having)
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Column(ColumnRef),
    Template {
        template: Template,
        columns: Vec<ColumnRef>,
        values: Vec<BindValue>,
    },
}

#[derive(Debug, Clone)]
pub struct Clause {
    kind: ClauseKind,
    slots: Vec<Slot>,
    rendered: [Option<String>; 2],
    compositions: usize,
}

fn bind_sql(column: &ColumnRef, mode: RenderMode) -> Result<String, SqlBuildError> {
    match column {
        ColumnRef::Bound(c) => Ok(column_sql(c, mode)),
        ColumnRef::Unbound(u) => Err(SqlBuildError::UnboundColumn {
            table: u.table.to_string(),
            column: u.column.clone(),
        }),
    }
}

/// Column of `tree` that `column` should be rebound to, if it is unbound or
/// belongs to another tree. Nothing is modified.
fn resolve(column: &ColumnRef, tree: &SchemaTree) -> Result<Option<Column>, SchemaGraphError> {
    let needs_rebind = match column {
        ColumnRef::Unbound(_) => true,
        ColumnRef::Bound(c) => c.tree_id() != tree.id(),
    };
    if !needs_rebind {
        return Ok(None);
    }

    let node = tree.convert(column.table())?;
    let rebound = node
        .column(column.column_name())
        .ok_or_else(|| {
            SchemaGraphError::not_found(LookupKind::Column, column.column_name(), node.table())
        })?
        .clone();
    debug!(
        "Rebinding {}.{} to node {}",
        column.table(),
        column.column_name(),
        node.alias()
    );
    Ok(Some(rebound))
}

/// Replacements for a clause's column references, in `Clause::columns` order.
/// `None` keeps the reference as it is.
#[derive(Debug)]
pub(crate) struct Rebinding(Vec<Option<Column>>);

impl Clause {
    pub fn new(kind: ClauseKind) -> Self {
        Clause {
            kind,
            slots: Vec::new(),
            rendered: [None, None],
            compositions: 0,
        }
    }

    pub fn kind(&self) -> ClauseKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    fn invalidate(&mut self) {
        self.rendered = [None, None];
    }

    pub fn add_column(&mut self, column: impl Into<ColumnRef>) -> &mut Self {
        self.slots.push(Slot::Column(column.into()));
        self.invalidate();
        self
    }

    /// Append a template item whose `{n}` placeholders refer to `columns`.
    pub fn add_template<I, C>(&mut self, template: &str, columns: I) -> Result<&mut Self, SqlBuildError>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.add_template_with_values(template, columns, Vec::<BindValue>::new())
    }

    /// Append a template item with `{n}` column placeholders and `?` bind markers.
    pub fn add_template_with_values<I, C, V>(
        &mut self,
        template: &str,
        columns: I,
        values: V,
    ) -> Result<&mut Self, SqlBuildError>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
        V: IntoIterator,
        V::Item: Into<BindValue>,
    {
        let columns: Vec<ColumnRef> = columns.into_iter().map(Into::into).collect();
        let values: Vec<BindValue> = values.into_iter().map(Into::into).collect();
        let template = Template::parse(template, columns.len(), values.len())?;
        self.slots.push(Slot::Template {
            template,
            columns,
            values,
        });
        self.invalidate();
        Ok(self)
    }

    /// Every column reference in slot order
    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> + '_ {
        self.slots.iter().flat_map(|slot| match slot {
            Slot::Column(c) => std::slice::from_ref(c).iter(),
            Slot::Template { columns, .. } => columns.iter(),
        })
    }

    pub fn bound_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns().filter_map(ColumnRef::bound)
    }

    /// Columns that make up a whole item on their own, in item order
    pub fn item_columns(&self) -> impl Iterator<Item = &ColumnRef> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Column(c) => Some(c),
            Slot::Template { .. } => None,
        })
    }

    /// Bind values in the order their markers appear in the rendered text
    pub fn bind_values(&self) -> impl Iterator<Item = &BindValue> + '_ {
        self.slots.iter().flat_map(|slot| match slot {
            Slot::Column(_) => std::slice::Iter::default(),
            Slot::Template { values, .. } => values.iter(),
        })
    }

    /// Resolve every unbound (or foreign-tree) column against `tree`'s ambiguity index.
    ///
    /// Returns how many references were rebound. Fails with `NotJoinable` when the
    /// table does not occur in the tree and `Ambiguous` when it occurs more than once;
    /// on failure the clause is left exactly as it was.
    pub fn adjust_columns(&mut self, tree: &SchemaTree) -> Result<usize, SqlBuildError> {
        let rebinding = self.plan_rebinding(tree)?;
        Ok(self.apply_rebinding(rebinding))
    }

    pub(crate) fn plan_rebinding(&self, tree: &SchemaTree) -> Result<Rebinding, SqlBuildError> {
        let replacements = self
            .columns()
            .map(|c| resolve(c, tree))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rebinding(replacements))
    }

    pub(crate) fn apply_rebinding(&mut self, rebinding: Rebinding) -> usize {
        let targets = self.slots.iter_mut().flat_map(|slot| match slot {
            Slot::Column(c) => std::slice::from_mut(c).iter_mut(),
            Slot::Template { columns, .. } => columns.iter_mut(),
        });
        let mut rebound = 0;
        for (target, replacement) in targets.zip(rebinding.0) {
            if let Some(column) = replacement {
                *target = ColumnRef::Bound(column);
                rebound += 1;
            }
        }
        if rebound > 0 {
            self.invalidate();
        }
        rebound
    }

    /// Rendered item list (without the clause keyword).
    pub fn render(&mut self, mode: RenderMode) -> Result<&str, SqlBuildError> {
        let index = mode.index();
        let text = match self.rendered[index].take() {
            Some(cached) => cached,
            None => {
                let composed = self.compose(mode)?;
                self.compositions += 1;
                composed
            }
        };
        Ok(self.rendered[index].insert(text).as_str())
    }

    /// How many times the text was actually composed rather than served from cache
    pub fn compositions(&self) -> usize {
        self.compositions
    }

    fn compose(&self, mode: RenderMode) -> Result<String, SqlBuildError> {
        let wrap = self.kind.is_predicate() && self.slots.len() > 1;
        let mut items = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let item = match slot {
                Slot::Column(c) => {
                    let mut sql = bind_sql(c, mode)?;
                    if let (ClauseKind::Select, RenderMode::Joined, ColumnRef::Bound(bound)) =
                        (self.kind, mode, c)
                    {
                        sql.push_str(" AS ");
                        sql.push_str(&quote_identifier(bound.alias()));
                    }
                    sql
                }
                Slot::Template {
                    template, columns, ..
                } => {
                    let mut sql = String::with_capacity(template.source.len());
                    for part in &template.parts {
                        match part {
                            TemplatePart::Text(text) => sql.push_str(text),
                            TemplatePart::Column(n) => sql.push_str(&bind_sql(&columns[*n], mode)?),
                            TemplatePart::Bind => sql.push('?'),
                        }
                    }
                    if wrap {
                        format!("({})", sql)
                    } else {
                        sql
                    }
                }
            };
            items.push(item);
        }
        Ok(items.join(self.kind.separator()))
    }
}
