//! The Catalog Provider seam.
//!
//! A provider answers raw catalog questions for one data source. Everything
//! above this trait (cache, graph builder, composer) is driver-agnostic.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

#[cfg(test)]
use mockall::automock;

use super::errors::CatalogError;
use super::facts::{ColumnFact, CrossReferenceFact, PrimaryKeyFact};
use super::table_identity::TableIdentity;
use super::value_type::ValueType;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Blocking catalog fetches. Implementations must be idempotent reads.
#[cfg_attr(test, automock)]
pub trait CatalogProvider: Send + Sync {
    /// Every table in `schema`
    fn list_tables(&self, schema: &str) -> Result<Vec<TableIdentity>>;

    /// Columns of `table` in ordinal order
    fn columns_of(&self, table: &TableIdentity) -> Result<Vec<ColumnFact>>;

    fn primary_key_of(&self, table: &TableIdentity) -> Result<Option<PrimaryKeyFact>>;

    /// Foreign keys declared on `table` (tables it references)
    fn imported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>>;

    /// Foreign keys on other tables that reference `table`
    fn exported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>>;

    /// Foreign keys on `referencing` that reference `referenced`
    fn cross_references_between(
        &self,
        referenced: &TableIdentity,
        referencing: &TableIdentity,
    ) -> Result<Vec<CrossReferenceFact>>;

    /// Semantic value type of a column. Drivers with private type codes override this.
    fn value_type(&self, column: &ColumnFact) -> ValueType {
        ValueType::from_type_code(column.type_code, &column.type_name)
    }
}

/// Several providers consulted in order.
///
/// Table lists, columns and primary keys come from the first provider that
/// has a non-empty answer. Key relationships are the union across all
/// providers, de-duplicated, in provider order.
pub struct LayeredCatalog {
    providers: Vec<Arc<dyn CatalogProvider>>,
}

impl LayeredCatalog {
    pub fn new(providers: Vec<Arc<dyn CatalogProvider>>) -> Self {
        LayeredCatalog { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn first_non_empty<T>(
        &self,
        fetch: impl Fn(&dyn CatalogProvider) -> Result<Vec<T>>,
    ) -> Result<Vec<T>> {
        let mut lookup = Lookup::default();
        for (index, provider) in self.providers.iter().enumerate() {
            if let Some(found) = lookup.record(fetch(provider.as_ref()))? {
                if !found.is_empty() {
                    debug!("LayeredCatalog: provider #{} answered", index);
                    return Ok(found);
                }
            }
        }
        lookup.finish(Vec::new())
    }

    fn union(
        &self,
        fetch: impl Fn(&dyn CatalogProvider) -> Result<Vec<CrossReferenceFact>>,
    ) -> Result<Vec<CrossReferenceFact>> {
        let mut lookup = Lookup::default();
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for provider in &self.providers {
            let Some(facts) = lookup.record(fetch(provider.as_ref()))? else {
                continue;
            };
            for fact in facts {
                if seen.insert(fact.dedup_key()) {
                    merged.push(fact);
                }
            }
        }
        lookup.finish(merged)
    }
}

/// Tracks whether any layer knows the table at all.
///
/// A layer that reports `TableNotFound` is skipped; the error only surfaces
/// when no layer knows the table.
#[derive(Default)]
struct Lookup {
    known: bool,
    missing: Option<CatalogError>,
}

impl Lookup {
    fn record<T>(&mut self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => {
                self.known = true;
                Ok(Some(value))
            }
            Err(e @ CatalogError::TableNotFound { .. }) => {
                self.missing = Some(e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn finish<T>(self, value: T) -> Result<T> {
        match self.missing {
            Some(e) if !self.known => Err(e),
            _ => Ok(value),
        }
    }
}

impl CatalogProvider for LayeredCatalog {
    fn list_tables(&self, schema: &str) -> Result<Vec<TableIdentity>> {
        self.first_non_empty(|p| p.list_tables(schema))
    }

    /// Columns of the first layer that has any, each typed by that same layer.
    fn columns_of(&self, table: &TableIdentity) -> Result<Vec<ColumnFact>> {
        let mut lookup = Lookup::default();
        for (index, provider) in self.providers.iter().enumerate() {
            let Some(mut columns) = lookup.record(provider.columns_of(table))? else {
                continue;
            };
            if columns.is_empty() {
                continue;
            }
            debug!("LayeredCatalog: provider #{} answered columns of {}", index, table);
            for column in &mut columns {
                if column.value_type.is_none() {
                    column.value_type = Some(provider.value_type(column));
                }
            }
            return Ok(columns);
        }
        lookup.finish(Vec::new())
    }

    fn primary_key_of(&self, table: &TableIdentity) -> Result<Option<PrimaryKeyFact>> {
        let mut lookup = Lookup::default();
        for provider in &self.providers {
            if let Some(Some(pk)) = lookup.record(provider.primary_key_of(table))? {
                return Ok(Some(pk));
            }
        }
        lookup.finish(None)
    }

    fn imported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>> {
        self.union(|p| p.imported_keys_of(table))
    }

    fn exported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>> {
        self.union(|p| p.exported_keys_of(table))
    }

    fn cross_references_between(
        &self,
        referenced: &TableIdentity,
        referencing: &TableIdentity,
    ) -> Result<Vec<CrossReferenceFact>> {
        self.union(|p| p.cross_references_between(referenced, referencing))
    }

    /// Columns fetched through `columns_of` carry the answering layer's type.
    /// A fact from anywhere else falls back to the first layer's mapping.
    fn value_type(&self, column: &ColumnFact) -> ValueType {
        if let Some(resolved) = column.value_type {
            return resolved;
        }
        match self.providers.first() {
            Some(provider) => provider.value_type(column),
            None => ValueType::from_type_code(column.type_code, &column.type_name),
        }
    }
}
