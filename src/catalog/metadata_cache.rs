//! Memoized catalog lookups.
//!
//! One independent cache per request shape (table list, columns, primary key,
//! imported keys, exported keys, cross references). Each shape has its own
//! lock, and within a shape each key has its own slot, so at most one provider
//! call is made per key no matter how many threads ask for it.
//!
//! Values are handed out as `Arc`s; a hit never copies fact vectors.

use std::sync::Arc;

use log::debug;

use super::errors::CatalogError;
use super::facts::{ColumnFact, CrossReferenceFact, PrimaryKeyFact};
use super::provider::{CatalogProvider, Result};
use super::table_identity::{regularize, TableIdentity};
use super::value_type::ValueType;
use crate::utils::keyed_cache::{KeyedCache, KeyedCacheStats, LockPoisoned};

impl From<LockPoisoned> for CatalogError {
    fn from(e: LockPoisoned) -> Self {
        CatalogError::LockPoisoned {
            shape: e.shape.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataCacheStats {
    pub tables: KeyedCacheStats,
    pub columns: KeyedCacheStats,
    pub primary_keys: KeyedCacheStats,
    pub imported_keys: KeyedCacheStats,
    pub exported_keys: KeyedCacheStats,
    pub cross_references: KeyedCacheStats,
}

impl MetadataCacheStats {
    pub fn total_misses(&self) -> u64 {
        self.tables.misses
            + self.columns.misses
            + self.primary_keys.misses
            + self.imported_keys.misses
            + self.exported_keys.misses
            + self.cross_references.misses
    }
}

pub struct MetadataCache {
    provider: Arc<dyn CatalogProvider>,
    tables: KeyedCache<String, Arc<Vec<TableIdentity>>>,
    columns: KeyedCache<TableIdentity, Arc<Vec<ColumnFact>>>,
    primary_keys: KeyedCache<TableIdentity, Option<Arc<PrimaryKeyFact>>>,
    imported_keys: KeyedCache<TableIdentity, Arc<Vec<CrossReferenceFact>>>,
    exported_keys: KeyedCache<TableIdentity, Arc<Vec<CrossReferenceFact>>>,
    cross_references: KeyedCache<(TableIdentity, TableIdentity), Arc<Vec<CrossReferenceFact>>>,
}

impl MetadataCache {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        MetadataCache {
            provider,
            tables: KeyedCache::new("table list"),
            columns: KeyedCache::new("columns"),
            primary_keys: KeyedCache::new("primary keys"),
            imported_keys: KeyedCache::new("imported keys"),
            exported_keys: KeyedCache::new("exported keys"),
            cross_references: KeyedCache::new("cross references"),
        }
    }

    pub fn provider(&self) -> &Arc<dyn CatalogProvider> {
        &self.provider
    }

    pub fn tables(&self, schema: &str) -> Result<Arc<Vec<TableIdentity>>> {
        self.tables.get_or_try_insert_with(&regularize(schema), || {
            debug!("MetadataCache miss: tables of schema {}", schema);
            self.provider.list_tables(schema).map(Arc::new)
        })
    }

    pub fn columns(&self, table: &TableIdentity) -> Result<Arc<Vec<ColumnFact>>> {
        self.columns.get_or_try_insert_with(table, || {
            debug!("MetadataCache miss: columns of {}", table);
            self.provider.columns_of(table).map(Arc::new)
        })
    }

    pub fn primary_key(&self, table: &TableIdentity) -> Result<Option<Arc<PrimaryKeyFact>>> {
        self.primary_keys.get_or_try_insert_with(table, || -> Result<_> {
            debug!("MetadataCache miss: primary key of {}", table);
            Ok(self.provider.primary_key_of(table)?.map(Arc::new))
        })
    }

    pub fn imported_keys(&self, table: &TableIdentity) -> Result<Arc<Vec<CrossReferenceFact>>> {
        self.imported_keys.get_or_try_insert_with(table, || {
            debug!("MetadataCache miss: imported keys of {}", table);
            self.provider.imported_keys_of(table).map(Arc::new)
        })
    }

    pub fn exported_keys(&self, table: &TableIdentity) -> Result<Arc<Vec<CrossReferenceFact>>> {
        self.exported_keys.get_or_try_insert_with(table, || {
            debug!("MetadataCache miss: exported keys of {}", table);
            self.provider.exported_keys_of(table).map(Arc::new)
        })
    }

    pub fn cross_references(
        &self,
        referenced: &TableIdentity,
        referencing: &TableIdentity,
    ) -> Result<Arc<Vec<CrossReferenceFact>>> {
        let key = (referenced.clone(), referencing.clone());
        self.cross_references.get_or_try_insert_with(&key, || {
            debug!(
                "MetadataCache miss: cross references {} <- {}",
                referenced, referencing
            );
            self.provider
                .cross_references_between(referenced, referencing)
                .map(Arc::new)
        })
    }

    /// Type mapping is a pure function of the fact and is not cached.
    pub fn value_type(&self, column: &ColumnFact) -> ValueType {
        self.provider.value_type(column)
    }

    pub fn clear_tables(&self) -> Result<()> {
        Ok(self.tables.clear()?)
    }

    pub fn clear_columns(&self) -> Result<()> {
        Ok(self.columns.clear()?)
    }

    pub fn clear_primary_keys(&self) -> Result<()> {
        Ok(self.primary_keys.clear()?)
    }

    pub fn clear_imported_keys(&self) -> Result<()> {
        Ok(self.imported_keys.clear()?)
    }

    pub fn clear_exported_keys(&self) -> Result<()> {
        Ok(self.exported_keys.clear()?)
    }

    pub fn clear_cross_references(&self) -> Result<()> {
        Ok(self.cross_references.clear()?)
    }

    /// Reset all six shapes
    pub fn clear(&self) -> Result<()> {
        self.clear_tables()?;
        self.clear_columns()?;
        self.clear_primary_keys()?;
        self.clear_imported_keys()?;
        self.clear_exported_keys()?;
        self.clear_cross_references()?;
        debug!("MetadataCache cleared");
        Ok(())
    }

    pub fn stats(&self) -> MetadataCacheStats {
        MetadataCacheStats {
            tables: self.tables.stats(),
            columns: self.columns.stats(),
            primary_keys: self.primary_keys.stats(),
            imported_keys: self.imported_keys.stats(),
            exported_keys: self.exported_keys.stats(),
            cross_references: self.cross_references.stats(),
        }
    }
}
