//! YAML-backed catalog definitions.
//!
//! A `StaticCatalog` answers provider calls from a declared schema instead of
//! a live driver. The CLI uses it to inspect graphs offline, and tests use it
//! as a deterministic provider.
//!
//! # Example
//!
//! ```yaml
//! schemas:
//!   - name: shop
//!     tables:
//!       - name: customers
//!         columns:
//!           - { name: id, type: integer, nullable: false }
//!           - { name: email, type: varchar(320) }
//!         primary_key: [id]
//!       - name: orders
//!         columns:
//!           - { name: id, type: integer, nullable: false }
//!           - { name: customer_id, type: integer }
//!         primary_key: [id]
//!         foreign_keys:
//!           - name: fk_orders_customer
//!             references: customers
//!             columns:
//!               - { column: customer_id, references: id }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;
use super::facts::{ColumnFact, ColumnPair, CrossReferenceFact, PrimaryKeyFact};
use super::provider::{CatalogProvider, Result};
use super::table_identity::{regularize, TableIdentity};
use super::value_type::type_code_for_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub schemas: Vec<SchemaDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub primary_key_name: Option<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub name: String,
    /// Referenced table, `table` (same schema) or `schema.table`
    pub references: String,
    pub columns: Vec<ColumnMappingDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMappingDefinition {
    /// Referencing column on this table
    pub column: String,
    /// Referenced column on the target table
    pub references: String,
}

#[derive(Debug, Clone)]
struct TableEntry {
    columns: Vec<ColumnFact>,
    primary_key: Option<PrimaryKeyFact>,
    imported: Vec<CrossReferenceFact>,
}

/// Provider serving a fixed, validated catalog definition.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    schemas: HashMap<String, Vec<TableIdentity>>,
    tables: BTreeMap<TableIdentity, TableEntry>,
}

impl StaticCatalog {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let definition: CatalogDefinition =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::ConfigParse {
                error: e.to_string(),
            })?;
        Self::from_definition(definition)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::ConfigRead {
            error: format!("{}: {}", path.display(), e),
        })?;
        info!("Loading catalog definition from {}", path.display());
        Self::from_yaml_str(&content)
    }

    pub fn from_definition(definition: CatalogDefinition) -> Result<Self> {
        let mut schemas: HashMap<String, Vec<TableIdentity>> = HashMap::new();
        let mut tables = BTreeMap::new();

        for schema in &definition.schemas {
            for table in &schema.tables {
                let identity = TableIdentity::new(&schema.name, &table.name);
                if tables.contains_key(&identity) {
                    return Err(invalid(format!("table `{}` is declared twice", identity)));
                }
                let entry = build_entry(&identity, table)?;
                schemas
                    .entry(regularize(&schema.name))
                    .or_default()
                    .push(identity.clone());
                tables.insert(identity, entry);
            }
        }

        resolve_references(&mut tables)?;
        let catalog = StaticCatalog { schemas, tables };
        debug!(
            "StaticCatalog: {} schemas, {} tables",
            catalog.schemas.len(),
            catalog.tables.len()
        );
        Ok(catalog)
    }

    fn entry(&self, table: &TableIdentity) -> Result<&TableEntry> {
        self.tables
            .get(table)
            .ok_or_else(|| CatalogError::TableNotFound {
                table: table.to_string(),
            })
    }
}

/// Every foreign key must land on a declared table and declared columns.
/// The referenced table takes the spelling it was declared with.
fn resolve_references(tables: &mut BTreeMap<TableIdentity, TableEntry>) -> Result<()> {
    let mut declared = Vec::new();
    for (owner, entry) in tables.iter() {
        for (index, fact) in entry.imported.iter().enumerate() {
            let (identity, target) = tables.get_key_value(&fact.pk_table).ok_or_else(|| {
                invalid(format!(
                    "foreign key `{}` on `{}` references unknown table `{}`",
                    fact.fk_name, fact.fk_table, fact.pk_table
                ))
            })?;
            for pair in &fact.columns {
                if !has_column(&target.columns, &pair.pk_column) {
                    return Err(invalid(format!(
                        "foreign key `{}` references unknown column `{}.{}`",
                        fact.fk_name, identity, pair.pk_column
                    )));
                }
            }
            declared.push((owner.clone(), index, identity.clone()));
        }
    }
    for (owner, index, identity) in declared {
        if let Some(entry) = tables.get_mut(&owner) {
            entry.imported[index].pk_table = identity;
        }
    }
    Ok(())
}

fn invalid(message: String) -> CatalogError {
    CatalogError::InvalidDefinition { message }
}

fn has_column(columns: &[ColumnFact], name: &str) -> bool {
    let key = regularize(name);
    columns.iter().any(|c| regularize(&c.name) == key)
}

fn build_entry(identity: &TableIdentity, table: &TableDefinition) -> Result<TableEntry> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(table.columns.len());
    for (index, column) in table.columns.iter().enumerate() {
        if !seen.insert(regularize(&column.name)) {
            return Err(invalid(format!(
                "column `{}` is declared twice on `{}`",
                column.name, identity
            )));
        }
        columns.push(ColumnFact {
            name: column.name.clone(),
            type_code: type_code_for_name(&column.type_name),
            type_name: column.type_name.clone(),
            nullable: column.nullable,
            position: index as u32 + 1,
            value_type: None,
        });
    }

    for pk_column in &table.primary_key {
        if !has_column(&columns, pk_column) {
            return Err(invalid(format!(
                "primary key column `{}` does not exist on `{}`",
                pk_column, identity
            )));
        }
    }
    let primary_key = if table.primary_key.is_empty() {
        None
    } else {
        Some(PrimaryKeyFact {
            name: table.primary_key_name.clone(),
            columns: table.primary_key.clone(),
        })
    };

    let mut imported = Vec::with_capacity(table.foreign_keys.len());
    for fk in &table.foreign_keys {
        let pk_table = match TableIdentity::parse(&fk.references) {
            Some(qualified) => qualified,
            None => TableIdentity::new(identity.schema(), fk.references.trim()),
        };
        if fk.columns.is_empty() {
            return Err(invalid(format!("foreign key `{}` has no columns", fk.name)));
        }
        let mut pairs = Vec::with_capacity(fk.columns.len());
        for mapping in &fk.columns {
            if !has_column(&columns, &mapping.column) {
                return Err(invalid(format!(
                    "foreign key `{}` uses unknown column `{}.{}`",
                    fk.name, identity, mapping.column
                )));
            }
            pairs.push(ColumnPair {
                pk_column: mapping.references.clone(),
                fk_column: mapping.column.clone(),
            });
        }
        imported.push(CrossReferenceFact {
            fk_name: fk.name.clone(),
            pk_table,
            fk_table: identity.clone(),
            columns: pairs,
        });
    }

    Ok(TableEntry {
        columns,
        primary_key,
        imported,
    })
}

impl CatalogProvider for StaticCatalog {
    fn list_tables(&self, schema: &str) -> Result<Vec<TableIdentity>> {
        Ok(self
            .schemas
            .get(&regularize(schema))
            .cloned()
            .unwrap_or_default())
    }

    fn columns_of(&self, table: &TableIdentity) -> Result<Vec<ColumnFact>> {
        Ok(self.entry(table)?.columns.clone())
    }

    fn primary_key_of(&self, table: &TableIdentity) -> Result<Option<PrimaryKeyFact>> {
        Ok(self.entry(table)?.primary_key.clone())
    }

    fn imported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>> {
        Ok(self.entry(table)?.imported.clone())
    }

    fn exported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>> {
        self.entry(table)?;
        Ok(self
            .tables
            .values()
            .flat_map(|entry| entry.imported.iter())
            .filter(|fact| &fact.pk_table == table)
            .cloned()
            .collect())
    }

    fn cross_references_between(
        &self,
        referenced: &TableIdentity,
        referencing: &TableIdentity,
    ) -> Result<Vec<CrossReferenceFact>> {
        self.entry(referenced)?;
        Ok(self
            .entry(referencing)?
            .imported
            .iter()
            .filter(|fact| &fact.pk_table == referenced)
            .cloned()
            .collect())
    }
}
