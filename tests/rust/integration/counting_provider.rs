//! Provider wrapper that counts (and optionally slows) every catalog call

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use relgraph::catalog::{
    CatalogProvider, ColumnFact, CrossReferenceFact, PrimaryKeyFact, StaticCatalog, TableIdentity,
};

/// customers ← orders → warehouses, orders ← shipments → warehouses
pub const LOGISTICS: &str = r#"
schemas:
  - name: ops
    tables:
      - name: customers
        columns:
          - { name: id, type: integer }
          - { name: name, type: text }
        primary_key: [id]
      - name: warehouses
        columns:
          - { name: id, type: integer }
          - { name: city, type: text }
        primary_key: [id]
      - name: orders
        columns:
          - { name: id, type: integer }
          - { name: customer_id, type: integer }
          - { name: warehouse_id, type: integer }
        primary_key: [id]
        foreign_keys:
          - name: fk_order_customer
            references: customers
            columns:
              - { column: customer_id, references: id }
          - name: fk_order_warehouse
            references: warehouses
            columns:
              - { column: warehouse_id, references: id }
      - name: shipments
        columns:
          - { name: id, type: integer }
          - { name: order_id, type: integer }
          - { name: origin_id, type: integer }
        primary_key: [id]
        foreign_keys:
          - name: fk_shipment_order
            references: orders
            columns:
              - { column: order_id, references: id }
          - name: fk_shipment_origin
            references: warehouses
            columns:
              - { column: origin_id, references: id }
"#;

#[derive(Default)]
pub struct CallCounts {
    pub list_tables: AtomicUsize,
    pub columns: AtomicUsize,
    pub primary_keys: AtomicUsize,
    pub imported_keys: AtomicUsize,
    pub exported_keys: AtomicUsize,
    pub cross_references: AtomicUsize,
}

impl CallCounts {
    pub fn columns(&self) -> usize {
        self.columns.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        [
            &self.list_tables,
            &self.columns,
            &self.primary_keys,
            &self.imported_keys,
            &self.exported_keys,
            &self.cross_references,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

pub struct CountingProvider {
    inner: StaticCatalog,
    delay: Duration,
    pub counts: Arc<CallCounts>,
}

impl CountingProvider {
    pub fn new(yaml: &str) -> Self {
        Self::with_delay(yaml, Duration::ZERO)
    }

    /// Every call sleeps for `delay` before answering
    pub fn with_delay(yaml: &str, delay: Duration) -> Self {
        CountingProvider {
            inner: StaticCatalog::from_yaml_str(yaml).unwrap(),
            delay,
            counts: Arc::new(CallCounts::default()),
        }
    }

    fn tick(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

type Result<T> = std::result::Result<T, relgraph::catalog::CatalogError>;

impl CatalogProvider for CountingProvider {
    fn list_tables(&self, schema: &str) -> Result<Vec<TableIdentity>> {
        self.tick(&self.counts.list_tables);
        self.inner.list_tables(schema)
    }

    fn columns_of(&self, table: &TableIdentity) -> Result<Vec<ColumnFact>> {
        self.tick(&self.counts.columns);
        self.inner.columns_of(table)
    }

    fn primary_key_of(&self, table: &TableIdentity) -> Result<Option<PrimaryKeyFact>> {
        self.tick(&self.counts.primary_keys);
        self.inner.primary_key_of(table)
    }

    fn imported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>> {
        self.tick(&self.counts.imported_keys);
        self.inner.imported_keys_of(table)
    }

    fn exported_keys_of(&self, table: &TableIdentity) -> Result<Vec<CrossReferenceFact>> {
        self.tick(&self.counts.exported_keys);
        self.inner.exported_keys_of(table)
    }

    fn cross_references_between(
        &self,
        referenced: &TableIdentity,
        referencing: &TableIdentity,
    ) -> Result<Vec<CrossReferenceFact>> {
        self.tick(&self.counts.cross_references);
        self.inner.cross_references_between(referenced, referencing)
    }
}
