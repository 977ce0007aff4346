//! Shared fixtures for schema graph and composer tests.

use std::sync::Arc;

use super::builder::SchemaGraph;
use crate::catalog::StaticCatalog;
use crate::config::GraphConfig;

/// customers ← orders ← order_items → products (twice) → suppliers
pub const SHOP_CATALOG: &str = r#"
schemas:
  - name: shop
    tables:
      - name: customers
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: name, type: varchar(200) }
          - { name: email, type: varchar(320) }
        primary_key: [id]
      - name: orders
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: customer_id, type: integer }
          - { name: placed_at, type: timestamp }
        primary_key: [id]
        foreign_keys:
          - name: fk_orders_customer
            references: customers
            columns:
              - { column: customer_id, references: id }
      - name: order_items
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: order_id, type: integer }
          - { name: product_id, type: integer }
          - { name: substitute_id, type: integer }
          - { name: quantity, type: integer }
        primary_key: [id]
        foreign_keys:
          - name: fk_items_order
            references: orders
            columns:
              - { column: order_id, references: id }
          - name: fk_items_product
            references: products
            columns:
              - { column: product_id, references: id }
          - name: fk_items_substitute
            references: products
            columns:
              - { column: substitute_id, references: id }
      - name: products
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: name, type: varchar(200) }
          - { name: supplier_id, type: integer }
        primary_key: [id]
        foreign_keys:
          - name: fk_products_supplier
            references: suppliers
            columns:
              - { column: supplier_id, references: id }
      - name: suppliers
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: name, type: varchar(200) }
        primary_key: [id]
"#;

pub fn graph_for(yaml: &str, schemas: &[&str]) -> SchemaGraph {
    let provider = StaticCatalog::from_yaml_str(yaml).expect("test catalog must load");
    SchemaGraph::new(
        Arc::new(provider),
        GraphConfig::with_schemas(schemas.iter().copied()),
    )
}
