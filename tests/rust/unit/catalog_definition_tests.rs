//! YAML catalog loading and validation

#[cfg(test)]
mod catalog_definition_tests {
    use std::io::Write;
    use std::sync::Arc;

    use relgraph::catalog::{CatalogError, CatalogProvider, StaticCatalog, TableIdentity, ValueType};
    use relgraph::config::GraphConfig;
    use relgraph::schema_graph::SchemaGraph;
    use relgraph::sql_builder::SelectQuery;
    use test_case::test_case;

    const LIBRARY: &str = r#"
schemas:
  - name: library
    tables:
      - name: authors
        columns:
          - { name: id, type: bigint, nullable: false }
          - { name: full_name, type: varchar(120) }
        primary_key: [id]
        primary_key_name: authors_pk
      - name: books
        columns:
          - { name: id, type: bigint, nullable: false }
          - { name: author_id, type: bigint }
          - { name: published, type: date }
          - { name: price, type: "numeric(10, 2)" }
          - { name: metadata, type: jsonb }
        primary_key: [id]
        foreign_keys:
          - name: fk_books_author
            references: library.authors
            columns:
              - { column: author_id, references: id }
"#;

    #[test]
    fn test_load_and_answer_provider_calls() {
        let catalog = StaticCatalog::from_yaml_str(LIBRARY).unwrap();
        let books = TableIdentity::new("library", "books");
        let authors = TableIdentity::new("Library", "AUTHORS");

        let tables = catalog.list_tables("LIBRARY").unwrap();
        assert_eq!(tables.len(), 2);
        assert!(catalog.list_tables("archive").unwrap().is_empty());

        let columns = catalog.columns_of(&books).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "author_id", "published", "price", "metadata"]);
        assert_eq!(columns[0].position, 1);
        assert!(!columns[0].nullable);

        let pk = catalog.primary_key_of(&authors).unwrap().unwrap();
        assert_eq!(pk.name.as_deref(), Some("authors_pk"));
        assert_eq!(pk.columns, vec!["id"]);

        let imported = catalog.imported_keys_of(&books).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].pk_table, authors);
        assert_eq!(catalog.exported_keys_of(&authors).unwrap(), imported);
        assert_eq!(
            catalog.cross_references_between(&authors, &books).unwrap(),
            imported
        );
        assert!(catalog
            .cross_references_between(&books, &authors)
            .unwrap()
            .is_empty());
    }

    #[test_case(0, ValueType::BigInt ; "bigint")]
    #[test_case(2, ValueType::Date ; "date")]
    #[test_case(3, ValueType::Decimal ; "numeric with precision")]
    #[test_case(4, ValueType::Json ; "jsonb")]
    fn test_declared_types_map_to_value_types(index: usize, expected: ValueType) {
        let catalog = StaticCatalog::from_yaml_str(LIBRARY).unwrap();
        let columns = catalog
            .columns_of(&TableIdentity::new("library", "books"))
            .unwrap();
        assert_eq!(catalog.value_type(&columns[index]), expected);
    }

    #[test]
    fn test_unknown_table_is_not_found() {
        let catalog = StaticCatalog::from_yaml_str(LIBRARY).unwrap();
        assert!(matches!(
            catalog.columns_of(&TableIdentity::new("library", "loans")),
            Err(CatalogError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_join_uses_declared_spelling_of_referenced_table() {
        let yaml = r#"
schemas:
  - name: sales
    tables:
      - name: CUSTOMERS
        columns:
          - { name: id, type: integer }
        primary_key: [id]
      - name: invoices
        columns:
          - { name: id, type: integer }
          - { name: customer_id, type: integer }
        foreign_keys:
          - name: fk_invoice_customer
            references: Customers
            columns:
              - { column: customer_id, references: id }
"#;
        let catalog = StaticCatalog::from_yaml_str(yaml).unwrap();
        let graph = SchemaGraph::new(Arc::new(catalog), GraphConfig::with_schemas(["sales"]));
        let tree = graph
            .build_or_get_root(&TableIdentity::new("sales", "invoices"))
            .unwrap();
        let customer = tree.root().children()[0];

        let mut query = SelectQuery::new(Arc::clone(&tree));
        query.select(tree.column(customer, "id").unwrap());
        assert_eq!(
            query.to_sql().unwrap().sql,
            "SELECT `t1_0`.`id` AS `t1_0_c0` \
             FROM `sales`.`invoices` AS `t1` \
             LEFT OUTER JOIN `sales`.`CUSTOMERS` AS `t1_0` ON `t1_0`.`id` = `t1`.`customer_id`"
        );
    }

    #[test_case(
        r#"
schemas:
  - name: s
    tables:
      - name: a
        columns: [{ name: id, type: int }, { name: ID, type: int }]
"#
        ; "duplicate column"
    )]
    #[test_case(
        r#"
schemas:
  - name: s
    tables:
      - name: a
        columns: [{ name: id, type: int }]
        primary_key: [key]
"#
        ; "primary key on missing column"
    )]
    #[test_case(
        r#"
schemas:
  - name: s
    tables:
      - name: a
        columns: [{ name: id, type: int }, { name: b_id, type: int }]
        foreign_keys:
          - name: fk_a_b
            references: b
            columns: [{ column: b_id, references: id }]
"#
        ; "foreign key to undeclared table"
    )]
    #[test_case(
        r#"
schemas:
  - name: s
    tables:
      - name: b
        columns: [{ name: id, type: int }]
      - name: a
        columns: [{ name: id, type: int }, { name: b_id, type: int }]
        foreign_keys:
          - name: fk_a_b
            references: b
            columns: [{ column: b_id, references: code }]
"#
        ; "foreign key to undeclared column"
    )]
    #[test_case(
        r#"
schemas:
  - name: s
    tables:
      - name: a
        columns: [{ name: id, type: int }]
      - name: A
        columns: [{ name: id, type: int }]
"#
        ; "duplicate table"
    )]
    fn test_invalid_definitions_rejected(yaml: &str) {
        assert!(matches!(
            StaticCatalog::from_yaml_str(yaml),
            Err(CatalogError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            StaticCatalog::from_yaml_str("schemas: [ { name: s, tables: 7 } ]"),
            Err(CatalogError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIBRARY.as_bytes()).unwrap();
        let catalog = StaticCatalog::from_yaml_file(file.path()).unwrap();
        assert_eq!(catalog.list_tables("library").unwrap().len(), 2);

        assert!(matches!(
            StaticCatalog::from_yaml_file("/nonexistent/catalog.yaml"),
            Err(CatalogError::ConfigRead { .. })
        ));
    }
}
