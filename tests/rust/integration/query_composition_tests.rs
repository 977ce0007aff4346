//! End-to-end composition over trees built from a catalog definition

#[cfg(test)]
mod query_composition_tests {
    use std::sync::Arc;

    use relgraph::catalog::{StaticCatalog, TableIdentity};
    use relgraph::config::GraphConfig;
    use relgraph::schema_graph::{NodeHandle, SchemaGraph, SchemaGraphError, Truncation};
    use relgraph::sql_builder::{
        BindValue, Clause, ClauseKind, RenderMode, SelectQuery, SortOrder, SqlBuildError,
        UnboundColumn,
    };

    /// departments ← employees (manager self-reference) ← timesheets → projects → departments
    const HR: &str = r#"
schemas:
  - name: hr
    tables:
      - name: departments
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: title, type: varchar(80) }
        primary_key: [id]
      - name: employees
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: department_id, type: integer }
          - { name: manager_id, type: integer }
          - { name: full_name, type: varchar(120) }
        primary_key: [id]
        foreign_keys:
          - name: fk_employee_department
            references: departments
            columns:
              - { column: department_id, references: id }
          - name: fk_employee_manager
            references: employees
            columns:
              - { column: manager_id, references: id }
      - name: projects
        columns:
          - { name: id, type: integer, nullable: false }
          - { name: department_id, type: integer }
          - { name: code, type: char(8) }
        primary_key: [id]
        foreign_keys:
          - name: fk_project_department
            references: departments
            columns:
              - { column: department_id, references: id }
      - name: timesheets
        columns:
          - { name: employee_id, type: integer, nullable: false }
          - { name: project_id, type: integer, nullable: false }
          - { name: week, type: date, nullable: false }
          - { name: hours, type: "numeric(5, 2)" }
        primary_key: [employee_id, project_id, week]
        foreign_keys:
          - name: fk_timesheet_employee
            references: employees
            columns:
              - { column: employee_id, references: id }
          - name: fk_timesheet_project
            references: projects
            columns:
              - { column: project_id, references: id }
"#;

    fn graph() -> SchemaGraph {
        let catalog = StaticCatalog::from_yaml_str(HR).unwrap();
        SchemaGraph::new(Arc::new(catalog), GraphConfig::with_schemas(["hr"]))
    }

    fn hr(name: &str) -> TableIdentity {
        TableIdentity::new("hr", name)
    }

    #[test]
    fn test_tree_shape_and_aliases() {
        let graph = graph();
        // departments t0, employees t1, projects t2, timesheets t3
        let tree = graph.build_or_get_root(&hr("timesheets")).unwrap();
        let aliases: Vec<&str> = tree.nodes().iter().map(|n| n.alias()).collect();
        assert_eq!(
            aliases,
            vec!["t3", "t3_0", "t3_1", "t3_0_0", "t3_0_1", "t3_1_0"]
        );

        // The manager self-reference is a leaf
        let manager = tree.find_by_alias("t3_0_1").unwrap();
        assert_eq!(manager.table(), &hr("employees"));
        assert_eq!(manager.truncation(), Some(Truncation::Cycle));
        assert!(manager.children().is_empty());

        let pk: Vec<&str> = tree.root().primary_key().map(|c| c.name()).collect();
        assert_eq!(pk, vec!["employee_id", "project_id", "week"]);

        let employee = tree
            .child_by_fk_columns(NodeHandle::ROOT, &["EMPLOYEE_ID"])
            .unwrap();
        assert_eq!(employee.alias(), "t3_0");
        assert!(matches!(
            tree.child_by_fk_name(NodeHandle::ROOT, "fk_timesheet_week"),
            Err(SchemaGraphError::NotFound { .. })
        ));
    }

    #[test]
    fn test_convert_through_graph() {
        let graph = graph();
        let tree = graph.build_or_get_root(&hr("timesheets")).unwrap();

        let projects = graph.convert(&tree, &hr("projects")).unwrap();
        assert_eq!(tree.node(projects).unwrap().alias(), "t3_1");
        // Reached through both employees and projects
        assert!(matches!(
            graph.convert(&tree, &hr("departments")),
            Err(SchemaGraphError::Ambiguous { count: 2, .. })
        ));
        assert!(matches!(
            graph.convert(&tree, &hr("employees")),
            Err(SchemaGraphError::Ambiguous { count: 2, .. })
        ));

        let departments = graph.build_or_get_root(&hr("departments")).unwrap();
        assert!(matches!(
            graph.convert(&departments, &hr("timesheets")),
            Err(SchemaGraphError::NotJoinable { .. })
        ));
    }

    #[test]
    fn test_report_query() {
        let graph = graph();
        let tree = graph.build_or_get_root(&hr("timesheets")).unwrap();
        let employee = tree.find_by_alias("t3_0").unwrap().handle();
        let employee_department = tree.find_by_alias("t3_0_0").unwrap().handle();
        let hours = tree.column(NodeHandle::ROOT, "hours").unwrap();
        let title = tree.column(employee_department, "title").unwrap();

        let mut query = SelectQuery::new(Arc::clone(&tree));
        query
            .select(title)
            .select(tree.column(employee, "full_name").unwrap())
            .select_expression("sum({0})", [hours])
            .unwrap();
        query
            .filter(
                "{0} BETWEEN ? AND ?",
                [tree.column(NodeHandle::ROOT, "week").unwrap()],
                ["2024-01-01", "2024-03-31"],
            )
            .unwrap()
            .filter(
                "{0} = ?",
                [UnboundColumn::new(hr("projects"), "code")],
                ["APOLLO"],
            )
            .unwrap();
        query
            .group_by(title)
            .group_by(tree.column(employee, "full_name").unwrap());
        query
            .having("sum({0}) > ?", [hours], [40])
            .unwrap()
            .order_by(title, SortOrder::Asc)
            .unwrap();

        assert_eq!(query.adjust_columns().unwrap(), 1);
        let rendered = query.to_sql().unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT `t3_0_0`.`title` AS `t3_0_0_c1`, `t3_0`.`full_name` AS `t3_0_c3`, sum(`t3`.`hours`) \
             FROM `hr`.`timesheets` AS `t3` \
             LEFT OUTER JOIN `hr`.`employees` AS `t3_0` ON `t3_0`.`id` = `t3`.`employee_id` \
             LEFT OUTER JOIN `hr`.`departments` AS `t3_0_0` ON `t3_0_0`.`id` = `t3_0`.`department_id` \
             LEFT OUTER JOIN `hr`.`projects` AS `t3_1` ON `t3_1`.`id` = `t3`.`project_id` \
             WHERE (`t3`.`week` BETWEEN ? AND ?) AND (`t3_1`.`code` = ?) \
             GROUP BY `t3_0_0`.`title`, `t3_0`.`full_name` \
             HAVING sum(`t3`.`hours`) > ? \
             ORDER BY `t3_0_0`.`title` ASC"
        );
        assert_eq!(
            rendered.bind_values,
            vec![
                BindValue::from("2024-01-01"),
                BindValue::from("2024-03-31"),
                BindValue::from("APOLLO"),
                BindValue::Int(40),
            ]
        );
        let labels: Vec<&str> = rendered.result_columns.iter().map(|c| c.alias()).collect();
        assert_eq!(labels, vec!["t3_0_0_c1", "t3_0_c3"]);
    }

    #[test]
    fn test_ambiguous_reference_resolved_with_tree_column() {
        let graph = graph();
        let tree = graph.build_or_get_root(&hr("timesheets")).unwrap();

        let mut query = SelectQuery::new(Arc::clone(&tree));
        query.select(UnboundColumn::new(hr("departments"), "title"));
        assert!(matches!(
            query.adjust_columns(),
            Err(SqlBuildError::Graph(SchemaGraphError::Ambiguous { .. }))
        ));

        // Pick the project's department explicitly
        let project_department = tree.find_by_alias("t3_1_0").unwrap().handle();
        let mut query = SelectQuery::new(Arc::clone(&tree));
        query.select(tree.column(project_department, "title").unwrap());
        let rendered = query.to_sql().unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT `t3_1_0`.`title` AS `t3_1_0_c1` \
             FROM `hr`.`timesheets` AS `t3` \
             LEFT OUTER JOIN `hr`.`projects` AS `t3_1` ON `t3_1`.`id` = `t3`.`project_id` \
             LEFT OUTER JOIN `hr`.`departments` AS `t3_1_0` ON `t3_1_0`.`id` = `t3_1`.`department_id`"
        );
    }

    #[test]
    fn test_standalone_clause_reused_across_trees() {
        let graph = graph();
        let employees = graph.build_or_get_root(&hr("employees")).unwrap();
        let projects = graph.build_or_get_root(&hr("projects")).unwrap();

        let mut clause = Clause::new(ClauseKind::Where);
        clause
            .add_template_with_values(
                "{0} IN (?, ?)",
                [UnboundColumn::new(hr("departments"), "title")],
                ["Research", "Operations"],
            )
            .unwrap();

        clause.adjust_columns(&employees).unwrap();
        assert_eq!(
            clause.render(RenderMode::Joined).unwrap(),
            "`t1_0`.`title` IN (?, ?)"
        );

        // Bound to the employees tree; adjusting moves it into the projects tree
        assert_eq!(clause.adjust_columns(&projects).unwrap(), 1);
        assert_eq!(
            clause.render(RenderMode::Joined).unwrap(),
            "`t2_0`.`title` IN (?, ?)"
        );
        assert_eq!(clause.render(RenderMode::Bare).unwrap(), "`title` IN (?, ?)");
    }

    #[test]
    fn test_invalid_templates() {
        let graph = graph();
        let tree = graph.build_or_get_root(&hr("employees")).unwrap();
        let id = tree.column(NodeHandle::ROOT, "id").unwrap();

        let mut query = SelectQuery::new(Arc::clone(&tree));
        assert!(matches!(
            query.filter("{0} = {1}", [id], Vec::<BindValue>::new()),
            Err(SqlBuildError::PlaceholderOutOfRange { index: 1, supplied: 1, .. })
        ));
        assert!(matches!(
            query.filter("{0} = ?", [id], Vec::<BindValue>::new()),
            Err(SqlBuildError::BindCountMismatch { expected: 1, supplied: 0, .. })
        ));
        assert!(query.clause(ClauseKind::Where).is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let catalog = StaticCatalog::from_yaml_str(HR).unwrap();
        let config = GraphConfig {
            max_depth: 1,
            ..GraphConfig::with_schemas(["hr"])
        };
        let graph = SchemaGraph::new(Arc::new(catalog), config);
        let tree = graph.build_or_get_root(&hr("timesheets")).unwrap();
        assert_eq!(tree.len(), 3);
        for child in tree.root().children() {
            assert_eq!(tree.node(*child).unwrap().truncation(), Some(Truncation::MaxDepth));
        }
    }
}
