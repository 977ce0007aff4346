//! Many threads sharing one schema graph

#[cfg(test)]
mod concurrency_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use relgraph::catalog::TableIdentity;
    use relgraph::config::GraphConfig;
    use relgraph::schema_graph::SchemaGraph;
    use relgraph::sql_builder::{SelectQuery, UnboundColumn};
    use serial_test::serial;

    use crate::counting_provider::{CallCounts, CountingProvider, LOGISTICS};

    fn slow_graph(delay: Duration) -> (SchemaGraph, Arc<CallCounts>) {
        let provider = CountingProvider::with_delay(LOGISTICS, delay);
        let counts = Arc::clone(&provider.counts);
        let graph = SchemaGraph::new(Arc::new(provider), GraphConfig::with_schemas(["ops"]));
        (graph, counts)
    }

    fn ops(name: &str) -> TableIdentity {
        TableIdentity::new("ops", name)
    }

    #[test]
    fn test_concurrent_builders_share_one_tree() {
        let (graph, counts) = slow_graph(Duration::from_millis(5));
        let trees: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| graph.build_or_get_root(&ops("shipments")).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for tree in &trees[1..] {
            assert!(Arc::ptr_eq(&trees[0], tree));
        }
        assert_eq!(counts.list_tables.load(Ordering::SeqCst), 1);
        assert_eq!(counts.columns(), 4);
        assert_eq!(counts.imported_keys.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_one_fetch_per_key_under_contention() {
        let (graph, counts) = slow_graph(Duration::from_millis(20));
        thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    let columns = graph.metadata().columns(&ops("orders")).unwrap();
                    assert_eq!(columns.len(), 3);
                });
            }
        });
        assert_eq!(counts.columns(), 1);
        let stats = graph.metadata().stats();
        assert_eq!(stats.columns.misses, 1);
        assert_eq!(stats.columns.hits, 15);
    }

    #[test]
    #[serial]
    fn test_different_keys_fetch_in_parallel() {
        let delay = Duration::from_millis(200);
        let (graph, counts) = slow_graph(delay);
        let tables = ["customers", "orders", "shipments", "warehouses"];

        let started = Instant::now();
        thread::scope(|scope| {
            for table in tables {
                let graph = &graph;
                scope.spawn(move || graph.metadata().columns(&ops(table)).unwrap());
            }
        });
        let elapsed = started.elapsed();

        assert_eq!(counts.columns(), 4);
        assert!(
            elapsed < delay * 3,
            "fetches for different keys were serialized: {:?}",
            elapsed
        );
    }

    #[test]
    fn test_queries_composed_in_parallel() {
        let (graph, _) = slow_graph(Duration::ZERO);
        let tree = graph.build_or_get_root(&ops("shipments")).unwrap();

        let sql: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let tree = Arc::clone(&tree);
                    scope.spawn(move || {
                        let mut query = SelectQuery::new(tree);
                        query.select(UnboundColumn::new(ops("customers"), "name"));
                        query.adjust_columns().unwrap();
                        query.to_sql().unwrap().sql
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(sql.iter().all(|s| s == &sql[0]));
        assert_eq!(
            sql[0],
            "SELECT `t2_0_0`.`name` AS `t2_0_0_c1` FROM `ops`.`shipments` AS `t2` \
             LEFT OUTER JOIN `ops`.`orders` AS `t2_0` ON `t2_0`.`id` = `t2`.`order_id` \
             LEFT OUTER JOIN `ops`.`customers` AS `t2_0_0` ON `t2_0_0`.`id` = `t2_0`.`customer_id`"
        );
    }
}
