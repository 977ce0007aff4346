use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use validator::Validate;

use relgraph::catalog::StaticCatalog;
use relgraph::config::{split_list, GraphConfig};
use relgraph::schema_graph::{NodeHandle, SchemaGraph, SchemaTree};
use relgraph::sql_builder::{SelectQuery, UnboundColumn};
use relgraph::TableIdentity;

/// Relgraph - foreign-key trees and SQL composition over a catalog definition
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML catalog definition
    #[arg(long, env = "RELGRAPH_CATALOG")]
    catalog: Option<String>,

    /// Comma separated catalog schemas (defaults to RELGRAPH_SCHEMAS or "public")
    #[arg(long)]
    schemas: Option<String>,

    /// Deepest level whose foreign keys are still expanded
    #[arg(long)]
    max_depth: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every node of the tree rooted at a table
    Tree {
        /// Root table as schema.table
        table: String,

        /// Emit JSON instead of one line per node
        #[arg(long)]
        json: bool,
    },
    /// Compose a SELECT over the tree rooted at a table
    Sql {
        /// Root table as schema.table
        table: String,

        /// Selected column as schema.table.column (repeatable; default is every root column)
        #[arg(long = "column")]
        columns: Vec<String>,

        /// Equality filter as schema.table.column=value (repeatable)
        #[arg(long = "equals")]
        equals: Vec<String>,

        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Serialize)]
struct NodeSummary<'a> {
    alias: &'a str,
    table: &'a TableIdentity,
    depth: usize,
    parent: Option<&'a str>,
    foreign_key: Option<&'a str>,
    truncation: Option<String>,
}

fn parse_table(value: &str) -> anyhow::Result<TableIdentity> {
    TableIdentity::parse(value).ok_or_else(|| anyhow!("Expected schema.table, got `{}`", value))
}

fn parse_column(value: &str) -> anyhow::Result<UnboundColumn> {
    UnboundColumn::parse(value)
        .ok_or_else(|| anyhow!("Expected schema.table.column, got `{}`", value))
}

fn build_config(cli: &Cli) -> anyhow::Result<GraphConfig> {
    let mut config = GraphConfig::from_env().context("Invalid environment configuration")?;
    if let Some(schemas) = &cli.schemas {
        config.schemas = split_list(schemas);
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_tree(tree: &SchemaTree, json: bool) -> anyhow::Result<()> {
    let summaries: Vec<NodeSummary> = tree
        .nodes()
        .iter()
        .map(|node| NodeSummary {
            alias: node.alias(),
            table: node.table(),
            depth: node.depth(),
            parent: node.parent().and_then(|p| tree.get(p)).map(|p| p.alias()),
            foreign_key: node.reference().map(|fk| fk.fk_name.as_str()),
            truncation: node.truncation().map(|t| format!("{:?}", t)),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for summary in &summaries {
        let indent = "  ".repeat(summary.depth);
        let via = summary
            .foreign_key
            .map(|fk| format!(" via {}", fk))
            .unwrap_or_default();
        let truncated = summary
            .truncation
            .as_deref()
            .map(|t| format!(" [{}]", t))
            .unwrap_or_default();
        println!("{}{} {}{}{}", indent, summary.alias, summary.table, via, truncated);
    }
    Ok(())
}

fn compose_sql(
    tree: Arc<SchemaTree>,
    columns: &[String],
    equals: &[String],
    limit: Option<u64>,
) -> anyhow::Result<()> {
    let mut query = SelectQuery::new(tree);
    if columns.is_empty() {
        query.select_all(NodeHandle::ROOT)?;
    }
    for column in columns {
        query.select(parse_column(column)?);
    }
    for condition in equals {
        let Some((column, value)) = condition.split_once('=') else {
            bail!("Expected schema.table.column=value, got `{}`", condition);
        };
        query.filter("{0} = ?", [parse_column(column)?], [value.trim()])?;
    }
    if let Some(limit) = limit {
        query.limit(limit);
    }

    let rebound = query.adjust_columns()?;
    info!("Bound {} column reference(s), {} table(s) joined", rebound, query.joins().len());

    let rendered = query.to_sql()?;
    println!("{}", rendered.sql);
    if !rendered.bind_values.is_empty() {
        println!("-- binds: {}", serde_json::to_string(&rendered.bind_values)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let Some(catalog_path) = config.catalog_path.clone() else {
        bail!("No catalog definition given; pass --catalog or set RELGRAPH_CATALOG");
    };
    let catalog = StaticCatalog::from_yaml_file(&catalog_path)
        .with_context(|| format!("Failed to load catalog `{}`", catalog_path))?;
    let graph = SchemaGraph::new(Arc::new(catalog), config);

    match &cli.command {
        Command::Tree { table, json } => {
            let tree = graph.build_or_get_root(&parse_table(table)?)?;
            print_tree(&tree, *json)
        }
        Command::Sql {
            table,
            columns,
            equals,
            limit,
        } => {
            let tree = graph.build_or_get_root(&parse_table(table)?)?;
            compose_sql(tree, columns, equals, *limit)
        }
    }
}
