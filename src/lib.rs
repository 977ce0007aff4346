//! Relgraph - foreign-key relationship graphs and SQL composition over a relational catalog
//!
//! This crate provides:
//! - Cached access to catalog metadata (tables, columns, keys)
//! - One alias-stable tree of foreign-key relationships per root table
//! - Clause composition that binds bare table references into a tree and
//!   grows the join list as columns are referenced

pub mod utils;

pub mod catalog;
pub mod config;
pub mod schema_graph;
pub mod sql_builder;

pub use catalog::{CatalogProvider, LayeredCatalog, MetadataCache, StaticCatalog, TableIdentity};
pub use config::GraphConfig;
pub use schema_graph::{NodeHandle, SchemaGraph, SchemaGraphError, SchemaTree};
pub use sql_builder::{Clause, ClauseKind, RenderMode, SelectQuery, SqlBuildError, UnboundColumn};
