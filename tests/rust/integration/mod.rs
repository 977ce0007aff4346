//! Integration tests - graph building and query composition end to end
//!
//! These tests load YAML catalog definitions and drive the schema graph and
//! the clause composer together.

mod counting_provider;

mod concurrency_tests;
mod query_composition_tests;
