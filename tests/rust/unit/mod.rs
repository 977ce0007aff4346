//! Unit tests - public API checks that need no external catalog
//!
//! These tests exercise catalog loading and layering through the crate's public surface.

mod catalog_definition_tests;
