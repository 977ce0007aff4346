//! Centralized alias generation for tree nodes and columns.
//!
//! The composer emits these strings verbatim as SQL table and column aliases,
//! so every alias must come from here.
//!
//! ## Naming Convention
//! - Root node: `t{ordinal}`, zero-padded to the digit count of the catalog's table count
//! - Child node: `{parent}_{seq}`, `seq` zero-padded to the digit count of the parent's foreign key count
//! - Column: `{node}_c{seq}`, `seq` zero-padded to the digit count of the node's column count
//!
//! Examples with 120 catalog tables:
//! - root `t007`, its second of three foreign keys `t007_1`, that node's column 4 of 12 `t007_1_c04`

/// Number of decimal digits needed to print `count` (at least 1).
pub fn pad_width(count: usize) -> usize {
    let mut width = 1;
    let mut rest = count / 10;
    while rest > 0 {
        width += 1;
        rest /= 10;
    }
    width
}

pub fn padded(seq: usize, width: usize) -> String {
    format!("{:0width$}", seq, width = width)
}

pub fn root_alias(ordinal: usize, table_count: usize) -> String {
    format!("t{}", padded(ordinal, pad_width(table_count)))
}

pub fn child_alias(parent: &str, seq: usize, sibling_count: usize) -> String {
    format!("{}_{}", parent, padded(seq, pad_width(sibling_count)))
}

pub fn column_alias(node: &str, sequence: &str) -> String {
    format!("{}_c{}", node, sequence)
}
