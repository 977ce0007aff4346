//! Driver type code → semantic value type mapping.
//!
//! Type codes follow the standard `Types` numbering most SQL drivers report
//! (INTEGER = 4, VARCHAR = 12, TIMESTAMP = 93, ...). Codes outside that set,
//! and vendor "OTHER" columns, fall back to the reported type name.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub mod type_codes {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const CHAR: i32 = 1;
    pub const VARCHAR: i32 = 12;
    pub const LONGVARCHAR: i32 = -1;
    pub const NCHAR: i32 = -15;
    pub const NVARCHAR: i32 = -9;
    pub const LONGNVARCHAR: i32 = -16;
    pub const CLOB: i32 = 2005;
    pub const NCLOB: i32 = 2011;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const TIME_WITH_TIMEZONE: i32 = 2013;
    pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;
    pub const BINARY: i32 = -2;
    pub const VARBINARY: i32 = -3;
    pub const LONGVARBINARY: i32 = -4;
    pub const BLOB: i32 = 2004;
    pub const BOOLEAN: i32 = 16;
    pub const OTHER: i32 = 1111;
}

/// How a column's value is bound and extracted by the statement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Real,
    Double,
    Text,
    Binary,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
    Other,
}

lazy_static! {
    /// Common type names → (type code, value type). Keys are lowercase.
    static ref TYPE_NAMES: HashMap<&'static str, (i32, ValueType)> = {
        use type_codes::*;
        let entries: [(&'static str, i32, ValueType); 37] = [
            ("bool", BOOLEAN, ValueType::Boolean),
            ("boolean", BOOLEAN, ValueType::Boolean),
            ("bit", BIT, ValueType::Boolean),
            ("tinyint", TINYINT, ValueType::SmallInt),
            ("smallint", SMALLINT, ValueType::SmallInt),
            ("int2", SMALLINT, ValueType::SmallInt),
            ("int", INTEGER, ValueType::Integer),
            ("integer", INTEGER, ValueType::Integer),
            ("int4", INTEGER, ValueType::Integer),
            ("serial", INTEGER, ValueType::Integer),
            ("bigint", BIGINT, ValueType::BigInt),
            ("int8", BIGINT, ValueType::BigInt),
            ("bigserial", BIGINT, ValueType::BigInt),
            ("numeric", NUMERIC, ValueType::Decimal),
            ("decimal", DECIMAL, ValueType::Decimal),
            ("real", REAL, ValueType::Real),
            ("float4", REAL, ValueType::Real),
            ("float", FLOAT, ValueType::Double),
            ("float8", DOUBLE, ValueType::Double),
            ("double", DOUBLE, ValueType::Double),
            ("char", CHAR, ValueType::Text),
            ("varchar", VARCHAR, ValueType::Text),
            ("text", LONGVARCHAR, ValueType::Text),
            ("nvarchar", NVARCHAR, ValueType::Text),
            ("clob", CLOB, ValueType::Text),
            ("date", DATE, ValueType::Date),
            ("time", TIME, ValueType::Time),
            ("timetz", TIME_WITH_TIMEZONE, ValueType::Time),
            ("timestamp", TIMESTAMP, ValueType::Timestamp),
            ("datetime", TIMESTAMP, ValueType::Timestamp),
            ("timestamptz", TIMESTAMP_WITH_TIMEZONE, ValueType::Timestamp),
            ("binary", BINARY, ValueType::Binary),
            ("varbinary", VARBINARY, ValueType::Binary),
            ("bytea", LONGVARBINARY, ValueType::Binary),
            ("blob", BLOB, ValueType::Binary),
            ("uuid", OTHER, ValueType::Uuid),
            ("json", OTHER, ValueType::Json),
        ];
        entries
            .into_iter()
            .map(|(name, code, value_type)| (name, (code, value_type)))
            .collect()
    };
}

/// Strip length/precision suffixes: `varchar(255)` → `varchar`.
fn base_type_name(type_name: &str) -> String {
    let lower = type_name.trim().to_lowercase();
    match lower.find('(') {
        Some(pos) => lower[..pos].trim_end().to_string(),
        None => lower,
    }
}

impl ValueType {
    pub fn from_type_code(type_code: i32, type_name: &str) -> ValueType {
        use type_codes::*;
        match type_code {
            BOOLEAN | BIT => ValueType::Boolean,
            TINYINT | SMALLINT => ValueType::SmallInt,
            INTEGER => ValueType::Integer,
            BIGINT => ValueType::BigInt,
            NUMERIC | DECIMAL => ValueType::Decimal,
            REAL => ValueType::Real,
            FLOAT | DOUBLE => ValueType::Double,
            CHAR | VARCHAR | LONGVARCHAR | NCHAR | NVARCHAR | LONGNVARCHAR | CLOB | NCLOB => {
                ValueType::Text
            }
            DATE => ValueType::Date,
            TIME | TIME_WITH_TIMEZONE => ValueType::Time,
            TIMESTAMP | TIMESTAMP_WITH_TIMEZONE => ValueType::Timestamp,
            BINARY | VARBINARY | LONGVARBINARY | BLOB => ValueType::Binary,
            _ => Self::from_type_name(type_name),
        }
    }

    pub fn from_type_name(type_name: &str) -> ValueType {
        let base = base_type_name(type_name);
        if base == "jsonb" {
            return ValueType::Json;
        }
        TYPE_NAMES
            .get(base.as_str())
            .map(|(_, value_type)| *value_type)
            .unwrap_or(ValueType::Other)
    }
}

/// Type code a catalog definition should report for a declared type name.
pub fn type_code_for_name(type_name: &str) -> i32 {
    TYPE_NAMES
        .get(base_type_name(type_name).as_str())
        .map(|(code, _)| *code)
        .unwrap_or(type_codes::OTHER)
}
