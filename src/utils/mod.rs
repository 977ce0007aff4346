pub mod alias_naming;
pub mod keyed_cache;
