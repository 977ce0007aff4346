pub mod definition;
pub mod errors;
pub mod facts;
pub mod metadata_cache;
pub mod provider;
pub mod table_identity;
pub mod value_type;

pub use definition::{CatalogDefinition, StaticCatalog};
pub use errors::CatalogError;
pub use facts::{ColumnFact, ColumnPair, CrossReferenceFact, PrimaryKeyFact};
pub use metadata_cache::{MetadataCache, MetadataCacheStats};
pub use provider::{CatalogProvider, LayeredCatalog};
pub use table_identity::TableIdentity;
pub use value_type::ValueType;
