// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod culture;
pub mod comparer;
pub mod column;
pub mod record;

// Re-exports for convenience
pub use error::QueryError;
pub use value::Value;
pub use data_type::DataType;
pub use culture::Culture;
pub use comparer::{Comparer, CompareOp};
pub use column::{Column, column_ordinal};
pub use record::ProviderRecord;
