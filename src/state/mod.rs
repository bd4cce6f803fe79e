// Module declarations
pub mod execution;
pub mod variables;
pub mod views;
pub mod options;
pub mod session;
pub mod query_state;

// Re-exports for convenience
pub use execution::ExecutionState;
pub use variables::{Variable, Variables};
pub use views::{ViewDefinition, ViewSource, Views};
pub use options::{HeadingMode, OutputOptions};
pub use session::SessionState;
pub use query_state::{BinKey, QueryState, StateBin};
