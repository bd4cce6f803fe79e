// logquery - SQL-like queries over text files and directory listings
// Modular architecture: parser -> planner -> provider chain -> row output

// Clippy configuration
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

// Values, culture, comparer, errors
pub mod core;

// Session and per-query state (variables, views, memo bins)
pub mod state;

// SQL dialect parser (USE, DECLARE, SET, views, SELECT)
pub mod parser;

// Expression trees (arena nodes, builder, functions)
pub mod expression;

// Row providers (directory, text, filter, sort, views, ...)
pub mod provider;

// Planning and command execution
pub mod executor;

// Engine orchestration, configuration, session log file
pub mod engine;

// Re-export commonly used types for convenience
pub use core::{Column, Comparer, Culture, DataType, ProviderRecord, QueryError, Value};
pub use parser::{parse_commands, Command, CommandParser, SqlParser};
pub use provider::{Provider, ProviderFactory};
pub use executor::{CommandOutcome, OutputSink, WriterSink};
pub use state::{ExecutionState, SessionState};
pub use engine::{Engine, EngineConfig, Timings};
