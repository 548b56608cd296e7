//! Compose file discovery, parsing, and CLI orchestration

pub mod config;
pub mod executor;
pub mod parser;
pub mod scanner;
pub mod status;

pub use executor::{ComposeCommand, CommandResult, Executor};
pub use parser::{ComposeFileDetails, ComposeParser, ServiceDefinition};
pub use scanner::{ComposeFileRef, Scanner};
pub use status::{StatusCollector, StatusSummary};
