//! CLI commands implementation

pub mod format;
pub mod ingest;
pub mod init;
pub mod query;
pub mod shell;
pub mod status;

pub use format::*;
pub use ingest::*;
pub use init::*;
pub use query::*;
pub use shell::*;
pub use status::*;
