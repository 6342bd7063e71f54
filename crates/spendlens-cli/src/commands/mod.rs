//! CLI command implementations
//!
//! - `analyze` - Analyze a statement file
//! - `serve` - Upload API server
//! - `setup` - Shared utilities (config loading, classifier selection)
//! - `status` - Config and health commands

pub mod analyze;
pub mod serve;
pub mod setup;
pub mod status;

// Re-export command functions for main.rs
pub use analyze::*;
pub use serve::*;
pub use setup::*;
pub use status::*;
