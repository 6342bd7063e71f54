//! HTTP request handlers
//!
//! - `upload` - statement analysis
//! - `status` - health and effective configuration

pub mod status;
pub mod upload;

// Re-export all handlers for use in router
pub use status::*;
pub use upload::*;
