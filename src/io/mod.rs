//! Input/Output handling for the CLI and HTTP surfaces.
//!
//! This module provides:
//! - The `update_tags` request and response schema
//! - Exit codes mapped from ranking errors

pub mod exit_code;
pub mod schema;

pub use exit_code::ExitCode;
pub use schema::{ErrorBody, UpdateTagsRequest, UpdateTagsResponse};
