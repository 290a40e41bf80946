//! Shared data models for the video comparison service.
//!
//! This crate provides Serde-serializable types for:
//! - Comparison methods and requests
//! - Playback speed parsing
//! - Encoding configuration
//! - External process results and API response bodies

pub mod encoding;
pub mod method;
pub mod process;
pub mod request;

// Re-export common types
pub use encoding::EncodingConfig;
pub use method::{ComparisonMethod, MethodParseError};
pub use process::{truncate_chars, ProcessResult};
pub use request::{ComparisonRequest, ComparisonResponse, ErrorBody, PlaybackSpeed};
