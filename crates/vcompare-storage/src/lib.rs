//! Local filesystem storage.
//!
//! This crate provides:
//! - Staging of uploaded inputs under collision-free names
//! - Output file naming and lookup with path traversal protection
//! - Best-effort cleanup of transient inputs

pub mod client;
pub mod error;

pub use client::{validate_filename, MediaStore, StoreConfig};
pub use error::{StorageError, StorageResult};
