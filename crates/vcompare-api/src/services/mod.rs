//! Business logic services.

pub mod comparison;

pub use comparison::{CompareUpload, ComparisonService, UploadedVideo};
