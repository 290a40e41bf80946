//! Input validation for uploaded files.
//!
//! Validation is name-only: a mislabelled file is caught later when FFmpeg
//! fails to decode it.

/// Lowercased suffix after the last `.`, if the name has one.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Whether `filename` carries one of the `allowed` extensions.
pub fn is_allowed_file(filename: &str, allowed: &[String]) -> bool {
    match file_extension(filename) {
        Some(ext) => allowed.iter().any(|a| *a == ext),
        None => false,
    }
}
