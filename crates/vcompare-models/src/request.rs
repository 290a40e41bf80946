//! Comparison requests and response bodies.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::method::ComparisonMethod;

/// A fully validated comparison job.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub method: ComparisonMethod,
    /// First input (stream A)
    pub input1: PathBuf,
    /// Second input (stream B)
    pub input2: PathBuf,
    /// Where the comparison video is written
    pub output: PathBuf,
    /// Height both inputs are scaled to, if any
    pub target_height: Option<u32>,
    /// Requested playback speed; normalised by the command builder
    pub playback_speed: Option<f64>,
}

/// Playback speed as it arrives on the wire.
///
/// Clients send either a JSON number or a string such as `"1.5"`. Any other
/// JSON value is kept as `Other` and reads as no speed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaybackSpeed {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl PlaybackSpeed {
    /// Parse a form value. Unparsable or empty input yields `None`.
    pub fn parse_text(value: &str) -> Option<f64> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        value.parse::<f64>().ok()
    }

    /// Numeric value, if one can be read.
    pub fn value(&self) -> Option<f64> {
        match self {
            PlaybackSpeed::Number(n) => Some(*n),
            PlaybackSpeed::Text(s) => Self::parse_text(s),
            PlaybackSpeed::Other(_) => None,
        }
    }
}

/// Successful comparison response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    /// URL path the video can be fetched from
    pub output_url: String,
    pub output_filename: String,
}

impl ComparisonResponse {
    /// Build a response for a file in the output store.
    pub fn for_output(output_filename: impl Into<String>) -> Self {
        let output_filename = output_filename.into();
        Self {
            output_url: format!("/outputs/{}", output_filename),
            output_filename,
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_speed() {
        assert_eq!(PlaybackSpeed::parse_text("2"), Some(2.0));
        assert_eq!(PlaybackSpeed::parse_text(" 0.5 "), Some(0.5));
        assert_eq!(PlaybackSpeed::parse_text(""), None);
        assert_eq!(PlaybackSpeed::parse_text("fast"), None);
    }

    #[test]
    fn test_speed_accepts_number_or_string() {
        let n: PlaybackSpeed = serde_json::from_str("1.5").unwrap();
        assert_eq!(n.value(), Some(1.5));

        let s: PlaybackSpeed = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(s.value(), Some(2.0));
    }

    #[test]
    fn test_speed_of_other_json_types_is_absent() {
        for raw in ["true", "{\"x\":1}", "[2]", "null"] {
            let speed: PlaybackSpeed = serde_json::from_str(raw).unwrap();
            assert!(matches!(speed, PlaybackSpeed::Other(_)), "{}", raw);
            assert_eq!(speed.value(), None, "{}", raw);
        }
    }

    #[test]
    fn test_response_for_output() {
        let response = ComparisonResponse::for_output("abc_output.mp4");
        assert_eq!(response.output_url, "/outputs/abc_output.mp4");
        assert_eq!(response.output_filename, "abc_output.mp4");
    }
}
