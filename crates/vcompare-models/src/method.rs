//! Comparison method definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available comparison methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    /// Both videos next to each other
    SideBySide,
    /// First video on top of the second
    VerticalStack,
    /// Absolute per-pixel difference
    DifferenceBlend,
    /// Second video subtracted from the first
    SubtractBlend,
    /// 50/50 average of both videos
    OpacityBlend,
    /// Even frames from the first video, odd frames from the second
    Interleave,
    /// Red from the first video, blue from the second, green averaged
    ColorChannelMix,
}

impl ComparisonMethod {
    /// All available methods.
    pub const ALL: &'static [ComparisonMethod] = &[
        ComparisonMethod::SideBySide,
        ComparisonMethod::VerticalStack,
        ComparisonMethod::DifferenceBlend,
        ComparisonMethod::SubtractBlend,
        ComparisonMethod::OpacityBlend,
        ComparisonMethod::Interleave,
        ComparisonMethod::ColorChannelMix,
    ];

    /// Returns the method identifier as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMethod::SideBySide => "side_by_side",
            ComparisonMethod::VerticalStack => "vertical_stack",
            ComparisonMethod::DifferenceBlend => "difference_blend",
            ComparisonMethod::SubtractBlend => "subtract_blend",
            ComparisonMethod::OpacityBlend => "opacity_blend",
            ComparisonMethod::Interleave => "interleave",
            ComparisonMethod::ColorChannelMix => "color_channel_mix",
        }
    }

    /// Whether both streams get a colour tint before being compared.
    pub fn is_tinted(&self) -> bool {
        matches!(
            self,
            ComparisonMethod::DifferenceBlend
                | ComparisonMethod::SubtractBlend
                | ComparisonMethod::OpacityBlend
        )
    }

    /// Whether the comparison output gets its luma boosted.
    pub fn is_brightness_boosted(&self) -> bool {
        matches!(
            self,
            ComparisonMethod::DifferenceBlend | ComparisonMethod::SubtractBlend
        )
    }
}

impl fmt::Display for ComparisonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComparisonMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "side_by_side" => Ok(ComparisonMethod::SideBySide),
            "vertical_stack" => Ok(ComparisonMethod::VerticalStack),
            "difference_blend" => Ok(ComparisonMethod::DifferenceBlend),
            "subtract_blend" => Ok(ComparisonMethod::SubtractBlend),
            "opacity_blend" => Ok(ComparisonMethod::OpacityBlend),
            "interleave" => Ok(ComparisonMethod::Interleave),
            "color_channel_mix" => Ok(ComparisonMethod::ColorChannelMix),
            _ => Err(MethodParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown comparison method: {0}")]
pub struct MethodParseError(pub String);
