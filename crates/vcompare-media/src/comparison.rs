//! Comparison filter-graph planning.
//!
//! Maps a comparison method and its parameters to a [`FilterGraphPlan`] and
//! serializes that plan into an [`FfmpegCommand`]. Planning is total over
//! [`ComparisonMethod`]; only parsing a method identifier can fail.
//!
//! Stage order:
//! 1. speed normalisation (no stage, may record a warning)
//! 2. scale both inputs (when a target height is set)
//! 3. tint both streams (blend methods)
//! 4. the comparison itself
//! 5. brightness boost (difference/subtract)
//! 6. retime (speed other than 1.0)

use tracing::warn;
use vcompare_models::encoding::{DEFAULT_BRIGHTNESS_BOOST, DEFAULT_TINT_SHIFT};
use vcompare_models::{ComparisonMethod, ComparisonRequest, EncodingConfig};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::{self, FilterGraphPlan, FilterStage, StageKind, INPUT_A, INPUT_B};

/// Speeds within this distance of 1.0 are not retimed.
const SPEED_TOLERANCE: f64 = 1e-6;

/// Fixed parameters of every comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSettings {
    /// Colour balance shift for tinted methods
    pub tint_shift: f64,
    /// Luma multiplier for difference/subtract
    pub brightness_boost: f64,
    pub encoding: EncodingConfig,
    /// FFmpeg `-v` level
    pub log_level: String,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            tint_shift: DEFAULT_TINT_SHIFT,
            brightness_boost: DEFAULT_BRIGHTNESS_BOOST,
            encoding: EncodingConfig::default(),
            log_level: "error".to_string(),
        }
    }
}

/// Coerce a requested speed into a positive finite value.
///
/// Returns the speed to use and a warning when the request was replaced.
pub fn normalize_speed(speed: Option<f64>) -> (f64, Option<String>) {
    match speed {
        None => (1.0, None),
        Some(s) if s.is_finite() && s > 0.0 => (s, None),
        Some(s) => (
            1.0,
            Some(format!("Invalid playback speed {}, falling back to 1.0", s)),
        ),
    }
}

/// Plan the filter graph for one comparison.
pub fn build_plan(
    method: ComparisonMethod,
    target_height: Option<u32>,
    playback_speed: Option<f64>,
    settings: &ComparisonSettings,
) -> FilterGraphPlan {
    let mut plan = FilterGraphPlan::new();

    let (speed, speed_warning) = normalize_speed(playback_speed);
    if let Some(message) = speed_warning {
        warn!(method = %method, "{}", message);
        plan.warn(message);
    }

    let mut a = INPUT_A.to_string();
    let mut b = INPUT_B.to_string();

    if let Some(height) = target_height.filter(|h| *h > 0) {
        plan.push(FilterStage::new(StageKind::Scale, [a.as_str()], filters::filter_scale(height), "scaled_a"));
        plan.push(FilterStage::new(StageKind::Scale, [b.as_str()], filters::filter_scale(height), "scaled_b"));
        a = "scaled_a".to_string();
        b = "scaled_b".to_string();
    }

    if method.is_tinted() {
        plan.push(FilterStage::new(
            StageKind::Tint,
            [a.as_str()],
            filters::filter_tint_blue(settings.tint_shift),
            "tinted_a",
        ));
        plan.push(FilterStage::new(
            StageKind::Tint,
            [b.as_str()],
            filters::filter_tint_green(settings.tint_shift),
            "tinted_b",
        ));
        a = "tinted_a".to_string();
        b = "tinted_b".to_string();
    }

    push_comparison(&mut plan, method, &a, &b);
    let mut last = "compared".to_string();

    if method.is_brightness_boosted() {
        plan.push(FilterStage::new(
            StageKind::Boost,
            [last.as_str()],
            filters::filter_brightness_boost(settings.brightness_boost),
            "boosted",
        ));
        last = "boosted".to_string();
    }

    if (speed - 1.0).abs() > SPEED_TOLERANCE {
        plan.push(FilterStage::new(
            StageKind::Retime,
            [last.as_str()],
            filters::filter_retime(speed),
            "retimed",
        ));
    }

    plan
}

fn push_comparison(plan: &mut FilterGraphPlan, method: ComparisonMethod, a: &str, b: &str) {
    let filter = match method {
        ComparisonMethod::SideBySide => filters::FILTER_HSTACK,
        ComparisonMethod::VerticalStack => filters::FILTER_VSTACK,
        ComparisonMethod::DifferenceBlend => filters::FILTER_DIFFERENCE,
        ComparisonMethod::SubtractBlend => filters::FILTER_SUBTRACT,
        ComparisonMethod::OpacityBlend => filters::FILTER_OPACITY,
        ComparisonMethod::Interleave => filters::FILTER_INTERLEAVE,
        ComparisonMethod::ColorChannelMix => {
            plan.push(FilterStage::new(StageKind::Format, [a], filters::FILTER_PLANAR_RGB, "rgb_a"));
            plan.push(FilterStage::new(StageKind::Format, [b], filters::FILTER_PLANAR_RGB, "rgb_b"));
            plan.push(FilterStage::new(
                StageKind::Compare,
                ["rgb_a", "rgb_b"],
                filters::FILTER_CHANNEL_MIX,
                "compared",
            ));
            return;
        }
    };
    plan.push(FilterStage::new(StageKind::Compare, [a, b], filter, "compared"));
}

/// Build the complete FFmpeg invocation for a validated request.
pub fn build_command(request: &ComparisonRequest, settings: &ComparisonSettings) -> FfmpegCommand {
    let plan = build_plan(
        request.method,
        request.target_height,
        request.playback_speed,
        settings,
    );
    // Every plan ends with the comparison stage or a stage after it
    let output_tag = plan.output_tag().unwrap_or("compared").to_string();

    FfmpegCommand::new(&request.output)
        .log_level(settings.log_level.clone())
        .input(&request.input1)
        .input(&request.input2)
        .filter_complex(plan.to_filter_complex())
        .map_stream(&output_tag)
        .encoding(&settings.encoding)
        .shortest()
}

/// Parse a method identifier, signalling an invalid method otherwise.
pub fn parse_method(method: &str) -> MediaResult<ComparisonMethod> {
    method
        .parse()
        .map_err(|_| MediaError::invalid_method(method.trim()))
}
