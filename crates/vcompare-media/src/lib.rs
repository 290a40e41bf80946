//! FFmpeg integration for video comparisons.
//!
//! This crate provides:
//! - A typed filter-graph plan for every comparison method
//! - Type-safe FFmpeg command building
//! - A mockable executor abstraction over the FFmpeg subprocess

pub mod command;
pub mod comparison;
pub mod error;
pub mod filters;

pub use command::{check_ffmpeg, ensure_success, CommandExecutor, FfmpegCommand, FfmpegRunner};
pub use comparison::{
    build_command, build_plan, normalize_speed, parse_method, ComparisonSettings,
};
pub use error::{MediaError, MediaResult};
pub use filters::{even_scaled_width, FilterGraphPlan, FilterStage, StageKind};
