//! Application state.

use std::sync::Arc;

use vcompare_media::{CommandExecutor, FfmpegRunner};

use crate::config::{ApiConfig, CompareConfig};
use crate::services::ComparisonService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub compare: Arc<CompareConfig>,
    pub comparisons: ComparisonService,
}

impl AppState {
    /// Create new application state running the configured FFmpeg binary.
    pub fn new(config: ApiConfig, compare: CompareConfig) -> Self {
        let mut runner = FfmpegRunner::new(&compare.ffmpeg_path);
        if let Some(secs) = compare.ffmpeg_timeout_secs {
            runner = runner.with_timeout(secs);
        }
        Self::with_executor(config, compare, Arc::new(runner))
    }

    /// Create state with a custom executor.
    pub fn with_executor(
        config: ApiConfig,
        compare: CompareConfig,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let compare = Arc::new(compare);
        let comparisons = ComparisonService::new(Arc::clone(&compare), executor);
        Self {
            config,
            compare,
            comparisons,
        }
    }
}
