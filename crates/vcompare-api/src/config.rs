//! API configuration.

use std::path::PathBuf;

use vcompare_media::ComparisonSettings;
use vcompare_models::encoding::DEFAULT_TARGET_HEIGHT;
use vcompare_storage::StoreConfig;

/// Container extensions accepted for uploads.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Maximum number of stderr characters returned to clients.
pub const DEFAULT_DIAGNOSTIC_EXCERPT_CHARS: usize = 500;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024 * 1024, // 1GB, two videos per request
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Comparison pipeline configuration.
///
/// Immutable once the server starts; shared by the handlers and the
/// comparison service.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// Upload and output directories
    pub store: StoreConfig,
    /// Lowercase extensions accepted for uploads
    pub allowed_extensions: Vec<String>,
    /// Height both inputs are scaled to; `None` keeps the source size
    pub target_height: Option<u32>,
    /// FFmpeg executable name or path
    pub ffmpeg_path: PathBuf,
    /// Kill FFmpeg after this many seconds; `None` waits indefinitely
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Fixed inputs for `/compare_local`
    pub sample_videos: (PathBuf, PathBuf),
    /// Front-end entry page served at `/`
    pub index_page: PathBuf,
    /// Maximum stderr characters included in error responses
    pub diagnostic_excerpt_chars: usize,
    /// Filter and encoder constants
    pub settings: ComparisonSettings,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            target_height: Some(DEFAULT_TARGET_HEIGHT),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffmpeg_timeout_secs: None,
            sample_videos: (
                PathBuf::from("samples/video1.mp4"),
                PathBuf::from("samples/video2.mp4"),
            ),
            index_page: PathBuf::from("index.html"),
            diagnostic_excerpt_chars: DEFAULT_DIAGNOSTIC_EXCERPT_CHARS,
            settings: ComparisonSettings::default(),
        }
    }
}

impl CompareConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let allowed_extensions = std::env::var("ALLOWED_EXTENSIONS")
            .map(|s| {
                s.split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_extensions);

        // TARGET_HEIGHT=0 disables scaling
        let target_height = match env_parse::<u32>("TARGET_HEIGHT") {
            Some(0) => None,
            Some(h) => Some(h),
            None => defaults.target_height,
        };

        let mut settings = defaults.settings;
        if let Some(shift) = env_parse("TINT_SHIFT") {
            settings.tint_shift = shift;
        }
        if let Some(boost) = env_parse("BRIGHTNESS_BOOST") {
            settings.brightness_boost = boost;
        }

        Self {
            store: StoreConfig::from_env(),
            allowed_extensions,
            target_height,
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            ffmpeg_timeout_secs: env_parse("FFMPEG_TIMEOUT_SECS").filter(|s| *s > 0),
            sample_videos: (
                std::env::var("SAMPLE_VIDEO_1")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.sample_videos.0),
                std::env::var("SAMPLE_VIDEO_2")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.sample_videos.1),
            ),
            index_page: std::env::var("INDEX_PAGE")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_page),
            diagnostic_excerpt_chars: env_parse("DIAGNOSTIC_EXCERPT_CHARS")
                .unwrap_or(defaults.diagnostic_excerpt_chars),
            settings,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
