//! Comparison orchestration.
//!
//! Validates a comparison request, stages its inputs, runs FFmpeg through a
//! [`CommandExecutor`] and turns the outcome into a response or an
//! [`ApiError`]. Uploaded inputs are removed when the request finishes,
//! whatever the outcome; outputs stay in the store for retrieval.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use tracing::{error, info, warn};
use vcompare_media::{build_command, ensure_success, parse_method, CommandExecutor, MediaError};
use vcompare_models::{
    truncate_chars, ComparisonMethod, ComparisonRequest, ComparisonResponse, PlaybackSpeed,
};
use vcompare_storage::MediaStore;

use crate::config::CompareConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{file_extension, is_allowed_file};

/// One uploaded file, buffered in memory until validation passes.
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    /// Client-supplied file name
    pub filename: String,
    pub data: Bytes,
}

/// Fields of a `/compare` submission.
#[derive(Debug, Clone, Default)]
pub struct CompareUpload {
    pub video1: Option<UploadedVideo>,
    pub video2: Option<UploadedVideo>,
    pub comparison_method: Option<String>,
    pub playback_speed: Option<PlaybackSpeed>,
}

/// Service running comparison jobs.
#[derive(Clone)]
pub struct ComparisonService {
    config: Arc<CompareConfig>,
    store: MediaStore,
    executor: Arc<dyn CommandExecutor>,
}

impl ComparisonService {
    /// Create a new comparison service.
    pub fn new(config: Arc<CompareConfig>, executor: Arc<dyn CommandExecutor>) -> Self {
        let store = MediaStore::new(config.store.clone());
        Self {
            config,
            store,
            executor,
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Compare two uploaded videos.
    ///
    /// Nothing is written before both files and the method are validated.
    pub async fn compare_uploads(&self, upload: CompareUpload) -> ApiResult<ComparisonResponse> {
        let (video1, video2) = match (upload.video1, upload.video2) {
            (Some(video1), Some(video2)) => (video1, video2),
            _ => {
                warn!("Request missing 'video1' or 'video2' file part");
                return Err(ApiError::bad_request("Missing video file(s) in request"));
            }
        };

        if video1.filename.is_empty() || video2.filename.is_empty() {
            warn!("One or both submitted files have no filename");
            return Err(ApiError::bad_request("No selected file or empty filename"));
        }

        let allowed = &self.config.allowed_extensions;
        if !(is_allowed_file(&video1.filename, allowed) && is_allowed_file(&video2.filename, allowed)) {
            warn!(
                video1 = %video1.filename,
                video2 = %video2.filename,
                "Invalid file type submitted"
            );
            return Err(ApiError::bad_request(format!(
                "Invalid file type. Allowed types: {}",
                allowed.join(", ")
            )));
        }

        let method = resolve_method(upload.comparison_method.as_deref())?;

        let ext1 = file_extension(&video1.filename).unwrap_or_default();
        let ext2 = file_extension(&video2.filename).unwrap_or_default();
        let job_id = MediaStore::new_job_id();

        // Runs on every exit path, including unwinding
        let mut staged = scopeguard::guard(Vec::with_capacity(2), |paths: Vec<PathBuf>| {
            MediaStore::discard_blocking(&paths);
            info!("Cleanup attempt finished for request");
        });

        staged.push(self.store.upload_path(&job_id, 1, &ext1));
        let input1 = self.store.stage_upload(&job_id, 1, &ext1, &video1.data).await?;
        staged.push(self.store.upload_path(&job_id, 2, &ext2));
        let input2 = self.store.stage_upload(&job_id, 2, &ext2, &video2.data).await?;

        info!(
            job_id = %job_id,
            input1 = %input1.display(),
            input2 = %input2.display(),
            "Saved input videos"
        );

        self.run_comparison(&job_id, method, input1, input2, upload.playback_speed.as_ref())
            .await
    }

    /// Compare the two configured sample videos.
    ///
    /// The samples are read-only inputs and are never deleted.
    pub async fn compare_local(
        &self,
        comparison_method: Option<&str>,
        playback_speed: Option<&PlaybackSpeed>,
    ) -> ApiResult<ComparisonResponse> {
        let method = resolve_method(comparison_method)?;

        let (sample1, sample2) = &self.config.sample_videos;
        if !(is_file(sample1).await && is_file(sample2).await) {
            warn!(
                sample1 = %sample1.display(),
                sample2 = %sample2.display(),
                "Sample videos not found"
            );
            return Err(ApiError::not_found("Sample videos not found"));
        }

        let job_id = MediaStore::new_job_id();
        self.run_comparison(&job_id, method, sample1.clone(), sample2.clone(), playback_speed)
            .await
    }

    async fn run_comparison(
        &self,
        job_id: &str,
        method: ComparisonMethod,
        input1: PathBuf,
        input2: PathBuf,
        playback_speed: Option<&PlaybackSpeed>,
    ) -> ApiResult<ComparisonResponse> {
        let request = ComparisonRequest {
            method,
            input1,
            input2,
            output: self.store.output_path(job_id),
            target_height: self.config.target_height,
            playback_speed: requested_speed(playback_speed),
        };
        let cmd = build_command(&request, &self.config.settings);

        info!(job_id, method = %method, "Running FFmpeg comparison");
        let start = Instant::now();
        let result = self.executor.execute(&cmd).await;
        metrics::record_ffmpeg_duration(method.as_str(), start.elapsed().as_secs_f64());

        let outcome = result.and_then(ensure_success);
        match outcome {
            Ok(output) => {
                metrics::record_comparison(method.as_str(), "success");
                info!(job_id, output = %output.display(), "FFmpeg processing successful");
                Ok(ComparisonResponse::for_output(MediaStore::output_filename(job_id)))
            }
            Err(MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            }) => {
                metrics::record_comparison(method.as_str(), "failed");
                let stderr = stderr.unwrap_or_default();
                // The partial output is left in place for debugging
                error!(job_id, method = %method, exit_code = ?exit_code, "{}. Error: {}", message, stderr);
                Err(ApiError::processing(
                    exit_code,
                    truncate_chars(&stderr, self.config.diagnostic_excerpt_chars),
                ))
            }
            Err(e) => {
                metrics::record_comparison(method.as_str(), "error");
                Err(e.into())
            }
        }
    }
}

fn resolve_method(method: Option<&str>) -> ApiResult<ComparisonMethod> {
    match method.map(str::trim) {
        None | Some("") => Err(ApiError::bad_request("Missing comparison_method")),
        Some(method) => Ok(parse_method(method)?),
    }
}

fn requested_speed(speed: Option<&PlaybackSpeed>) -> Option<f64> {
    let speed = speed?;
    let value = speed.value();
    if value.is_none() {
        warn!(speed = ?speed, "Unparsable playback speed, using 1.0");
    }
    value
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use mockall::mock;
    use tempfile::TempDir;
    use vcompare_media::{FfmpegCommand, MediaResult};
    use vcompare_models::ProcessResult;
    use vcompare_storage::StoreConfig;

    mock! {
        pub Executor {}

        #[async_trait]
        impl CommandExecutor for Executor {
            async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<ProcessResult>;
        }
    }

    fn config(dir: &TempDir) -> CompareConfig {
        CompareConfig {
            store: StoreConfig {
                upload_dir: dir.path().join("uploads"),
                output_dir: dir.path().join("outputs"),
            },
            sample_videos: (
                dir.path().join("samples").join("video1.mp4"),
                dir.path().join("samples").join("video2.mp4"),
            ),
            ..Default::default()
        }
    }

    async fn service(dir: &TempDir, executor: MockExecutor) -> ComparisonService {
        let service = ComparisonService::new(Arc::new(config(dir)), Arc::new(executor));
        service.store().ensure_dirs().await.unwrap();
        service
    }

    fn video(name: &str) -> Option<UploadedVideo> {
        Some(UploadedVideo {
            filename: name.to_string(),
            data: Bytes::from_static(b"not really a video"),
        })
    }

    fn upload(method: &str) -> CompareUpload {
        CompareUpload {
            video1: video("a.mp4"),
            video2: video("b.mkv"),
            comparison_method: Some(method.to_string()),
            playback_speed: None,
        }
    }

    fn succeed(cmd: &FfmpegCommand) -> MediaResult<ProcessResult> {
        std::fs::write(cmd.output(), b"video").unwrap();
        Ok(ProcessResult {
            exit_code: Some(0),
            stderr: String::new(),
            output: Some(cmd.output().to_path_buf()),
        })
    }

    fn args_contain(cmd: &FfmpegCommand, needle: &str) -> bool {
        cmd.build_args().iter().any(|arg| arg.contains(needle))
    }

    fn dir_is_empty(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_upload_success_removes_inputs() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|cmd| {
                cmd.inputs().len() == 2
                    && cmd.inputs().iter().all(|p| p.exists())
                    && cmd.inputs()[1].extension().is_some_and(|e| e == "mkv")
                    && args_contain(cmd, "hstack=inputs=2")
            })
            .times(1)
            .returning(succeed);
        let service = service(&dir, executor).await;

        let response = service.compare_uploads(upload("side_by_side")).await.unwrap();

        assert!(response.output_filename.ends_with("_output.mp4"));
        assert_eq!(response.output_url, format!("/outputs/{}", response.output_filename));
        assert!(dir.path().join("outputs").join(&response.output_filename).exists());
        assert!(dir_is_empty(&dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_ffmpeg_failure_returns_bounded_excerpt() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(1).returning(|_| {
            Ok(ProcessResult {
                exit_code: Some(1),
                stderr: "e".repeat(1200),
                output: None,
            })
        });
        let service = service(&dir, executor).await;

        let err = service.compare_uploads(upload("difference_blend")).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        match err {
            ApiError::Processing { exit_code, excerpt } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(excerpt.len(), 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(dir_is_empty(&dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_invalid_extension_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        let service = service(&dir, executor).await;

        let mut request = upload("side_by_side");
        request.video1 = video("a.txt");
        let err = service.compare_uploads(request).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "Invalid file type. Allowed types: mp4, mov, avi, mkv, webm"
        );
        assert!(dir_is_empty(&dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_bogus_method_never_runs_ffmpeg() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        let service = service(&dir, executor).await;

        let err = service.compare_uploads(upload("bogus_method")).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid comparison method: bogus_method");
        assert!(dir_is_empty(&dir.path().join("uploads")));
        assert!(dir_is_empty(&dir.path().join("outputs")));
    }

    #[tokio::test]
    async fn test_missing_and_unnamed_files() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        let service = service(&dir, executor).await;

        let mut missing = upload("side_by_side");
        missing.video2 = None;
        let err = service.compare_uploads(missing).await.unwrap_err();
        assert_eq!(err.public_message(), "Missing video file(s) in request");

        let mut unnamed = upload("side_by_side");
        unnamed.video1 = video("");
        let err = service.compare_uploads(unnamed).await.unwrap_err();
        assert_eq!(err.public_message(), "No selected file or empty filename");
    }

    #[tokio::test]
    async fn test_missing_or_blank_method_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        let service = service(&dir, executor).await;

        let mut absent = upload("");
        absent.comparison_method = None;
        let err = service.compare_uploads(absent).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Missing comparison_method");

        let err = service.compare_uploads(upload("   ")).await.unwrap_err();
        assert_eq!(err.public_message(), "Missing comparison_method");

        let err = service.compare_local(None, None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        assert!(dir_is_empty(&dir.path().join("uploads")));
        assert!(dir_is_empty(&dir.path().join("outputs")));
    }

    #[tokio::test]
    async fn test_playback_speed_from_form_text() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|cmd| args_contain(cmd, "setpts=0.5*PTS"))
            .times(1)
            .returning(succeed);
        executor
            .expect_execute()
            .withf(|cmd| !args_contain(cmd, "setpts"))
            .times(1)
            .returning(succeed);
        let service = service(&dir, executor).await;

        let mut faster = upload("vertical_stack");
        faster.playback_speed = Some(PlaybackSpeed::Text("2".to_string()));
        service.compare_uploads(faster).await.unwrap();

        let mut garbage = upload("vertical_stack");
        garbage.playback_speed = Some(PlaybackSpeed::Text("fast".to_string()));
        service.compare_uploads(garbage).await.unwrap();
    }

    #[tokio::test]
    async fn test_executor_error_is_unexpected() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Err(MediaError::FfmpegNotFound("ffmpeg".to_string())));
        let service = service(&dir, executor).await;

        let err = service.compare_uploads(upload("opacity_blend")).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "An unexpected server error occurred");
        assert!(dir_is_empty(&dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_compare_local_without_samples() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        let service = service(&dir, executor).await;

        let err = service.compare_local(Some("interleave"), None).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Sample videos not found");
    }

    #[tokio::test]
    async fn test_compare_local_keeps_samples() {
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        std::fs::create_dir_all(&samples).unwrap();
        std::fs::write(samples.join("video1.mp4"), b"one").unwrap();
        std::fs::write(samples.join("video2.mp4"), b"two").unwrap();

        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|cmd| args_contain(cmd, "format=gbrp"))
            .times(1)
            .returning(succeed);
        let service = service(&dir, executor).await;

        let speed = PlaybackSpeed::Number(1.0);
        let response = service
            .compare_local(Some("color_channel_mix"), Some(&speed))
            .await
            .unwrap();

        assert!(response.output_url.starts_with("/outputs/"));
        assert!(samples.join("video1.mp4").exists());
        assert!(samples.join("video2.mp4").exists());
    }

    #[tokio::test]
    async fn test_compare_local_validates_method_first() {
        let dir = TempDir::new().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        let service = service(&dir, executor).await;

        let err = service.compare_local(Some("nope"), None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
