//! The video generator: admits jobs and drives each through the five stages.
//!
//! Every job runs as its own task. Stages within a job are strictly
//! sequential; the cancellation token is checked before each stage and raced
//! against the in-flight stage call, so a cancelled job never waits on a
//! collaborator that ignores the signal.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::metrics::{JOBS_FINISHED, STAGE_DURATION};
use crate::stages::{NotificationPayload, StageError, StageSet};

use super::cleanup::{CleanupManager, CleanupReport};
use super::config::GeneratorConfig;
use super::error::GenerationError;
use super::registry::{AdmissionToken, JobRecord, JobRegistry};
use super::types::{GeneratorStatus, JobStatus, ProgressCallback, ProgressEvent, Stage};

const CANCELLED_MESSAGE: &str = "operation cancelled";

/// Runs video generation jobs with bounded concurrency.
///
/// Cheap to clone; clones share the same registry and collaborators.
#[derive(Clone)]
pub struct VideoGenerator {
    inner: Arc<GeneratorInner>,
}

struct GeneratorInner {
    config: GeneratorConfig,
    stages: StageSet,
    registry: Arc<JobRegistry>,
    cleanup: CleanupManager,
    tasks: TaskTracker,
}

impl VideoGenerator {
    /// Create a generator, making sure the output and temp directories exist.
    pub fn new(config: GeneratorConfig, stages: StageSet) -> Result<Self, GenerationError> {
        if config.max_concurrent_jobs == 0 {
            return Err(GenerationError::configuration(
                "max_concurrent_jobs must be at least 1",
            ));
        }
        if config.output_dir.as_os_str().is_empty() {
            return Err(GenerationError::configuration("output_dir is required"));
        }
        if config.temp_dir.as_os_str().is_empty() {
            return Err(GenerationError::configuration("temp_dir is required"));
        }

        for dir in [&config.output_dir, &config.temp_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                GenerationError::resource(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let registry = Arc::new(JobRegistry::new(config.max_concurrent_jobs));
        let cleanup = CleanupManager::new(Arc::clone(&registry));

        info!(
            capacity = config.max_concurrent_jobs,
            output_dir = %config.output_dir.display(),
            temp_dir = %config.temp_dir.display(),
            stages = ?stages,
            "Video generator ready"
        );

        Ok(Self {
            inner: Arc::new(GeneratorInner {
                config,
                stages,
                registry,
                cleanup,
                tasks: TaskTracker::new(),
            }),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.inner.config
    }

    /// The registry of active jobs.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.inner.registry
    }

    /// Admit `id` and run it to completion in the caller's task.
    pub async fn generate(
        &self,
        id: &str,
        on_progress: ProgressCallback,
    ) -> Result<(), GenerationError> {
        let token = self.inner.registry.admit(id)?;
        token.record().mark_running();
        let job = Arc::clone(&self.inner).run_job(token, on_progress);
        self.inner.tasks.track_future(job).await
    }

    /// Admit `id` and run it on a spawned task.
    ///
    /// Admission errors are returned synchronously; the handle resolves to
    /// the job's outcome.
    pub fn start(
        &self,
        id: &str,
        on_progress: ProgressCallback,
    ) -> Result<JoinHandle<Result<(), GenerationError>>, GenerationError> {
        let token = self.inner.registry.admit(id)?;
        token.record().mark_running();
        let inner = Arc::clone(&self.inner);
        Ok(self.inner.tasks.spawn(inner.run_job(token, on_progress)))
    }

    /// Cancel an active job and release its slot right away.
    ///
    /// The job's own task still emits the terminal `cancelled` event.
    pub async fn cancel(&self, id: &str) -> Result<(), GenerationError> {
        let record = self
            .inner
            .registry
            .get(id)
            .ok_or_else(|| GenerationError::resource(format!("Job {} is not active", id)))?;

        info!(job_id = id, "Cancelling job");
        record.cancel();
        self.inner.cleanup.cleanup_record(&record).await;
        Ok(())
    }

    /// Cancel every active job. Returns how many were cancelled.
    pub async fn cancel_all(&self) -> usize {
        let records = self.inner.registry.records();
        for record in &records {
            record.cancel();
            self.inner.cleanup.cleanup_record(record).await;
        }
        if !records.is_empty() {
            info!(count = records.len(), "Cancelled all active jobs");
        }
        records.len()
    }

    /// Cancels every active job and waits up to `timeout` for their tasks,
    /// including late cleanups, to finish. Returns whether they all did.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let cancelled = self.cancel_all().await;
        self.inner.tasks.close();
        let drained = tokio::time::timeout(timeout, self.inner.tasks.wait())
            .await
            .is_ok();
        if drained {
            info!(cancelled, "Video generator stopped");
        } else {
            warn!(
                cancelled,
                pending = self.inner.tasks.len(),
                "Timed out waiting for jobs to finish"
            );
        }
        drained
    }

    pub fn status(&self) -> GeneratorStatus {
        let jobs = self.inner.registry.snapshots();
        GeneratorStatus {
            capacity: self.inner.registry.capacity(),
            active_jobs: jobs.len(),
            jobs,
        }
    }
}

impl GeneratorInner {
    async fn run_job(
        self: Arc<Self>,
        token: AdmissionToken,
        on_progress: ProgressCallback,
    ) -> Result<(), GenerationError> {
        let record = Arc::clone(token.record());
        let mut guard = ReleaseOnDrop::new(
            Arc::clone(&record),
            self.cleanup.clone(),
            self.tasks.clone(),
        );
        let id = record.id().to_string();
        info!(job_id = %id, "Starting video generation");

        let mut created = Vec::new();
        let mut result = self.run_stages(&record, &on_progress, &mut created).await;

        // Cancellation wins over whatever the stages returned.
        let status = if record.is_cancelled() {
            JobStatus::Cancelled
        } else if result.is_ok() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        record.transition(status);
        let status = record.status();
        if status == JobStatus::Cancelled && result.is_ok() {
            result = Err(stage_error(Stage::Notify, CANCELLED_MESSAGE));
        }

        // A cancel may have drained the record while a stage was still
        // writing, so retry this job's own paths.
        if status == JobStatus::Cancelled {
            let remaining = record.owned_resources();
            for path in created {
                if !remaining.contains(&path) {
                    record.register_resource(path);
                }
            }
        }
        let report = self.cleanup.cleanup_record(&record).await;
        guard.disarm();
        log_cleanup(&id, &report);

        let event = match (&status, &result) {
            (JobStatus::Completed, _) => ProgressEvent::completed(),
            (JobStatus::Cancelled, Err(e)) => ProgressEvent::cancelled(e.describe()),
            (_, Err(e)) => ProgressEvent::failed(e.describe()),
            (_, Ok(())) => ProgressEvent::completed(),
        };
        on_progress(&id, &event);
        // Only now may the id be admitted again.
        self.registry.retire(&record);
        JOBS_FINISHED.with_label_values(&[status.as_str()]).inc();

        match &result {
            Ok(()) => info!(job_id = %id, "Video generation completed"),
            Err(e) if status == JobStatus::Cancelled => {
                info!(job_id = %id, error = %e, "Video generation cancelled")
            }
            Err(e) => error!(job_id = %id, code = e.code(), error = %e, "Video generation failed"),
        }

        result
    }

    async fn run_stages(
        &self,
        record: &Arc<JobRecord>,
        on_progress: &ProgressCallback,
        created: &mut Vec<PathBuf>,
    ) -> Result<(), GenerationError> {
        let id = record.id();
        let cancel = record.cancellation();
        let stages = &self.stages;
        let stamp = temp_stamp();

        self.enter(record, Stage::Content, on_progress)?;
        let content = self
            .run_stage(record, Stage::Content, stages.content.generate_content(cancel))
            .await?;
        debug!(job_id = id, phrase = %content.phrase, "Content generated");

        self.enter(record, Stage::Voice, on_progress)?;
        let audio_path = self.temp_path(&stamp, id, "audio.wav");
        record.register_resource(audio_path.clone());
        created.push(audio_path.clone());
        let voice = self
            .run_stage(
                record,
                Stage::Voice,
                stages.voice.generate_voice(&content.phrase, &audio_path, cancel),
            )
            .await?;

        self.enter(record, Stage::Image, on_progress)?;
        let image_path = self.temp_path(&stamp, id, "image.jpg");
        record.register_resource(image_path.clone());
        created.push(image_path.clone());
        let keywords = content.keywords();
        let image = self
            .run_stage(
                record,
                Stage::Image,
                stages.image.generate_image(&keywords, &image_path, cancel),
            )
            .await?;

        self.enter(record, Stage::Render, on_progress)?;
        let video_path = self.config.output_dir.join(format!("{}.mp4", id));
        let video = self
            .run_stage(
                record,
                Stage::Render,
                stages.renderer.render_video(
                    &image.image_path,
                    &voice.audio_path,
                    &content.text,
                    &video_path,
                    cancel,
                ),
            )
            .await?;

        self.enter(record, Stage::Notify, on_progress)?;
        let payload = NotificationPayload::video_generated(&content, &video, &image.attribution);
        let delivered = self
            .run_stage(record, Stage::Notify, stages.notifier.notify(&payload, cancel))
            .await?;
        if !delivered {
            return Err(stage_error(
                Stage::Notify,
                "notifier reported the message as undelivered",
            ));
        }

        Ok(())
    }

    /// Cancellation check and progress checkpoint before a stage.
    fn enter(
        &self,
        record: &JobRecord,
        stage: Stage,
        on_progress: &ProgressCallback,
    ) -> Result<(), GenerationError> {
        if record.is_cancelled() {
            debug!(job_id = record.id(), stage = %stage, "Cancelled before stage");
            return Err(stage_error(stage, CANCELLED_MESSAGE));
        }
        record.transition(JobStatus::Processing);
        debug!(job_id = record.id(), stage = %stage, "Entering stage");
        on_progress(record.id(), &ProgressEvent::stage(stage));
        Ok(())
    }

    /// Runs one stage call, first-settled-wins against cancellation.
    async fn run_stage<T, F>(
        &self,
        record: &JobRecord,
        stage: Stage,
        call: F,
    ) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, StageError>>,
    {
        let started = Instant::now();
        let cancel = record.cancellation();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StageError::Cancelled),
            res = AssertUnwindSafe(call).catch_unwind() => match res {
                Ok(res) => res,
                Err(panic) => Err(StageError::other(format!(
                    "stage panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            },
        };

        let result_label = match &outcome {
            Ok(_) => "success",
            Err(_) if record.is_cancelled() => "cancelled",
            Err(_) => "failed",
        };
        STAGE_DURATION
            .with_label_values(&[stage.as_str(), result_label])
            .observe(started.elapsed().as_secs_f64());

        outcome.map_err(|e| {
            if record.is_cancelled() {
                stage_error(stage, CANCELLED_MESSAGE)
            } else {
                warn!(job_id = record.id(), stage = %stage, error = %e, "Stage failed");
                stage_error(stage, e.to_string())
            }
        })
    }

    fn temp_path(&self, stamp: &str, id: &str, suffix: &str) -> PathBuf {
        self.config
            .temp_dir
            .join(format!("{}-{}-{}", stamp, id, suffix))
    }
}

/// File-name safe timestamp shared by all temp artifacts of one job.
fn temp_stamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Wraps a stage failure into the error kind for that stage.
fn stage_error(stage: Stage, message: impl Into<String>) -> GenerationError {
    let message = message.into();
    match stage {
        Stage::Content => GenerationError::Content(message),
        Stage::Voice => GenerationError::Voice(message),
        Stage::Image => GenerationError::Image(message),
        Stage::Render => GenerationError::Render(message),
        Stage::Notify => GenerationError::Notification(message),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_cleanup(id: &str, report: &CleanupReport) {
    if report.failed > 0 {
        warn!(
            job_id = id,
            deleted = report.deleted,
            failed = report.failed,
            "Cleanup finished with failures"
        );
    } else {
        debug!(
            job_id = id,
            deleted = report.deleted,
            missing = report.missing,
            released = report.released,
            "Cleanup finished"
        );
    }
}

/// Releases a job whose future was dropped before it finished.
struct ReleaseOnDrop {
    record: Arc<JobRecord>,
    cleanup: CleanupManager,
    tasks: TaskTracker,
    armed: bool,
}

impl ReleaseOnDrop {
    fn new(record: Arc<JobRecord>, cleanup: CleanupManager, tasks: TaskTracker) -> Self {
        Self {
            record,
            cleanup,
            tasks,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(job_id = self.record.id(), "Job dropped before finishing, cancelling");
        self.record.cancel();
        let record = Arc::clone(&self.record);
        let cleanup = self.cleanup.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.tasks.spawn_on(
                    async move {
                        cleanup.cleanup_record(&record).await;
                        cleanup.registry().retire(&record);
                    },
                    &handle,
                );
            }
            Err(_) => {
                cleanup.registry().release_record(&record);
                cleanup.registry().retire(&record);
            }
        }
    }
}
