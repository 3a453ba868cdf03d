//! Release of per-job temporary artifacts and registry slots.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::metrics::{CLEANUP_FAILURES, CLEANUP_FILES_DELETED};

use super::registry::{JobRecord, JobRegistry};

/// What a cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files that existed and were deleted.
    pub deleted: usize,
    /// Registered paths that never got created (or were already gone).
    pub missing: usize,
    /// Files that could not be deleted.
    pub failed: usize,
    /// Whether this pass removed the job from the registry.
    pub released: bool,
}

/// Deletes the temporary files of finished jobs and retires their records.
///
/// Never fails: deletion errors are logged and counted, and the registry slot
/// is freed regardless.
#[derive(Debug, Clone)]
pub struct CleanupManager {
    registry: Arc<JobRegistry>,
}

impl CleanupManager {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Cleans up the job registered under `id`. Unknown ids are a no-op.
    pub async fn cleanup(&self, id: &str) -> CleanupReport {
        match self.registry.get(id) {
            Some(record) => self.cleanup_record(&record).await,
            None => {
                debug!(job_id = id, "Cleanup skipped, job not registered");
                CleanupReport::default()
            }
        }
    }

    /// Cleans up a specific record.
    ///
    /// Owned paths are drained from the record, so concurrent or repeated
    /// calls delete each path at most once.
    pub async fn cleanup_record(&self, record: &Arc<JobRecord>) -> CleanupReport {
        let mut report = CleanupReport::default();

        for path in record.drain_resources() {
            match remove_if_exists(&path).await {
                Ok(true) => {
                    report.deleted += 1;
                    CLEANUP_FILES_DELETED.inc();
                    info!(job_id = record.id(), path = %path.display(), "Cleaned up temporary file");
                }
                Ok(false) => report.missing += 1,
                Err(e) => {
                    report.failed += 1;
                    CLEANUP_FAILURES.inc();
                    error!(
                        job_id = record.id(),
                        path = %path.display(),
                        error = %e,
                        "Failed to clean up temporary file"
                    );
                }
            }
        }

        report.released = self.registry.release_record(record);
        report
    }
}

async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(false);
    }
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
