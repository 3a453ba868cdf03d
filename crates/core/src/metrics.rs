//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Admission (admitted, rejected, active jobs)
//! - Job outcomes and per-stage durations
//! - Cleanup of temporary artifacts
//! - Progress store retention

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Admission
// =============================================================================

/// Jobs admitted total.
pub static JOBS_ADMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("phrasereel_jobs_admitted_total", "Total jobs admitted").unwrap()
});

/// Admissions rejected total by reason.
pub static ADMISSIONS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phrasereel_admissions_rejected_total",
            "Total admission attempts that were rejected",
        ),
        &["reason"], // "capacity", "duplicate", "invalid_id"
    )
    .unwrap()
});

/// Jobs currently holding a registry slot.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phrasereel_active_jobs",
        "Number of jobs currently holding a concurrency slot",
    )
    .unwrap()
});

// =============================================================================
// Pipeline
// =============================================================================

/// Jobs finished total by terminal status.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phrasereel_jobs_finished_total", "Total jobs finished"),
        &["status"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phrasereel_stage_duration_seconds",
            "Duration of individual pipeline stages",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["stage", "result"], // result: "success", "failed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Cleanup
// =============================================================================

/// Temporary files deleted during cleanup.
pub static CLEANUP_FILES_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "phrasereel_cleanup_files_deleted_total",
        "Temporary files deleted during job cleanup",
    )
    .unwrap()
});

/// Temporary files that could not be deleted.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "phrasereel_cleanup_failures_total",
        "Temporary files that failed to delete during job cleanup",
    )
    .unwrap()
});

// =============================================================================
// Progress store
// =============================================================================

/// Terminal progress entries evicted from the store.
pub static PROGRESS_EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "phrasereel_progress_evictions_total",
        "Terminal progress entries evicted after the retention window",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Admission
        Box::new(JOBS_ADMITTED.clone()),
        Box::new(ADMISSIONS_REJECTED.clone()),
        Box::new(ACTIVE_JOBS.clone()),
        // Pipeline
        Box::new(JOBS_FINISHED.clone()),
        Box::new(STAGE_DURATION.clone()),
        // Cleanup
        Box::new(CLEANUP_FILES_DELETED.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
        // Progress
        Box::new(PROGRESS_EVICTIONS.clone()),
    ]
}
