//! Types for the video generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle status of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether no further stage execution can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Content,
    Voice,
    Image,
    Render,
    Notify,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Content,
        Stage::Voice,
        Stage::Image,
        Stage::Render,
        Stage::Notify,
    ];

    /// Progress percentage reported when the stage is entered.
    pub fn checkpoint(&self) -> u8 {
        match self {
            Self::Content => 10,
            Self::Voice => 30,
            Self::Image => 50,
            Self::Render => 70,
            Self::Notify => 90,
        }
    }

    /// Label shown to users while the stage runs.
    pub fn step_label(&self) -> &'static str {
        match self {
            Self::Content => "Generating English phrase...",
            Self::Voice => "Synthesizing voice...",
            Self::Image => "Generating background image...",
            Self::Render => "Compositing video...",
            Self::Notify => "Sending notification...",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Voice => "voice",
            Self::Image => "image",
            Self::Render => "render",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A progress update for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: JobStatus,
    /// 0-100.
    pub progress: u8,
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// Event emitted on entering a stage.
    pub fn stage(stage: Stage) -> Self {
        Self {
            status: JobStatus::Processing,
            progress: stage.checkpoint(),
            step: stage.step_label().to_string(),
            error: None,
        }
    }

    /// Event recorded by a bridge when a job has been accepted but not started.
    pub fn queued() -> Self {
        Self {
            status: JobStatus::Pending,
            progress: 0,
            step: "Queued".to_string(),
            error: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: JobStatus::Completed,
            progress: 100,
            step: "Done".to_string(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            progress: 0,
            step: "Error".to_string(),
            error: Some(error.into()),
        }
    }

    pub fn cancelled(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Cancelled,
            progress: 0,
            step: "Cancelled".to_string(),
            error: Some(error.into()),
        }
    }
}

/// Sink for progress events: `(job_id, event)`.
///
/// Called synchronously from the job task; implementations must not block.
pub type ProgressCallback = Arc<dyn Fn(&str, &ProgressEvent) + Send + Sync>;

/// Point-in-time view of an active job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    pub admitted_at: DateTime<Utc>,
    /// Number of temporary files currently owned by the job.
    pub owned_resources: usize,
}

/// Overall generator status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorStatus {
    pub capacity: usize,
    pub active_jobs: usize,
    pub jobs: Vec<JobSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoints_in_order() {
        let checkpoints: Vec<u8> = Stage::ALL.iter().map(|s| s.checkpoint()).collect();
        assert_eq!(checkpoints, vec![10, 30, 50, 70, 90]);
        assert!(Stage::ALL.iter().all(|s| !s.step_label().is_empty()));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent::stage(Stage::Image);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"status\":\"processing\""));
        assert!(json.contains("\"progress\":50"));
        assert!(!json.contains("error"));

        let event = ProgressEvent::failed("boom");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"error\":\"boom\""));
    }

    #[test]
    fn test_progress_event_deserialize_without_error() {
        let json = r#"{"status":"completed","progress":100,"step":"Done"}"#;
        let event: ProgressEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, ProgressEvent::completed());
    }
}
