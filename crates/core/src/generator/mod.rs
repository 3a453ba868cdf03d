//! Job orchestration: admission, the five-stage pipeline, cancellation and
//! cleanup.
//!
//! - [`JobRegistry`] bounds the number of active jobs and rejects duplicates.
//! - [`VideoGenerator`] runs admitted jobs through content, voice, image,
//!   render and notify, emitting a [`ProgressEvent`] at each checkpoint.
//! - [`CleanupManager`] deletes a job's temporary files and frees its slot.

mod cleanup;
mod config;
mod error;
mod registry;
mod runner;
mod types;

pub use cleanup::{CleanupManager, CleanupReport};
pub use config::GeneratorConfig;
pub use error::{ConcurrencyError, GenerationError};
pub use registry::{validate_job_id, AdmissionToken, JobRecord, JobRegistry};
pub use runner::VideoGenerator;
pub use types::{
    GeneratorStatus, JobSnapshot, JobStatus, ProgressCallback, ProgressEvent, Stage,
};
