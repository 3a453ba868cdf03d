//! Job records and the admission-controlled registry of active jobs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::metrics::{ACTIVE_JOBS, ADMISSIONS_REJECTED, JOBS_ADMITTED};

use super::error::{ConcurrencyError, GenerationError};
use super::types::{JobSnapshot, JobStatus};

const MAX_JOB_ID_LEN: usize = 128;

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Per-job mutable state.
#[derive(Debug)]
pub struct JobRecord {
    id: String,
    admitted_at: DateTime<Utc>,
    cancel: CancellationToken,
    status: Mutex<JobStatus>,
    owned_resources: Mutex<Vec<PathBuf>>,
    task_running: AtomicBool,
}

impl JobRecord {
    fn new(id: String) -> Self {
        Self {
            id,
            admitted_at: Utc::now(),
            cancel: CancellationToken::new(),
            status: Mutex::new(JobStatus::Pending),
            owned_resources: Mutex::new(Vec::new()),
            task_running: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn admitted_at(&self) -> DateTime<Utc> {
        self.admitted_at
    }

    pub fn status(&self) -> JobStatus {
        *lock(&self.status)
    }

    /// Moves the job to `next`. Terminal statuses are sticky: once a job is
    /// completed, failed or cancelled it never changes again.
    ///
    /// Returns whether the transition happened.
    pub fn transition(&self, next: JobStatus) -> bool {
        let mut status = lock(&self.status);
        if status.is_terminal() {
            return false;
        }
        *status = next;
        true
    }

    /// The job's cancellation signal.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Signals cancellation and marks the job cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.transition(JobStatus::Cancelled);
    }

    /// Records a temporary path owned by this job.
    pub fn register_resource(&self, path: PathBuf) {
        lock(&self.owned_resources).push(path);
    }

    /// Paths currently owned, in registration order.
    pub fn owned_resources(&self) -> Vec<PathBuf> {
        lock(&self.owned_resources).clone()
    }

    /// Takes every owned path, leaving the list empty. A path is handed out
    /// at most once no matter how many times this is called.
    pub fn drain_resources(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *lock(&self.owned_resources))
    }

    /// Marks that a task is driving this job and will emit its terminal
    /// event. Until [`JobRegistry::retire`] runs, a released record keeps
    /// its id reserved.
    pub(crate) fn mark_running(&self) {
        self.task_running.store(true, Ordering::SeqCst);
    }

    fn task_running(&self) -> bool {
        self.task_running.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            status: self.status(),
            admitted_at: self.admitted_at,
            owned_resources: lock(&self.owned_resources).len(),
        }
    }
}

/// Proof of admission, handed to the executor that runs the job.
#[derive(Debug, Clone)]
pub struct AdmissionToken {
    record: Arc<JobRecord>,
}

impl AdmissionToken {
    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn record(&self) -> &Arc<JobRecord> {
        &self.record
    }
}

#[derive(Debug, Default)]
struct Slots {
    active: HashMap<String, Arc<JobRecord>>,
    /// Released jobs whose task has not emitted its terminal event yet.
    /// They hold their id but no capacity.
    retiring: HashMap<String, Arc<JobRecord>>,
}

impl Slots {
    fn remove_active(&mut self, record: &Arc<JobRecord>) -> bool {
        match self.active.get(record.id()) {
            Some(current) if Arc::ptr_eq(current, record) => {
                self.active.remove(record.id());
                if record.task_running() {
                    self.retiring
                        .insert(record.id().to_string(), Arc::clone(record));
                }
                true
            }
            _ => false,
        }
    }
}

/// The set of active jobs, bounded by a fixed capacity.
#[derive(Debug)]
pub struct JobRegistry {
    capacity: usize,
    slots: Mutex<Slots>,
}

impl JobRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.slots).active.contains_key(id)
    }

    /// Whether `id` belongs to a released job still finishing up.
    pub fn is_retiring(&self, id: &str) -> bool {
        lock(&self.slots).retiring.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<JobRecord>> {
        lock(&self.slots).active.get(id).cloned()
    }

    /// Admits a new job with status `pending`.
    ///
    /// The capacity check and the insert happen under one lock, so concurrent
    /// admissions can never push the registry past its capacity. An id is
    /// also rejected as a duplicate while its previous job is retiring.
    pub fn admit(&self, id: &str) -> Result<AdmissionToken, GenerationError> {
        if let Err(e) = validate_job_id(id) {
            ADMISSIONS_REJECTED.with_label_values(&["invalid_id"]).inc();
            return Err(e);
        }

        let mut slots = lock(&self.slots);

        if slots.active.contains_key(id) || slots.retiring.contains_key(id) {
            ADMISSIONS_REJECTED.with_label_values(&["duplicate"]).inc();
            return Err(ConcurrencyError::DuplicateJob {
                job_id: id.to_string(),
            }
            .into());
        }

        if slots.active.len() >= self.capacity {
            ADMISSIONS_REJECTED.with_label_values(&["capacity"]).inc();
            return Err(ConcurrencyError::CapacityReached {
                capacity: self.capacity,
            }
            .into());
        }

        let record = Arc::new(JobRecord::new(id.to_string()));
        slots.active.insert(id.to_string(), Arc::clone(&record));
        JOBS_ADMITTED.inc();
        ACTIVE_JOBS.inc();
        debug!(job_id = id, active = slots.active.len(), "Job admitted");

        Ok(AdmissionToken { record })
    }

    /// Removes a job by id. Calling it again for the same id is a no-op.
    pub fn release(&self, id: &str) -> Option<Arc<JobRecord>> {
        let mut slots = lock(&self.slots);
        let record = slots.active.get(id).cloned()?;
        slots.remove_active(&record);
        ACTIVE_JOBS.dec();
        debug!(job_id = id, "Job released");
        Some(record)
    }

    /// Removes `record` only if it is still the one registered under its id,
    /// so a late release never evicts a newer job that reused the id.
    ///
    /// The slot is freed immediately. If a task is still driving the job the
    /// id stays reserved until [`retire`](Self::retire).
    pub fn release_record(&self, record: &Arc<JobRecord>) -> bool {
        let released = lock(&self.slots).remove_active(record);
        if released {
            ACTIVE_JOBS.dec();
            debug!(job_id = record.id(), "Job released");
        }
        released
    }

    /// Called once the job's task has emitted its terminal event; frees the
    /// id for reuse.
    pub fn retire(&self, record: &Arc<JobRecord>) {
        let mut slots = lock(&self.slots);
        record.task_running.store(false, Ordering::SeqCst);
        if let Some(current) = slots.retiring.get(record.id()) {
            if Arc::ptr_eq(current, record) {
                slots.retiring.remove(record.id());
                debug!(job_id = record.id(), "Job retired");
            }
        }
    }

    /// Every active record.
    pub fn records(&self) -> Vec<Arc<JobRecord>> {
        lock(&self.slots).active.values().cloned().collect()
    }

    pub fn snapshots(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> =
            self.records().iter().map(|r| r.snapshot()).collect();
        snapshots.sort_by(|a, b| a.admitted_at.cmp(&b.admitted_at));
        snapshots
    }
}

/// Job ids end up in file names, so only a conservative charset is allowed.
pub fn validate_job_id(id: &str) -> Result<(), GenerationError> {
    if id.is_empty() {
        return Err(GenerationError::validation("Job id must not be empty"));
    }
    if id.len() > MAX_JOB_ID_LEN {
        return Err(GenerationError::validation(format!(
            "Job id exceeds {} characters",
            MAX_JOB_ID_LEN
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(GenerationError::validation(format!(
            "Job id contains invalid characters: {}",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_admit_until_capacity() {
        let registry = JobRegistry::new(2);
        assert_ok!(registry.admit("a"));
        assert_ok!(registry.admit("b"));

        let err = assert_err!(registry.admit("c"));
        assert_eq!(
            err,
            GenerationError::Concurrency(ConcurrencyError::CapacityReached { capacity: 2 })
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_admit_rejects_duplicate_active_id() {
        let registry = JobRegistry::new(4);
        assert_ok!(registry.admit("a"));

        let err = assert_err!(registry.admit("a"));
        assert!(matches!(
            err,
            GenerationError::Concurrency(ConcurrencyError::DuplicateJob { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_admit_rejects_invalid_ids() {
        let registry = JobRegistry::new(4);
        assert!(matches!(registry.admit(""), Err(GenerationError::Validation(_))));
        assert!(matches!(
            registry.admit("../etc"),
            Err(GenerationError::Validation(_))
        ));
        assert!(matches!(
            registry.admit(&"x".repeat(MAX_JOB_ID_LEN + 1)),
            Err(GenerationError::Validation(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_new_record_is_pending() {
        let registry = JobRegistry::new(1);
        let token = registry.admit("job_1").unwrap();
        assert_eq!(token.id(), "job_1");
        assert_eq!(token.record().status(), JobStatus::Pending);
        assert!(!token.record().is_cancelled());
        assert!(token.record().owned_resources().is_empty());
    }

    #[test]
    fn test_release_is_idempotent_and_frees_capacity() {
        let registry = JobRegistry::new(1);
        registry.admit("a").unwrap();

        assert!(registry.release("a").is_some());
        assert!(registry.release("a").is_none());
        assert!(registry.admit("b").is_ok());
    }

    #[test]
    fn test_release_record_ignores_reused_id() {
        let registry = JobRegistry::new(2);
        let old = registry.admit("a").unwrap();
        registry.release("a");
        let new = registry.admit("a").unwrap();

        assert!(!registry.release_record(old.record()));
        assert!(registry.contains("a"));
        assert!(registry.release_record(new.record()));
        assert!(!registry.contains("a"));
    }

    #[test]
    fn test_released_running_job_reserves_id_until_retired() {
        let registry = JobRegistry::new(1);
        let token = registry.admit("a").unwrap();
        let record = token.record();
        record.mark_running();

        assert!(registry.release_record(record));
        assert!(!registry.contains("a"));
        assert!(registry.is_retiring("a"));

        // Capacity is free, the id is not.
        let err = assert_err!(registry.admit("a"));
        assert!(matches!(
            err,
            GenerationError::Concurrency(ConcurrencyError::DuplicateJob { .. })
        ));
        let other = assert_ok!(registry.admit("b"));
        registry.release_record(other.record());

        registry.retire(record);
        assert!(!registry.is_retiring("a"));
        assert_ok!(registry.admit("a"));
    }

    #[test]
    fn test_retire_before_release_does_not_reserve() {
        let registry = JobRegistry::new(1);
        let token = registry.admit("a").unwrap();
        token.record().mark_running();

        registry.retire(token.record());
        assert!(registry.release_record(token.record()));
        assert!(!registry.is_retiring("a"));
        assert_ok!(registry.admit("a"));
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let registry = JobRegistry::new(1);
        let token = registry.admit("a").unwrap();
        let record = token.record();

        assert!(record.transition(JobStatus::Processing));
        record.cancel();
        assert_eq!(record.status(), JobStatus::Cancelled);
        assert!(record.is_cancelled());

        assert!(!record.transition(JobStatus::Completed));
        assert!(!record.transition(JobStatus::Failed));
        assert_eq!(record.status(), JobStatus::Cancelled);
    }

    #[test]
    fn test_drain_resources_hands_out_paths_once() {
        let registry = JobRegistry::new(1);
        let token = registry.admit("a").unwrap();
        let record = token.record();

        record.register_resource(PathBuf::from("/tmp/a-audio.wav"));
        record.register_resource(PathBuf::from("/tmp/a-image.jpg"));
        assert_eq!(record.snapshot().owned_resources, 2);

        let drained = record.drain_resources();
        assert_eq!(
            drained,
            vec![
                PathBuf::from("/tmp/a-audio.wav"),
                PathBuf::from("/tmp/a-image.jpg")
            ]
        );
        assert!(record.drain_resources().is_empty());
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_capacity() {
        let registry = Arc::new(JobRegistry::new(3));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.admit(&format!("job-{}", i)).is_ok())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 3);
        assert_eq!(registry.len(), 3);
    }
}
