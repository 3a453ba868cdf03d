//! Behaviour switches shared by the mock stages.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::stages::StageError;

/// Controls how a mock stage call behaves.
///
/// A call goes through these steps in order: count the call and claim the
/// queued error, panic if asked to, sleep for the configured delay, wait on
/// the hold gate, cancel the job if asked to, then fail with the claimed
/// error if there was one. Delay and hold return [`StageError::Cancelled`]
/// as soon as the job is cancelled, unless cancellation is being ignored.
///
/// A queued error belongs to the call that claimed it, so a call cut short
/// by cancellation never leaves it behind for the next job.
#[derive(Debug, Default)]
pub struct MockControl {
    next_error: RwLock<Option<StageError>>,
    delay_ms: AtomicU64,
    gate: Mutex<Option<CancellationToken>>,
    ignore_cancellation: AtomicBool,
    panic_next: AtomicBool,
    cancel_next: AtomicBool,
    calls: AtomicUsize,
}

impl MockControl {
    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: StageError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Set the simulated duration of each call.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Block subsequent calls until [`release`](Self::release) is called.
    pub fn hold(&self) {
        *self.gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(CancellationToken::new());
    }

    /// Let held calls (and future ones) proceed.
    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap_or_else(|e| e.into_inner()).take() {
            gate.cancel();
        }
    }

    /// Keep running after the job is cancelled, like a collaborator that
    /// does not watch the token.
    pub fn set_ignore_cancellation(&self, ignore: bool) {
        self.ignore_cancellation.store(ignore, Ordering::SeqCst);
    }

    /// Make the next call panic.
    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    /// Make the next call cancel its own job and then finish normally, with
    /// the queued error or success. Models a cancel that arrives while the
    /// stage is settling.
    pub fn cancel_next(&self) {
        self.cancel_next.store(true, Ordering::SeqCst);
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls have been made.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Runs the configured behaviour at the start of a stage call.
    pub(crate) async fn begin(&self, cancel: &CancellationToken) -> Result<(), StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let error = self.next_error.write().await.take();

        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("mock stage panicked");
        }

        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            self.wait(tokio::time::sleep(Duration::from_millis(delay_ms)), cancel)
                .await?;
        }

        let gate = self
            .gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(gate) = gate {
            self.wait(gate.cancelled(), cancel).await?;
        }

        if self.cancel_next.swap(false, Ordering::SeqCst) {
            cancel.cancel();
        }

        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn wait<F>(&self, fut: F, cancel: &CancellationToken) -> Result<(), StageError>
    where
        F: Future<Output = ()>,
    {
        if self.ignore_cancellation.load(Ordering::SeqCst) {
            fut.await;
            return Ok(());
        }
        tokio::select! {
            _ = fut => Ok(()),
            _ = cancel.cancelled() => Err(StageError::Cancelled),
        }
    }
}
