//! Testing utilities and mock implementations of the stage collaborators.
//!
//! The mocks are deterministic and write real files, so tests can observe
//! what cleanup deletes and what survives.
//!
//! # Example
//!
//! ```rust,ignore
//! use phrasereel_core::testing::{fixtures, MockStages};
//! use phrasereel_core::VideoGenerator;
//!
//! let mocks = MockStages::new();
//! mocks.image.set_next_error(StageError::other("no images")).await;
//!
//! let generator = VideoGenerator::new(fixtures::generator_config(dir.path()), mocks.stage_set())?;
//! let recorder = fixtures::ProgressRecorder::new();
//! let result = generator.generate("job-1", recorder.callback()).await;
//! ```

mod control;
mod mock_stages;

pub use control::MockControl;
pub use mock_stages::{
    MockContentGenerator, MockImageGenerator, MockNotifier, MockStages, MockVideoRenderer,
    MockVoiceGenerator, RecordedRender,
};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use crate::generator::{GeneratorConfig, ProgressCallback, ProgressEvent};
    use crate::stages::ContentResult;

    /// The phrase pair returned by [`MockContentGenerator`](super::MockContentGenerator)
    /// unless configured otherwise.
    pub fn content() -> ContentResult {
        ContentResult::new(
            "Helping others brings joy",
            "人を助けることは喜びをもたらします",
        )
    }

    /// Generator config with output and temp directories under `root`.
    pub fn generator_config(root: &Path) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_output_dir(root.join("output/videos"))
            .with_temp_dir(root.join("temp"))
    }

    /// Collects every progress event it receives.
    #[derive(Debug, Clone, Default)]
    pub struct ProgressRecorder {
        events: Arc<Mutex<Vec<(String, ProgressEvent)>>>,
    }

    impl ProgressRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn callback(&self) -> ProgressCallback {
            let events = Arc::clone(&self.events);
            Arc::new(move |id: &str, event: &ProgressEvent| {
                events
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((id.to_string(), event.clone()));
            })
        }

        /// Events received for `id`, in order.
        pub fn events_for(&self, id: &str) -> Vec<ProgressEvent> {
            self.events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .filter(|(job, _)| job == id)
                .map(|(_, event)| event.clone())
                .collect()
        }

        /// Progress values received for `id`, in order.
        pub fn progress_for(&self, id: &str) -> Vec<u8> {
            self.events_for(id).iter().map(|e| e.progress).collect()
        }

        pub fn last_for(&self, id: &str) -> Option<ProgressEvent> {
            self.events_for(id).pop()
        }
    }
}
