use phrasereel_core::{Config, ProgressStore, SanitizedConfig, VideoGenerator};

/// Shared application state
pub struct AppState {
    config: Config,
    generator: VideoGenerator,
    progress: ProgressStore,
}

impl AppState {
    pub fn new(config: Config, generator: VideoGenerator, progress: ProgressStore) -> Self {
        Self {
            config,
            generator,
            progress,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn generator(&self) -> &VideoGenerator {
        &self.generator
    }

    /// Latest progress per job, fed by the generator's progress callback.
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }
}
