pub mod config;
pub mod generator;
pub mod metrics;
pub mod progress;
pub mod stages;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use generator::{
    CleanupManager, CleanupReport, ConcurrencyError, GenerationError, GeneratorConfig,
    GeneratorStatus, JobRegistry, JobSnapshot, JobStatus, ProgressCallback, ProgressEvent, Stage,
    VideoGenerator,
};
pub use progress::{ProgressConfig, ProgressStore};
pub use stages::{
    ContentGenerator, ContentResult, ImageGenerator, NotificationPayload, Notifier, StageError,
    StageSet, VideoRenderer, VoiceGenerator,
};
