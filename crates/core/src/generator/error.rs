//! Error taxonomy for video generation.
//!
//! Every collaborator failure is caught at its stage boundary and re-wrapped
//! into the variant matching that stage, so callers only ever see one of the
//! kinds below. Each kind carries a stable machine-readable code.

use thiserror::Error;

/// Why an admission was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    /// All slots are taken by non-terminal jobs.
    #[error("Maximum number of concurrent jobs reached ({capacity})")]
    CapacityReached { capacity: usize },

    /// A job with the same id is still active.
    #[error("Job {job_id} is already active")]
    DuplicateJob { job_id: String },
}

/// Errors surfaced by the video generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Failed to generate content: {0}")]
    Content(String),

    #[error("Failed to generate voice: {0}")]
    Voice(String),

    #[error("Failed to generate image: {0}")]
    Image(String),

    #[error("Failed to render video: {0}")]
    Render(String),

    #[error("Failed to send notification: {0}")]
    Notification(String),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    #[error("{0}")]
    Resource(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(String),
}

impl GenerationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Content(_) => "CONTENT_GENERATION_ERROR",
            Self::Voice(_) => "VOICE_GENERATION_ERROR",
            Self::Image(_) => "IMAGE_GENERATION_ERROR",
            Self::Render(_) => "VIDEO_RENDER_ERROR",
            Self::Notification(_) => "NOTIFICATION_ERROR",
            Self::Concurrency(_) => "CONCURRENCY_ERROR",
            Self::Resource(_) => "RESOURCE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Human-readable kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Content(_) => "ContentGenerationError",
            Self::Voice(_) => "VoiceGenerationError",
            Self::Image(_) => "ImageGenerationError",
            Self::Render(_) => "VideoRenderError",
            Self::Notification(_) => "NotificationError",
            Self::Concurrency(_) => "ConcurrencyError",
            Self::Resource(_) => "ResourceError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Validation(_) => "ValidationError",
        }
    }

    /// Message shown in the terminal progress event: `Kind (CODE): message`.
    pub fn describe(&self) -> String {
        format!("{} ({}): {}", self.kind(), self.code(), self)
    }

    /// Whether the error came out of one of the five pipeline stages.
    pub fn is_stage_error(&self) -> bool {
        matches!(
            self,
            Self::Content(_)
                | Self::Voice(_)
                | Self::Image(_)
                | Self::Render(_)
                | Self::Notification(_)
        )
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            GenerationError::Content("x".into()).code(),
            "CONTENT_GENERATION_ERROR"
        );
        assert_eq!(GenerationError::Render("x".into()).code(), "VIDEO_RENDER_ERROR");
        assert_eq!(
            GenerationError::from(ConcurrencyError::CapacityReached { capacity: 3 }).code(),
            "CONCURRENCY_ERROR"
        );
        assert_eq!(GenerationError::resource("x").code(), "RESOURCE_ERROR");
        assert_eq!(GenerationError::configuration("x").code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_describe_includes_kind_code_and_context() {
        let err = GenerationError::Image("No images found".to_string());
        assert_eq!(
            err.describe(),
            "ImageGenerationError (IMAGE_GENERATION_ERROR): Failed to generate image: No images found"
        );
    }

    #[test]
    fn test_concurrency_variants_display() {
        let err: GenerationError = ConcurrencyError::DuplicateJob {
            job_id: "job-1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Job job-1 is already active");
        assert!(!err.is_stage_error());

        let err: GenerationError = ConcurrencyError::CapacityReached { capacity: 2 }.into();
        assert!(err.to_string().contains("(2)"));
    }

    #[test]
    fn test_stage_errors() {
        assert!(GenerationError::Voice("x".into()).is_stage_error());
        assert!(GenerationError::Notification("x".into()).is_stage_error());
        assert!(!GenerationError::validation("x").is_stage_error());
    }
}
