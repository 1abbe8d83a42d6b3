pub mod gateway;
pub mod reorder;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::stroke::Ink;

pub use gateway::{GatewayOutcome, GatewayStatus, RecognitionGateway};
pub use reorder::reorder;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("failed to query model download state: {0}")]
    ModelState(String),
    #[error("failed to download model: {0}")]
    Download(String),
    #[error("failed to create recognizer: {0}")]
    CreateRecognizer(String),
    #[error("recognition request failed: {0}")]
    Recognize(String),
}

/// Identifier of a downloadable recognition model, resolved from a language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(language_tag: impl Into<String>) -> Self {
        Self(language_tag.into())
    }

    pub fn language_tag(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ranked recognizer result. Lists arrive most likely first.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionCandidate {
    pub text: String,
    pub score: Option<f32>,
}

impl RecognitionCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
        }
    }
}

/// Model management side of the on-device recognizer.
#[async_trait]
pub trait RecognizerService: Send + Sync {
    /// `None` when no model exists for the tag.
    fn resolve_model(&self, language_tag: &str) -> Option<ModelId>;

    async fn is_downloaded(&self, model: &ModelId) -> Result<bool, RecognitionError>;

    /// Idempotent: succeeds immediately for models already on the device.
    async fn download(&self, model: &ModelId) -> Result<(), RecognitionError>;

    fn create_recognizer(&self, model: &ModelId) -> Result<Arc<dyn Recognizer>, RecognitionError>;
}

/// A live recognizer bound to one model. Holds native resources until released.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, ink: &Ink) -> Result<Vec<RecognitionCandidate>, RecognitionError>;

    fn release(&self);
}

/// Results of the gateway's background tasks, tagged with the switch generation
/// they were issued under.
#[derive(Debug)]
pub enum GatewayEvent {
    DownloadState {
        generation: u64,
        result: Result<bool, RecognitionError>,
    },
    DownloadFinished {
        generation: u64,
        model: ModelId,
        elapsed_ms: u64,
    },
    DownloadFailed {
        generation: u64,
        error: RecognitionError,
    },
    Recognized {
        generation: u64,
        candidates: Vec<RecognitionCandidate>,
        elapsed_ms: u64,
    },
    RecognitionFailed {
        generation: u64,
        error: RecognitionError,
    },
}

impl GatewayEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::DownloadState { generation, .. }
            | Self::DownloadFinished { generation, .. }
            | Self::DownloadFailed { generation, .. }
            | Self::Recognized { generation, .. }
            | Self::RecognitionFailed { generation, .. } => *generation,
        }
    }
}
