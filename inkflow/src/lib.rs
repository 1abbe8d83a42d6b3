pub mod editor;
mod error;
pub mod event;
pub mod feedback;
pub mod language;
pub mod metrics;
pub mod recognition;
pub mod session;
pub mod settings;
pub mod stroke;
#[cfg(test)]
mod testing;
mod utils;

pub use editor::{EditHistory, Selection, TextBuffer, TextFieldValue};
pub use error::AppError;
pub use event::SessionEvent;
pub use feedback::UserFeedback;
pub use language::{CatalogError, LanguageDirectory, LanguageOption, LocaleDisplay};
pub use metrics::PerformanceReport;
pub use recognition::{
    GatewayStatus, ModelId, RecognitionCandidate, RecognitionError, Recognizer,
    RecognizerService, reorder,
};
pub use session::{Session, SessionServices};
pub use settings::{SessionSettings, SettingsError};
pub use stroke::{Ink, Point, PointerEvent, RenderPath, Stroke, StrokeCapture};

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| AppError::LoggingInit(err.to_string()))
}
