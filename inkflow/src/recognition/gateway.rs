use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::{GatewayEvent, ModelId, Recognizer, RecognizerService};
use crate::event::{EventSender, TaskSpawner};
use crate::metrics::RuntimeMetrics;
use crate::stroke::{Ink, Stroke};
use crate::utils::elapsed_ms;

pub const DOWNLOAD_ERROR_STATUS: &str = "Error downloading";
pub const RECOGNIZER_ERROR_STATUS: &str = "Error loading recognizer";

/// Upper bound on suggestions returned per recognition.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Initializing,
    Switching,
    Downloading,
    Ready,
    Error(String),
}

impl GatewayStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => f.write_str("Initializing..."),
            Self::Switching => f.write_str("Switching..."),
            Self::Downloading => f.write_str("Downloading..."),
            Self::Ready => f.write_str("Ready"),
            Self::Error(message) => f.write_str(message),
        }
    }
}

/// What the owner has to do after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    None,
    /// A new recognizer is live; download state changed, so the catalog is out of date.
    Installed,
    /// Top-ranked candidate texts, most likely first.
    Candidates(Vec<String>),
}

/// Owns the single live recognizer and the language it is bound to.
///
/// Download and recognition run as spawned tasks that report back through the session
/// event channel. Each language switch bumps `generation`; results carrying an older
/// generation are ignored for downloads, and for recognition when
/// `discard_stale_results` is set.
pub struct RecognitionGateway {
    service: Arc<dyn RecognizerService>,
    recognizer: Option<Arc<dyn Recognizer>>,
    language_tag: String,
    status: GatewayStatus,
    generation: u64,
    in_flight: usize,
    max_candidates: usize,
    discard_stale_results: bool,
    metrics: RuntimeMetrics,
    event_tx: EventSender,
    spawner: TaskSpawner,
}

impl RecognitionGateway {
    pub fn new(
        service: Arc<dyn RecognizerService>,
        event_tx: EventSender,
        spawner: TaskSpawner,
        max_candidates: usize,
        discard_stale_results: bool,
    ) -> Self {
        Self {
            service,
            recognizer: None,
            language_tag: String::new(),
            status: GatewayStatus::Initializing,
            generation: 0,
            in_flight: 0,
            max_candidates: max_candidates.clamp(1, MAX_CANDIDATES),
            discard_stale_results,
            metrics: RuntimeMetrics::new(),
            event_tx,
            spawner,
        }
    }

    pub fn status(&self) -> &GatewayStatus {
        &self.status
    }

    pub fn language_tag(&self) -> &str {
        &self.language_tag
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// No background task of this gateway is still pending.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }

    /// Starts loading the model for `language_tag`.
    ///
    /// Returns `false` without touching any state when the tag has no model or there is
    /// no runtime to load it on.
    pub fn switch_language(&mut self, language_tag: &str) -> bool {
        let Some(model) = self.service.resolve_model(language_tag) else {
            debug!(language_tag, "no recognition model for language tag; switch abandoned");
            return false;
        };
        if !self.spawner.is_available() {
            warn!(language_tag, "cannot load recognition model without a runtime");
            return false;
        }

        self.release_recognizer();
        self.generation += 1;
        self.language_tag = language_tag.to_string();
        self.status = GatewayStatus::Switching;
        info!(
            language_tag,
            generation = self.generation,
            "switching recognition language"
        );

        self.spawn_download_state_check(model.clone());
        self.spawn_download(model);
        true
    }

    /// Submits every committed stroke as one ink. No-op without a recognizer or strokes.
    pub fn recognize(&mut self, strokes: &[Stroke]) -> bool {
        let Some(recognizer) = self.recognizer.as_ref().map(Arc::clone) else {
            debug!("recognition skipped: no recognizer installed");
            return false;
        };
        if strokes.is_empty() {
            return false;
        }

        let ink = Ink::new(strokes.to_vec());
        let generation = self.generation;
        let event_tx = self.event_tx.clone();
        debug!(
            strokes = ink.len(),
            points = ink.point_count(),
            generation,
            "submitting ink for recognition"
        );

        let spawned = self.spawner.spawn(async move {
            let started = Instant::now();
            let event = match recognizer.recognize(&ink).await {
                Ok(candidates) => GatewayEvent::Recognized {
                    generation,
                    candidates,
                    elapsed_ms: elapsed_ms(started),
                },
                Err(error) => GatewayEvent::RecognitionFailed { generation, error },
            };
            let _ = event_tx.send(event.into());
        });
        if spawned {
            self.in_flight += 1;
        }
        spawned
    }

    /// Applies the result of a background task. Must run on the owning thread.
    pub fn handle_event(&mut self, event: GatewayEvent) -> GatewayOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        let current = event.generation() == self.generation;

        match event {
            GatewayEvent::DownloadState { result, .. } => {
                if !current {
                    return GatewayOutcome::None;
                }
                match result {
                    Ok(downloaded) if self.status == GatewayStatus::Switching => {
                        self.status = if downloaded {
                            GatewayStatus::Ready
                        } else {
                            GatewayStatus::Downloading
                        };
                        debug!(
                            language_tag = self.language_tag.as_str(),
                            downloaded, "model download state resolved"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(
                            language_tag = self.language_tag.as_str(),
                            "failed to query model download state: {err}"
                        );
                    }
                }
                GatewayOutcome::None
            }
            GatewayEvent::DownloadFinished {
                generation,
                model,
                elapsed_ms,
            } => {
                if !current {
                    debug!(
                        generation,
                        model = %model,
                        "ignoring download completion from superseded language switch"
                    );
                    return GatewayOutcome::None;
                }
                self.metrics.record_download(elapsed_ms);
                self.install_recognizer(&model)
            }
            GatewayEvent::DownloadFailed { generation, error } => {
                if !current {
                    debug!(generation, "ignoring download failure from superseded language switch");
                    return GatewayOutcome::None;
                }
                error!(
                    language_tag = self.language_tag.as_str(),
                    "model download failed: {error}"
                );
                self.status = GatewayStatus::Error(DOWNLOAD_ERROR_STATUS.to_string());
                GatewayOutcome::None
            }
            GatewayEvent::Recognized {
                generation,
                candidates,
                elapsed_ms,
            } => {
                if !current && self.discard_stale_results {
                    self.metrics.record_stale_drop();
                    debug!(
                        generation,
                        current_generation = self.generation,
                        "dropping recognition result from previous language"
                    );
                    return GatewayOutcome::None;
                }
                self.metrics.record_recognition(elapsed_ms);
                if candidates.is_empty() {
                    debug!("recognizer returned no candidates");
                    return GatewayOutcome::None;
                }
                let texts: Vec<String> = candidates
                    .into_iter()
                    .take(self.max_candidates)
                    .map(|candidate| candidate.text)
                    .collect();
                debug!(candidates = texts.len(), elapsed_ms, "recognition completed");
                GatewayOutcome::Candidates(texts)
            }
            GatewayEvent::RecognitionFailed { generation, error } => {
                if !current && self.discard_stale_results {
                    self.metrics.record_stale_drop();
                    return GatewayOutcome::None;
                }
                self.metrics.record_recognition_failure();
                warn!(generation, "recognition failed: {error}");
                GatewayOutcome::None
            }
        }
    }

    fn install_recognizer(&mut self, model: &ModelId) -> GatewayOutcome {
        match self.service.create_recognizer(model) {
            Ok(recognizer) => {
                self.release_recognizer();
                self.recognizer = Some(recognizer);
                self.status = GatewayStatus::Ready;
                info!(
                    language_tag = self.language_tag.as_str(),
                    generation = self.generation,
                    "recognizer installed"
                );
                GatewayOutcome::Installed
            }
            Err(err) => {
                error!(model = %model, "failed to create recognizer: {err}");
                self.status = GatewayStatus::Error(RECOGNIZER_ERROR_STATUS.to_string());
                GatewayOutcome::None
            }
        }
    }

    fn spawn_download_state_check(&mut self, model: ModelId) {
        let service = Arc::clone(&self.service);
        let event_tx = self.event_tx.clone();
        let generation = self.generation;

        if self.spawner.spawn(async move {
            let result = service.is_downloaded(&model).await;
            let _ = event_tx.send(GatewayEvent::DownloadState { generation, result }.into());
        }) {
            self.in_flight += 1;
        }
    }

    fn spawn_download(&mut self, model: ModelId) {
        let service = Arc::clone(&self.service);
        let event_tx = self.event_tx.clone();
        let generation = self.generation;

        let spawned = self.spawner.spawn(async move {
            let started = Instant::now();
            let event = match service.download(&model).await {
                Ok(()) => GatewayEvent::DownloadFinished {
                    generation,
                    model,
                    elapsed_ms: elapsed_ms(started),
                },
                Err(error) => GatewayEvent::DownloadFailed { generation, error },
            };
            let _ = event_tx.send(event.into());
        });
        if spawned {
            self.in_flight += 1;
        }
    }

    fn release_recognizer(&mut self) {
        if let Some(recognizer) = self.recognizer.take() {
            recognizer.release();
            debug!(
                language_tag = self.language_tag.as_str(),
                "released recognizer"
            );
        }
    }
}

impl Drop for RecognitionGateway {
    fn drop(&mut self) {
        self.release_recognizer();
    }
}
