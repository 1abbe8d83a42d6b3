use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

use crate::editor::{TextBuffer, TextFieldValue};
use crate::event::{self, EventReceiver, SessionEvent, TaskSpawner};
use crate::feedback::UserFeedback;
use crate::language::{LanguageCatalog, LanguageDirectory, LanguageOption, LocaleDisplay};
use crate::metrics::PerformanceReport;
use crate::recognition::{
    GatewayOutcome, GatewayStatus, RecognitionGateway, RecognizerService, reorder,
};
use crate::settings::SessionSettings;
use crate::stroke::{PointerEvent, RenderPath, Stroke, StrokeCapture};

pub const COPIED_MESSAGE: &str = "Copied!";

/// Platform services a session talks to.
pub struct SessionServices {
    pub recognizer: Arc<dyn RecognizerService>,
    pub directory: Arc<dyn LanguageDirectory>,
    pub locale: Arc<dyn LocaleDisplay>,
    pub feedback: Arc<dyn UserFeedback>,
}

/// One handwriting input surface: canvas, suggestions, text buffer and language state.
///
/// All mutation goes through `&mut self`. Background work reports back as
/// [`SessionEvent`]s which must be fed to [`Session::handle_event`], or drained with
/// [`Session::settle`] / [`Session::pump_pending`].
///
/// Background work runs on a tokio runtime. [`Session::new`] picks up the runtime of the
/// calling context; use [`Session::with_runtime`] when constructing from plain threads.
/// Without a runtime, language loading and recognition are no-ops.
pub struct Session {
    settings: SessionSettings,
    buffer: TextBuffer,
    capture: StrokeCapture,
    strokes: Vec<Stroke>,
    paths: Vec<RenderPath>,
    suggestions: Vec<String>,
    catalog: LanguageCatalog,
    gateway: RecognitionGateway,
    selected_tag: String,
    selected_label: String,
    feedback: Arc<dyn UserFeedback>,
    event_rx: EventReceiver,
}

impl Session {
    pub fn new(services: SessionServices, settings: SessionSettings) -> Self {
        Self::with_spawner(services, settings, TaskSpawner::current())
    }

    /// Runs background work on `runtime` regardless of the calling context.
    pub fn with_runtime(
        services: SessionServices,
        settings: SessionSettings,
        runtime: Handle,
    ) -> Self {
        Self::with_spawner(services, settings, TaskSpawner::new(runtime))
    }

    fn with_spawner(
        services: SessionServices,
        settings: SessionSettings,
        spawner: TaskSpawner,
    ) -> Self {
        let (event_tx, event_rx) = event::channel();
        let catalog = LanguageCatalog::new(
            services.directory,
            services.locale,
            settings.display_locale.clone(),
            event_tx.clone(),
            spawner.clone(),
        );
        let gateway = RecognitionGateway::new(
            services.recognizer,
            event_tx,
            spawner,
            settings.max_suggestions,
            settings.discard_stale_results,
        );
        let selected_tag = settings.language_tag.clone();
        let selected_label = catalog.label_for(&selected_tag);

        Self {
            buffer: TextBuffer::new(settings.undo_capacity),
            capture: StrokeCapture::new(),
            strokes: Vec::new(),
            paths: Vec::new(),
            suggestions: Vec::new(),
            catalog,
            gateway,
            selected_tag,
            selected_label,
            feedback: services.feedback,
            event_rx,
            settings,
        }
    }

    /// Lists languages and begins loading the configured one.
    pub fn start(&mut self) {
        info!(language_tag = self.selected_tag.as_str(), "starting handwriting session");
        self.catalog.refresh();
        if !self.gateway.switch_language(&self.selected_tag) {
            debug!(
                language_tag = self.selected_tag.as_str(),
                "configured language has no recognition model"
            );
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    // --- canvas ---

    /// Feeds one pointer event. Returns `true` when it completed a stroke.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        match self.capture.handle(event) {
            Some(completed) => {
                self.add_stroke(completed.stroke, completed.path);
                true
            }
            None => false,
        }
    }

    /// Commits a finished stroke and requests recognition of the whole canvas.
    pub fn add_stroke(&mut self, stroke: Stroke, path: RenderPath) {
        self.strokes.push(stroke);
        self.paths.push(path);
        self.gateway.recognize(&self.strokes);
    }

    pub fn clear_canvas(&mut self) {
        self.capture.cancel();
        self.strokes.clear();
        self.paths.clear();
        self.suggestions.clear();
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn paths(&self) -> &[RenderPath] {
        &self.paths
    }

    /// The curve of the gesture still being drawn.
    pub fn current_path(&self) -> Option<&RenderPath> {
        self.capture.current_path()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Inserts suggestion `index` plus the configured suffix, then clears the canvas.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        let Some(suggestion) = self.suggestions.get(index).cloned() else {
            return false;
        };
        let insert = format!("{suggestion}{}", self.settings.suggestion_suffix);
        self.buffer.insert_at_cursor(&insert);
        self.clear_canvas();
        true
    }

    // --- languages ---

    /// Clears the canvas and switches recognition to `tag`.
    ///
    /// Returns `false` when no model exists for `tag`; the previous language stays active.
    pub fn select_language(&mut self, tag: &str) -> bool {
        self.clear_canvas();
        if !self.gateway.switch_language(tag) {
            return false;
        }
        self.selected_tag = tag.to_string();
        self.selected_label = self.catalog.label_for(tag);
        true
    }

    pub fn selected_language_tag(&self) -> &str {
        &self.selected_tag
    }

    pub fn selected_language_label(&self) -> &str {
        &self.selected_label
    }

    pub fn languages(&self) -> &[LanguageOption] {
        self.catalog.options()
    }

    pub fn filter_languages(&self, query: &str) -> Vec<LanguageOption> {
        self.catalog.filter(query)
    }

    pub fn refresh_languages(&mut self) {
        self.catalog.refresh();
    }

    pub fn status(&self) -> &GatewayStatus {
        self.gateway.status()
    }

    pub fn status_text(&self) -> String {
        self.gateway.status().to_string()
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.gateway.metrics().report()
    }

    // --- text ---

    pub fn value(&self) -> &TextFieldValue {
        self.buffer.value()
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn can_undo(&self) -> bool {
        self.buffer.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.buffer.can_redo()
    }

    /// Direct edit from the text field.
    pub fn update_text(&mut self, value: TextFieldValue) -> bool {
        self.buffer.replace_all(value)
    }

    pub fn insert_at_cursor(&mut self, text: &str) {
        self.buffer.insert_at_cursor(text);
    }

    pub fn insert_newline(&mut self) {
        self.buffer.insert_at_cursor("\n");
    }

    pub fn backspace(&mut self) -> bool {
        self.buffer.backspace()
    }

    pub fn clear_text(&mut self) -> bool {
        self.buffer.clear_text()
    }

    pub fn undo(&mut self) -> bool {
        let applied = self.buffer.undo();
        debug!(applied, can_undo = self.buffer.can_undo(), "undo");
        applied
    }

    pub fn redo(&mut self) -> bool {
        let applied = self.buffer.redo();
        debug!(applied, can_redo = self.buffer.can_redo(), "redo");
        applied
    }

    /// Copies the text to the clipboard. Nothing happens when the text is empty.
    pub fn copy_to_clipboard(&self) -> bool {
        let text = self.buffer.text();
        if text.is_empty() {
            return false;
        }
        self.feedback.set_clipboard_text(text);
        self.feedback.notify_user(COPIED_MESSAGE);
        true
    }

    // --- events ---

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Gateway(event) => match self.gateway.handle_event(event) {
                GatewayOutcome::None => {}
                GatewayOutcome::Installed => {
                    self.catalog.refresh();
                }
                GatewayOutcome::Candidates(texts) => {
                    self.suggestions = reorder(texts);
                    debug!(suggestions = self.suggestions.len(), "suggestions updated");
                }
            },
            SessionEvent::Catalog(event) => {
                if self.catalog.handle_event(event) {
                    if let Some(option) = self.catalog.find(&self.selected_tag) {
                        self.selected_label = option.label.clone();
                    }
                }
            }
        }
    }

    /// Waits for the next background result without applying it.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.recv().await
    }

    /// Applies every result that has already arrived. Returns how many were applied.
    pub fn pump_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.gateway.is_idle() && self.catalog.is_idle()
    }

    /// Applies results until no background task is pending.
    pub async fn settle(&mut self) {
        while !self.is_idle() {
            match self.event_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::sync::Semaphore;

    use super::*;
    use crate::editor::Selection;
    use crate::testing::{FakeLocale, FakeRecognizerService, RecordingFeedback};

    struct Harness {
        session: Session,
        service: Arc<FakeRecognizerService>,
        feedback: Arc<RecordingFeedback>,
    }

    fn harness_with(service: FakeRecognizerService, settings: SessionSettings) -> Harness {
        let service = Arc::new(service);
        let feedback = Arc::new(RecordingFeedback::default());
        let services = SessionServices {
            recognizer: service.clone(),
            directory: Arc::new(service.directory()),
            locale: Arc::new(FakeLocale::standard()),
            feedback: feedback.clone(),
        };
        Harness {
            session: Session::new(services, settings),
            service,
            feedback,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeRecognizerService::new(), SessionSettings::default())
    }

    fn draw(session: &mut Session, x: f32) {
        session.pointer(PointerEvent::down(x, 0.0, 1));
        session.pointer(PointerEvent::moved(x + 4.0, 4.0, 2));
        assert!(session.pointer(PointerEvent::up(x + 8.0, 8.0, 3)));
    }

    async fn started() -> Harness {
        let mut harness = harness();
        harness.session.start();
        harness.session.settle().await;
        harness
    }

    #[tokio::test]
    async fn start_loads_configured_language_and_catalog() {
        let mut harness = harness();
        assert_eq!(harness.session.status_text(), "Initializing...");
        harness.session.start();
        assert_eq!(harness.session.status_text(), "Switching...");
        harness.session.settle().await;

        let session = &harness.session;
        assert_eq!(session.status_text(), "Ready");
        assert_eq!(session.selected_language_tag(), "en");
        assert_eq!(session.selected_language_label(), "English");
        assert_eq!(session.languages().len(), 5);
        assert!(session.languages()[0].is_downloaded);
        assert_eq!(session.languages()[0].tag, "en");
        assert_eq!(session.filter_languages("span")[0].label, "Spanish (español)");
    }

    #[tokio::test]
    async fn strokes_produce_reordered_suggestions() {
        let mut harness = started().await;
        draw(&mut harness.session, 0.0);
        draw(&mut harness.session, 20.0);
        harness.session.settle().await;

        assert_eq!(harness.session.strokes().len(), 2);
        assert_eq!(harness.session.paths().len(), 2);
        assert_eq!(harness.session.suggestions(), ["hallo", "hello", "hullo"]);
        assert_eq!(harness.service.last_ink_strokes(), Some(2));
        assert_eq!(harness.session.performance_report().recognitions, 2);
    }

    #[tokio::test]
    async fn strokes_before_recognizer_is_ready_are_kept_but_not_recognized() {
        let mut harness = harness();
        draw(&mut harness.session, 0.0);
        harness.session.settle().await;

        assert_eq!(harness.session.strokes().len(), 1);
        assert!(harness.session.suggestions().is_empty());
        assert_eq!(harness.service.last_ink_strokes(), None);
    }

    #[tokio::test]
    async fn recognition_failure_keeps_previous_suggestions() {
        let mut harness = started().await;
        draw(&mut harness.session, 0.0);
        harness.session.settle().await;

        harness.service.fail_recognition(true);
        draw(&mut harness.session, 20.0);
        harness.session.settle().await;

        assert_eq!(harness.session.suggestions(), ["hallo", "hello", "hullo"]);
        assert_eq!(harness.session.performance_report().recognition_failures, 1);
    }

    #[tokio::test]
    async fn selecting_suggestion_inserts_with_suffix_and_clears_canvas() {
        let mut harness = started().await;
        harness
            .session
            .update_text(TextFieldValue::with_cursor("Say ", 4));
        draw(&mut harness.session, 0.0);
        harness.session.settle().await;

        assert!(!harness.session.select_suggestion(7));
        assert!(harness.session.select_suggestion(1));
        assert_eq!(harness.session.text(), "Say hello ");
        assert_eq!(harness.session.value().selection, Selection::collapsed(10));
        assert!(harness.session.strokes().is_empty());
        assert!(harness.session.paths().is_empty());
        assert!(harness.session.suggestions().is_empty());

        assert!(harness.session.undo());
        assert_eq!(harness.session.text(), "Say ");
    }

    #[tokio::test]
    async fn switching_language_clears_canvas_and_updates_label() {
        let mut harness = started().await;
        draw(&mut harness.session, 0.0);
        harness.session.settle().await;

        assert!(harness.session.select_language("de"));
        assert!(harness.session.strokes().is_empty());
        assert!(harness.session.paths().is_empty());
        assert!(harness.session.suggestions().is_empty());
        assert_eq!(harness.session.selected_language_label(), "German (Deutsch)");
        assert_eq!(harness.service.released.load(Ordering::SeqCst), 1);
        harness.session.settle().await;

        assert_eq!(harness.session.status_text(), "Ready");
        let german = harness
            .session
            .languages()
            .iter()
            .find(|option| option.tag == "de")
            .cloned()
            .unwrap();
        assert!(german.is_downloaded);
    }

    #[tokio::test]
    async fn unknown_language_keeps_current_selection() {
        let mut harness = started().await;
        draw(&mut harness.session, 0.0);

        assert!(!harness.session.select_language("tlh"));
        assert!(harness.session.strokes().is_empty());
        assert_eq!(harness.session.selected_language_tag(), "en");
        assert_eq!(harness.session.status_text(), "Ready");
        harness.session.settle().await;
    }

    #[tokio::test]
    async fn download_failure_shows_error_status() {
        let mut harness = harness_with(
            FakeRecognizerService::new().failing_download("ja"),
            SessionSettings::default(),
        );
        harness.session.start();
        harness.session.settle().await;

        assert!(harness.session.select_language("ja"));
        harness.session.settle().await;
        assert_eq!(harness.session.status_text(), "Error downloading");

        draw(&mut harness.session, 0.0);
        harness.session.settle().await;
        assert!(harness.session.suggestions().is_empty());
    }

    async fn stale_result_suggestions(discard: bool) -> Vec<String> {
        let gate = Arc::new(Semaphore::new(0));
        let settings = SessionSettings {
            discard_stale_results: discard,
            ..SessionSettings::default()
        };
        let mut harness = harness_with(FakeRecognizerService::new().gated(gate.clone()), settings);
        harness.session.start();
        harness.session.settle().await;

        draw(&mut harness.session, 0.0);
        assert!(harness.session.select_language("fr"));
        gate.add_permits(1);
        harness.session.settle().await;
        harness.session.suggestions().to_vec()
    }

    #[tokio::test]
    async fn stale_results_are_dropped_after_switch() {
        assert!(stale_result_suggestions(true).await.is_empty());
    }

    #[tokio::test]
    async fn stale_results_are_applied_when_discarding_is_off() {
        assert_eq!(
            stale_result_suggestions(false).await,
            vec!["hallo", "hello", "hullo"]
        );
    }

    #[tokio::test]
    async fn copy_sends_text_and_notifies() {
        let mut harness = harness();
        assert!(!harness.session.copy_to_clipboard());
        assert!(harness.feedback.notifications.lock().unwrap().is_empty());

        harness.session.insert_at_cursor("note");
        harness.session.insert_newline();
        assert!(harness.session.copy_to_clipboard());
        assert_eq!(*harness.feedback.clipboard.lock().unwrap(), vec!["note\n"]);
        assert_eq!(*harness.feedback.notifications.lock().unwrap(), vec![COPIED_MESSAGE]);
    }

    #[tokio::test]
    async fn edits_undo_back_to_session_start() {
        let mut harness = harness();
        let session = &mut harness.session;
        session.insert_at_cursor("ab");
        session.update_text(TextFieldValue::with_cursor("abc", 3));
        session.backspace();
        session.clear_text();

        while session.undo() {}
        assert_eq!(session.text(), "");
        assert!(!session.can_undo());
        assert!(session.can_redo());

        assert!(session.redo());
        assert_eq!(session.text(), "ab");
        session.insert_at_cursor("!");
        assert!(!session.can_redo());
    }

    #[tokio::test]
    async fn pump_pending_applies_arrived_events() {
        let mut harness = harness();
        harness.session.refresh_languages();
        assert_eq!(harness.session.pump_pending(), 0);

        let event = harness.session.next_event().await.unwrap();
        harness.session.handle_event(event);
        assert!(harness.session.is_idle());
        assert_eq!(harness.session.languages().len(), 5);
    }

    #[tokio::test]
    async fn undo_capacity_comes_from_settings() {
        let settings = SessionSettings {
            undo_capacity: 2,
            ..SessionSettings::default()
        };
        let mut harness = harness_with(FakeRecognizerService::new(), settings);
        for ch in ["a", "b", "c", "d"] {
            harness.session.insert_at_cursor(ch);
        }

        let mut undone = 0;
        while harness.session.undo() {
            undone += 1;
        }
        assert_eq!(undone, 2);
        assert_eq!(harness.session.text(), "ab");
    }

    #[tokio::test]
    async fn suggestions_never_exceed_three() {
        let settings = SessionSettings {
            max_suggestions: 10,
            ..SessionSettings::default()
        };
        let mut harness = harness_with(FakeRecognizerService::new(), settings);
        harness.session.start();
        harness.session.settle().await;

        draw(&mut harness.session, 0.0);
        harness.session.settle().await;
        assert_eq!(harness.session.suggestions().len(), 3);
    }

    #[test]
    fn session_without_runtime_degrades_to_no_ops() {
        let mut harness = harness();
        harness.session.start();
        assert_eq!(harness.session.status_text(), "Initializing...");
        assert!(harness.session.is_idle());

        assert!(!harness.session.select_language("de"));
        assert_eq!(harness.session.selected_language_tag(), "en");
        harness.session.refresh_languages();
        draw(&mut harness.session, 0.0);
        assert_eq!(harness.session.strokes().len(), 1);
        assert_eq!(harness.session.pump_pending(), 0);

        harness.session.insert_at_cursor("still editable");
        assert!(harness.session.undo());
    }

    #[test]
    fn session_runs_on_a_supplied_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let service = Arc::new(FakeRecognizerService::new());
        let services = SessionServices {
            recognizer: service.clone(),
            directory: Arc::new(service.directory()),
            locale: Arc::new(FakeLocale::standard()),
            feedback: Arc::new(RecordingFeedback::default()),
        };
        let mut session =
            Session::with_runtime(services, SessionSettings::default(), runtime.handle().clone());

        session.start();
        runtime.block_on(session.settle());
        assert_eq!(session.status_text(), "Ready");

        draw(&mut session, 0.0);
        runtime.block_on(session.settle());
        assert_eq!(session.suggestions(), ["hallo", "hello", "hullo"]);
    }
}
