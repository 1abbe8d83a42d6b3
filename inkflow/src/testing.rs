//! In-memory stand-ins for the platform services.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::feedback::UserFeedback;
use crate::language::{CatalogError, LanguageDirectory, LocaleDisplay};
use crate::recognition::{
    ModelId, RecognitionCandidate, RecognitionError, Recognizer, RecognizerService,
};
use crate::stroke::Ink;

const KNOWN_TAGS: &[&str] = &["en", "de", "fr", "es", "ja", "en-x-gesture"];

pub struct FakeRecognizerService {
    known: HashSet<String>,
    downloaded: Arc<Mutex<HashSet<String>>>,
    failing_downloads: HashSet<String>,
    fail_recognition: Arc<AtomicBool>,
    last_ink_strokes: Arc<Mutex<Option<usize>>>,
    gate: Option<Arc<Semaphore>>,
    pub created: AtomicUsize,
    pub released: Arc<AtomicUsize>,
}

impl FakeRecognizerService {
    pub fn new() -> Self {
        Self {
            known: KNOWN_TAGS.iter().map(|tag| tag.to_string()).collect(),
            downloaded: Arc::new(Mutex::new(HashSet::new())),
            failing_downloads: HashSet::new(),
            fail_recognition: Arc::new(AtomicBool::new(false)),
            last_ink_strokes: Arc::new(Mutex::new(None)),
            gate: None,
            created: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_download(mut self, tag: &str) -> Self {
        self.failing_downloads.insert(tag.to_string());
        self
    }

    /// Recognition calls block until the semaphore hands out a permit.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fail_recognition(&self, fail: bool) {
        self.fail_recognition.store(fail, Ordering::SeqCst);
    }

    pub fn last_ink_strokes(&self) -> Option<usize> {
        *self.last_ink_strokes.lock().unwrap()
    }

    /// A directory that sees this service's download state.
    pub fn directory(&self) -> FakeDirectory {
        FakeDirectory {
            all: KNOWN_TAGS.iter().map(|tag| tag.to_string()).collect(),
            downloaded: Arc::clone(&self.downloaded),
            fail: false,
        }
    }
}

#[async_trait]
impl RecognizerService for FakeRecognizerService {
    fn resolve_model(&self, language_tag: &str) -> Option<ModelId> {
        self.known
            .contains(language_tag)
            .then(|| ModelId::new(language_tag))
    }

    async fn is_downloaded(&self, model: &ModelId) -> Result<bool, RecognitionError> {
        Ok(self.downloaded.lock().unwrap().contains(model.language_tag()))
    }

    async fn download(&self, model: &ModelId) -> Result<(), RecognitionError> {
        if self.failing_downloads.contains(model.language_tag()) {
            return Err(RecognitionError::Download("network unavailable".to_string()));
        }
        self.downloaded
            .lock()
            .unwrap()
            .insert(model.language_tag().to_string());
        Ok(())
    }

    fn create_recognizer(&self, model: &ModelId) -> Result<Arc<dyn Recognizer>, RecognitionError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeRecognizer {
            language_tag: model.language_tag().to_string(),
            released: Arc::clone(&self.released),
            fail: Arc::clone(&self.fail_recognition),
            last_ink_strokes: Arc::clone(&self.last_ink_strokes),
            gate: self.gate.clone(),
        }))
    }
}

struct FakeRecognizer {
    language_tag: String,
    released: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    last_ink_strokes: Arc<Mutex<Option<usize>>>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn recognize(&self, ink: &Ink) -> Result<Vec<RecognitionCandidate>, RecognitionError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        *self.last_ink_strokes.lock().unwrap() = Some(ink.len());
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecognitionError::Recognize("engine busy".to_string()));
        }

        let texts: &[&str] = match self.language_tag.as_str() {
            "en" => &["hello", "hallo", "hullo", "help"],
            "fr" => &["bonjour", "bonsoir"],
            _ => &["?"],
        };
        Ok(texts.iter().map(|text| RecognitionCandidate::new(*text)).collect())
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeDirectory {
    all: Vec<String>,
    downloaded: Arc<Mutex<HashSet<String>>>,
    fail: bool,
}

impl FakeDirectory {
    pub fn new(all: &[&str], downloaded: &[&str]) -> Self {
        Self {
            all: all.iter().map(|tag| tag.to_string()).collect(),
            downloaded: Arc::new(Mutex::new(
                downloaded.iter().map(|tag| tag.to_string()).collect(),
            )),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl LanguageDirectory for FakeDirectory {
    fn all_language_tags(&self) -> Result<Vec<String>, CatalogError> {
        if self.fail {
            return Err(CatalogError::Available("model index unavailable".to_string()));
        }
        Ok(self.all.clone())
    }

    async fn downloaded_language_tags(&self) -> Result<HashSet<String>, CatalogError> {
        Ok(self.downloaded.lock().unwrap().clone())
    }
}

pub struct FakeLocale {
    english: HashMap<&'static str, &'static str>,
    native: HashMap<&'static str, &'static str>,
}

impl FakeLocale {
    pub fn standard() -> Self {
        Self {
            english: HashMap::from([
                ("en", "English"),
                ("de", "German"),
                ("fr", "French"),
                ("es", "Spanish"),
                ("ja", "Japanese"),
            ]),
            native: HashMap::from([
                ("en", "English"),
                ("de", "Deutsch"),
                ("fr", "french"),
                ("es", "español"),
                ("ja", "日本語"),
            ]),
        }
    }
}

impl LocaleDisplay for FakeLocale {
    fn display_name(&self, tag: &str, in_locale: &str) -> Option<String> {
        let table = if in_locale == tag {
            &self.native
        } else if in_locale.starts_with("en") {
            &self.english
        } else {
            return None;
        };
        table.get(tag).map(|name| name.to_string())
    }
}

#[derive(Default)]
pub struct RecordingFeedback {
    pub clipboard: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<String>>,
}

impl UserFeedback for RecordingFeedback {
    fn set_clipboard_text(&self, text: &str) {
        self.clipboard.lock().unwrap().push(text.to_string());
    }

    fn notify_user(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }
}
