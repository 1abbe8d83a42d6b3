use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::event::{EventSender, TaskSpawner};

const GESTURE_TAG_SUFFIX: &str = "-x-gesture";
const EMOJI_TAG: &str = "zxx-Zsye-x-emoji";
const AUTODRAW_TAG: &str = "zxx-Zsym-x-autodraw";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to list available languages: {0}")]
    Available(String),
    #[error("failed to list downloaded languages: {0}")]
    Downloaded(String),
}

/// Source of the language tags the recognizer knows about.
#[async_trait]
pub trait LanguageDirectory: Send + Sync {
    fn all_language_tags(&self) -> Result<Vec<String>, CatalogError>;

    async fn downloaded_language_tags(&self) -> Result<HashSet<String>, CatalogError>;
}

/// Locale naming service. `in_locale` is the tag of the language to render the name in.
pub trait LocaleDisplay: Send + Sync {
    fn display_name(&self, tag: &str, in_locale: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOption {
    pub label: String,
    pub tag: String,
    pub is_downloaded: bool,
}

/// Human label for a language tag, e.g. `German (Deutsch)`.
pub fn format_language_label(locale: &dyn LocaleDisplay, tag: &str, display_locale: &str) -> String {
    match tag {
        EMOJI_TAG => return "Emoji".to_string(),
        AUTODRAW_TAG => return "Autodraw".to_string(),
        _ => {}
    }

    let Some(display) = locale.display_name(tag, display_locale) else {
        return tag.to_string();
    };
    match locale.display_name(tag, tag) {
        Some(native) if native.to_lowercase() != display.to_lowercase() => {
            format!("{display} ({native})")
        }
        _ => display,
    }
}

/// Gesture models are dropped; downloaded languages sort first, then by label.
pub fn build_options(
    locale: &dyn LocaleDisplay,
    display_locale: &str,
    all_tags: &[String],
    downloaded: &HashSet<String>,
) -> Vec<LanguageOption> {
    let mut options: Vec<LanguageOption> = all_tags
        .iter()
        .filter(|tag| !tag.ends_with(GESTURE_TAG_SUFFIX))
        .map(|tag| LanguageOption {
            label: format_language_label(locale, tag, display_locale),
            tag: tag.clone(),
            is_downloaded: downloaded.contains(tag),
        })
        .collect();

    options.sort_by(|a, b| {
        b.is_downloaded
            .cmp(&a.is_downloaded)
            .then_with(|| a.label.cmp(&b.label))
    });
    options
}

#[derive(Debug)]
pub enum CatalogEvent {
    Refreshed {
        request: u64,
        result: Result<Vec<LanguageOption>, CatalogError>,
    },
}

/// Selectable recognition languages, refreshed in the background.
pub struct LanguageCatalog {
    directory: Arc<dyn LanguageDirectory>,
    locale: Arc<dyn LocaleDisplay>,
    display_locale: String,
    options: Vec<LanguageOption>,
    requested: u64,
    applied: u64,
    in_flight: usize,
    event_tx: EventSender,
    spawner: TaskSpawner,
}

impl LanguageCatalog {
    pub fn new(
        directory: Arc<dyn LanguageDirectory>,
        locale: Arc<dyn LocaleDisplay>,
        display_locale: impl Into<String>,
        event_tx: EventSender,
        spawner: TaskSpawner,
    ) -> Self {
        Self {
            directory,
            locale,
            display_locale: display_locale.into(),
            options: Vec::new(),
            requested: 0,
            applied: 0,
            in_flight: 0,
            event_tx,
            spawner,
        }
    }

    pub fn options(&self) -> &[LanguageOption] {
        &self.options
    }

    pub fn find(&self, tag: &str) -> Option<&LanguageOption> {
        self.options.iter().find(|option| option.tag == tag)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn label_for(&self, tag: &str) -> String {
        self.find(tag)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| format_language_label(self.locale.as_ref(), tag, &self.display_locale))
    }

    /// Case-insensitive substring match on labels. A blank query keeps everything.
    pub fn filter(&self, query: &str) -> Vec<LanguageOption> {
        if query.trim().is_empty() {
            return self.options.clone();
        }
        let needle = query.to_lowercase();
        self.options
            .iter()
            .filter(|option| option.label.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Re-enumerates languages on a background task. Returns `false` without a runtime.
    pub fn refresh(&mut self) -> bool {
        self.requested += 1;
        let request = self.requested;
        let directory = Arc::clone(&self.directory);
        let locale = Arc::clone(&self.locale);
        let display_locale = self.display_locale.clone();
        let event_tx = self.event_tx.clone();
        debug!(request, "refreshing language catalog");

        let spawned = self.spawner.spawn(async move {
            let result = match directory.all_language_tags() {
                Ok(all_tags) => directory.downloaded_language_tags().await.map(|downloaded| {
                    build_options(locale.as_ref(), &display_locale, &all_tags, &downloaded)
                }),
                Err(err) => Err(err),
            };
            let _ = event_tx.send(CatalogEvent::Refreshed { request, result }.into());
        });
        if spawned {
            self.in_flight += 1;
        } else {
            warn!(request, "language catalog refresh skipped: no runtime");
        }
        spawned
    }

    /// Returns `true` when the option list was replaced.
    pub fn handle_event(&mut self, event: CatalogEvent) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        let CatalogEvent::Refreshed { request, result } = event;
        if request <= self.applied {
            debug!(request, applied = self.applied, "ignoring outdated catalog refresh");
            return false;
        }

        match result {
            Ok(options) => {
                self.applied = request;
                let downloaded = options.iter().filter(|option| option.is_downloaded).count();
                info!(
                    languages = options.len(),
                    downloaded, "language catalog refreshed"
                );
                self.options = options;
                true
            }
            Err(err) => {
                warn!(request, "language catalog refresh failed: {err}");
                false
            }
        }
    }
}
