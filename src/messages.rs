//! Localized user-facing strings
//!
//! The pipeline never embeds user-facing text. It asks a [`Localizer`] for
//! messages by key and for language display names by code. [`Messages`] is
//! the catalog-backed implementation: one [`LocalizedMessages`] map per locale,
//! looked up along the UI locale's fallback chain and finally in English.

use crate::error::TranslateResult;
use crate::language::LanguageCode;
use crate::loader;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("placeholder pattern is valid"));

const BUNDLED_EN: &str = include_str!("../locales/en.json");
const FALLBACK_LOCALE: &str = "en";

/// Message keys used by the pipeline
pub mod keys {
    pub const BUTTON_RUN: &str = "popup_button_run";
    pub const COPIED: &str = "popup_copied";
    pub const LOADING: &str = "popup_loading";
    pub const TRANSLATING: &str = "popup_translating";
    pub const NO_SELECTION: &str = "popup_error_no_selection";
    pub const INJECTION_BLOCKED: &str = "popup_error_injection_blocked";
    pub const GESTURE_DETECTOR: &str = "popup_error_gesture_detector";
    pub const GESTURE_TRANSLATOR: &str = "popup_error_gesture_translator";
    pub const TRANSLATION_UNAVAILABLE: &str = "popup_error_translation_unavailable";
}

/// Source of localized strings for the pipeline
pub trait Localizer: Send + Sync {
    /// Look up `key` and substitute `$1`, `$2`, ... with `args`
    fn message(&self, key: &str, args: &[&str]) -> String;

    /// Human-readable name of a language, in the UI language
    fn language_name(&self, code: &LanguageCode) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct LocalizedMessages(pub HashMap<String, String>);

impl LocalizedMessages {
    pub fn new() -> Self {
        LocalizedMessages(HashMap::new())
    }
    pub fn with_message(&mut self, key: &str, message: &str) -> &mut Self {
        self.0.insert(key.to_owned(), message.to_owned());
        self
    }
    pub fn get_message(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }
    pub fn get(&self, key: &str) -> String {
        self.0.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct Messages {
    // Keyed by lowercase locale and then by message key
    // e.g. catalogs["en"]["popup_loading"] = "Loading"
    //      catalogs["fr"]["popup_loading"] = "Chargement"
    catalogs: HashMap<String, LocalizedMessages>,
    ui_locale: LanguageCode,
}

impl Messages {
    pub fn new() -> Self {
        Messages {
            catalogs: HashMap::new(),
            ui_locale: LanguageCode::fallback(),
        }
    }

    /// A catalog preloaded with the bundled English messages
    pub fn bundled() -> TranslateResult<Self> {
        let mut messages = Messages::new();
        let en = loader::load_messages_from_str(BUNDLED_EN, "bundled en.json")?;
        messages.with_messages_for_locale(FALLBACK_LOCALE, en);
        Ok(messages)
    }

    /// Bundled English plus every catalog found in `dir`
    pub fn from_dir(dir: &Path) -> TranslateResult<Self> {
        let mut messages = Messages::bundled()?;
        for (locale, catalog) in loader::load_all_messages_from_dir(dir)? {
            messages.merge_messages_for_locale(&locale, catalog);
        }
        Ok(messages)
    }

    pub fn with_locale(&mut self, locale: LanguageCode) -> &mut Self {
        self.ui_locale = locale;
        self
    }

    pub fn ui_locale(&self) -> &LanguageCode {
        &self.ui_locale
    }

    pub fn with_messages_for_locale(
        &mut self,
        locale: &str,
        messages: LocalizedMessages,
    ) -> &mut Self {
        self.catalogs.insert(locale.to_lowercase(), messages);
        self
    }

    /// Add messages to a locale, overriding keys that already exist
    pub fn merge_messages_for_locale(&mut self, locale: &str, messages: LocalizedMessages) {
        self.catalogs
            .entry(locale.to_lowercase())
            .or_default()
            .0
            .extend(messages.0);
    }

    fn lookup_chain(&self) -> Vec<String> {
        let mut chain: Vec<String> = self
            .ui_locale
            .fallback_chain()
            .into_iter()
            .map(|l| l.to_lowercase())
            .collect();
        if !chain.iter().any(|l| l == FALLBACK_LOCALE) {
            chain.push(FALLBACK_LOCALE.to_string());
        }
        chain
    }

    fn find(&self, key: &str) -> Option<&String> {
        for locale in self.lookup_chain() {
            if let Some(message) = self.catalogs.get(&locale).and_then(|c| c.get_message(key)) {
                if locale != self.ui_locale.as_str().to_lowercase() {
                    debug!(key, locale = %locale, requested = %self.ui_locale, "message fallback");
                }
                return Some(message);
            }
        }
        None
    }

    /// Raw message text, or the key itself when no catalog has it
    pub fn get_message(&self, key: &str) -> String {
        self.find(key).cloned().unwrap_or_else(|| key.to_string())
    }

    pub fn localize(&self, key: &str, args: &[&str]) -> String {
        substitute(&self.get_message(key), args)
    }
}

impl Default for Messages {
    fn default() -> Self {
        Messages::new()
    }
}

impl Localizer for Messages {
    fn message(&self, key: &str, args: &[&str]) -> String {
        self.localize(key, args)
    }

    fn language_name(&self, code: &LanguageCode) -> String {
        code.fallback_chain()
            .iter()
            .find_map(|candidate| self.find(&format!("language-name-{}", candidate.to_lowercase())))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

/// Replace `$n` placeholders with the n-th (1-based) argument
///
/// Placeholders without a matching argument are left as written.
pub fn substitute(message: &str, args: &[&str]) -> String {
    PLACEHOLDER
        .replace_all(message, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| args.get(i))
                .map(|value| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
