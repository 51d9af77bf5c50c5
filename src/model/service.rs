//! Model service traits
//!
//! These traits describe the externally supplied language-detection and
//! translation capabilities. A service creates ready-to-use handles; creation
//! may suspend while a model asset downloads, reporting progress through a
//! [`DownloadMonitor`].
//!
//! # Example
//!
//! ```ignore
//! use quick_translate::model::{DownloadMonitor, TranslatorService};
//! use futures::StreamExt;
//!
//! let monitor = DownloadMonitor::new("Translator Model");
//! let translator = service.create(&en, &fr, &monitor).await?;
//! let mut stream = translator.translate_streaming("Hello");
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?);
//! }
//! ```

use crate::error::TranslateResult;
use crate::language::LanguageCode;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A finite, single-consumption stream of translated text chunks
pub type ChunkStream<'a> = BoxStream<'a, TranslateResult<String>>;

/// One ranked result of language detection
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub detected_language: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(detected_language: &str, confidence: f64) -> Self {
        Self {
            detected_language: detected_language.to_string(),
            confidence,
        }
    }
}

/// Whether a translation model exists for a language pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Model is on the device and ready
    Available,
    /// Model exists but must be downloaded before use
    Downloadable,
    /// Model download is in progress
    Downloading,
    /// No model can translate this pair
    Unavailable,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Downloadable => "downloadable",
            Availability::Downloading => "downloading",
            Availability::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model download progress, `loaded` in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub loaded: f64,
}

impl DownloadProgress {
    pub fn percent(&self) -> u32 {
        (self.loaded.clamp(0.0, 1.0) * 100.0).floor() as u32
    }
}

type ProgressListener = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Progress channel handed to capability construction
///
/// Progress is informational: it never alters control flow.
#[derive(Clone)]
pub struct DownloadMonitor {
    label: String,
    listener: Option<ProgressListener>,
}

impl DownloadMonitor {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            listener: None,
        }
    }

    /// Also forward every progress event to `listener`
    pub fn with_listener(mut self, listener: impl Fn(DownloadProgress) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn report(&self, loaded: f64) {
        let progress = DownloadProgress { loaded };
        debug!("{}: Downloaded {}%", self.label, progress.percent());
        if let Some(listener) = &self.listener {
            listener(progress);
        }
    }
}

impl fmt::Debug for DownloadMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadMonitor")
            .field("label", &self.label)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Creates language detectors
#[async_trait]
pub trait LanguageDetectorService: Send + Sync {
    /// Construct a detector, possibly downloading its model first
    async fn create(&self, monitor: &DownloadMonitor) -> TranslateResult<Box<dyn LanguageDetector>>;

    /// Name used in logs
    fn provider_name(&self) -> &str;
}

/// A ready language detector
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Rank candidate languages for `text` by descending confidence
    async fn detect(&self, text: &str) -> TranslateResult<Vec<Detection>>;
}

/// Creates translators for language pairs
#[async_trait]
pub trait TranslatorService: Send + Sync {
    /// Whether a model exists for this exact pair
    async fn availability(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> TranslateResult<Availability>;

    /// Construct a translator, possibly downloading its model first
    async fn create(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
        monitor: &DownloadMonitor,
    ) -> TranslateResult<Box<dyn Translator>>;

    /// Name used in logs
    fn provider_name(&self) -> &str;
}

/// A ready translator for one language pair
pub trait Translator: Send + Sync {
    /// Start translating `text`, yielding the output as appended chunks
    fn translate_streaming<'a>(&'a self, text: &'a str) -> ChunkStream<'a>;
}
