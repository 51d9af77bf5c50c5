//! Mock model services for testing
//!
//! A deterministic, download-free stand-in for on-device detection and
//! translation models. Every behavior the pipeline reacts to can be
//! simulated: ranked, empty or failing detection; per-pair availability;
//! creation failures; download progress; chunked streaming; mid-stream errors.
//!
//! # Example
//!
//! ```ignore
//! use quick_translate::model::{MockModels, MockMode, MockDetection};
//!
//! let models = MockModels::new(MockMode::Suffix).detecting(MockDetection::language("en"));
//! let calls = models.calls();
//! // hand `Arc::new(models)` to a ModelBroker as both services
//! ```

use crate::error::{TranslateError, TranslateResult};
use crate::language::LanguageCode;
use crate::model::service::{
    Availability, ChunkStream, Detection, DownloadMonitor, LanguageDetector,
    LanguageDetectorService, Translator, TranslatorService,
};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Return input unchanged
    NoOp,
    /// Append target suffix to every non-blank line: "hello" → "hello_fr"
    Suffix,
    /// Predefined (text, target) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),
    /// Uppercase the input
    Uppercase,
    /// Fail the stream before the first chunk
    Error(String),
}

/// Mock detection outcomes
#[derive(Debug, Clone)]
pub enum MockDetection {
    /// Return these results as-is
    Ranked(Vec<Detection>),
    /// Detection succeeds with no candidates
    Empty,
    /// `detect` fails
    Error(String),
}

impl MockDetection {
    /// A single confident result
    pub fn language(code: &str) -> Self {
        MockDetection::Ranked(vec![Detection::new(code, 0.98)])
    }
}

/// Counters of every model call, shared with the test that set up the mock
#[derive(Debug, Default)]
pub struct CallCounts {
    detector_creates: AtomicUsize,
    detections: AtomicUsize,
    availability_checks: AtomicUsize,
    translator_creates: AtomicUsize,
    streams: AtomicUsize,
}

impl CallCounts {
    pub fn detector_creates(&self) -> usize {
        self.detector_creates.load(Ordering::SeqCst)
    }
    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::SeqCst)
    }
    pub fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }
    pub fn translator_creates(&self) -> usize {
        self.translator_creates.load(Ordering::SeqCst)
    }
    pub fn streams(&self) -> usize {
        self.streams.load(Ordering::SeqCst)
    }

    /// Sum of all calls into the model services
    pub fn total(&self) -> usize {
        self.detector_creates()
            + self.detections()
            + self.availability_checks()
            + self.translator_creates()
            + self.streams()
    }
}

/// Mock implementation of both model services
#[derive(Debug, Clone)]
pub struct MockModels {
    mode: MockMode,
    detection: MockDetection,
    availability: HashMap<(String, String), Availability>,
    default_availability: Availability,
    detector_creation_error: Option<String>,
    translator_creation_error: Option<String>,
    progress_steps: Vec<f64>,
    /// Simulated per-chunk latency
    delay_ms: u64,
    fail_stream_after: Option<(usize, String)>,
    calls: Arc<CallCounts>,
}

impl MockModels {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            detection: MockDetection::language("en"),
            availability: HashMap::new(),
            default_availability: Availability::Available,
            detector_creation_error: None,
            translator_creation_error: None,
            progress_steps: Vec::new(),
            delay_ms: 0,
            fail_stream_after: None,
            calls: Arc::new(CallCounts::default()),
        }
    }

    pub fn detecting(mut self, detection: MockDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Override availability for one pair
    pub fn with_availability(mut self, source: &str, target: &str, availability: Availability) -> Self {
        self.availability
            .insert((source.to_string(), target.to_string()), availability);
        self
    }

    /// Availability for pairs without an override
    pub fn with_default_availability(mut self, availability: Availability) -> Self {
        self.default_availability = availability;
        self
    }

    pub fn failing_detector_creation(mut self, message: &str) -> Self {
        self.detector_creation_error = Some(message.to_string());
        self
    }

    pub fn failing_translator_creation(mut self, message: &str) -> Self {
        self.translator_creation_error = Some(message.to_string());
        self
    }

    /// Progress values reported during every capability construction
    pub fn with_progress(mut self, steps: &[f64]) -> Self {
        self.progress_steps = steps.to_vec();
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Emit `chunks` chunks of a stream, then fail with `message`
    pub fn failing_stream_after(mut self, chunks: usize, message: &str) -> Self {
        self.fail_stream_after = Some((chunks, message.to_string()));
        self
    }

    pub fn calls(&self) -> Arc<CallCounts> {
        self.calls.clone()
    }

    async fn download(&self, monitor: &DownloadMonitor) {
        for step in &self.progress_steps {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            monitor.report(*step);
        }
    }
}

#[async_trait]
impl LanguageDetectorService for MockModels {
    async fn create(&self, monitor: &DownloadMonitor) -> TranslateResult<Box<dyn LanguageDetector>> {
        self.calls.detector_creates.fetch_add(1, Ordering::SeqCst);
        self.download(monitor).await;

        if let Some(msg) = &self.detector_creation_error {
            return Err(TranslateError::ModelCreation(msg.clone()));
        }

        Ok(Box::new(MockDetector {
            detection: self.detection.clone(),
            calls: self.calls.clone(),
        }))
    }

    fn provider_name(&self) -> &str {
        "Mock Models"
    }
}

#[async_trait]
impl TranslatorService for MockModels {
    async fn availability(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> TranslateResult<Availability> {
        self.calls.availability_checks.fetch_add(1, Ordering::SeqCst);
        let key = (source.to_string(), target.to_string());
        Ok(self
            .availability
            .get(&key)
            .copied()
            .unwrap_or(self.default_availability))
    }

    async fn create(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
        monitor: &DownloadMonitor,
    ) -> TranslateResult<Box<dyn Translator>> {
        self.calls.translator_creates.fetch_add(1, Ordering::SeqCst);
        self.download(monitor).await;

        if let Some(msg) = &self.translator_creation_error {
            return Err(TranslateError::ModelCreation(msg.clone()));
        }

        Ok(Box::new(MockTranslator {
            source: source.clone(),
            target: target.clone(),
            mode: self.mode.clone(),
            delay_ms: self.delay_ms,
            fail_stream_after: self.fail_stream_after.clone(),
            calls: self.calls.clone(),
        }))
    }

    fn provider_name(&self) -> &str {
        "Mock Models"
    }
}

struct MockDetector {
    detection: MockDetection,
    calls: Arc<CallCounts>,
}

#[async_trait]
impl LanguageDetector for MockDetector {
    async fn detect(&self, _text: &str) -> TranslateResult<Vec<Detection>> {
        self.calls.detections.fetch_add(1, Ordering::SeqCst);
        match &self.detection {
            MockDetection::Ranked(results) => Ok(results.clone()),
            MockDetection::Empty => Ok(Vec::new()),
            MockDetection::Error(msg) => Err(TranslateError::Detection(msg.clone())),
        }
    }
}

struct MockTranslator {
    source: LanguageCode,
    target: LanguageCode,
    mode: MockMode,
    delay_ms: u64,
    fail_stream_after: Option<(usize, String)>,
    calls: Arc<CallCounts>,
}

impl MockTranslator {
    fn apply_translation(&self, text: &str) -> TranslateResult<String> {
        let target = self.target.as_str();
        let suffix = |text: &str| {
            text.split_inclusive('\n')
                .map(|line| {
                    let body = line.trim_end_matches(['\r', '\n']);
                    if body.trim().is_empty() {
                        line.to_string()
                    } else {
                        format!("{}_{}{}", body, target, &line[body.len()..])
                    }
                })
                .collect::<String>()
        };

        match &self.mode {
            MockMode::NoOp => Ok(text.to_string()),
            MockMode::Suffix => Ok(suffix(text)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map.get(&key).cloned().unwrap_or_else(|| suffix(text)))
            }
            MockMode::Uppercase => Ok(text.to_uppercase()),
            MockMode::Error(msg) => Err(TranslateError::Stream(msg.clone())),
        }
    }
}

/// Split text into word-sized chunks, each keeping its trailing whitespace
fn chunk_words(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(|chunk| chunk.to_string())
        .collect()
}

impl Translator for MockTranslator {
    fn translate_streaming<'a>(&'a self, text: &'a str) -> ChunkStream<'a> {
        self.calls.streams.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(source = %self.source, target = %self.target, "mock stream opened");

        let mut items: Vec<TranslateResult<String>> = match self.apply_translation(text) {
            Ok(translated) => chunk_words(&translated).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };

        if let Some((after, msg)) = &self.fail_stream_after {
            items.truncate(*after);
            items.push(Err(TranslateError::Stream(msg.clone())));
        }

        let delay_ms = self.delay_ms;
        stream::iter(items)
            .then(move |item| async move {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                item
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).unwrap()
    }

    async fn translate_all(models: &MockModels, text: &str, target: &str) -> TranslateResult<Vec<String>> {
        let monitor = DownloadMonitor::new("test");
        let translator = TranslatorService::create(models, &lang("en"), &lang(target), &monitor).await?;
        let mut stream = translator.translate_streaming(text);
        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            chunks.push(chunk?);
        }
        Ok(chunks)
    }

    // ========== Translation Modes ==========

    #[tokio::test]
    async fn test_noop_streams_words() {
        let models = MockModels::new(MockMode::NoOp);
        let chunks = translate_all(&models, "Hello brave world", "fr").await.unwrap();
        assert_eq!(chunks, vec!["Hello ", "brave ", "world"]);
    }

    #[tokio::test]
    async fn test_suffix_per_line() {
        let models = MockModels::new(MockMode::Suffix);
        let chunks = translate_all(&models, "one\ntwo", "de").await.unwrap();
        assert_eq!(chunks.concat(), "one_de\ntwo_de");
    }

    #[tokio::test]
    async fn test_mappings_with_fallback() {
        let mut map = HashMap::new();
        map.insert(("Hello".to_string(), "fr".to_string()), "Bonjour".to_string());
        let models = MockModels::new(MockMode::Mappings(map));

        assert_eq!(translate_all(&models, "Hello", "fr").await.unwrap().concat(), "Bonjour");
        assert_eq!(translate_all(&models, "Bye", "fr").await.unwrap().concat(), "Bye_fr");
    }

    #[tokio::test]
    async fn test_uppercase() {
        let models = MockModels::new(MockMode::Uppercase);
        assert_eq!(translate_all(&models, "abc", "fr").await.unwrap().concat(), "ABC");
    }

    #[tokio::test]
    async fn test_error_mode_fails_stream() {
        let models = MockModels::new(MockMode::Error("model crashed".into()));
        match translate_all(&models, "Hello", "fr").await {
            Err(TranslateError::Stream(msg)) => assert_eq!(msg, "model crashed"),
            other => panic!("Expected Stream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fail_after_some_chunks() {
        let models = MockModels::new(MockMode::NoOp).failing_stream_after(1, "connection lost");
        let translator = TranslatorService::create(&models, &lang("en"), &lang("fr"), &DownloadMonitor::new("t"))
            .await
            .unwrap();
        let mut stream = translator.translate_streaming("a b c");
        assert_eq!(stream.next().await.unwrap().unwrap(), "a ");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    // ========== Detection ==========

    #[tokio::test]
    async fn test_detection_outcomes() {
        let monitor = DownloadMonitor::new("test");

        let models = MockModels::new(MockMode::NoOp).detecting(MockDetection::language("ja"));
        let detector = LanguageDetectorService::create(&models, &monitor).await.unwrap();
        assert_eq!(detector.detect("こんにちは").await.unwrap()[0].detected_language, "ja");

        let models = MockModels::new(MockMode::NoOp).detecting(MockDetection::Empty);
        let detector = LanguageDetectorService::create(&models, &monitor).await.unwrap();
        assert!(detector.detect("x").await.unwrap().is_empty());

        let models = MockModels::new(MockMode::NoOp).detecting(MockDetection::Error("boom".into()));
        let detector = LanguageDetectorService::create(&models, &monitor).await.unwrap();
        assert!(detector.detect("x").await.is_err());
    }

    #[tokio::test]
    async fn test_creation_failures() {
        let monitor = DownloadMonitor::new("test");
        let models = MockModels::new(MockMode::NoOp)
            .failing_detector_creation("NotAllowedError")
            .failing_translator_creation("NotSupportedError");

        assert!(LanguageDetectorService::create(&models, &monitor).await.is_err());
        assert!(
            TranslatorService::create(&models, &lang("en"), &lang("fr"), &monitor)
                .await
                .is_err()
        );
    }

    // ========== Availability, Progress, Counters ==========

    #[tokio::test]
    async fn test_availability_overrides() {
        let models = MockModels::new(MockMode::NoOp)
            .with_default_availability(Availability::Downloadable)
            .with_availability("en", "xx", Availability::Unavailable);

        assert_eq!(
            models.availability(&lang("en"), &lang("fr")).await.unwrap(),
            Availability::Downloadable
        );
        assert_eq!(
            models.availability(&lang("en"), &lang("xx")).await.unwrap(),
            Availability::Unavailable
        );
        assert_eq!(models.calls().availability_checks(), 2);
    }

    #[tokio::test]
    async fn test_progress_is_reported() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let monitor = DownloadMonitor::new("test").with_listener(move |p| sink.lock().unwrap().push(p.loaded));

        let models = MockModels::new(MockMode::NoOp).with_progress(&[0.0, 0.5, 1.0]);
        LanguageDetectorService::create(&models, &monitor).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_call_counters() {
        let models = MockModels::new(MockMode::NoOp);
        let calls = models.calls();
        assert_eq!(calls.total(), 0);

        translate_all(&models, "hi", "fr").await.unwrap();
        assert_eq!(calls.translator_creates(), 1);
        assert_eq!(calls.streams(), 1);
        assert_eq!(calls.total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_per_chunk() {
        let models = MockModels::new(MockMode::NoOp).with_delay(50);
        let start = tokio::time::Instant::now();
        translate_all(&models, "a b c", "fr").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_provider_name() {
        let models = MockModels::new(MockMode::NoOp);
        assert_eq!(LanguageDetectorService::provider_name(&models), "Mock Models");
        assert_eq!(TranslatorService::provider_name(&models), "Mock Models");
    }
}
