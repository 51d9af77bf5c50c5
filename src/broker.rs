//! Model broker
//!
//! Obtains ready-to-use detector and translator handles from the model
//! services. Detection is forgiving: anything that goes wrong after the
//! detector exists falls back to English. Capability construction failures
//! are fatal and carry a hint telling the user to press the run button again,
//! since platforms commonly refuse model creation without a fresh user
//! gesture.

use crate::error::{TranslateError, TranslateResult};
use crate::language::LanguageCode;
use crate::messages::{Localizer, keys};
use crate::model::{Availability, DownloadMonitor, LanguageDetectorService, Translator, TranslatorService};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ModelBroker {
    detection: Arc<dyn LanguageDetectorService>,
    translation: Arc<dyn TranslatorService>,
    localizer: Arc<dyn Localizer>,
}

impl ModelBroker {
    pub fn new(
        detection: Arc<dyn LanguageDetectorService>,
        translation: Arc<dyn TranslatorService>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            detection,
            translation,
            localizer,
        }
    }

    /// `"{underlying}\n\n{hint}"`, the hint naming the run button
    fn with_retry_hint(&self, error: TranslateError, hint_key: &str) -> TranslateError {
        let run_label = self.localizer.message(keys::BUTTON_RUN, &[]);
        let hint = self.localizer.message(hint_key, &[&run_label]);
        let underlying = match error {
            TranslateError::ModelCreation(msg) => msg,
            other => other.to_string(),
        };
        TranslateError::ModelCreation(format!("{}\n\n{}", underlying, hint))
    }

    /// Detect the language of `text`
    ///
    /// Only detector construction can fail; an empty, blank, unparsable or
    /// failed detection yields the default source language.
    pub async fn detect_language(&self, text: &str) -> TranslateResult<LanguageCode> {
        let monitor = DownloadMonitor::new("Language Detector");
        let detector = self
            .detection
            .create(&monitor)
            .await
            .map_err(|e| self.with_retry_hint(e, keys::GESTURE_DETECTOR))?;

        let detected = match detector.detect(text).await {
            Ok(results) => results
                .into_iter()
                .next()
                .map(|top| top.detected_language)
                .filter(|code| !code.trim().is_empty())
                .and_then(|code| match LanguageCode::parse(&code) {
                    Ok(code) => Some(code),
                    Err(e) => {
                        warn!(error = %e, "detector returned an invalid language code");
                        None
                    }
                }),
            Err(e) => {
                warn!(error = %e, "language detection failed, using default");
                None
            }
        };

        let language = detected.unwrap_or_else(LanguageCode::fallback);
        info!(language = %language, provider = self.detection.provider_name(), "detected source language");
        Ok(language)
    }

    /// Availability of `source → target`; identical languages are unavailable
    /// without asking the service
    pub async fn resolve_availability(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> TranslateResult<Availability> {
        if source == target {
            return Ok(Availability::Unavailable);
        }
        self.translation.availability(source, target).await
    }

    /// Create a translator for `source → target`
    pub async fn create_translator(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> TranslateResult<Box<dyn Translator>> {
        let availability = self.resolve_availability(source, target).await?;
        debug!(source = %source, target = %target, availability = %availability, "translation availability");

        if availability == Availability::Unavailable {
            let source_name = self.localizer.language_name(source);
            let target_name = self.localizer.language_name(target);
            return Err(TranslateError::Unavailable(self.localizer.message(
                keys::TRANSLATION_UNAVAILABLE,
                &[&source_name, &target_name],
            )));
        }

        let monitor = DownloadMonitor::new("Translator Model");
        let translator = self
            .translation
            .create(source, target, &monitor)
            .await
            .map_err(|e| self.with_retry_hint(e, keys::GESTURE_TRANSLATOR))?;

        info!(
            source = %source,
            target = %target,
            provider = self.translation.provider_name(),
            "translator ready"
        );
        Ok(translator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Messages;
    use crate::model::{Detection, MockDetection, MockMode, MockModels};

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).unwrap()
    }

    fn broker(models: MockModels) -> ModelBroker {
        let models = Arc::new(models);
        ModelBroker::new(models.clone(), models, Arc::new(Messages::bundled().unwrap()))
    }

    // ========== Detection ==========

    #[tokio::test]
    async fn test_detect_returns_top_ranked() {
        let models = MockModels::new(MockMode::NoOp).detecting(MockDetection::Ranked(vec![
            Detection::new("de", 0.8),
            Detection::new("nl", 0.15),
        ]));
        assert_eq!(broker(models).detect_language("Guten Tag").await.unwrap(), lang("de"));
    }

    #[tokio::test]
    async fn test_detect_empty_falls_back_to_english() {
        let models = MockModels::new(MockMode::NoOp).detecting(MockDetection::Empty);
        assert_eq!(broker(models).detect_language("???").await.unwrap(), lang("en"));
    }

    #[tokio::test]
    async fn test_detect_error_falls_back_to_english() {
        let models = MockModels::new(MockMode::NoOp).detecting(MockDetection::Error("boom".into()));
        assert_eq!(broker(models).detect_language("text").await.unwrap(), lang("en"));
    }

    #[tokio::test]
    async fn test_detect_blank_or_invalid_code_falls_back() {
        let models = MockModels::new(MockMode::NoOp)
            .detecting(MockDetection::Ranked(vec![Detection::new("", 0.9)]));
        assert_eq!(broker(models).detect_language("x").await.unwrap(), lang("en"));

        let models = MockModels::new(MockMode::NoOp)
            .detecting(MockDetection::Ranked(vec![Detection::new("und!", 0.9)]));
        assert_eq!(broker(models).detect_language("x").await.unwrap(), lang("en"));
    }

    #[tokio::test]
    async fn test_detector_creation_failure_has_retry_hint() {
        let models = MockModels::new(MockMode::NoOp).failing_detector_creation("NotAllowedError: gesture required");
        match broker(models).detect_language("text").await {
            Err(TranslateError::ModelCreation(msg)) => {
                assert!(msg.starts_with("NotAllowedError: gesture required\n\n"));
                assert!(msg.contains("\"Run\""));
                assert!(msg.contains("language detection"));
            }
            other => panic!("Expected ModelCreation error, got {:?}", other),
        }
    }

    // ========== Availability ==========

    #[tokio::test]
    async fn test_same_language_is_unavailable_without_service_call() {
        let models = MockModels::new(MockMode::NoOp);
        let calls = models.calls();
        let broker = broker(models);

        let availability = broker.resolve_availability(&lang("fr"), &lang("fr")).await.unwrap();
        assert_eq!(availability, Availability::Unavailable);
        assert_eq!(calls.availability_checks(), 0);
    }

    #[tokio::test]
    async fn test_different_languages_ask_the_service() {
        let models = MockModels::new(MockMode::NoOp).with_availability("en", "fr", Availability::Downloadable);
        let calls = models.calls();
        let broker = broker(models);

        let availability = broker.resolve_availability(&lang("en"), &lang("fr")).await.unwrap();
        assert_eq!(availability, Availability::Downloadable);
        assert_eq!(calls.availability_checks(), 1);
    }

    // ========== Translator Creation ==========

    #[tokio::test]
    async fn test_unavailable_pair_names_languages() {
        let models = MockModels::new(MockMode::NoOp).with_availability("en", "ja", Availability::Unavailable);
        let calls = models.calls();
        match broker(models).create_translator(&lang("en"), &lang("ja")).await {
            Err(TranslateError::Unavailable(msg)) => {
                assert_eq!(msg, "Translation from English to Japanese is not available.");
            }
            Err(e) => panic!("Expected Unavailable error, got {:?}", e),
            Ok(_) => panic!("Expected Unavailable error"),
        }
        assert_eq!(calls.translator_creates(), 0);
    }

    #[tokio::test]
    async fn test_same_language_pair_fails_with_pair_message() {
        match broker(MockModels::new(MockMode::NoOp)).create_translator(&lang("en"), &lang("en")).await {
            Err(e) => assert_eq!(e.to_string(), "Translation from English to English is not available."),
            Ok(_) => panic!("Expected Unavailable error"),
        }
    }

    #[tokio::test]
    async fn test_translator_creation_failure_has_retry_hint() {
        let models = MockModels::new(MockMode::NoOp).failing_translator_creation("NotSupportedError");
        match broker(models).create_translator(&lang("en"), &lang("fr")).await {
            Err(TranslateError::ModelCreation(msg)) => {
                assert!(msg.starts_with("NotSupportedError\n\n"));
                assert!(msg.contains("translation model"));
            }
            Err(e) => panic!("Expected ModelCreation error, got {:?}", e),
            Ok(_) => panic!("Expected ModelCreation error"),
        }
    }

    #[tokio::test]
    async fn test_downloadable_pair_creates_translator() {
        let models = MockModels::new(MockMode::NoOp)
            .with_default_availability(Availability::Downloadable)
            .with_progress(&[0.0, 0.5, 1.0]);
        let calls = models.calls();
        assert!(broker(models).create_translator(&lang("en"), &lang("fr")).await.is_ok());
        assert_eq!(calls.translator_creates(), 1);
    }
}
