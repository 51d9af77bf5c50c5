//! LibreTranslate-compatible HTTP backend
//!
//! Talks to a self-hosted translation server implementing the LibreTranslate
//! API. The models live on the server, so capability construction never
//! downloads anything and reports completion immediately.
//!
//! # Configuration
//!
//! `LIBRETRANSLATE_URL` selects the server (e.g. `http://localhost:5000`);
//! `LIBRETRANSLATE_API_KEY` is sent when set.
//!
//! # Example
//!
//! ```ignore
//! use quick_translate::model::LibreTranslateProvider;
//!
//! let provider = Arc::new(LibreTranslateProvider::from_env()?);
//! let broker = ModelBroker::new(provider.clone(), provider, localizer);
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
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// One entry of `GET /languages`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LanguageInfo {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetectResponseItem {
    language: String,
    /// Percentage in `0..=100`
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Clone)]
struct Endpoint {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn with_key(&self, mut body: Value) -> Value {
        if let (Some(key), Some(obj)) = (&self.api_key, body.as_object_mut()) {
            obj.insert("api_key".to_string(), Value::String(key.clone()));
        }
        body
    }

    async fn check<T: DeserializeOwned>(response: reqwest::Response) -> TranslateResult<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<Value>(&error_text)
                .ok()
                .and_then(|v| v["error"].as_str().map(|s| s.to_string()))
                .unwrap_or(error_text);

            return Err(if status.is_client_error() {
                TranslateError::Config(format!("API client error ({}): {}", status, detail))
            } else {
                TranslateError::Network(format!("API server error ({}): {}", status, detail))
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TranslateError::Network(format!("Failed to parse API response: {}", e)))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> TranslateResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .json(&self.with_key(body))
            .send()
            .await?;
        Self::check(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> TranslateResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::check(response).await
    }
}

/// LibreTranslate provider implementing both model services
#[derive(Clone)]
pub struct LibreTranslateProvider {
    endpoint: Endpoint,
    languages: Arc<OnceCell<Vec<LanguageInfo>>>,
}

impl LibreTranslateProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> TranslateResult<Self> {
        if base_url.trim().is_empty() {
            return Err(TranslateError::Config("Server URL cannot be empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(TranslateError::Config(format!(
                "Server URL must start with http:// or https://: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: Endpoint {
                base_url: base_url.trim().to_string(),
                api_key: api_key.filter(|k| !k.trim().is_empty()),
                client,
            },
            languages: Arc::new(OnceCell::new()),
        })
    }

    /// Create a provider from `LIBRETRANSLATE_URL` and `LIBRETRANSLATE_API_KEY`
    pub fn from_env() -> TranslateResult<Self> {
        let base_url = std::env::var("LIBRETRANSLATE_URL").map_err(|_| {
            TranslateError::Config("LIBRETRANSLATE_URL environment variable not set".to_string())
        })?;
        Self::new(&base_url, std::env::var("LIBRETRANSLATE_API_KEY").ok())
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    /// Use a known language listing instead of fetching `/languages`
    pub fn with_languages(mut self, languages: Vec<LanguageInfo>) -> Self {
        self.languages = Arc::new(OnceCell::new_with(Some(languages)));
        self
    }

    /// Supported languages, fetched once per provider
    pub async fn languages(&self) -> TranslateResult<&[LanguageInfo]> {
        let languages = self
            .languages
            .get_or_try_init(|| async {
                let languages: Vec<LanguageInfo> = self.endpoint.get("languages").await?;
                debug!(count = languages.len(), "fetched supported languages");
                Ok::<_, TranslateError>(languages)
            })
            .await?;
        Ok(languages.as_slice())
    }
}

impl LibreTranslateProvider {
    async fn remote_translator(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> TranslateResult<RemoteTranslator> {
        let languages = self.languages().await?;
        let (source_code, target_code) = resolve_pair(languages, source, target).ok_or_else(|| {
            TranslateError::Unavailable(format!(
                "The server cannot translate from {} to {}",
                source, target
            ))
        })?;
        debug!(source = %source_code, target = %target_code, "resolved server language codes");

        Ok(RemoteTranslator {
            endpoint: self.endpoint.clone(),
            source: source_code,
            target: target_code,
        })
    }
}

impl std::fmt::Debug for LibreTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreTranslateProvider")
            .field("base_url", &self.endpoint.base_url)
            .field("api_key", &self.endpoint.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Server spelling of `code`: an exact match first, then its base language
fn server_code<'a>(candidates: &'a [String], code: &LanguageCode) -> Option<&'a str> {
    candidates
        .iter()
        .find(|c| c.eq_ignore_ascii_case(code.as_str()))
        .or_else(|| candidates.iter().find(|c| c.eq_ignore_ascii_case(code.base_language())))
        .map(String::as_str)
}

/// The `(source, target)` server codes that translate this pair, if any
///
/// `zh-Hant` resolves to the server's `zh-Hant` when listed and to `zh`
/// otherwise, so the codes sent to `/translate` are the ones availability
/// was decided on.
pub fn resolve_pair(
    languages: &[LanguageInfo],
    source: &LanguageCode,
    target: &LanguageCode,
) -> Option<(String, String)> {
    let exact = languages
        .iter()
        .filter(|info| info.code.eq_ignore_ascii_case(source.as_str()));
    let base = languages
        .iter()
        .filter(|info| info.code.eq_ignore_ascii_case(source.base_language()));

    exact.chain(base).find_map(|info| {
        server_code(&info.targets, target).map(|t| (info.code.clone(), t.to_string()))
    })
}

/// Availability of a pair according to a `/languages` listing
pub fn pair_availability(
    languages: &[LanguageInfo],
    source: &LanguageCode,
    target: &LanguageCode,
) -> Availability {
    if resolve_pair(languages, source, target).is_some() {
        Availability::Available
    } else {
        Availability::Unavailable
    }
}

fn ranked(items: Vec<DetectResponseItem>) -> Vec<Detection> {
    let mut detections: Vec<Detection> = items
        .into_iter()
        .map(|item| Detection::new(&item.language, item.confidence / 100.0))
        .collect();
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    detections
}

#[async_trait]
impl LanguageDetectorService for LibreTranslateProvider {
    async fn create(&self, monitor: &DownloadMonitor) -> TranslateResult<Box<dyn LanguageDetector>> {
        monitor.report(1.0);
        Ok(Box::new(RemoteDetector {
            endpoint: self.endpoint.clone(),
        }))
    }

    fn provider_name(&self) -> &str {
        "LibreTranslate"
    }
}

#[async_trait]
impl TranslatorService for LibreTranslateProvider {
    async fn availability(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> TranslateResult<Availability> {
        let languages = self.languages().await?;
        Ok(pair_availability(languages, source, target))
    }

    async fn create(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
        monitor: &DownloadMonitor,
    ) -> TranslateResult<Box<dyn Translator>> {
        let translator = self.remote_translator(source, target).await?;
        monitor.report(1.0);
        Ok(Box::new(translator))
    }

    fn provider_name(&self) -> &str {
        "LibreTranslate"
    }
}

struct RemoteDetector {
    endpoint: Endpoint,
}

#[async_trait]
impl LanguageDetector for RemoteDetector {
    async fn detect(&self, text: &str) -> TranslateResult<Vec<Detection>> {
        let items: Vec<DetectResponseItem> = self.endpoint.post("detect", json!({ "q": text })).await?;
        Ok(ranked(items))
    }
}

/// Translator bound to the server's own codes for the pair
struct RemoteTranslator {
    endpoint: Endpoint,
    source: String,
    target: String,
}

impl RemoteTranslator {
    fn request_body(&self, text: &str) -> Value {
        json!({
            "q": text,
            "source": self.source,
            "target": self.target,
            "format": "text"
        })
    }

    async fn translate(&self, text: &str) -> TranslateResult<String> {
        let body = self.request_body(text);
        let response: TranslateResponse = self
            .endpoint
            .post("translate", body)
            .await
            .map_err(|e| TranslateError::Stream(e.to_string()))?;
        Ok(response.translated_text)
    }
}

impl Translator for RemoteTranslator {
    // The server answers in one piece, delivered as a single chunk.
    fn translate_streaming<'a>(&'a self, text: &'a str) -> ChunkStream<'a> {
        stream::once(self.translate(text)).boxed()
    }
}
