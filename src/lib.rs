//! Translate selected text with on-device language models
//!
//! The crate orchestrates externally supplied language-detection and
//! translation models: it splits the selection into paragraphs, detects the
//! source language, negotiates a translator for the language pair, streams
//! each paragraph's translation into the host view as it arrives, and keeps
//! the last result in a single-slot cache.
//!
//! # Example
//!
//! ```ignore
//! use quick_translate::{
//!     LanguageCode, Messages, MockMode, MockModels, ModelBroker, Pipeline, RecordingView,
//!     ResultCache, StaticSelection,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let messages = Arc::new(Messages::bundled()?);
//!     let models = Arc::new(MockModels::new(MockMode::Suffix));
//!     let broker = ModelBroker::new(models.clone(), models, messages.clone());
//!
//!     let view = Arc::new(RecordingView::new());
//!     let pipeline = Pipeline::new(
//!         broker,
//!         ResultCache::in_memory(),
//!         messages,
//!         view.clone(),
//!         Arc::new(StaticSelection::new("Hello\n\nWorld")),
//!     );
//!
//!     let report = pipeline.run(&LanguageCode::parse("fr")?, true).await;
//!     println!("{}", report.content); // "Hello_fr\n\nWorld_fr"
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod cache;
pub mod error;
pub mod language;
pub mod loader;
pub mod messages;
pub mod model;
pub mod pipeline;
pub mod segment;
pub mod selection;
pub mod status;
pub mod streaming;


// Re-export main types for convenient access
pub use broker::ModelBroker;
pub use cache::{CacheEntry, JsonFileStore, MemoryStore, ResultCache, SessionStore, Task};
pub use error::{TranslateError, TranslateResult};
pub use language::{DEFAULT_SOURCE_LANGUAGE, LanguageCode};
pub use messages::{LocalizedMessages, Localizer, Messages};
pub use model::{
    Availability, LibreTranslateProvider, MockDetection, MockMode, MockModels,
    LanguageDetectorService, TranslatorService,
};
pub use pipeline::{Pipeline, RunOutcome, RunPhase, RunReport, clipboard_text};
pub use segment::{Segment, SegmentKind, segment};
pub use selection::{SelectionSource, StaticSelection, StdinSelection};
pub use status::{PopupView, RecordingView, StatusTicker};
pub use streaming::translate_segment;
