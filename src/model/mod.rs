//! Model services
//!
//! Language detection and translation models are supplied from outside the
//! crate. This module defines the service traits the pipeline drives and two
//! implementations:
//!
//! 1. **MockModels** - deterministic in-process models for tests and demos
//! 2. **LibreTranslateProvider** - a LibreTranslate-compatible HTTP server

pub mod libretranslate;
pub mod mock;
pub mod service;

pub use libretranslate::{LanguageInfo, LibreTranslateProvider};
pub use mock::{CallCounts, MockDetection, MockMode, MockModels};
pub use service::{
    Availability, ChunkStream, Detection, DownloadMonitor, DownloadProgress, LanguageDetector,
    LanguageDetectorService, Translator, TranslatorService,
};
