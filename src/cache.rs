//! Single-slot result cache
//!
//! Remembers the last successful translation, keyed by the exact
//! `(input text, target language)` pair. The slot itself lives in a
//! [`SessionStore`], so the cache can survive across runs (and processes, with
//! [`JsonFileStore`]).

use crate::error::TranslateResult;
use crate::language::LanguageCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// One user-triggered translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub input_text: String,
    pub target_language: LanguageCode,
}

impl Task {
    pub fn new(input_text: &str, target_language: LanguageCode) -> Self {
        Self {
            input_text: input_text.to_string(),
            target_language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub task: Task,
    pub output_text: String,
}

/// Session-scoped key-value persistence holding the cache slot
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> TranslateResult<Option<CacheEntry>>;
    async fn save(&self, entry: &CacheEntry) -> TranslateResult<()>;
    async fn remove(&self) -> TranslateResult<()>;
}

/// In-process store; the slot lives as long as the store
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> TranslateResult<Option<CacheEntry>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, entry: &CacheEntry) -> TranslateResult<()> {
        *self.slot.lock().await = Some(entry.clone());
        Ok(())
    }

    async fn remove(&self) -> TranslateResult<()> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

/// Store persisting the slot as a JSON file
///
/// A missing file is an empty slot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the slot is written to before being renamed into place
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn load(&self) -> TranslateResult<Option<CacheEntry>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entry: &CacheEntry) -> TranslateResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(entry)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    async fn remove(&self) -> TranslateResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The result cache: last write wins, no expiry
pub struct ResultCache {
    store: Box<dyn SessionStore>,
}

impl ResultCache {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// A cache backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub async fn get(&self) -> TranslateResult<Option<CacheEntry>> {
        self.store.load().await
    }

    pub async fn put(&self, entry: CacheEntry) -> TranslateResult<()> {
        debug!(
            target_language = %entry.task.target_language,
            chars = entry.output_text.chars().count(),
            "cache slot replaced"
        );
        self.store.save(&entry).await
    }

    pub async fn clear(&self) -> TranslateResult<()> {
        self.store.remove().await
    }

    /// Cached output for `task`, compared structurally on the whole task
    pub async fn lookup(&self, task: &Task) -> TranslateResult<Option<String>> {
        Ok(self
            .get()
            .await?
            .filter(|entry| &entry.task == task)
            .map(|entry| entry.output_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, lang: &str) -> Task {
        Task::new(text, LanguageCode::parse(lang).unwrap())
    }

    fn entry(text: &str, lang: &str, output: &str) -> CacheEntry {
        CacheEntry {
            task: task(text, lang),
            output_text: output.to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_after_put() {
        let cache = ResultCache::in_memory();
        let a = entry("Hello", "fr", "Bonjour");
        cache.put(a.clone()).await.unwrap();
        assert_eq!(cache.get().await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = ResultCache::in_memory();
        cache.put(entry("Hello", "fr", "Bonjour")).await.unwrap();
        cache.put(entry("Bye", "de", "Tschüss")).await.unwrap();

        assert_eq!(cache.get().await.unwrap(), Some(entry("Bye", "de", "Tschüss")));
        assert_eq!(cache.lookup(&task("Hello", "fr")).await.unwrap(), None);
        assert_eq!(
            cache.lookup(&task("Bye", "de")).await.unwrap(),
            Some("Tschüss".to_string())
        );
    }

    #[tokio::test]
    async fn test_clear_empties_slot() {
        let cache = ResultCache::in_memory();
        cache.put(entry("Hello", "fr", "Bonjour")).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get().await.unwrap(), None);
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_different_target_is_miss() {
        let cache = ResultCache::in_memory();
        cache.put(entry("Hello", "fr", "Bonjour")).await.unwrap();
        assert_eq!(cache.lookup(&task("Hello", "es")).await.unwrap(), None);
        assert_eq!(cache.lookup(&task("Hello!", "fr")).await.unwrap(), None);
        assert_eq!(
            cache.lookup(&task("Hello", "FR")).await.unwrap(),
            Some("Bonjour".to_string())
        );
    }

    #[tokio::test]
    async fn test_json_file_store_persists_across_instances() {
        let path = std::env::temp_dir()
            .join(format!("quick-translate-cache-{}", std::process::id()))
            .join("session.json");
        let _ = std::fs::remove_file(&path);

        let first = ResultCache::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(first.get().await.unwrap(), None);
        first.put(entry("Hello\n\nWorld", "ja", "こんにちは\n\n世界")).await.unwrap();

        let second = ResultCache::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(
            second.lookup(&task("Hello\n\nWorld", "ja")).await.unwrap(),
            Some("こんにちは\n\n世界".to_string())
        );

        second.clear().await.unwrap();
        assert!(!path.exists());
        assert_eq!(first.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_replaces_file_without_leftovers() {
        let dir = std::env::temp_dir().join(format!("quick-translate-replace-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("session.json");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, r#"{"task": {"input_text": "Hel"#).unwrap();

        let store = JsonFileStore::new(&path);
        store.save(&entry("Hello", "fr", "Bonjour")).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(entry("Hello", "fr", "Bonjour")));
        assert!(!store.temp_path().exists());
        let names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_error() {
        let path = std::env::temp_dir().join(format!("quick-translate-corrupt-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(crate::error::TranslateError::Store(_))
        ));

        let _ = std::fs::remove_file(&path);
    }
}
