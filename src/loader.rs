use crate::error::{TranslateError, TranslateResult};
use crate::messages::LocalizedMessages;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Parse a message catalog from JSON text
///
/// Two layouts are accepted, and may be mixed within one file:
/// ```json
/// {
///     "@metadata": { ... },
///     "popup_loading": "Loading",
///     "popup_copied": { "message": "Copied!", "description": "..." }
/// }
/// ```
/// Keys starting with `@` are metadata and ignored.
///
/// `origin` is only used in error messages.
pub fn load_messages_from_str(content: &str, origin: &str) -> TranslateResult<LocalizedMessages> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| TranslateError::Config(format!("Failed to parse JSON from '{}': {}", origin, e)))?;

    let obj = json.as_object().ok_or_else(|| {
        TranslateError::Config(format!("Invalid JSON in '{}': root must be an object", origin))
    })?;

    let mut messages = LocalizedMessages::new();
    for (key, value) in obj {
        if key.starts_with('@') {
            continue;
        }

        let text = match value {
            Value::String(text) => Some(text.as_str()),
            Value::Object(entry) => entry.get("message").and_then(Value::as_str),
            _ => None,
        };

        match text {
            Some(text) => {
                messages.with_message(key, text);
            }
            None => warn!(key = %key, origin, "message is not a string, skipping"),
        }
    }

    Ok(messages)
}

/// Load messages from a single JSON file
pub fn load_messages_from_file(path: &Path) -> TranslateResult<LocalizedMessages> {
    let content = fs::read_to_string(path).map_err(|e| {
        TranslateError::Config(format!("Failed to read file '{}': {}", path.display(), e))
    })?;

    load_messages_from_str(&content, &path.display().to_string())
}

/// Load every catalog found in a directory
///
/// Both `dir/<locale>.json` and the extension layout
/// `dir/<locale>/messages.json` are recognized; the file stem or the
/// subdirectory name is used as the locale code.
pub fn load_all_messages_from_dir(
    dir: &Path,
) -> TranslateResult<HashMap<String, LocalizedMessages>> {
    if !dir.is_dir() {
        return Err(TranslateError::Config(format!(
            "Not a catalog directory: {}",
            dir.display()
        )));
    }

    let mut all_messages = HashMap::new();

    let entries = fs::read_dir(dir).map_err(|e| {
        TranslateError::Config(format!("Failed to read directory '{}': {}", dir.display(), e))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| TranslateError::Config(format!("Error reading directory entry: {}", e)))?
            .path();

        let (locale, file) = if path.is_dir() {
            let file = path.join("messages.json");
            if !file.is_file() {
                continue;
            }
            (path.file_name().and_then(|name| name.to_str()), file)
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            (path.file_stem().and_then(|stem| stem.to_str()), path.clone())
        } else {
            continue;
        };

        let locale = locale
            .ok_or_else(|| TranslateError::Config(format!("Invalid filename: {}", path.display())))?
            .replace('_', "-")
            .to_lowercase();

        let messages = load_messages_from_file(&file)?;
        all_messages.insert(locale, messages);
    }

    if all_messages.is_empty() {
        warn!(dir = %dir.display(), "no message catalogs found");
    }

    Ok(all_messages)
}
