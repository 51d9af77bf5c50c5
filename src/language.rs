//! Language codes
//!
//! `LanguageCode` is a validated BCP 47 tag kept in canonical form, so two
//! codes spelled differently (`EN-us`, `en-US`) compare equal when used as
//! part of a cache key.

use crate::error::{TranslateError, TranslateResult};
use icu_locale::Locale;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language assumed when detection produces no usable result
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and canonicalize a language tag
    ///
    /// ```
    /// use quick_translate::LanguageCode;
    ///
    /// let code = LanguageCode::parse("pt-br").unwrap();
    /// assert_eq!(code.as_str(), "pt-BR");
    /// assert_eq!(code.base_language(), "pt");
    /// ```
    pub fn parse(tag: &str) -> TranslateResult<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(TranslateError::InvalidLanguage(
                "Language code is empty".to_string(),
            ));
        }

        let locale: Locale = tag
            .parse()
            .map_err(|e| TranslateError::InvalidLanguage(format!("'{}': {}", tag, e)))?;

        Ok(LanguageCode(locale.to_string()))
    }

    /// The default source language used when detection falls back
    pub fn fallback() -> Self {
        LanguageCode(DEFAULT_SOURCE_LANGUAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language subtag without script or region (`zh-Hant` → `zh`)
    pub fn base_language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Candidate codes from most to least specific: `pt-BR`, `pt`
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain = vec![self.0.clone()];
        let mut current = self.0.as_str();
        while let Some(idx) = current.rfind('-') {
            current = &current[..idx];
            chain.push(current.to_string());
        }
        chain
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = TranslateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LanguageCode::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::parse(s)
    }
}
