/// Error types for the translation pipeline
///
/// The `Display` output of every variant is the text shown to the user when a
/// run fails, so variants that are raised with an already-localized message
/// print that message verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// The requested language pair has no translation capability
    Unavailable(String),
    /// A detector or translator could not be constructed
    ModelCreation(String),
    /// The detector failed while ranking languages
    Detection(String),
    /// The translation stream failed part way through a segment
    Stream(String),
    /// The page selection could not be read
    SelectionBlocked(String),
    /// The session store could not be read or written
    Store(String),
    /// Transport failure talking to a remote model service
    Network(String),
    /// Invalid configuration (missing endpoint, bad catalog, ...)
    Config(String),
    /// A language code that is not a valid BCP 47 tag
    InvalidLanguage(String),
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::Unavailable(msg) => write!(f, "{}", msg),
            TranslateError::ModelCreation(msg) => write!(f, "{}", msg),
            TranslateError::Detection(msg) => write!(f, "Language detection failed: {}", msg),
            TranslateError::Stream(msg) => write!(f, "{}", msg),
            TranslateError::SelectionBlocked(msg) => write!(f, "{}", msg),
            TranslateError::Store(msg) => write!(f, "Session store error: {}", msg),
            TranslateError::Network(msg) => write!(f, "Network error: {}", msg),
            TranslateError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TranslateError::InvalidLanguage(msg) => write!(f, "Invalid language code: {}", msg),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::Store(err.to_string())
    }
}

impl From<std::io::Error> for TranslateError {
    fn from(err: std::io::Error) -> Self {
        TranslateError::Store(err.to_string())
    }
}

/// Result type for pipeline operations
pub type TranslateResult<T> = Result<T, TranslateError>;
