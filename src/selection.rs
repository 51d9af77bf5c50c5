use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

/// Reads the text the user selected in the host page
#[async_trait]
pub trait SelectionSource: Send + Sync {
    /// The current selection; empty when nothing is selected
    async fn selected_text(&self) -> TranslateResult<String>;
}

/// A selection fixed at construction time
#[derive(Debug, Clone, Default)]
pub struct StaticSelection(pub String);

impl StaticSelection {
    pub fn new(text: &str) -> Self {
        StaticSelection(text.to_string())
    }
}

#[async_trait]
impl SelectionSource for StaticSelection {
    async fn selected_text(&self) -> TranslateResult<String> {
        Ok(self.0.clone())
    }
}

/// Selection read from standard input until EOF
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSelection;

#[async_trait]
impl SelectionSource for StdinSelection {
    async fn selected_text(&self) -> TranslateResult<String> {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| TranslateError::SelectionBlocked(e.to_string()))?;
        Ok(text)
    }
}
