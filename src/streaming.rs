use crate::error::TranslateResult;
use crate::model::Translator;
use futures::StreamExt;

/// Translate one content segment by consuming the translator's chunk stream
///
/// Every chunk is appended to the segment's running text and `on_chunk` is
/// called with that text before the next chunk is awaited. Stream errors are
/// returned unchanged; the partial text is discarded.
pub async fn translate_segment<F>(
    translator: &dyn Translator,
    text: &str,
    mut on_chunk: F,
) -> TranslateResult<String>
where
    F: FnMut(&str),
{
    let mut stream = translator.translate_streaming(text);
    let mut partial = String::new();

    while let Some(chunk) = stream.next().await {
        partial.push_str(&chunk?);
        on_chunk(&partial);
    }

    Ok(partial)
}
