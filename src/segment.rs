//! Paragraph-aware text segmentation
//!
//! Input text is split on paragraph breaks (two or more consecutive line
//! breaks, `\n` or `\r\n`). The breaks themselves are kept as segments so the
//! concatenation of every segment reproduces the input exactly.
//!
//! # Example
//!
//! ```
//! use quick_translate::segment::{segment, SegmentKind};
//!
//! let kinds: Vec<_> = segment("Hello\n\nWorld").map(|s| s.kind).collect();
//! assert_eq!(kinds, vec![SegmentKind::Content, SegmentKind::Break, SegmentKind::Content]);
//! ```

use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").expect("paragraph break pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Text between paragraph breaks, possibly containing single line breaks
    Content,
    /// A maximal run of two or more line breaks
    Break,
}

/// A contiguous slice of the input classified as content or paragraph break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

impl<'a> Segment<'a> {
    pub fn content(text: &'a str) -> Self {
        Segment {
            kind: SegmentKind::Content,
            text,
        }
    }

    pub fn paragraph_break(text: &'a str) -> Self {
        Segment {
            kind: SegmentKind::Break,
            text,
        }
    }

    /// Whether this segment should be sent to a translation model
    ///
    /// Breaks and whitespace-only content are passed through verbatim.
    pub fn is_translatable(&self) -> bool {
        self.kind == SegmentKind::Content && !self.text.trim().is_empty()
    }
}

/// Iterator over the segments of a text
///
/// Cloning the iterator restarts the sequence from the clone's position.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let start = self.pos;
        match PARAGRAPH_BREAK.find_at(self.text, start) {
            Some(m) if m.start() == start => {
                self.pos = m.end();
                Some(Segment::paragraph_break(m.as_str()))
            }
            Some(m) => {
                self.pos = m.start();
                Some(Segment::content(&self.text[start..m.start()]))
            }
            None => {
                self.pos = self.text.len();
                Some(Segment::content(&self.text[start..]))
            }
        }
    }
}

/// Split `text` into content and paragraph-break segments
pub fn segment(text: &str) -> Segments<'_> {
    Segments { text, pos: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<(SegmentKind, &str)> {
        segment(text).map(|s| (s.kind, s.text)).collect()
    }

    #[test]
    fn test_round_trip_reproduces_input() {
        let inputs = [
            "",
            "Hello",
            "Hello\n\nWorld",
            "\n\nleading",
            "trailing\n\n\n",
            "a\r\n\r\nb\n\n\nc",
            "line one\nline two",
            "  \n\n  \n\n",
            "\r\n",
            "mixed\n\r\nbreaks\r\n\nhere",
            "unicode ✓ テキスト\n\nçà",
        ];
        for input in inputs {
            let rebuilt: String = segment(input).map(|s| s.text).collect();
            assert_eq!(rebuilt, input, "round trip failed for {:?}", input);
        }
    }

    #[test]
    fn test_double_line_break_is_break_segment() {
        assert_eq!(
            collect("Hello\n\nWorld"),
            vec![
                (SegmentKind::Content, "Hello"),
                (SegmentKind::Break, "\n\n"),
                (SegmentKind::Content, "World"),
            ]
        );
    }

    #[test]
    fn test_longer_break_runs_stay_whole() {
        assert_eq!(
            collect("a\n\n\n\nb"),
            vec![
                (SegmentKind::Content, "a"),
                (SegmentKind::Break, "\n\n\n\n"),
                (SegmentKind::Content, "b"),
            ]
        );
    }

    #[test]
    fn test_crlf_breaks() {
        assert_eq!(
            collect("a\r\n\r\nb"),
            vec![
                (SegmentKind::Content, "a"),
                (SegmentKind::Break, "\r\n\r\n"),
                (SegmentKind::Content, "b"),
            ]
        );
    }

    #[test]
    fn test_single_line_break_is_not_split() {
        assert_eq!(
            collect("first line\nsecond line"),
            vec![(SegmentKind::Content, "first line\nsecond line")]
        );
        assert_eq!(collect("a\r\nb"), vec![(SegmentKind::Content, "a\r\nb")]);
    }

    #[test]
    fn test_leading_and_trailing_breaks() {
        assert_eq!(
            collect("\n\nbody\n\n"),
            vec![
                (SegmentKind::Break, "\n\n"),
                (SegmentKind::Content, "body"),
                (SegmentKind::Break, "\n\n"),
            ]
        );
    }

    #[test]
    fn test_empty_input_has_no_segments() {
        assert_eq!(segment("").count(), 0);
    }

    #[test]
    fn test_no_segment_is_empty() {
        for s in segment("\n\n\n\nx\n\n \n\ny") {
            assert!(!s.text.is_empty());
        }
    }

    #[test]
    fn test_whitespace_only_content_is_not_translatable() {
        let segments: Vec<_> = segment("a\n\n   \n\nb").collect();
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[2], Segment::content("   "));
        assert!(!segments[2].is_translatable());
        assert!(!segments[1].is_translatable());
        assert!(segments[0].is_translatable());
        assert!(segments[4].is_translatable());
    }

    #[test]
    fn test_single_newline_alone_is_blank_content() {
        let segments: Vec<_> = segment("\n").collect();
        assert_eq!(segments, vec![Segment::content("\n")]);
        assert!(!segments[0].is_translatable());
    }

    #[test]
    fn test_sequence_is_restartable() {
        let segments = segment("one\n\ntwo\n\nthree");
        let first: Vec<_> = segments.clone().collect();
        let second: Vec<_> = segments.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }
}
