//! Syntax error reporting
//!
//! A [`SyntaxError`] records the parse state, the byte offset where parsing got
//! stuck, and a short window of surrounding source with a caret under the
//! offending position. In strict mode it is returned from
//! [`parse`](super::parse); in tolerant mode it is stored on the tree instead.

use super::kind::NodeKind;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Bytes of source shown on each side of the error offset
const CONTEXT_RADIUS: usize = 30;

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultKind {
    /// Input ended while a tag, string, or bracket was still open
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The cursor stopped advancing
    #[error("endless loop detected")]
    EndlessLoop,

    /// A control tag's body ended without a matching closing tag
    #[error("unclosed tag `{name}`")]
    UnclosedTag { name: String },
}

/// A fatal or recorded template syntax error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to parse template in state {state} at offset {offset}: {kind}\n{context}")]
pub struct SyntaxError {
    pub kind: FaultKind,
    /// Kind of the context being scanned when the fault was raised
    pub state: NodeKind,
    /// Byte offset into the source
    pub offset: usize,
    /// Quoted source window and caret line
    pub context: String,
}

impl SyntaxError {
    pub fn new(source: &str, kind: FaultKind, state: NodeKind, offset: usize) -> Self {
        SyntaxError {
            kind,
            state,
            offset,
            context: context_window(source, offset),
        }
    }

    /// Short one-line description without the source window
    pub fn summary(&self) -> String {
        format!(
            "{} in state {} at offset {}",
            self.kind, self.state, self.offset
        )
    }
}

impl Serialize for SyntaxError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.summary())
    }
}

fn floor_boundary(source: &str, mut i: usize) -> usize {
    i = i.min(source.len());
    while !source.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(source: &str, mut i: usize) -> usize {
    i = i.min(source.len());
    while !source.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// JSON-quoted window around `offset` plus a caret pointing at it.
fn context_window(source: &str, offset: usize) -> String {
    let at = floor_boundary(source, offset);
    let start = floor_boundary(source, at.saturating_sub(CONTEXT_RADIUS));
    let end = ceil_boundary(source, at + CONTEXT_RADIUS);

    let before = &source[start..at];
    let window = &source[start..end];

    let quoted = serde_json::to_string(window).unwrap_or_else(|_| window.to_string());
    // opening quote plus the escaped prefix
    let column = serde_json::to_string(before)
        .map(|q| q.chars().count() - 1)
        .unwrap_or(before.chars().count() + 1);

    format!("{}\n{}^", quoted, " ".repeat(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_state_and_offset() {
        let err = SyntaxError::new("{{ hello", FaultKind::UnexpectedEof, NodeKind::TagOutput, 8);
        let text = err.to_string();
        assert!(text.starts_with(
            "failed to parse template in state TAG_OUTPUT at offset 8: unexpected end of input"
        ));
    }

    #[test]
    fn test_caret_points_at_offset() {
        let err = SyntaxError::new("abc def", FaultKind::EndlessLoop, NodeKind::Expression, 4);
        let mut lines = err.context.lines();
        assert_eq!(lines.next(), Some("\"abc def\""));
        // quote + "abc " puts the caret under 'd'
        assert_eq!(lines.next(), Some("     ^"));
    }

    #[test]
    fn test_window_is_bounded() {
        let source = "x".repeat(200);
        let err = SyntaxError::new(&source, FaultKind::EndlessLoop, NodeKind::Text, 100);
        let first = err.context.lines().next().unwrap_or_default();
        assert_eq!(first.len(), 2 * CONTEXT_RADIUS + 2);
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let source = "ééééééééééééééééééééééééé{{";
        // offset inside a multi-byte character must not panic
        let err = SyntaxError::new(source, FaultKind::UnexpectedEof, NodeKind::TagOutput, 3);
        assert!(err.context.contains('^'));
    }

    #[test]
    fn test_unclosed_tag_message() {
        let kind = FaultKind::UnclosedTag {
            name: "for".to_string(),
        };
        assert_eq!(kind.to_string(), "unclosed tag `for`");
    }
}
