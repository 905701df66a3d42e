//! Template source pane
//!
//! Shows the template with line numbers and paints the byte span of the
//! selected node. Tag delimiters (`{{ }}`, `{% %}`) get their own color so the
//! tag structure stays readable while browsing.
//!
//! # Scrolling
//!
//! While `follow` is set the pane keeps the first line of the selected span in
//! view. Scrolling the pane by hand clears it until the selection moves again.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Scroll state for the source pane
#[derive(Debug)]
pub struct SourceScrollState {
    pub offset: usize,
    pub follow: bool,
}

impl Default for SourceScrollState {
    fn default() -> Self {
        SourceScrollState {
            offset: 0,
            follow: true,
        }
    }
}

/// Byte range of each line, without its line terminator
pub fn line_ranges(source: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for line in source.split_inclusive('\n') {
        let text = line.trim_end_matches(['\n', '\r']);
        ranges.push((start, start + text.len()));
        start += line.len();
    }
    if ranges.is_empty() {
        ranges.push((0, 0));
    }
    ranges
}

/// Zero-based line containing byte `offset`
pub fn line_of(ranges: &[(usize, usize)], offset: usize) -> usize {
    ranges
        .iter()
        .rposition(|&(start, _)| start <= offset)
        .unwrap_or(0)
}

/// Split one line into styled spans, marking the part inside `span`
fn highlight_line(text: &str, line_start: usize, span: (usize, usize)) -> Vec<Span<'_>> {
    let line_end = line_start + text.len();
    let from = span.0.clamp(line_start, line_end) - line_start;
    let to = span.1.clamp(line_start, line_end) - line_start;

    if from >= to || !text.is_char_boundary(from) || !text.is_char_boundary(to) {
        return delimiter_spans(text, Style::default());
    }

    let selected = Style::default()
        .bg(DEFAULT_THEME.span_bg)
        .add_modifier(Modifier::BOLD);

    let mut spans = delimiter_spans(&text[..from], Style::default());
    spans.extend(delimiter_spans(&text[from..to], selected));
    spans.extend(delimiter_spans(&text[to..], Style::default()));
    spans
}

/// Color `{{`, `}}`, `{%` and `%}` on top of `base`
fn delimiter_spans(text: &str, base: Style) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut plain = 0;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i + 1 < bytes.len() {
        let pair = &bytes[i..i + 2];
        if matches!(pair, b"{{" | b"}}" | b"{%" | b"%}") {
            if plain < i {
                spans.push(Span::styled(&text[plain..i], base.fg(DEFAULT_THEME.fg)));
            }
            spans.push(Span::styled(&text[i..i + 2], base.fg(DEFAULT_THEME.delimiter)));
            i += 2;
            plain = i;
        } else {
            i += 1;
        }
    }

    if plain < text.len() {
        spans.push(Span::styled(&text[plain..], base.fg(DEFAULT_THEME.fg)));
    }
    spans
}

/// Render the source pane. `span` is the selected node's byte range.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source: &str,
    span: (usize, usize),
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" Source [{}..{}] ", span.0, span.1))
        .borders(Borders::ALL)
        .border_style(border_style);

    let ranges = line_ranges(source);
    let total_lines = ranges.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    if scroll_state.follow {
        let first = line_of(&ranges, span.0);
        if first < scroll_state.offset || first >= scroll_state.offset + visible_height {
            scroll_state.offset = first.saturating_sub(visible_height / 3);
        }
    }
    scroll_state.offset = scroll_state
        .offset
        .min(total_lines.saturating_sub(visible_height));

    let lines: Vec<Line> = ranges
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, &(start, end))| {
            let text = source.get(start..end).unwrap_or("");
            let touches = span.0 < end.max(start + 1) && span.1 > start;
            let num_style = if touches {
                Style::default()
                    .fg(DEFAULT_THEME.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut spans = vec![Span::styled(format!("{:4} ", idx + 1), num_style)];
            spans.extend(highlight_line(text, start, span));
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ranges() {
        assert_eq!(line_ranges("ab\ncd\r\n\nx"), vec![(0, 2), (3, 5), (7, 7), (8, 9)]);
        assert_eq!(line_ranges(""), vec![(0, 0)]);
    }

    #[test]
    fn test_line_of() {
        let ranges = line_ranges("ab\ncd\nef");
        assert_eq!(line_of(&ranges, 0), 0);
        assert_eq!(line_of(&ranges, 2), 0);
        assert_eq!(line_of(&ranges, 3), 1);
        assert_eq!(line_of(&ranges, 100), 2);
    }

    #[test]
    fn test_highlight_splits_at_span() {
        let spans = highlight_line("Hi {{ x }}!", 0, (3, 10));
        let text: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, vec!["Hi ", "{{", " x ", "}}", "!"]);
        assert_eq!(spans[1].style.bg, Some(DEFAULT_THEME.span_bg));
        assert_eq!(spans[0].style.bg, None);
        assert_eq!(spans[1].style.fg, Some(DEFAULT_THEME.delimiter));
    }
}
