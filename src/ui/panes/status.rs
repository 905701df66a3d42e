//! Status bar rendering with keybindings and selection info

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// What the status bar shows about the current selection
pub struct StatusRenderData<'a> {
    pub kind: &'a str,
    pub start: usize,
    pub end: Option<usize>,
    pub error_count: usize,
    pub message: &'a str,
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: &StatusRenderData<'_>) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let has_errors = data.error_count > 0;
    let end = data
        .end
        .map_or_else(|| "?".to_string(), |end| end.to_string());

    let mut left_spans = vec![
        Span::styled(
            format!(" {} ", data.kind),
            Style::default()
                .bg(DEFAULT_THEME.badge)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}..{} ", data.start, end),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.accent),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
    ];

    if has_errors {
        left_spans.push(Span::styled(
            format!(" {} error(s) ", data.error_count),
            Style::default()
                .bg(DEFAULT_THEME.error)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        left_spans.push(Span::styled(
            " OK ",
            Style::default()
                .bg(DEFAULT_THEME.success)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    left_spans.push(Span::styled(
        format!(" {} ", data.message),
        Style::default()
            .bg(DEFAULT_THEME.current_line_bg)
            .fg(DEFAULT_THEME.fg),
    ));

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);

    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in [
        (" ↑/↓ ", " move "),
        (" PgUp/PgDn ", " page "),
        (" e ", " next error "),
        (" ⇥ ", " pane "),
        ("q", " quit "),
    ]
    .into_iter()
    .enumerate()
    {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(key, key_style));
        right_spans.push(Span::styled(desc, desc_style));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);

    frame.render_widget(right_paragraph, layout[1]);
}
