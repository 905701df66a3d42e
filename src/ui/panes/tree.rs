//! Syntax tree pane
//!
//! The tree is flattened into one [`TreeRow`] per node in pre-order, indented
//! by depth. Closing tags reached only through `closing_tag` are listed under
//! their opener so every tag in the source has a row.

use crate::parser::{NodeId, NodeKind, NodeRef, Tree};
use crate::print::describe;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// One visible line of the tree pane
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub id: NodeId,
    pub kind: NodeKind,
    pub depth: usize,
    pub label: String,
    pub has_error: bool,
}

/// Flatten `tree` into display rows
pub fn flatten_tree(tree: &Tree<'_>) -> Vec<TreeRow> {
    let mut rows = Vec::with_capacity(tree.len());
    push_rows(&mut rows, tree.root(), 0);
    rows
}

fn push_rows(rows: &mut Vec<TreeRow>, node: NodeRef<'_>, depth: usize) {
    rows.push(TreeRow {
        id: node.id(),
        kind: node.kind(),
        depth,
        label: format!("{}{}", node.kind(), describe(node)),
        has_error: node.error().is_some(),
    });
    for child in node.children() {
        push_rows(rows, child, depth + 1);
    }
    if let Some(closer) = node.closing_tag() {
        push_rows(rows, closer, depth);
    }
}

/// Scroll state for the tree pane
#[derive(Debug, Default)]
pub struct TreeScrollState {
    pub offset: usize,
}

pub fn render_tree_pane(
    frame: &mut Frame,
    area: Rect,
    rows: &[TreeRow],
    selected: usize,
    is_focused: bool,
    scroll_state: &mut TreeScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" Tree ({} nodes) ", rows.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // Keep the selection on screen
    if selected < scroll_state.offset {
        scroll_state.offset = selected;
    } else if selected >= scroll_state.offset + visible_height {
        scroll_state.offset = selected + 1 - visible_height;
    }

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, row)| {
            let is_selected = idx == selected;
            let (kind, detail) = row
                .label
                .split_once(' ')
                .map_or((row.label.as_str(), ""), |(k, d)| (k, d));

            let kind_style = if row.has_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.kind_color(row.kind))
            };

            let mut spans = vec![
                Span::raw("  ".repeat(row.depth)),
                Span::styled(kind.to_string(), kind_style),
            ];
            if !detail.is_empty() {
                spans.push(Span::styled(
                    format!(" {}", detail),
                    Style::default().fg(DEFAULT_THEME.fg),
                ));
            }
            if row.has_error {
                spans.push(Span::styled(" !", Style::default().fg(DEFAULT_THEME.error)));
            }

            if is_selected {
                let highlight = Style::default()
                    .bg(DEFAULT_THEME.current_line_bg)
                    .add_modifier(Modifier::BOLD);
                for span in &mut spans {
                    span.style = span.style.patch(highlight);
                }
            }

            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}
