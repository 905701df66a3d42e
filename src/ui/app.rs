//! Main TUI application state and logic

use crate::parser::Tree;
use crate::ui::panes::{
    flatten_tree, render_source_pane, render_status_bar, render_tree_pane, SourceScrollState,
    StatusRenderData, TreeRow, TreeScrollState,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const PAGE: usize = 10;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Tree,
    Source,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Tree => FocusedPane::Source,
            FocusedPane::Source => FocusedPane::Tree,
        }
    }
}

/// The main application state
pub struct App<'a> {
    tree: &'a Tree<'a>,

    /// Flattened tree, one row per node
    pub rows: Vec<TreeRow>,

    /// Index into `rows`
    pub selected: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    pub tree_scroll: TreeScrollState,
    pub source_scroll: SourceScrollState,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl<'a> App<'a> {
    pub fn new(tree: &'a Tree<'a>) -> Self {
        let rows = flatten_tree(tree);
        let errors = rows.iter().filter(|r| r.has_error).count();
        App {
            tree,
            rows,
            selected: 0,
            focused_pane: FocusedPane::Tree,
            tree_scroll: TreeScrollState::default(),
            source_scroll: SourceScrollState::default(),
            should_quit: false,
            status_message: if errors == 0 {
                String::from("Parsed")
            } else {
                String::from("Parsed with errors, press e to visit them")
            },
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Byte span of the selected node; open nodes run to the end of input
    pub fn selected_span(&self) -> (usize, usize) {
        self.rows
            .get(self.selected)
            .and_then(|row| self.tree.get(row.id))
            .map_or((0, 0), |node| {
                let end = node.end().unwrap_or(self.tree.source().len());
                (node.start(), end)
            })
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(main_chunks[0]);

        render_tree_pane(
            frame,
            columns[0],
            &self.rows,
            self.selected,
            self.focused_pane == FocusedPane::Tree,
            &mut self.tree_scroll,
        );

        let span = self.selected_span();
        render_source_pane(
            frame,
            columns[1],
            self.tree.source(),
            span,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let node = self
            .rows
            .get(self.selected)
            .and_then(|row| self.tree.get(row.id));
        let kind = node.map_or("", |n| n.kind().name());
        let data = StatusRenderData {
            kind,
            start: node.map_or(0, |n| n.start()),
            end: node.and_then(|n| n.end()),
            error_count: self.rows.iter().filter(|r| r.has_error).count(),
            message: &self.status_message,
        };
        render_status_bar(frame, main_chunks[1], &data);
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Char('e') => self.next_error(),
            KeyCode::Up | KeyCode::Char('k') => self.move_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(1),
            KeyCode::PageUp => self.move_up(PAGE),
            KeyCode::PageDown => self.move_down(PAGE),
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(self.rows.len().saturating_sub(1)),
            _ => {}
        }
    }

    fn move_up(&mut self, by: usize) {
        match self.focused_pane {
            FocusedPane::Tree => self.select(self.selected.saturating_sub(by)),
            FocusedPane::Source => {
                self.source_scroll.follow = false;
                self.source_scroll.offset = self.source_scroll.offset.saturating_sub(by);
            }
        }
    }

    fn move_down(&mut self, by: usize) {
        match self.focused_pane {
            FocusedPane::Tree => self.select(self.selected.saturating_add(by)),
            FocusedPane::Source => {
                self.source_scroll.follow = false;
                self.source_scroll.offset = self.source_scroll.offset.saturating_add(by);
            }
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index.min(self.rows.len().saturating_sub(1));
        self.source_scroll.follow = true;
    }

    /// Select the next row carrying an error, wrapping around
    fn next_error(&mut self) {
        let len = self.rows.len();
        let found = (1..=len)
            .map(|step| (self.selected + step) % len.max(1))
            .find(|&i| self.rows[i].has_error);

        match found {
            Some(i) => {
                self.select(i);
                self.status_message = format!("Error at row {}", i + 1);
            }
            None => {
                self.status_message = "No errors".to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_with_options, ParseOptions};
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App<'_>, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_movement_is_clamped() {
        let tree = parse("a {{ b }} c").unwrap();
        let mut app = App::new(&tree);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected, 0);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected, app.rows.len() - 1);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.selected, 0);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected, 1);
        assert_eq!(app.selected_span(), (0, 2));
    }

    #[test]
    fn test_source_focus_scrolls_instead_of_selecting() {
        let tree = parse("a\nb\nc").unwrap();
        let mut app = App::new(&tree);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Source);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, 0);
        assert_eq!(app.source_scroll.offset, 1);
        assert!(!app.source_scroll.follow);
    }

    #[test]
    fn test_next_error_wraps() {
        let tree = parse_with_options("{{ 'x", ParseOptions::tolerant()).unwrap();
        let mut app = App::new(&tree);
        press(&mut app, KeyCode::Char('e'));
        let first = app.selected;
        assert!(app.rows[first].has_error);
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.selected, first);
        assert_eq!(app.rows[first].label, "STRING");
    }

    #[test]
    fn test_no_errors_message() {
        let tree = parse("plain").unwrap();
        let mut app = App::new(&tree);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.selected, 0);
        assert_eq!(app.status_message, "No errors");
    }

    #[test]
    fn test_quit_keys() {
        let tree = parse("").unwrap();
        let mut app = App::new(&tree);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }
}
