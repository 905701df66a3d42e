//! Plain-text tree dump
//!
//! ```text
//! Tree                                                                            Derived from
//! -----                                                                           -------------
//!   TEXT                                                                          "Hi {{ name }}"
//!   ├ LITERAL                                                                     "Hi "
//!   └ TAG_OUTPUT                                                                  "{{ name }}"
//!     └ EXPRESSION                                                                "name "
//!       └ VARIABLE (name)                                                         "name"
//! ```

use crate::parser::{NodeKind, NodeRef, Tree};
use crossterm::style::Stylize;
use std::fmt::Write;

const TREE_WIDTH: usize = 80;
const BODY_WIDTH: usize = 100;

/// Renders a [`Tree`] as one line per node
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint nodes that carry an error red
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn render(&self, tree: &Tree<'_>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<TREE_WIDTH$}Derived from", "Tree");
        let _ = writeln!(out, "{:<TREE_WIDTH$}-------------", "-----");
        self.render_node(&mut out, tree.root(), "", true);
        out
    }

    fn render_node(&self, out: &mut String, node: NodeRef<'_>, prefix: &str, is_last: bool) {
        let angle = match (prefix.is_empty(), is_last) {
            (true, _) => "",
            (false, true) => "└ ",
            (false, false) => "├ ",
        };
        let indent = if prefix.is_empty() { "  " } else { prefix };

        let mut label = format!("{indent}{angle}{}{}", node.kind(), describe(node));
        if node.error().is_some() {
            label.push_str(" !");
        }
        let label = format!("{label:<TREE_WIDTH$}");
        let label = if self.color && node.error().is_some() {
            label.red().to_string()
        } else {
            label
        };

        let body: String = quote(node.match_text()).chars().take(BODY_WIDTH).collect();
        let _ = writeln!(out, "{label}{body}");

        let child_prefix = format!("{prefix}{}", if is_last { "  " } else { "│ " });
        let count = node.child_count();
        for (i, child) in node.children().enumerate() {
            self.render_node(out, child, &child_prefix, i + 1 == count);
        }
    }
}

/// ` (name=value)`, or empty
pub(crate) fn describe(node: NodeRef<'_>) -> String {
    let value = match node.value() {
        Some(value) if node.kind() != NodeKind::Literal => serde_json::to_string(value)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string(),
        _ => String::new(),
    };

    let parts: Vec<&str> = [node.name().unwrap_or(""), value.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join("="))
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_default()
}

/// Shorthand for `Printer::new().render(tree)`
pub fn render(tree: &Tree<'_>) -> String {
    Printer::new().render(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_with_options, ParseOptions};

    #[test]
    fn test_header_and_rows() {
        let tree = parse("Hi {{ name }}").unwrap();
        let out = render(&tree);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2 + tree.len());
        assert!(lines[0].starts_with("Tree "));
        assert!(lines[0].ends_with("Derived from"));
        assert!(lines[2].starts_with("  TEXT "));
        assert!(lines[3].starts_with("  ├ LITERAL "));
        assert!(lines[3].ends_with("\"Hi \""));
        assert!(lines[4].starts_with("  └ TAG_OUTPUT "));
        assert!(lines[6].contains("VARIABLE (name)"));
    }

    #[test]
    fn test_values_are_unquoted() {
        let tree = parse("{% set a = 'x' %}").unwrap();
        let out = render(&tree);
        assert!(out.contains("OPERATOR (=)"));
        assert!(out.contains("STRING (x)"));
        assert!(out.contains("TAG_CONTROL (set)"));
    }

    #[test]
    fn test_body_is_truncated() {
        let source = format!("{{{{ '{}' }}}}", "x".repeat(300));
        let tree = parse(&source).unwrap();
        let out = render(&tree);
        let line = out.lines().find(|l| l.contains("TAG_OUTPUT")).unwrap();
        assert_eq!(line.chars().count(), TREE_WIDTH + BODY_WIDTH);
    }

    #[test]
    fn test_error_marker() {
        let tree = parse_with_options("{{ 'open", ParseOptions::tolerant()).unwrap();
        let out = Printer::new().render(&tree);
        assert!(out.lines().any(|l| l.contains("STRING !")));
    }
}
