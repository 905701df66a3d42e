//! Twig template parser
//!
//! This module turns template text into a position-annotated syntax tree:
//! - [`kind`]: the closed set of node kinds and their is-a hierarchy
//! - [`node`]: the node arena ([`Tree`]) and borrowed node handles
//! - [`lexer`]: byte probes over the source and string literal decoding
//! - [`error`]: [`SyntaxError`] and the fault kinds
//! - [`options`]: [`ParseOptions`]
//!
//! # Parser Implementation
//!
//! A single forward-only recursive matcher. Each node kind has a step function
//! (in `text`, `expressions` and `linker`) that looks at the current byte and
//! either opens a nested node, closes the current one, or moves on. Closing
//! tags are matched to their openers while scanning, so the tree comes out
//! fully linked.
//!
//! In strict mode (the default) the first syntax error is returned. In tolerant
//! mode the parser records errors on the tree and resumes after the nearest
//! enclosing control tag.

pub mod error;
pub mod kind;
pub mod lexer;
pub mod node;
pub mod options;

mod engine;
mod expressions;
mod linker;
mod operators;
mod text;

pub use error::{FaultKind, SyntaxError};
pub use kind::NodeKind;
pub use linker::{is_closer_name, is_self_closing};
pub use node::{Node, NodeId, NodeRef, Tree, Value};
pub use options::ParseOptions;

use engine::Engine;
use tracing::debug_span;

/// Parse `source` with default (strict) options.
///
/// ```
/// let tree = twig_ast::parse("Hello {{ name }}").unwrap();
/// let tag = tree.root().child(1).unwrap();
/// assert_eq!(tag.match_text(), "{{ name }}");
/// ```
pub fn parse(source: &str) -> Result<Tree<'_>, SyntaxError> {
    parse_with_options(source, ParseOptions::default())
}

/// Parse `source`.
///
/// With `throw_syntax_errors` off this never fails; errors are recorded on the
/// returned tree instead (see [`Tree::errors`]).
pub fn parse_with_options(source: &str, options: ParseOptions) -> Result<Tree<'_>, SyntaxError> {
    let _span = debug_span!("parse", len = source.len(), strict = options.throw_syntax_errors)
        .entered();
    Engine::new(source, options).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let tree = parse("").unwrap();
        let root = tree.root();
        assert_eq!(root.kind(), NodeKind::Text);
        assert_eq!(root.child_count(), 0);
        assert_eq!((root.start(), root.end()), (0, Some(0)));
    }

    #[test]
    fn test_plain_text_is_one_literal() {
        let tree = parse("just text").unwrap();
        assert_eq!(tree.len(), 2);
        let literal = tree.root().child(0).unwrap();
        assert_eq!(literal.kind(), NodeKind::Literal);
        assert_eq!(literal.value().and_then(Value::as_str), Some("just text"));
    }

    #[test]
    fn test_iter_lists_closers_after_the_opener_subtree() {
        let tree = parse("{% if a %}x{% endif %}").unwrap();
        let kinds: Vec<_> = tree.iter().map(|n| (n.kind(), n.name())).collect();
        assert_eq!(kinds.len(), tree.len());
        assert_eq!(kinds[1], (NodeKind::TagControl, Some("if")));
        assert_eq!(kinds.last(), Some(&(NodeKind::TagControl, Some("endif"))));
        assert_eq!(tree.root().child_count(), 1);
    }

    #[test]
    fn test_tolerant_never_fails() {
        for source in ["{{", "{%", "{% if %}", "{{ 'x", "{% for a in b %}{{ c }"] {
            let tree = parse_with_options(source, ParseOptions::tolerant()).unwrap();
            assert!(tree.has_errors(), "{source:?} should record an error");
        }
    }
}
