//! Tag/block linking
//!
//! Closing tags are matched dynamically: a closer binds to the nearest
//! enclosing `TAG_CONTROL` of the right family, found by walking `parent`
//! links upward from the block that contains it. `else` and `elseif` belong to
//! the `if` family; any other closer strips its `end` prefix (`endfor` → `for`).
//!
//! An `if` with branches is threaded into one chain:
//!
//! ```text
//! TAG_CONTROL if
//! ├ TAG_ARGUMENT        condition
//! ├ BLOCK               first body
//! ├ TAG_CONTROL elseif
//! │ ├ TAG_ARGUMENT      branch condition
//! │ └ BLOCK             branch body
//! └ TAG_CONTROL else
//!   └ BLOCK             last body
//! ```
//!
//! The terminal closer (`endif`) is not a child. It is reached through the
//! opener's `closing_tag`, and points back through `opening_tag`.

use super::engine::{Engine, Scan, Step};
use super::error::FaultKind;
use super::kind::NodeKind;
use super::node::NodeId;
use tracing::{debug, trace};

/// Tags that never open a body
pub const SELF_CLOSING: [&str; 3] = ["set", "import", "include"];

/// `else` / `elseif`
pub fn is_branch_name(name: &str) -> bool {
    name == "else" || name == "elseif"
}

/// Names that close (or continue) an open control tag
pub fn is_closer_name(name: &str) -> bool {
    name.starts_with("end") || is_branch_name(name)
}

pub fn is_self_closing(name: &str) -> bool {
    SELF_CLOSING.contains(&name)
}

/// Name of the control tag a closer belongs to
pub fn opener_name(closer: &str) -> &str {
    if is_branch_name(closer) {
        "if"
    } else {
        closer.strip_prefix("end").unwrap_or(closer)
    }
}

impl Engine<'_> {
    /// Nearest `TAG_CONTROL` at or above `from` that `closer` can close
    pub(crate) fn find_opening_tag(&self, closer: &str, from: NodeId) -> Option<NodeId> {
        let target = opener_name(closer);
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.kind == NodeKind::TagControl && node.name.as_deref() == Some(target) {
                return Some(id);
            }
            cursor = node.parent;
        }
        None
    }

    /// Handle a closing tag met inside `block`.
    pub(crate) fn bind_closer(&mut self, block: NodeId, closer: NodeId) -> Step {
        let name = self.nodes[closer].name.clone().unwrap_or_default();
        let at = self.nodes[closer].start;

        match self.find_opening_tag(&name, block) {
            Some(opener) if self.nodes[block].parent == Some(opener) => {
                self.nodes[opener].closing_tag = Some(closer);
                self.nodes[opener].block = Some(block);
                self.nodes[closer].opening_tag = Some(opener);
                self.nodes[closer].block = Some(block);
                self.nodes[block].end = Some(at);
                trace!(closer = %name, opener, "linked");
                Step::Done
            }
            Some(opener) => {
                // belongs further up: end this block before it and let the
                // enclosing block read it again
                debug!(closer = %name, opener, offset = at, "closer skips an open tag");
                self.discard(closer);
                self.nodes[block].end = Some(at);
                Step::Done
            }
            None => {
                debug!(closer = %name, offset = at, "stray closing tag");
                self.adopt(block, closer);
                Step::Goto(self.end_of(closer))
            }
        }
    }

    /// Parse the body of control tag `id`, whose header ends at `at`.
    ///
    /// Each `BLOCK` goes to the current branch owner (the opener, then each
    /// `elseif`/`else` in turn); branch closers become children of the opener.
    pub(crate) fn scan_body(&mut self, id: NodeId, name: &str, mut at: usize) -> Scan<()> {
        let mut owner = id;

        loop {
            self.nodes[id].closing_tag = None;
            let block = match self.enter(NodeKind::Block, at, 0, Some(id)) {
                Ok(block) => block,
                Err(fault) => {
                    self.adopt(owner, fault.node);
                    return Err(fault);
                }
            };
            self.adopt(owner, block);

            let Some(closer) = self.nodes[id].closing_tag else {
                let offset = self.end_of(block);
                return Err(self.raise(
                    id,
                    NodeKind::TagControl,
                    FaultKind::UnclosedTag {
                        name: name.to_string(),
                    },
                    offset,
                ));
            };

            if self.nodes[closer]
                .name
                .as_deref()
                .is_some_and(is_branch_name)
            {
                self.adopt(id, closer);
                owner = closer;
                at = self.end_of(closer);
                continue;
            }

            let end = self.end_of(closer);
            let error = self.nodes[closer].error.clone();
            let tag = &mut self.nodes[id];
            tag.end = Some(end);
            tag.closing = Some(false);
            if error.is_some() {
                tag.error = error;
            }
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_with_options, ParseOptions};

    #[test]
    fn test_opener_names() {
        assert_eq!(opener_name("endif"), "if");
        assert_eq!(opener_name("endfor"), "for");
        assert_eq!(opener_name("else"), "if");
        assert_eq!(opener_name("elseif"), "if");
        assert_eq!(opener_name("endwith"), "with");
    }

    #[test]
    fn test_name_classes() {
        assert!(is_closer_name("endblock"));
        assert!(is_closer_name("else"));
        assert!(!is_closer_name("elsewhere"));
        assert!(!is_closer_name("if"));
        assert!(is_self_closing("set"));
        assert!(!is_self_closing("with"));
    }

    #[test]
    fn test_balanced_link() {
        let tree = parse("{% if a %}x{% endif %}").unwrap();
        let tag = tree.root().child(0).unwrap();
        let closer = tag.closing_tag().unwrap();
        assert_eq!(closer.name(), Some("endif"));
        assert_eq!(closer.opening_tag().unwrap().id(), tag.id());
        assert_eq!(tag.block().unwrap().id(), closer.block().unwrap().id());
        assert_eq!(tag.closing(), Some(false));
        assert_eq!(tag.match_text(), "{% if a %}x{% endif %}");
    }

    #[test]
    fn test_branch_chain() {
        let tree = parse("{% if a %}A{% elseif b %}B{% else %}C{% endif %}").unwrap();
        let tag = tree.root().child(0).unwrap();
        assert_eq!(tag.child_count(), 4);
        assert_eq!(tag.descend(&[1, 0]).unwrap().match_text(), "A");

        let elseif = tag.child(2).unwrap();
        assert_eq!(elseif.name(), Some("elseif"));
        assert_eq!(elseif.descend(&[0, 0]).unwrap().name(), Some("b"));
        assert_eq!(elseif.descend(&[1, 0]).unwrap().match_text(), "B");
        assert_eq!(elseif.opening_tag().unwrap().id(), tag.id());

        let other = tag.child(3).unwrap();
        assert_eq!(other.name(), Some("else"));
        assert_eq!(other.descend(&[0, 0]).unwrap().match_text(), "C");

        assert_eq!(tag.closing_tag().unwrap().name(), Some("endif"));
    }

    #[test]
    fn test_unclosed_tag_strict() {
        let err = parse("{% for x in y %}body").unwrap_err();
        assert_eq!(err.kind, FaultKind::UnexpectedEof);
        assert_eq!(err.state, NodeKind::Block);
    }

    #[test]
    fn test_mismatched_closer_binds_outward() {
        let source = "{% if a %}{% for x in y %}{% endif %}";
        let err = parse(source).unwrap_err();
        assert_eq!(
            err.kind,
            FaultKind::UnclosedTag {
                name: "for".to_string()
            }
        );

        let tree = parse_with_options(source, ParseOptions::tolerant()).unwrap();
        let tag = tree.root().child(0).unwrap();
        assert_eq!(tag.name(), Some("if"));
        assert_eq!(tag.closing_tag().unwrap().name(), Some("endif"));

        let inner = tag.descend(&[1, 0]).unwrap();
        assert_eq!(inner.name(), Some("for"));
        assert!(inner.error().is_some());
        let marker = inner.closing_tag().unwrap();
        assert_eq!(marker.kind(), NodeKind::Error);
        assert_eq!(marker.opening_tag().unwrap().id(), inner.id());
    }

    #[test]
    fn test_stray_closer_in_block() {
        let tree = parse("{% if a %}{% endfoo %}{% endif %}").unwrap();
        let tag = tree.root().child(0).unwrap();
        let stray = tag.descend(&[1, 0]).unwrap();
        assert_eq!(stray.name(), Some("endfoo"));
        assert_eq!(stray.opening_tag().map(|t| t.id()), None);
        assert_eq!(tag.closing_tag().unwrap().name(), Some("endif"));
    }
}
