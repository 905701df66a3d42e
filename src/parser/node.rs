//! Syntax tree nodes
//!
//! The tree is an arena: [`Tree`] owns a flat `Vec<Node>` and nodes refer to
//! each other by [`NodeId`]. Only `children` expresses ownership. `parent`,
//! `expr`, `closing_tag`, `opening_tag` and `block` are plain ids used for
//! navigation.
//!
//! # Spans
//!
//! `start` and `end` are byte offsets into the source with an exclusive end, so
//! `&source[start..end]` is the text a node was derived from. `end` is `None`
//! only on nodes left open by a recorded syntax error.
//!
//! Consumers that work with inclusive offsets use [`NodeRef::last`], the
//! offset of the node's final byte. The serialized `end` field is inclusive
//! as well: it is `start - 1` for an empty node.
//!
//! # Serialization
//!
//! [`Tree`] and [`NodeRef`] implement [`serde::Serialize`]. The view omits
//! `parent` and `expr`, and writes tag cross-links as shallow link objects, so
//! the output is acyclic.

use super::error::SyntaxError;
use super::kind::NodeKind;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Index of a node in its [`Tree`]
pub type NodeId = usize;

/// Decoded literal or operator value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// A single tree element
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub start: usize,
    pub end: Option<usize>,
    pub children: Vec<NodeId>,
    /// Identifier, object key, or tag name
    pub name: Option<String>,
    pub value: Option<Value>,
    /// Quote character of a string literal
    pub quote: Option<char>,
    /// The child that stands for this node's expression
    pub expr: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub closing_tag: Option<NodeId>,
    pub opening_tag: Option<NodeId>,
    pub block: Option<NodeId>,
    /// `Some(true)` on closers, `Some(false)` on openers with a body
    pub closing: Option<bool>,
    pub error: Option<SyntaxError>,
}

impl Node {
    pub fn new(kind: NodeKind, start: usize, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            start,
            end: None,
            children: Vec::new(),
            name: None,
            value: None,
            quote: None,
            expr: None,
            parent,
            closing_tag: None,
            opening_tag: None,
            block: None,
            closing: None,
            error: None,
        }
    }

    /// A closed leaf node
    pub fn leaf(kind: NodeKind, start: usize, end: usize, value: Value) -> Self {
        Node {
            end: Some(end),
            value: Some(value),
            ..Node::new(kind, start, None)
        }
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind.is(kind)
    }
}

/// A parsed template: the source text and the node arena
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<'src> {
    source: &'src str,
    nodes: Vec<Node>,
}

impl<'src> Tree<'src> {
    pub(crate) fn new(source: &'src str, nodes: Vec<Node>) -> Self {
        Tree { source, nodes }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// The root `TEXT` node
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { tree: self, id: 0 }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arena order.
    ///
    /// Children come in pre-order. Nodes reached only through a link (a
    /// terminal closing tag, a synthesized `ERROR` marker) follow the whole
    /// subtree of the tag that links to them.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        let root = self.root();
        (0..self.nodes.len()).map(move |id| NodeRef { id, ..root })
    }

    /// Nodes carrying an error, including synthesized `ERROR` nodes
    pub fn errors(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.iter()
            .filter(|n| n.error().is_some() || n.kind() == NodeKind::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

impl Serialize for Tree<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

/// Borrowed handle to one node of a [`Tree`]
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree<'a>,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn at(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.and_then(|id| self.tree.get(id))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node {
        &self.tree.nodes[self.id]
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.node().is(kind)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.node().name.as_deref()
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.node().value.as_ref()
    }

    pub fn quote(&self) -> Option<char> {
        self.node().quote
    }

    pub fn start(&self) -> usize {
        self.node().start
    }

    pub fn end(&self) -> Option<usize> {
        self.node().end
    }

    /// Inclusive offset of the last matched byte.
    ///
    /// `None` while the node is open, and for empty nodes.
    pub fn last(&self) -> Option<usize> {
        let start = self.start();
        self.end()
            .and_then(|end| end.checked_sub(1))
            .filter(|&last| last >= start)
    }

    /// Inclusive end as written by the serializer
    fn inclusive_end(&self) -> Option<i64> {
        self.end().map(|end| end as i64 - 1)
    }

    /// Source text this node was derived from.
    ///
    /// Nodes left open by an error match up to the end of input.
    pub fn match_text(&self) -> &'a str {
        let source = self.tree.source;
        let node = self.node();
        let end = node.end.unwrap_or(source.len());
        source.get(node.start..end).unwrap_or("")
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        self.at(self.node().children.get(index).copied())
    }

    /// Follow a path of child indices
    pub fn descend(&self, path: &[usize]) -> Option<NodeRef<'a>> {
        path.iter().try_fold(*self, |node, &i| node.child(i))
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().parent)
    }

    pub fn expr(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().expr)
    }

    pub fn closing_tag(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().closing_tag)
    }

    pub fn opening_tag(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().opening_tag)
    }

    pub fn block(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().block)
    }

    pub fn closing(&self) -> Option<bool> {
        self.node().closing
    }

    pub fn error(&self) -> Option<&'a SyntaxError> {
        self.node().error.as_ref()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("start", &self.start())
            .field("end", &self.end())
            .finish()
    }
}

/// Shallow view of a cross-linked tag
struct Link<'a>(NodeRef<'a>);

impl Serialize for Link<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &node.kind())?;
        if let Some(name) = node.name() {
            map.serialize_entry("name", name)?;
        }
        map.serialize_entry("start", &node.start())?;
        map.serialize_entry("end", &node.inclusive_end())?;
        if let Some(error) = node.error() {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}

struct Children<'a>(NodeRef<'a>);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.child_count()))?;
        for child in self.0.children() {
            seq.serialize_element(&child)?;
        }
        seq.end()
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.node();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &node.kind)?;
        map.serialize_entry("start", &node.start)?;
        map.serialize_entry("end", &self.inclusive_end())?;
        map.serialize_entry("match", self.match_text())?;
        if let Some(name) = &node.name {
            map.serialize_entry("name", name)?;
        }
        if let Some(value) = &node.value {
            map.serialize_entry("value", value)?;
        }
        if let Some(quote) = node.quote {
            map.serialize_entry("quote", &quote)?;
        }
        if let Some(closing) = node.closing {
            map.serialize_entry("closing", &closing)?;
        }
        if let Some(error) = &node.error {
            map.serialize_entry("error", error)?;
        }
        if let Some(tag) = self.closing_tag() {
            map.serialize_entry("closingTag", &Link(tag))?;
        }
        if let Some(tag) = self.opening_tag() {
            map.serialize_entry("openingTag", &Link(tag))?;
        }
        if let Some(block) = self.block() {
            map.serialize_entry("block", &Link(block))?;
        }
        map.serialize_entry("children", &Children(*self))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree<'static> {
        let source = "ab{{x}}";
        let mut root = Node::new(NodeKind::Text, 0, None);
        root.end = Some(7);
        root.children = vec![1, 2];
        let mut literal = Node::leaf(NodeKind::Literal, 0, 2, Value::String("ab".into()));
        literal.parent = Some(0);
        let mut tag = Node::new(NodeKind::TagOutput, 2, Some(0));
        tag.end = Some(7);
        tag.children = vec![3];
        let mut var = Node::new(NodeKind::Variable, 4, Some(2));
        var.end = Some(5);
        var.name = Some("x".into());
        tag.expr = Some(3);
        Tree::new(source, vec![root, literal, tag, var])
    }

    #[test]
    fn test_match_text_is_exclusive_slice() {
        let tree = sample();
        assert_eq!(tree.root().match_text(), "ab{{x}}");
        assert_eq!(tree.root().child(0).unwrap().match_text(), "ab");
        assert_eq!(tree.root().descend(&[1, 0]).unwrap().match_text(), "x");
    }

    #[test]
    fn test_open_node_matches_to_end() {
        let mut tree = sample();
        tree.nodes[2].end = None;
        assert_eq!(tree.get(2).unwrap().match_text(), "{{x}}");
    }

    #[test]
    fn test_last_is_inclusive() {
        let tree = sample();
        let tag = tree.get(2).unwrap();
        assert_eq!((tag.start(), tag.end(), tag.last()), (2, Some(7), Some(6)));
        assert_eq!(&tree.source()[tag.start()..=6], tag.match_text());

        let mut tree = sample();
        tree.nodes[3].end = Some(4);
        assert_eq!(tree.get(3).unwrap().last(), None);
        tree.nodes[3].end = None;
        assert_eq!(tree.get(3).unwrap().last(), None);
    }

    #[test]
    fn test_serialized_end_is_inclusive() {
        let mut tree = sample();
        tree.nodes[1].end = Some(0);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["end"], 6);
        assert_eq!(json["children"][1]["start"], 2);
        assert_eq!(json["children"][1]["end"], 6);
        // empty nodes end one before they start
        assert_eq!(json["children"][0]["end"], -1);

        tree.nodes[2].end = None;
        let json = serde_json::to_value(&tree).unwrap();
        assert!(json["children"][1]["end"].is_null());
    }

    #[test]
    fn test_serialization_omits_back_references() {
        let tree = sample();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "TEXT");
        assert_eq!(json["children"][0]["value"], "ab");
        assert_eq!(json["children"][1]["children"][0]["name"], "x");
        let text = json.to_string();
        assert!(!text.contains("\"parent\""));
        assert!(!text.contains("\"expr\""));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Number(1.5).as_number(), Some(1.5));
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Null.as_str(), None);
    }
}
