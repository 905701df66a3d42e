//! Recursive matching engine
//!
//! The engine is a single forward-only scanner. [`Engine::enter`] creates a
//! node of a given kind and runs [`Engine::scan`] over it. The scan advances a
//! byte cursor and hands each position to the step function for the node's
//! context. Step functions live in `text`, `expressions` and `linker`. A step
//! either recurses into `enter` for a nested construct, closes the current
//! node, or moves the cursor.
//!
//! # Faults
//!
//! A fault (unexpected end of input, a stalled cursor, an unclosed tag)
//! unwinds through `Result`. In strict mode it surfaces from
//! [`parse`](super::parse) unchanged. In tolerant mode every level keeps its
//! partial child in the tree. The nearest `TAG_CONTROL` at or above the fault
//! then absorbs it: it gets a synthesized `ERROR` closing tag, and its parent
//! resumes scanning at the fault offset.
//!
//! # Speculation
//!
//! Operator validation parses a right-hand side and throws it away. While
//! speculating, faults are never recorded or absorbed, and the arena is
//! truncated back to where it was.

use super::error::{FaultKind, SyntaxError};
use super::kind::NodeKind;
use super::lexer::Source;
use super::node::{Node, NodeId, Tree, Value};
use super::options::ParseOptions;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Outcome of one step of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Advance the cursor by one byte
    Next,
    /// Continue at the given offset
    Goto(usize),
    /// The node is closed
    Done,
}

/// A fault unwinding out of `node`
#[derive(Debug)]
pub(crate) struct Fault {
    pub error: SyntaxError,
    pub node: NodeId,
}

pub(crate) type Scan<T> = Result<T, Fault>;

pub(crate) struct Engine<'a> {
    pub(crate) src: Source<'a>,
    pub(crate) nodes: Vec<Node>,
    /// Operator length per offset, 0 when none matched
    pub(crate) operators: FxHashMap<usize, usize>,
    options: ParseOptions,
    speculating: usize,
}

impl<'a> Engine<'a> {
    pub fn new(text: &'a str, options: ParseOptions) -> Self {
        Engine {
            src: Source::new(text),
            nodes: Vec::new(),
            operators: FxHashMap::default(),
            options,
            speculating: 0,
        }
    }

    /// Parse the whole source as a root `TEXT` node
    pub fn run(mut self) -> Result<Tree<'a>, SyntaxError> {
        let root = match self.enter(NodeKind::Text, 0, 0, None) {
            Ok(root) => root,
            Err(fault) if self.recovering() => {
                debug!(offset = fault.error.offset, "fault reached the root");
                self.nodes[fault.node].end = Some(fault.error.offset);
                fault.node
            }
            Err(fault) => return Err(fault.error),
        };
        Ok(self.compact(root))
    }

    /// Whether faults are recorded on the tree right now
    fn recovering(&self) -> bool {
        !self.options.throw_syntax_errors && self.speculating == 0
    }

    pub(crate) fn is_speculating(&self) -> bool {
        self.speculating > 0
    }

    /// Create a node and scan it, starting `skip` bytes after `start`.
    ///
    /// The node is not added to `parent`'s children; the caller decides.
    pub(crate) fn enter(
        &mut self,
        kind: NodeKind,
        start: usize,
        skip: usize,
        parent: Option<NodeId>,
    ) -> Scan<NodeId> {
        let id = self.push(Node::new(kind, start, parent));
        trace!(%kind, start, id, "enter");

        match self.scan(id, kind, start + skip) {
            Ok(()) => Ok(id),
            Err(fault) if kind == NodeKind::TagControl && self.recovering() => {
                self.absorb(id, fault.error);
                Ok(id)
            }
            Err(fault) => Err(Fault { node: id, ..fault }),
        }
    }

    /// [`enter`](Self::enter) a nested context of `parent`.
    ///
    /// A faulted child is still attached to `parent` before the fault moves on.
    pub(crate) fn descend(
        &mut self,
        kind: NodeKind,
        start: usize,
        skip: usize,
        parent: NodeId,
    ) -> Scan<NodeId> {
        self.enter(kind, start, skip, Some(parent)).map_err(|fault| {
            self.adopt(parent, fault.node);
            fault
        })
    }

    /// Run `enter` in speculative mode and roll the arena back afterwards.
    ///
    /// Returns whatever `check` says about the finished node, or `false` on a fault.
    pub(crate) fn speculate(
        &mut self,
        kind: NodeKind,
        start: usize,
        skip: usize,
        parent: NodeId,
        check: impl Fn(&Node) -> bool,
    ) -> bool {
        let mark = self.nodes.len();
        self.speculating += 1;
        let accepted = match self.enter(kind, start, skip, Some(parent)) {
            Ok(id) => check(&self.nodes[id]),
            Err(fault) => {
                trace!(offset = fault.error.offset, "speculation faulted");
                false
            }
        };
        self.speculating -= 1;
        self.nodes.truncate(mark);
        accepted
    }

    fn scan(&mut self, id: NodeId, state: NodeKind, from: usize) -> Scan<()> {
        let len = self.src.len();
        let mut i = from;
        let mut last = [usize::MAX; 2];

        while i < len {
            if last[0] == i && last[1] == i {
                return Err(self.raise(id, state, FaultKind::EndlessLoop, i));
            }
            last = [last[1], i];

            let step = match state {
                NodeKind::Text | NodeKind::Block => self.step_text(id, state, i)?,
                NodeKind::TagOutput => self.step_output(id, i)?,
                NodeKind::TagControl => self.step_control(id, i)?,
                NodeKind::Expression | NodeKind::TagArgument | NodeKind::ObjectValue => {
                    self.step_expression(id, state, i)?
                }
                NodeKind::Variable | NodeKind::Filter => {
                    self.step_identifier(id, state, from, i)?
                }
                NodeKind::ExpressionList | NodeKind::ArgumentList => self.step_list(id, i)?,
                NodeKind::Array => self.step_array(id, i)?,
                NodeKind::Brackets => self.step_brackets(id, i)?,
                NodeKind::Object => self.step_object(id, i)?,
                NodeKind::ObjectProperty => self.step_property(id, i)?,
                NodeKind::String => self.step_string(id, i),
                NodeKind::Range => self.step_range(id, i)?,
                NodeKind::Operator => self.step_operator(id, i),
                // leaves and re-classified kinds are never scanned
                _ => {
                    self.nodes[id].end = Some(i);
                    Step::Done
                }
            };

            match step {
                Step::Next => i += 1,
                Step::Goto(j) => i = j,
                Step::Done => return Ok(()),
            }
        }

        self.finish(id, state, from)
    }

    /// Input ran out while `id` was still open
    fn finish(&mut self, id: NodeId, state: NodeKind, from: usize) -> Scan<()> {
        let len = self.src.len();

        // a name cut off by end of input
        if matches!(state, NodeKind::Variable | NodeKind::Filter) && self.nodes[id].name.is_none() {
            let name = self.src.slice(from.min(len), len);
            if !name.is_empty() {
                self.nodes[id].name = Some(name.to_string());
            }
        }

        if state.is_expression() {
            self.nodes[id].end = Some(len);
            return Ok(());
        }

        if state.is_text() {
            self.flush_literal(id, len);
            if self.nodes[id].parent.is_none() {
                self.nodes[id].end = Some(len);
                return Ok(());
            }
        }

        Err(self.raise(id, state, FaultKind::UnexpectedEof, len))
    }

    /// Build a fault for `id`, recording it on the node in tolerant mode
    pub(crate) fn raise(
        &mut self,
        id: NodeId,
        state: NodeKind,
        kind: FaultKind,
        offset: usize,
    ) -> Fault {
        let error = SyntaxError::new(self.src.text(), kind, state, offset);
        if self.recovering() {
            debug!(%state, offset, "{}", error.kind);
            self.nodes[id].error = Some(error.clone());
        } else {
            trace!(%state, offset, speculating = self.is_speculating(), "{}", error.kind);
        }
        Fault { error, node: id }
    }

    /// Close control tag `id` with a synthesized `ERROR` closing tag
    fn absorb(&mut self, id: NodeId, error: SyntaxError) {
        let offset = error.offset;
        debug!(
            tag = self.nodes[id].name.as_deref().unwrap_or(""),
            offset, "recovered at control tag"
        );

        let mut marker = Node::new(NodeKind::Error, offset, Some(id));
        marker.end = Some(offset);
        marker.opening_tag = Some(id);
        marker.error = Some(error.clone());
        let marker = self.push(marker);

        let tag = &mut self.nodes[id];
        tag.closing_tag = Some(marker);
        tag.error = Some(error);
        tag.end = Some(offset.max(tag.start));
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Drop `id` and everything created after it
    pub(crate) fn discard(&mut self, id: NodeId) {
        self.nodes.truncate(id);
    }

    /// Closed end of `id`, or its start if it never closed
    pub(crate) fn end_of(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        node.end.unwrap_or(node.start)
    }

    /// Attach a closed leaf to `parent`, which now ends where the leaf does
    pub(crate) fn push_leaf(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        start: usize,
        end: usize,
        value: Value,
    ) -> NodeId {
        let leaf = self.push(Node::leaf(kind, start, end, value));
        self.adopt(parent, leaf);
        leaf
    }

    /// Emit the text between the last child of `id` and `upto` as a `LITERAL`
    pub(crate) fn flush_literal(&mut self, id: NodeId, upto: usize) {
        let node = &self.nodes[id];
        let start = node
            .children
            .last()
            .map_or(node.start, |&last| self.end_of(last));
        if start >= upto {
            return;
        }
        let text = self.src.slice(start, upto).to_string();
        self.push_leaf(id, NodeKind::Literal, start, upto, Value::String(text));
    }

    /// Keep only nodes reachable from `root`, renumbered in pre-order
    fn compact(mut self, root: NodeId) -> Tree<'a> {
        let mut index: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if id >= index.len() || index[id].is_some() {
                continue;
            }
            index[id] = Some(order.len());
            order.push(id);

            let node = &self.nodes[id];
            stack.extend(
                [node.block, node.opening_tag, node.closing_tag]
                    .into_iter()
                    .flatten(),
            );
            stack.extend(node.children.iter().rev());
        }

        let remap = |id: NodeId| index.get(id).copied().flatten();
        let mut nodes = Vec::with_capacity(order.len());
        for &old in &order {
            let mut node =
                std::mem::replace(&mut self.nodes[old], Node::new(NodeKind::Twig, 0, None));
            node.children = node.children.iter().filter_map(|&c| remap(c)).collect();
            node.parent = node.parent.and_then(remap);
            node.expr = node.expr.and_then(remap);
            node.closing_tag = node.closing_tag.and_then(remap);
            node.opening_tag = node.opening_tag.and_then(remap);
            node.block = node.block.and_then(remap);
            nodes.push(node);
        }

        trace!(kept = nodes.len(), built = self.nodes.len(), "compacted");
        Tree::new(self.src.text(), nodes)
    }
}
