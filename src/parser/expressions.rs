//! Expression contexts
//!
//! An expression is a run of terms: literals, variables, function calls,
//! arrays, objects, bracket groups and filters, optionally followed by an
//! operator and a right-hand expression. Terms are appended to the expression
//! node in source order; the last plain term is remembered in `expr`.
//!
//! ```text
//! planet + (10 - x)
//!
//! EXPRESSION
//! ├ VARIABLE planet
//! ├ OPERATOR +
//! └ EXPRESSION
//!   └ BRACKETS
//!     └ EXPRESSION
//!       ├ NUMBER 10
//!       ├ OPERATOR -
//!       └ EXPRESSION
//!         └ VARIABLE x
//! ```
//!
//! An expression ends at the first byte none of its rules accept. The caller
//! decides what that byte means (`}}`, `%}`, `,`, `)`, ...).

use super::engine::{Engine, Scan, Step};
use super::kind::NodeKind;
use super::lexer::{decode_string_literal, is_name_byte, is_name_start, is_whitespace, NUMBER};
use super::node::{NodeId, Value};
use tracing::trace;

const KEYWORDS: [(&str, Value); 3] = [
    ("true", Value::Boolean(true)),
    ("false", Value::Boolean(false)),
    ("null", Value::Null),
];

impl Engine<'_> {
    /// Scan a nested `kind` and append it as the current term of `id`
    fn consume(&mut self, id: NodeId, kind: NodeKind, start: usize, skip: usize) -> Scan<Step> {
        let child = self.descend(kind, start, skip, id)?;
        Ok(self.attach(id, child))
    }

    fn attach(&mut self, id: NodeId, child: NodeId) -> Step {
        self.adopt(id, child);
        let end = self.end_of(child);
        let node = &mut self.nodes[id];
        node.end = Some(end);
        node.expr = Some(child);
        Step::Goto(end)
    }

    /// Turn provisional node `id` into a `kind` node, keeping its fields
    fn reclassify(&mut self, id: NodeId, kind: NodeKind) {
        let node = &mut self.nodes[id];
        trace!(id, from = %node.kind, to = %kind, "reclassify");
        node.kind = kind;
    }

    pub(crate) fn step_expression(&mut self, id: NodeId, state: NodeKind, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };

        if state == NodeKind::TagArgument && self.src.matches(i, "%}") {
            self.nodes[id].end = Some(i);
            return Ok(Step::Done);
        }

        match b {
            b'{' => return self.consume(id, NodeKind::Object, i, 1),
            b'[' => return self.consume(id, NodeKind::Array, i, 1),
            b'"' | b'\'' => return self.consume(id, NodeKind::String, i, 1),
            b'|' => {
                let (start, _) = self.src.read_until(i + 1, |b, _| !is_whitespace(b));
                return self.consume(id, NodeKind::Filter, start, 0);
            }
            _ => {}
        }

        for (word, value) in KEYWORDS {
            if self.src.matches_word(i, word) {
                let kind = match value {
                    Value::Null => NodeKind::Null,
                    _ => NodeKind::Boolean,
                };
                let end = i + word.len();
                let leaf = self.push_leaf(id, kind, i, end, value);
                let node = &mut self.nodes[id];
                node.end = Some(end);
                node.expr = Some(leaf);
                return Ok(Step::Goto(end));
            }
        }

        if self.resolve_operator(i, id) > 0 {
            let operator = self.descend(NodeKind::Operator, i, 0, id)?;
            self.adopt(id, operator);
            let right = self.descend(NodeKind::Expression, self.end_of(operator), 0, id)?;
            self.adopt(id, right);
            self.nodes[id].end = Some(self.end_of(right));
            return Ok(Step::Done);
        }

        if is_name_start(b) {
            return self.consume(id, NodeKind::Variable, i, 0);
        }

        let len = self.src.probe(i, &NUMBER);
        if len > 0 {
            let end = i + len;
            if let Some(n) = self
                .src
                .slice(i, end)
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
            {
                let leaf = self.push_leaf(id, NodeKind::Number, i, end, Value::Number(n));
                let node = &mut self.nodes[id];
                node.end = Some(end);
                node.expr = Some(leaf);
                return Ok(Step::Goto(end));
            }
        }

        if self.src.matches(i, "..") {
            let in_range = self.nodes[id]
                .parent
                .is_some_and(|p| self.nodes[p].kind == NodeKind::Range);
            if in_range {
                self.nodes[id].end = Some(i);
                return Ok(Step::Done);
            }

            // re-read everything so far as the lower bound of a range
            let start = self.nodes[id].start;
            let range = self.descend(NodeKind::Range, start, 0, id)?;
            let end = self.end_of(range);
            let node = &mut self.nodes[id];
            node.children = vec![range];
            node.expr = Some(range);
            node.end = Some(end);
            return Ok(Step::Goto(end));
        }

        if b == b'.' {
            let chain = self.descend(NodeKind::Variable, i, 1, id)?;
            if self.nodes[chain].name.as_deref().is_some_and(|n| !n.is_empty()) {
                self.reclassify(id, NodeKind::AccessChain);
                return Ok(self.attach(id, chain));
            }
            self.discard(chain);
            return Ok(Step::Next);
        }

        if b == b'(' {
            return self.consume(id, NodeKind::Brackets, i, 1);
        }

        if is_whitespace(b) {
            return Ok(Step::Next);
        }

        self.nodes[id].end = Some(i);
        Ok(Step::Done)
    }

    /// `VARIABLE`, `FUNCTION` and `FILTER`: a name, then an optional call
    pub(crate) fn step_identifier(
        &mut self,
        id: NodeId,
        state: NodeKind,
        from: usize,
        i: usize,
    ) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };

        if self.nodes[id].name.is_none() {
            if is_name_byte(b) {
                return Ok(Step::Next);
            }
            let name = self.src.slice(from, i);
            if name.is_empty() {
                self.nodes[id].end = Some(i);
                return Ok(Step::Done);
            }
            self.nodes[id].name = Some(name.to_string());
        }

        let awaiting_paren = self.nodes[id]
            .children
            .last()
            .is_some_and(|&c| self.nodes[c].kind == NodeKind::ArgumentList);

        if awaiting_paren {
            if b == b')' {
                self.nodes[id].end = Some(i + 1);
                return Ok(Step::Done);
            }
            if is_whitespace(b) {
                return Ok(Step::Next);
            }
            // unclosed call: stay put so the guard reports it
            return Ok(Step::Goto(i));
        }

        if b == b'(' {
            if state == NodeKind::Variable {
                self.reclassify(id, NodeKind::Function);
            }
            let args = self.descend(NodeKind::ArgumentList, i, 1, id)?;
            self.adopt(id, args);
            return Ok(Step::Goto(self.end_of(args)));
        }

        self.nodes[id].end = Some(i);
        Ok(Step::Done)
    }

    /// `EXPRESSION_LIST` and `ARGUMENT_LIST`: comma separated expressions
    pub(crate) fn step_list(&mut self, id: NodeId, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };
        let comma = b == b',';

        if self.nodes[id].children.is_empty() || comma {
            let start = if comma { i + 1 } else { i };
            let expr = self.descend(NodeKind::Expression, start, 0, id)?;
            if self.nodes[expr].children.is_empty() {
                self.discard(expr);
                self.nodes[id].end = Some(start);
                return Ok(Step::Done);
            }
            self.adopt(id, expr);
            let end = self.end_of(expr);
            self.nodes[id].end = Some(end);
            return Ok(Step::Goto(end));
        }

        if is_whitespace(b) {
            return Ok(Step::Next);
        }

        self.nodes[id].end = Some(i);
        Ok(Step::Done)
    }

    pub(crate) fn step_array(&mut self, id: NodeId, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };
        if b == b']' {
            self.nodes[id].end = Some(i + 1);
            return Ok(Step::Done);
        }
        if is_whitespace(b) {
            return Ok(Step::Next);
        }

        let values = self.descend(NodeKind::ExpressionList, i, 0, id)?;
        if self.nodes[values].children.is_empty() && self.end_of(values) <= i {
            self.discard(values);
            return Ok(Step::Goto(i));
        }
        self.adopt(id, values);
        let end = self.end_of(values);
        self.nodes[id].end = Some(end);
        Ok(Step::Goto(end))
    }

    pub(crate) fn step_brackets(&mut self, id: NodeId, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };
        if b == b')' {
            self.nodes[id].end = Some(i + 1);
            return Ok(Step::Done);
        }
        if is_whitespace(b) {
            return Ok(Step::Next);
        }

        let expr = self.descend(NodeKind::Expression, i, 0, id)?;
        if self.nodes[expr].children.is_empty() {
            self.discard(expr);
            return Ok(Step::Goto(i));
        }
        Ok(self.attach(id, expr))
    }

    pub(crate) fn step_object(&mut self, id: NodeId, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };
        if b == b'}' {
            self.nodes[id].end = Some(i + 1);
            return Ok(Step::Done);
        }
        if is_whitespace(b) {
            return Ok(Step::Next);
        }

        let property = self.descend(NodeKind::ObjectProperty, i, 0, id)?;
        self.adopt(id, property);
        Ok(Step::Goto(self.end_of(property)))
    }

    /// `key: value`, where the key is a name or a quoted string
    pub(crate) fn step_property(&mut self, id: NodeId, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };

        if self.nodes[id].name.is_none() {
            if is_whitespace(b) {
                return Ok(Step::Next);
            }

            if b == b'"' || b == b'\'' {
                let key = self.descend(NodeKind::String, i, 1, id)?;
                let end = self.end_of(key);
                let name = self.nodes[key]
                    .value
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.discard(key);
                self.nodes[id].name = Some(name);
                self.nodes[id].end = Some(end);
                return Ok(Step::Goto(end));
            }

            let (end, name) = self.src.read_until(i, |b, _| !is_name_byte(b));
            if name.is_empty() {
                return Ok(Step::Goto(i));
            }
            self.nodes[id].name = Some(name.to_string());
            self.nodes[id].end = Some(end);
            return Ok(Step::Goto(end));
        }

        if self.nodes[id].expr.is_none() {
            if b == b':' {
                return self.consume(id, NodeKind::ObjectValue, i + 1, 0);
            }
            if is_whitespace(b) {
                return Ok(Step::Next);
            }
            return Ok(Step::Goto(i));
        }

        match b {
            b',' => {
                self.nodes[id].end = Some(i + 1);
                Ok(Step::Done)
            }
            b'}' => {
                self.nodes[id].end = Some(i);
                Ok(Step::Done)
            }
            b if is_whitespace(b) => Ok(Step::Next),
            _ => Ok(Step::Goto(i)),
        }
    }

    pub(crate) fn step_string(&mut self, id: NodeId, i: usize) -> Step {
        let start = self.nodes[id].start;
        let (Some(b), Some(quote)) = (self.src.byte(i), self.src.byte(start)) else {
            return Step::Done;
        };

        if b == b'\\' {
            return Step::Goto(i + 2);
        }
        if b != quote {
            return Step::Next;
        }

        let raw = self.src.slice(start, i + 1);
        let node = &mut self.nodes[id];
        node.value = Some(Value::String(decode_string_literal(raw)));
        node.quote = Some(char::from(quote));
        node.end = Some(i + 1);
        Step::Done
    }

    /// `from..to`
    pub(crate) fn step_range(&mut self, id: NodeId, i: usize) -> Scan<Step> {
        let from = self.descend(NodeKind::Expression, i, 0, id)?;
        self.adopt(id, from);

        let at = (self.end_of(from) + 2).min(self.src.len());
        let to = self.descend(NodeKind::Expression, at, 0, id)?;
        self.adopt(id, to);

        self.nodes[id].end = Some(self.end_of(to));
        Ok(Step::Done)
    }

    pub(crate) fn step_operator(&mut self, id: NodeId, i: usize) -> Step {
        let context = self.nodes[id].parent.unwrap_or(id);
        let len = self.resolve_operator(i, context);
        let node = &mut self.nodes[id];
        node.value = Some(Value::String(self.src.slice(i, i + len).to_string()));
        node.end = Some(i + len);
        Step::Done
    }
}
