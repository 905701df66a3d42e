//! Text, output tag and control tag contexts
//!
//! `TEXT` (the root) and `BLOCK` (a control tag body) collect literal text and
//! open `{% %}` and `{{ }}` tags. `TAG_OUTPUT` holds one expression.
//! `TAG_CONTROL` reads its name and arguments, then either returns (closers and
//! self-closing tags) or parses its body through the linker.

use super::engine::{Engine, Scan, Step};
use super::kind::NodeKind;
use super::lexer::is_whitespace;
use super::linker::{is_closer_name, is_self_closing};

impl Engine<'_> {
    pub(crate) fn step_text(&mut self, id: usize, state: NodeKind, i: usize) -> Scan<Step> {
        if self.src.matches(i, "{%") {
            self.flush_literal(id, i);
            let tag = self.descend(NodeKind::TagControl, i, 2, id)?;

            if state == NodeKind::Block && self.nodes[tag].closing == Some(true) {
                return Ok(self.bind_closer(id, tag));
            }

            self.adopt(id, tag);
            return Ok(Step::Goto(self.end_of(tag)));
        }

        if self.src.matches(i, "{{") {
            self.flush_literal(id, i);
            let tag = self.descend(NodeKind::TagOutput, i, 2, id)?;
            self.adopt(id, tag);
            return Ok(Step::Goto(self.end_of(tag)));
        }

        Ok(Step::Next)
    }

    pub(crate) fn step_output(&mut self, id: usize, i: usize) -> Scan<Step> {
        if self.src.matches(i, "}}") {
            self.nodes[id].end = Some(i + 2);
            return Ok(Step::Done);
        }

        if self.src.byte(i).is_some_and(is_whitespace) {
            return Ok(Step::Next);
        }

        let expr = self.descend(NodeKind::Expression, i, 0, id)?;
        if self.nodes[expr].children.is_empty() {
            // nothing an expression can start with; stay put so the guard reports it
            self.discard(expr);
            return Ok(Step::Goto(i));
        }

        self.adopt(id, expr);
        Ok(Step::Goto(self.end_of(expr)))
    }

    pub(crate) fn step_control(&mut self, id: usize, i: usize) -> Scan<Step> {
        let Some(b) = self.src.byte(i) else {
            return Ok(Step::Done);
        };

        let Some(name) = self.nodes[id].name.clone() else {
            if is_whitespace(b) {
                return Ok(Step::Next);
            }
            let src = self.src;
            let (end, name) = src.read_until(i, |b, j| is_whitespace(b) || src.matches(j, "%}"));
            if name.is_empty() {
                return Ok(Step::Goto(i));
            }
            self.nodes[id].name = Some(name.to_string());
            return Ok(Step::Goto(end));
        };

        if self.src.matches(i, "%}") {
            let header_end = i + 2;
            self.nodes[id].end = Some(header_end);

            if is_closer_name(&name) {
                self.nodes[id].closing = Some(true);
                return Ok(Step::Done);
            }
            if is_self_closing(&name) {
                return Ok(Step::Done);
            }

            self.scan_body(id, &name, header_end)?;
            return Ok(Step::Done);
        }

        // {% for key, value in items %}
        if b == b',' && name == "for" && self.nodes[id].children.len() == 1 {
            return Ok(Step::Goto(i + 1));
        }

        if is_whitespace(b) {
            return Ok(Step::Next);
        }

        let arg = self.descend(NodeKind::TagArgument, i, 0, id)?;
        if self.nodes[arg].children.is_empty() {
            self.discard(arg);
            return Ok(Step::Goto(i));
        }

        self.adopt(id, arg);
        let end = self.end_of(arg);
        self.nodes[id].end = Some(end);
        Ok(Step::Goto(end))
    }
}
