//! Operator recognition
//!
//! Three tables are tried in order at a given offset:
//!
//! | table  | operators                       | needs a right-hand side |
//! |--------|---------------------------------|-------------------------|
//! | long   | `and` `or` `!=` `==` `in`       | yes                     |
//! | unary  | `++` `--` `is empty` `is not empty` | no                  |
//! | single | `+ - % / * = ~`                 | yes                     |
//!
//! Within a table the longest match wins. Word operators only match on a word
//! boundary, so `android` is a name and not `and` + `roid`. A right-hand side
//! is valid when a speculative parse of an expression right after the operator
//! yields at least one term and no error.
//!
//! Results are memoized per offset for the lifetime of one parse.

use super::engine::Engine;
use super::kind::NodeKind;
use super::node::NodeId;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Symbol(&'static str),
    Word(&'static str),
}

const LONG: [Candidate; 5] = [
    Candidate::Word("and"),
    Candidate::Word("or"),
    Candidate::Symbol("!="),
    Candidate::Symbol("=="),
    Candidate::Word("in"),
];

const UNARY: [Candidate; 4] = [
    Candidate::Symbol("++"),
    Candidate::Symbol("--"),
    Candidate::Word("is empty"),
    Candidate::Word("is not empty"),
];

const SINGLE: &[u8] = b"+-%/*=~";

impl Engine<'_> {
    /// Length of the operator at `at`, or 0.
    ///
    /// `parent` is the expression the operator would belong to.
    pub(crate) fn resolve_operator(&mut self, at: usize, parent: NodeId) -> usize {
        if let Some(&len) = self.operators.get(&at) {
            trace!(at, len, "operator cache hit");
            return len;
        }

        let len = self.match_operator(at, parent);
        self.operators.insert(at, len);
        len
    }

    fn match_operator(&mut self, at: usize, parent: NodeId) -> usize {
        let len = self.longest(&LONG, at);
        if len > 0 && self.validates(at, len, parent) {
            return len;
        }

        let len = self.longest(&UNARY, at);
        if len > 0 {
            return len;
        }

        if self.src.byte(at).is_some_and(|b| SINGLE.contains(&b)) && self.validates(at, 1, parent)
        {
            return 1;
        }

        0
    }

    fn longest(&self, table: &[Candidate], at: usize) -> usize {
        table
            .iter()
            .filter_map(|candidate| match *candidate {
                Candidate::Symbol(s) => self.src.matches(at, s).then_some(s.len()),
                Candidate::Word(w) => self.src.matches_word(at, w).then_some(w.len()),
            })
            .max()
            .unwrap_or(0)
    }

    /// Whether a usable expression follows an operator of `len` bytes at `at`
    fn validates(&mut self, at: usize, len: usize, parent: NodeId) -> bool {
        self.speculate(NodeKind::Expression, at, len, parent, |right| {
            !right.children.is_empty() && right.error.is_none()
        })
    }
}
