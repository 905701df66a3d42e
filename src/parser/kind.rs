//! Node kind registry
//!
//! Every node in a [`Tree`](super::node::Tree) carries a [`NodeKind`]. Kinds form
//! a small "is-a" hierarchy: a `Function` is a `Variable`, a `Range` is an
//! `Expression`, a `Block` is `Text`. The hierarchy is expressed through
//! [`NodeKind::parent_kind`] and queried with [`NodeKind::is`].
//!
//! # Stability
//!
//! Variants are append-only. New kinds go at the end of the enum and of
//! [`NodeKind::ALL`], and never change the parent of an existing kind.

use serde::{Serialize, Serializer};
use std::fmt;

/// Closed set of syntax tree node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Twig,
    Expression,
    ExpressionList,
    Brackets,
    Literal,
    Variable,
    Array,
    String,
    Number,
    Boolean,
    Null,
    Error,
    Operator,
    Filter,
    Function,
    ArgumentList,
    AccessChain,
    Object,
    ObjectProperty,
    ObjectValue,
    Tag,
    TagOutput,
    TagControl,
    TagArgument,
    Block,
    Range,
}

impl NodeKind {
    /// All kinds in declaration order
    pub const ALL: [NodeKind; 27] = [
        NodeKind::Text,
        NodeKind::Twig,
        NodeKind::Expression,
        NodeKind::ExpressionList,
        NodeKind::Brackets,
        NodeKind::Literal,
        NodeKind::Variable,
        NodeKind::Array,
        NodeKind::String,
        NodeKind::Number,
        NodeKind::Boolean,
        NodeKind::Null,
        NodeKind::Error,
        NodeKind::Operator,
        NodeKind::Filter,
        NodeKind::Function,
        NodeKind::ArgumentList,
        NodeKind::AccessChain,
        NodeKind::Object,
        NodeKind::ObjectProperty,
        NodeKind::ObjectValue,
        NodeKind::Tag,
        NodeKind::TagOutput,
        NodeKind::TagControl,
        NodeKind::TagArgument,
        NodeKind::Block,
        NodeKind::Range,
    ];

    /// The kind this kind directly specializes, if any
    pub fn parent_kind(self) -> Option<NodeKind> {
        use NodeKind::*;
        match self {
            Text | Twig | ExpressionList | Brackets | Literal => None,
            Expression | Variable | Array | String | Number | Boolean | Null | Error
            | Operator | Filter | Object | ObjectProperty | Tag => Some(Twig),
            Function | AccessChain => Some(Variable),
            ArgumentList => Some(ExpressionList),
            ObjectValue | TagArgument | Range => Some(Expression),
            TagOutput | TagControl => Some(Tag),
            Block => Some(Text),
        }
    }

    /// Membership test: true when `self` is `required` or specializes it.
    ///
    /// Reflexive and transitive along [`parent_kind`](Self::parent_kind).
    pub fn is(self, required: NodeKind) -> bool {
        let mut kind = Some(self);
        while let Some(k) = kind {
            if k == required {
                return true;
            }
            kind = k.parent_kind();
        }
        false
    }

    pub fn is_expression(self) -> bool {
        self.is(NodeKind::Expression)
    }

    pub fn is_variable_like(self) -> bool {
        self.is(NodeKind::Variable)
    }

    pub fn is_text(self) -> bool {
        self.is(NodeKind::Text)
    }

    pub fn is_tag(self) -> bool {
        self.is(NodeKind::Tag)
    }

    /// Diagnostic name, e.g. `TAG_CONTROL`
    pub fn name(self) -> &'static str {
        use NodeKind::*;
        match self {
            Text => "TEXT",
            Twig => "TWIG",
            Expression => "EXPRESSION",
            ExpressionList => "EXPRESSION_LIST",
            Brackets => "BRACKETS",
            Literal => "LITERAL",
            Variable => "VARIABLE",
            Array => "ARRAY",
            String => "STRING",
            Number => "NUMBER",
            Boolean => "BOOLEAN",
            Null => "NULL",
            Error => "ERROR",
            Operator => "OPERATOR",
            Filter => "FILTER",
            Function => "FUNCTION",
            ArgumentList => "ARGUMENT_LIST",
            AccessChain => "ACCESS_CHAIN",
            Object => "OBJECT",
            ObjectProperty => "OBJECT_PROPERTY",
            ObjectValue => "OBJECT_VALUE",
            Tag => "TAG",
            TagOutput => "TAG_OUTPUT",
            TagControl => "TAG_CONTROL",
            TagArgument => "TAG_ARGUMENT",
            Block => "BLOCK",
            Range => "RANGE",
        }
    }

    /// Reverse lookup of [`name`](Self::name)
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_reflexive() {
        for kind in NodeKind::ALL {
            assert!(kind.is(kind), "{} should be itself", kind);
        }
    }

    #[test]
    fn test_composition_table() {
        assert!(NodeKind::Function.is(NodeKind::Variable));
        assert!(NodeKind::Function.is(NodeKind::Twig));
        assert!(NodeKind::AccessChain.is(NodeKind::Variable));
        assert!(NodeKind::ArgumentList.is(NodeKind::ExpressionList));
        assert!(NodeKind::Range.is(NodeKind::Expression));
        assert!(NodeKind::TagArgument.is(NodeKind::Expression));
        assert!(NodeKind::ObjectValue.is(NodeKind::Expression));
        assert!(NodeKind::TagControl.is(NodeKind::Tag));
        assert!(NodeKind::Block.is(NodeKind::Text));

        assert!(!NodeKind::Variable.is(NodeKind::Function));
        assert!(!NodeKind::Literal.is(NodeKind::Twig));
        assert!(!NodeKind::Brackets.is(NodeKind::Expression));
        assert!(!NodeKind::Text.is(NodeKind::Block));
        assert!(!NodeKind::Filter.is(NodeKind::Variable));
    }

    #[test]
    fn test_name_lookup_round_trips() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(NodeKind::from_name("NOPE"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(NodeKind::TagArgument.is_expression());
        assert!(NodeKind::Function.is_variable_like());
        assert!(NodeKind::Block.is_text());
        assert!(NodeKind::TagOutput.is_tag());
        assert!(!NodeKind::Operator.is_expression());
    }
}
