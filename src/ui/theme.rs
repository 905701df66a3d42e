use crate::parser::NodeKind;
use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub accent: Color,    // Selected line number
    pub delimiter: Color, // `{{`, `{%` and their closers
    pub tag: Color,
    pub expression: Color,
    pub literal: Color,
    pub keyword: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub span_bg: Color, // Selected node's source span
    pub badge: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    accent: Color::Rgb(250, 179, 135),
    delimiter: Color::Rgb(203, 166, 247),
    tag: Color::Rgb(203, 166, 247),
    expression: Color::Rgb(148, 226, 213),
    literal: Color::Rgb(250, 179, 135),
    keyword: Color::Rgb(137, 180, 250),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(108, 112, 134),
    current_line_bg: Color::Rgb(50, 50, 70),
    span_bg: Color::Rgb(69, 71, 90),
    badge: Color::Rgb(137, 180, 250),
};

impl Theme {
    /// Color for a node kind label in the tree pane
    pub fn kind_color(&self, kind: NodeKind) -> Color {
        use NodeKind::*;
        match kind {
            Error => self.error,
            Text | Block | Literal => self.comment,
            String | Number => self.literal,
            Boolean | Null | Operator => self.keyword,
            k if k.is(Tag) => self.tag,
            _ => self.expression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_colors() {
        assert_eq!(DEFAULT_THEME.kind_color(NodeKind::TagControl), DEFAULT_THEME.tag);
        assert_eq!(DEFAULT_THEME.kind_color(NodeKind::Function), DEFAULT_THEME.expression);
        assert_eq!(DEFAULT_THEME.kind_color(NodeKind::Number), DEFAULT_THEME.literal);
        assert_eq!(DEFAULT_THEME.kind_color(NodeKind::Block), DEFAULT_THEME.comment);
    }
}
