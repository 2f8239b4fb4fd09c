use crate::lexer::TokenKind;

/// Binding strength for the Pratt expression loop, lowest first. `(`, `.`
/// and `:` share the call tier: each of them "opens" something applied to a
/// left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Precedence {
    #[default]
    Lowest,
    Assign,
    Lor,
    Land,
    Equals,
    LessGreater,
    Cast,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl From<TokenKind> for Precedence {
    fn from(kind: TokenKind) -> Self {
        use TokenKind::*;

        match kind {
            Assign => Self::Assign,
            Lor => Self::Lor,
            Land => Self::Land,
            Eq | NotEq => Self::Equals,
            Lt | Gt | LtEq | GtEq => Self::LessGreater,
            As => Self::Cast,
            Plus | Minus => Self::Sum,
            Asterisk | Slash => Self::Product,
            Lparen | Dot | Colon => Self::Call,
            Lbracket => Self::Index,
            _ => Self::Lowest,
        }
    }
}
