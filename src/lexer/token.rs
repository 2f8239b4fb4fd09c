use std::fmt;

/// Source span of a token or AST node. Lines are 1-based, columns are
/// 0-based within their line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Position {
    pub fn span(start: Position, end: Position) -> Position {
        Position {
            start_line: start.start_line,
            start_col: start.start_col,
            end_line: end.end_line,
            end_col: end.end_col,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Unknown,
    Int,
    Float,
    String,
    Char,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Semicolon,
    Assign,
    Identifier,
    Def,
    Fnc,
    Lparen,
    Rparen,
    Comma,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,
    Return,
    Type,
    Arrow,
    Ampersand,
    True,
    False,
    Not,
    Land,
    Lor,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    As,
    Sizeof,
    Import,
    If,
    Else,
    While,
    Struct,
    Dot,
    Colon,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Char => "CHAR",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Slash => "SLASH",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Def => "DEF",
            TokenKind::Fnc => "FNC",
            TokenKind::Lparen => "LPAREN",
            TokenKind::Rparen => "RPAREN",
            TokenKind::Comma => "COMMA",
            TokenKind::Lbrace => "LBRACE",
            TokenKind::Rbrace => "RBRACE",
            TokenKind::Lbracket => "LBRACKET",
            TokenKind::Rbracket => "RBRACKET",
            TokenKind::Return => "RETURN",
            TokenKind::Type => "TYPE",
            TokenKind::Arrow => "ARROW",
            TokenKind::Ampersand => "AMPERSAND",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Not => "NOT",
            TokenKind::Land => "LAND",
            TokenKind::Lor => "LOR",
            TokenKind::Eq => "EQ",
            TokenKind::NotEq => "NOTEQ",
            TokenKind::Lt => "LT",
            TokenKind::LtEq => "LTEQ",
            TokenKind::Gt => "GT",
            TokenKind::GtEq => "GTEQ",
            TokenKind::As => "AS",
            TokenKind::Sizeof => "SIZEOF",
            TokenKind::Import => "IMPORT",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Struct => "STRUCT",
            TokenKind::Dot => "DOT",
            TokenKind::Colon => "COLON",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// Base kind of a source-level type. `None` is the "absent" sentinel (an
/// uninitialized type slot, or the opaque pointee of `arr_new`'s result);
/// `Void` is the real unit return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    None,
    Void,
    Bool,
    Float,
    Char,
    Int8,
    Int16,
    Int32,
    Int,
    Uint8,
    Uint16,
    Uint32,
    Uint,
    Struct(String),
}

impl BaseType {
    pub fn is_signed_int(&self) -> bool {
        matches!(
            self,
            BaseType::Int8 | BaseType::Int16 | BaseType::Int32 | BaseType::Int
        )
    }

    pub fn is_unsigned_int(&self) -> bool {
        matches!(
            self,
            BaseType::Uint8 | BaseType::Uint16 | BaseType::Uint32 | BaseType::Uint
        )
    }

    // Char participates in integer arithmetic alongside Int8.
    pub fn is_integer(&self) -> bool {
        self.is_signed_int() || self.is_unsigned_int() || matches!(self, BaseType::Char)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::None => f.write_str("None"),
            BaseType::Void => f.write_str("Void"),
            BaseType::Bool => f.write_str("Bool"),
            BaseType::Float => f.write_str("Float"),
            BaseType::Char => f.write_str("Char"),
            BaseType::Int8 => f.write_str("Int8"),
            BaseType::Int16 => f.write_str("Int16"),
            BaseType::Int32 => f.write_str("Int32"),
            BaseType::Int => f.write_str("Int"),
            BaseType::Uint8 => f.write_str("Uint8"),
            BaseType::Uint16 => f.write_str("Uint16"),
            BaseType::Uint32 => f.write_str("Uint32"),
            BaseType::Uint => f.write_str("Uint"),
            BaseType::Struct(name) => f.write_str(name),
        }
    }
}

/// A source-language type: a base kind plus a pointer-indirection count.
/// Struct references are carried in the base so the indirection count
/// applies uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceType {
    pub base: BaseType,
    pub pointer: u8,
}

impl SourceType {
    pub const fn new(base: BaseType) -> SourceType {
        SourceType { base, pointer: 0 }
    }

    pub const fn pointer_to(base: BaseType, pointer: u8) -> SourceType {
        SourceType { base, pointer }
    }

    pub fn struct_name(&self) -> Option<&str> {
        match &self.base {
            BaseType::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for _ in 0..self.pointer {
            f.write_str("*")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    /// Base type carried by `TYPE` tokens; pointer stars are the parser's job.
    pub base: Option<BaseType>,
    pub pos: Position,
}

/// Keyword table. Both `none` and `void` map to the `Void` base; the `None`
/// base never comes from source text.
pub fn lookup_ident(literal: &str) -> (TokenKind, Option<BaseType>) {
    match literal {
        "def" => (TokenKind::Def, None),
        "fnc" => (TokenKind::Fnc, None),
        "return" => (TokenKind::Return, None),
        "true" => (TokenKind::True, None),
        "false" => (TokenKind::False, None),
        "as" => (TokenKind::As, None),
        "sizeof" => (TokenKind::Sizeof, None),
        "import" => (TokenKind::Import, None),
        "if" => (TokenKind::If, None),
        "else" => (TokenKind::Else, None),
        "while" => (TokenKind::While, None),
        "struct" => (TokenKind::Struct, None),
        "none" => (TokenKind::Type, Some(BaseType::Void)),
        "void" => (TokenKind::Type, Some(BaseType::Void)),
        "bool" => (TokenKind::Type, Some(BaseType::Bool)),
        "float" => (TokenKind::Type, Some(BaseType::Float)),
        "char" => (TokenKind::Type, Some(BaseType::Char)),
        "int8" => (TokenKind::Type, Some(BaseType::Int8)),
        "int16" => (TokenKind::Type, Some(BaseType::Int16)),
        "int32" => (TokenKind::Type, Some(BaseType::Int32)),
        "int" => (TokenKind::Type, Some(BaseType::Int)),
        "uint8" => (TokenKind::Type, Some(BaseType::Uint8)),
        "uint16" => (TokenKind::Type, Some(BaseType::Uint16)),
        "uint32" => (TokenKind::Type, Some(BaseType::Uint32)),
        "uint" => (TokenKind::Type, Some(BaseType::Uint)),
        _ => (TokenKind::Identifier, None),
    }
}
