//! AST for gl3 programs.
//!
//! Statements and expressions are tagged enums so every walk over the tree
//! is exhaustive. Each node can report a source position derived from its
//! tokens and children. The `Display` impls produce the canonical textual
//! form the parser tests assert against (integer literals print with their
//! resolved type, e.g. `4i32` becomes `4(Int32)`).

use std::collections::HashMap;
use std::fmt;

use crate::lexer::token::{BaseType, Position, SourceType};

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
            if !matches!(stmt, Statement::Expression(_)) {
                f.write_str(";")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    Expression(ExpressionStatement),
    Def(DefStatement),
    Return(ReturnStatement),
    Function(FunctionStatement),
    Import(ImportStatement),
    If(IfStatement),
    While(WhileStatement),
    Struct(StructStatement),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(s) => write!(f, "{}", s),
            Statement::Def(s) => write!(f, "{}", s),
            Statement::Return(s) => write!(f, "{}", s),
            Statement::Function(s) => write!(f, "{}", s),
            Statement::Import(s) => write!(f, "{}", s),
            Statement::If(s) => write!(f, "{}", s),
            Statement::While(s) => write!(f, "{}", s),
            Statement::Struct(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

impl fmt::Display for ExpressionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};", self.expression)
    }
}

#[derive(Debug, Clone)]
pub struct DefStatement {
    pub pos: Position,
    pub ty: SourceType,
    pub name: String,
    pub value: Expression,
}

impl fmt::Display for DefStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def {} {} = {}", self.ty, self.name, self.value)
    }
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub pos: Position,
    pub value: Expression,
}

impl fmt::Display for ReturnStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "return {}", self.value)
    }
}

/// Statements of a brace-delimited block. The braces themselves are printed
/// by the enclosing statement.
#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FunctionParameter {
    pub ty: SourceType,
    pub name: String,
}

impl fmt::Display for FunctionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionStatement {
    pub pos: Position,
    pub name: String,
    pub params: Vec<FunctionParameter>,
    pub ret: SourceType,
    pub body: BlockStatement,
}

impl fmt::Display for FunctionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fnc {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {} {{ {} }}", self.ret, self.body)
    }
}

#[derive(Debug, Clone)]
pub struct ImportStatement {
    pub pos: Position,
    pub path: String,
}

impl fmt::Display for ImportStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import \"{}\"", self.path)
    }
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub pos: Position,
    pub condition: Expression,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

impl fmt::Display for IfStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if {} {{ {} }}", self.condition, self.consequence)?;
        if let Some(alternative) = &self.alternative {
            write!(f, " else {{ {} }}", alternative)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub pos: Position,
    pub condition: Expression,
    pub body: BlockStatement,
}

impl fmt::Display for WhileStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while {} {{ {} }}", self.condition, self.body)
    }
}

/// Struct declaration. Fields are positional in LLVM terms, so the
/// declaration keeps the ordered type list and a name-to-index map built in
/// lock-step; `.field` lowering is then a constant index lookup.
#[derive(Debug, Clone)]
pub struct StructStatement {
    pub pos: Position,
    pub name: String,
    pub field_types: Vec<SourceType>,
    pub field_indexes: HashMap<String, usize>,
}

impl fmt::Display for StructStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = vec![""; self.field_types.len()];
        for (name, idx) in &self.field_indexes {
            names[*idx] = name.as_str();
        }
        write!(f, "struct {}{{", self.name)?;
        for (ty, name) in self.field_types.iter().zip(names) {
            write!(f, "{} {};", ty, name)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Dot,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Dot => ".",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("!"),
            UnaryOp::Neg => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Integer(IntegerLiteral),
    Float(FloatLiteral),
    Boolean(BooleanLiteral),
    Str(StringLiteral),
    Identifier(Identifier),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    Assign(AssignExpression),
    Call(CallExpression),
    Reference(ReferenceExpression),
    Dereference(DereferenceExpression),
    Cast(CastExpression),
    Sizeof(SizeofExpression),
    Array(ArrayLiteral),
    StructInit(StructInit),
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Integer(e) => e.pos,
            Expression::Float(e) => e.pos,
            Expression::Boolean(e) => e.pos,
            Expression::Str(e) => e.pos,
            Expression::Identifier(e) => e.pos,
            Expression::Prefix(e) => Position::span(e.pos, e.right.position()),
            Expression::Infix(e) => Position::span(e.left.position(), e.right.position()),
            Expression::Assign(e) => Position::span(e.left.position(), e.right.position()),
            Expression::Call(e) => e.pos,
            Expression::Reference(e) => Position::span(e.pos, e.var.pos),
            Expression::Dereference(e) => Position::span(e.pos, e.expr.position()),
            Expression::Cast(e) => e.pos,
            Expression::Sizeof(e) => e.pos,
            Expression::Array(e) => e.pos,
            Expression::StructInit(e) => e.pos,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(e) => write!(f, "{}", e),
            Expression::Float(e) => write!(f, "{}", e),
            Expression::Boolean(e) => write!(f, "{}", e),
            Expression::Str(e) => write!(f, "{}", e),
            Expression::Identifier(e) => write!(f, "{}", e),
            Expression::Prefix(e) => write!(f, "{}", e),
            Expression::Infix(e) => write!(f, "{}", e),
            Expression::Assign(e) => write!(f, "{}", e),
            Expression::Call(e) => write!(f, "{}", e),
            Expression::Reference(e) => write!(f, "{}", e),
            Expression::Dereference(e) => write!(f, "{}", e),
            Expression::Cast(e) => write!(f, "{}", e),
            Expression::Sizeof(e) => write!(f, "{}", e),
            Expression::Array(e) => write!(f, "{}", e),
            Expression::StructInit(e) => write!(f, "{}", e),
        }
    }
}

/// Integer literal. Both the signed and the unsigned reading of the source
/// text are kept; the emitter picks one from the resolved base type.
#[derive(Debug, Clone)]
pub struct IntegerLiteral {
    pub pos: Position,
    pub literal: String,
    pub value: i64,
    pub uvalue: u64,
    pub ty: SourceType,
}

impl fmt::Display for IntegerLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.base.is_unsigned_int() {
            write!(f, "{}({})", self.uvalue, self.ty)
        } else if self.ty.base.is_signed_int() {
            write!(f, "{}({})", self.value, self.ty)
        } else {
            write!(f, "{}({})", self.literal, self.ty)
        }
    }
}

#[derive(Debug, Clone)]
pub struct FloatLiteral {
    pub pos: Position,
    pub literal: String,
    pub value: f32,
}

impl fmt::Display for FloatLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.literal, BaseType::Float)
    }
}

#[derive(Debug, Clone)]
pub struct BooleanLiteral {
    pub pos: Position,
    pub value: bool,
}

impl fmt::Display for BooleanLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// String literal; `value` already carries the NUL byte the parser appends.
#[derive(Debug, Clone)]
pub struct StringLiteral {
    pub pos: Position,
    pub value: String,
}

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value)
    }
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub pos: Position,
    pub name: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct PrefixExpression {
    pub pos: Position,
    pub op: UnaryOp,
    pub right: Box<Expression>,
}

impl fmt::Display for PrefixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{})", self.op, self.right)
    }
}

#[derive(Debug, Clone)]
pub struct InfixExpression {
    pub left: Box<Expression>,
    pub op: BinaryOp,
    pub right: Box<Expression>,
}

impl fmt::Display for InfixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}

#[derive(Debug, Clone)]
pub struct AssignExpression {
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl fmt::Display for AssignExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub pos: Position,
    pub function: Identifier,
    pub args: Vec<Expression>,
}

impl fmt::Display for CallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// `&x` — takes the address of a named local.
#[derive(Debug, Clone)]
pub struct ReferenceExpression {
    pub pos: Position,
    pub var: Identifier,
}

impl fmt::Display for ReferenceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.var)
    }
}

#[derive(Debug, Clone)]
pub struct DereferenceExpression {
    pub pos: Position,
    pub expr: Box<Expression>,
}

impl fmt::Display for DereferenceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*{}", self.expr)
    }
}

#[derive(Debug, Clone)]
pub struct CastExpression {
    pub pos: Position,
    pub expr: Box<Expression>,
    pub ty: SourceType,
}

impl fmt::Display for CastExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.expr, self.ty)
    }
}

#[derive(Debug, Clone)]
pub struct SizeofExpression {
    pub pos: Position,
    pub ty: SourceType,
}

impl fmt::Display for SizeofExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sizeof {}", self.ty)
    }
}

/// `[Type; elem, elem, …]` — a heap array built through the `arrays`
/// runtime module.
#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    pub pos: Position,
    pub elem_ty: SourceType,
    pub items: Vec<Expression>,
}

impl fmt::Display for ArrayLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{};", self.elem_ty)?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("]")
    }
}

/// `Name:{v, v, …}` — positional struct initialization.
#[derive(Debug, Clone)]
pub struct StructInit {
    pub pos: Position,
    pub name: String,
    pub values: Vec<Expression>,
}

impl fmt::Display for StructInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{{", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("}")
    }
}
