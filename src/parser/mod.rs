//! Pratt parser for gl3.
//!
//! Expressions are parsed with precedence climbing: the current token picks
//! a prefix handler, then infix handlers take over while the next token
//! binds tighter than the surrounding context. Errors never abort the
//! parse; each failed expectation pushes a message onto `errors` and the
//! current production yields `None`. The driver refuses to compile a file
//! whose parse produced any errors.

pub mod ast;
pub mod precedence;

use crate::lexer::token::{BaseType, Position, SourceType};
use crate::lexer::{Lexer, Token, TokenKind};
use ast::*;
use precedence::Precedence;

pub struct Parser {
    lexer: Lexer,
    pub errors: Vec<String>,
    curr: Token,
    peek: Token,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Parser {
        let placeholder = Token {
            kind: TokenKind::Eof,
            literal: String::new(),
            base: None,
            pos: Position::default(),
        };
        let mut parser = Parser {
            lexer,
            errors: Vec::new(),
            curr: placeholder.clone(),
            peek: placeholder,
        };
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.curr_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }

        Program { statements }
    }

    fn next_token(&mut self) {
        self.curr = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn curr_is(&self, kind: TokenKind) -> bool {
        self.curr.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.errors.push(format!(
                "expected next token to be {}, got {} instead",
                kind, self.peek.kind
            ));
            false
        }
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.curr.kind {
            TokenKind::Def => self.parse_def_statement().map(Statement::Def),
            TokenKind::Return => self.parse_return_statement().map(Statement::Return),
            TokenKind::Fnc => self.parse_function_statement().map(Statement::Function),
            TokenKind::Import => self.parse_import_statement().map(Statement::Import),
            TokenKind::If => self.parse_if_statement().map(Statement::If),
            TokenKind::While => self.parse_while_statement().map(Statement::While),
            TokenKind::Struct => self.parse_struct_statement().map(Statement::Struct),
            _ => self.parse_expression_statement().map(Statement::Expression),
        }
    }

    fn parse_def_statement(&mut self) -> Option<DefStatement> {
        let pos = self.curr.pos;

        if !self.expect_type_start() {
            return None;
        }
        let ty = self.parse_type()?;

        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.curr.literal.clone();

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        let pos = Position::span(pos, value.position());

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(DefStatement {
            pos,
            ty,
            name,
            value,
        })
    }

    fn parse_return_statement(&mut self) -> Option<ReturnStatement> {
        let pos = self.curr.pos;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        let pos = Position::span(pos, value.position());

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(ReturnStatement { pos, value })
    }

    fn parse_import_statement(&mut self) -> Option<ImportStatement> {
        let pos = self.curr.pos;

        if !self.expect_peek(TokenKind::String) {
            return None;
        }
        let path = self.curr.literal.clone();
        let pos = Position::span(pos, self.curr.pos);

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(ImportStatement { pos, path })
    }

    fn parse_if_statement(&mut self) -> Option<IfStatement> {
        let pos = self.curr.pos;
        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let consequence = self.parse_block_statement()?;

        let mut alternative = None;
        if self.peek_is(TokenKind::Else) {
            self.next_token();
            if !self.expect_peek(TokenKind::Lbrace) {
                return None;
            }
            alternative = Some(self.parse_block_statement()?);
        }

        let pos = Position::span(pos, self.curr.pos);
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(IfStatement {
            pos,
            condition,
            consequence,
            alternative,
        })
    }

    fn parse_while_statement(&mut self) -> Option<WhileStatement> {
        let pos = self.curr.pos;
        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement()?;

        let pos = Position::span(pos, self.curr.pos);
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(WhileStatement {
            pos,
            condition,
            body,
        })
    }

    // Called with the current token on `{`; leaves it on the matching `}`.
    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let mut statements = Vec::new();
        self.next_token();

        while !self.curr_is(TokenKind::Rbrace) {
            if self.curr_is(TokenKind::Eof) {
                self.errors
                    .push("expected RBRACE to close block, reached end of input".to_string());
                return None;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }

        Some(BlockStatement { statements })
    }

    fn parse_function_statement(&mut self) -> Option<FunctionStatement> {
        let pos = self.curr.pos;

        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.curr.literal.clone();

        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }

        let mut params = Vec::new();
        while !self.peek_is(TokenKind::Rparen) {
            if !self.expect_type_start() {
                return None;
            }
            let ty = self.parse_type()?;
            if !self.expect_peek(TokenKind::Identifier) {
                return None;
            }
            params.push(FunctionParameter {
                ty,
                name: self.curr.literal.clone(),
            });
            if self.peek_is(TokenKind::Comma) {
                self.next_token();
            }
        }
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }

        if !self.expect_peek(TokenKind::Arrow) {
            return None;
        }
        if !self.expect_type_start() {
            return None;
        }
        let ret = self.parse_type()?;

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement()?;

        let pos = Position::span(pos, self.curr.pos);
        Some(FunctionStatement {
            pos,
            name,
            params,
            ret,
            body,
        })
    }

    fn parse_struct_statement(&mut self) -> Option<StructStatement> {
        let pos = self.curr.pos;

        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.curr.literal.clone();

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }

        let mut field_types = Vec::new();
        let mut field_indexes = std::collections::HashMap::new();
        while !self.peek_is(TokenKind::Rbrace) {
            if !self.expect_type_start() {
                return None;
            }
            let ty = self.parse_type()?;
            if !self.expect_peek(TokenKind::Identifier) {
                return None;
            }
            field_indexes.insert(self.curr.literal.clone(), field_types.len());
            field_types.push(ty);
        }
        if !self.expect_peek(TokenKind::Rbrace) {
            return None;
        }

        let pos = Position::span(pos, self.curr.pos);
        Some(StructStatement {
            pos,
            name,
            field_types,
            field_indexes,
        })
    }

    fn parse_expression_statement(&mut self) -> Option<ExpressionStatement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(ExpressionStatement { expression })
    }

    // ---- types ----

    // A type is either a TYPE keyword token or a struct-name identifier;
    // this checks the peek token starts one and advances onto it.
    fn expect_type_start(&mut self) -> bool {
        if self.peek_is(TokenKind::Type) || self.peek_is(TokenKind::Identifier) {
            self.next_token();
            true
        } else {
            self.errors.push(format!(
                "expected next token to be {}, got {} instead",
                TokenKind::Type,
                self.peek.kind
            ));
            false
        }
    }

    // Current token is the start of a type; consumes trailing `*`s.
    fn parse_type(&mut self) -> Option<SourceType> {
        let base = match self.curr.kind {
            TokenKind::Type => self.curr.base.clone().unwrap_or(BaseType::None),
            TokenKind::Identifier => BaseType::Struct(self.curr.literal.clone()),
            _ => {
                self.errors
                    .push(format!("expected type, got {} instead", self.curr.kind));
                return None;
            }
        };

        let mut ty = SourceType { base, pointer: 0 };
        while self.peek_is(TokenKind::Asterisk) {
            ty.pointer += 1;
            self.next_token();
        }
        Some(ty)
    }

    // ---- expressions ----

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < Precedence::from(self.peek.kind)
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.curr.kind {
            TokenKind::Int => self.parse_integer_literal().map(Expression::Integer),
            TokenKind::Float => self.parse_float_literal().map(Expression::Float),
            TokenKind::String => Some(Expression::Str(StringLiteral {
                pos: self.curr.pos,
                value: format!("{}\0", self.curr.literal),
            })),
            TokenKind::Char => self.parse_char_literal().map(Expression::Integer),
            TokenKind::Minus => self.parse_prefix_expression(UnaryOp::Neg),
            TokenKind::Not => self.parse_prefix_expression(UnaryOp::Not),
            TokenKind::Identifier => Some(Expression::Identifier(Identifier {
                pos: self.curr.pos,
                name: self.curr.literal.clone(),
            })),
            TokenKind::Lparen => self.parse_grouped_expression(),
            TokenKind::Ampersand => self.parse_reference_expression().map(Expression::Reference),
            TokenKind::Asterisk => self.parse_dereference_expression(),
            TokenKind::True | TokenKind::False => Some(Expression::Boolean(BooleanLiteral {
                pos: self.curr.pos,
                value: self.curr_is(TokenKind::True),
            })),
            TokenKind::Sizeof => self.parse_sizeof_expression().map(Expression::Sizeof),
            TokenKind::Lbracket => self.parse_array_literal().map(Expression::Array),
            _ => {
                self.errors.push(format!(
                    "no prefix parse function for {} found",
                    self.curr.kind
                ));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let op = match self.curr.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Asterisk => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::Land => BinaryOp::And,
            TokenKind::Lor => BinaryOp::Or,
            TokenKind::Dot => BinaryOp::Dot,
            TokenKind::Lparen => return self.parse_call_expression(left).map(Expression::Call),
            TokenKind::Assign => return self.parse_assign_expression(left),
            TokenKind::As => return self.parse_cast_expression(left).map(Expression::Cast),
            TokenKind::Lbracket => return self.parse_index_expression(left),
            TokenKind::Colon => return self.parse_struct_init(left).map(Expression::StructInit),
            _ => return Some(left),
        };

        let precedence = Precedence::from(self.curr.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix(InfixExpression {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }))
    }

    fn parse_integer_literal(&mut self) -> Option<IntegerLiteral> {
        let literal = self.curr.literal.clone();
        let mut pos = self.curr.pos;

        let parsed = if let Some(hex) = literal
            .strip_prefix("0x")
            .or_else(|| literal.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16)
        } else {
            literal.parse::<u64>()
        };
        let uvalue = match parsed {
            Ok(v) => v,
            Err(_) => {
                self.errors
                    .push(format!("could not parse {:?} as integer", literal));
                0
            }
        };

        let mut ty = SourceType::new(BaseType::Int);
        if self.peek_is(TokenKind::Identifier) {
            let base = match self.peek.literal.as_str() {
                "i8" => Some(BaseType::Int8),
                "i16" => Some(BaseType::Int16),
                "i32" => Some(BaseType::Int32),
                "u8" => Some(BaseType::Uint8),
                "u16" => Some(BaseType::Uint16),
                "u32" => Some(BaseType::Uint32),
                "u64" => Some(BaseType::Uint),
                _ => None,
            };
            if let Some(base) = base {
                ty.base = base;
                self.next_token();
                pos = Position::span(pos, self.curr.pos);
            }
        }

        Some(IntegerLiteral {
            pos,
            literal,
            value: uvalue as i64,
            uvalue,
            ty,
        })
    }

    fn parse_float_literal(&mut self) -> Option<FloatLiteral> {
        let literal = self.curr.literal.clone();
        let value = match literal.parse::<f32>() {
            Ok(v) => v,
            Err(_) => {
                self.errors
                    .push(format!("could not parse {:?} as float", literal));
                0.0
            }
        };

        Some(FloatLiteral {
            pos: self.curr.pos,
            literal,
            value,
        })
    }

    fn parse_char_literal(&mut self) -> Option<IntegerLiteral> {
        let literal = self.curr.literal.clone();
        let byte = match literal.bytes().next() {
            Some(b) => b,
            None => {
                self.errors.push("empty char literal".to_string());
                return None;
            }
        };

        Some(IntegerLiteral {
            pos: self.curr.pos,
            literal,
            value: byte as i64,
            uvalue: byte as u64,
            ty: SourceType::new(BaseType::Int8),
        })
    }

    fn parse_prefix_expression(&mut self, op: UnaryOp) -> Option<Expression> {
        let pos = self.curr.pos;
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix(PrefixExpression {
            pos,
            op,
            right: Box::new(right),
        }))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(expr)
    }

    fn parse_reference_expression(&mut self) -> Option<ReferenceExpression> {
        let pos = self.curr.pos;
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }

        Some(ReferenceExpression {
            pos,
            var: Identifier {
                pos: self.curr.pos,
                name: self.curr.literal.clone(),
            },
        })
    }

    fn parse_dereference_expression(&mut self) -> Option<Expression> {
        let pos = self.curr.pos;
        self.next_token();
        let expr = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Dereference(DereferenceExpression {
            pos,
            expr: Box::new(expr),
        }))
    }

    // `sizeof` accepts a TYPE token or a struct-name identifier, then
    // pointer stars.
    fn parse_sizeof_expression(&mut self) -> Option<SizeofExpression> {
        let pos = self.curr.pos;
        if !self.expect_type_start() {
            return None;
        }
        let ty = self.parse_type()?;
        let pos = Position::span(pos, self.curr.pos);

        Some(SizeofExpression { pos, ty })
    }

    // `[ Type ; elem (, elem)* ]`
    fn parse_array_literal(&mut self) -> Option<ArrayLiteral> {
        let pos = self.curr.pos;
        if !self.expect_type_start() {
            return None;
        }
        let elem_ty = self.parse_type()?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }

        let mut items = Vec::new();
        if self.peek_is(TokenKind::Rbracket) {
            self.next_token();
        } else {
            self.next_token();
            items.push(self.parse_expression(Precedence::Lowest)?);
            while self.peek_is(TokenKind::Comma) {
                self.next_token();
                self.next_token();
                items.push(self.parse_expression(Precedence::Lowest)?);
            }
            if !self.expect_peek(TokenKind::Rbracket) {
                return None;
            }
        }

        let pos = Position::span(pos, self.curr.pos);
        Some(ArrayLiteral {
            pos,
            elem_ty,
            items,
        })
    }

    fn parse_call_expression(&mut self, left: Expression) -> Option<CallExpression> {
        let function = match left {
            Expression::Identifier(ident) => ident,
            other => {
                self.errors.push(format!(
                    "expected identifier before call arguments, got {}",
                    other
                ));
                return None;
            }
        };

        let mut args = Vec::new();
        if self.peek_is(TokenKind::Rparen) {
            self.next_token();
        } else {
            self.next_token();
            args.push(self.parse_expression(Precedence::Lowest)?);
            while self.peek_is(TokenKind::Comma) {
                self.next_token();
                self.next_token();
                args.push(self.parse_expression(Precedence::Lowest)?);
            }
            if !self.expect_peek(TokenKind::Rparen) {
                return None;
            }
        }

        let pos = Position::span(function.pos, self.curr.pos);
        Some(CallExpression {
            pos,
            function,
            args,
        })
    }

    fn parse_assign_expression(&mut self, left: Expression) -> Option<Expression> {
        match &left {
            Expression::Identifier(_) | Expression::Dereference(_) => {}
            Expression::Infix(infix) if infix.op == BinaryOp::Dot => {}
            other => {
                self.errors.push(format!(
                    "got {} on lhs of assignment, expected ident, deref or field access",
                    other
                ));
                return None;
            }
        }

        self.next_token();
        let right = self.parse_expression(Precedence::Lowest)?;

        Some(Expression::Assign(AssignExpression {
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    fn parse_cast_expression(&mut self, left: Expression) -> Option<CastExpression> {
        let pos = left.position();
        if !self.expect_type_start() {
            return None;
        }
        let ty = self.parse_type()?;
        let pos = Position::span(pos, self.curr.pos);

        Some(CastExpression {
            pos,
            expr: Box::new(left),
            ty,
        })
    }

    // `a[i]` is sugar for pointer arithmetic: it parses straight to
    // `*(a + i)`, so the emitter only ever sees `+` and `*`.
    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        let pos = self.curr.pos;
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rbracket) {
            return None;
        }

        Some(Expression::Dereference(DereferenceExpression {
            pos,
            expr: Box::new(Expression::Infix(InfixExpression {
                left: Box::new(left),
                op: BinaryOp::Add,
                right: Box::new(index),
            })),
        }))
    }

    // `Name:{v, v, …}`
    fn parse_struct_init(&mut self, left: Expression) -> Option<StructInit> {
        let name = match left {
            Expression::Identifier(ident) => ident,
            other => {
                self.errors.push(format!(
                    "expected struct name before ':' initializer, got {}",
                    other
                ));
                return None;
            }
        };

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }

        let mut values = Vec::new();
        if self.peek_is(TokenKind::Rbrace) {
            self.next_token();
        } else {
            self.next_token();
            values.push(self.parse_expression(Precedence::Lowest)?);
            while self.peek_is(TokenKind::Comma) {
                self.next_token();
                self.next_token();
                values.push(self.parse_expression(Precedence::Lowest)?);
            }
            if !self.expect_peek(TokenKind::Rbrace) {
                return None;
            }
        }

        let pos = Position::span(name.pos, self.curr.pos);
        Some(StructInit {
            pos,
            name: name.name,
            values,
        })
    }
}
