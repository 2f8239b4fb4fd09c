//! Import-hygiene pass.
//!
//! A single read-only walk over the AST that verifies any call to a builtin
//! module's function is preceded by an `import` of that module. Source-file
//! imports (`.gl3` paths) are not modules and are ignored here. Names that
//! belong to no builtin module are skipped; the emitter reports them later
//! if nothing else resolves them.

use std::collections::HashSet;

use crate::codegen::builtins;
use crate::parser::ast::{Expression, Program, Statement};

#[derive(Default)]
pub struct Checker {
    imported: HashSet<String>,
    pub errors: Vec<String>,
}

impl Checker {
    pub fn new() -> Checker {
        Checker::default()
    }

    pub fn check_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.check_statement(stmt);
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Import(import) => {
                if !import.path.ends_with(".gl3") {
                    self.imported.insert(import.path.clone());
                }
            }
            Statement::Expression(s) => self.check_expression(&s.expression),
            Statement::Def(s) => self.check_expression(&s.value),
            Statement::Return(s) => self.check_expression(&s.value),
            Statement::Function(s) => {
                for stmt in &s.body.statements {
                    self.check_statement(stmt);
                }
            }
            Statement::If(s) => {
                self.check_expression(&s.condition);
                for stmt in &s.consequence.statements {
                    self.check_statement(stmt);
                }
                if let Some(alternative) = &s.alternative {
                    for stmt in &alternative.statements {
                        self.check_statement(stmt);
                    }
                }
            }
            Statement::While(s) => {
                self.check_expression(&s.condition);
                for stmt in &s.body.statements {
                    self.check_statement(stmt);
                }
            }
            Statement::Struct(_) => {}
        }
    }

    fn check_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Call(call) => {
                for arg in &call.args {
                    self.check_expression(arg);
                }
                if let Some(module) = builtins::module_providing(&call.function.name) {
                    if !self.imported.contains(module) {
                        self.errors.push(format!(
                            "stdlib function '{}' used without stdlib module '{}' imported, did you mean to import it?",
                            call.function.name, module
                        ));
                    }
                }
            }
            Expression::Prefix(e) => self.check_expression(&e.right),
            Expression::Infix(e) => {
                self.check_expression(&e.left);
                self.check_expression(&e.right);
            }
            Expression::Assign(e) => {
                self.check_expression(&e.left);
                self.check_expression(&e.right);
            }
            Expression::Dereference(e) => self.check_expression(&e.expr),
            Expression::Cast(e) => self.check_expression(&e.expr),
            Expression::Array(e) => {
                for item in &e.items {
                    self.check_expression(item);
                }
            }
            Expression::StructInit(e) => {
                for value in &e.values {
                    self.check_expression(value);
                }
            }
            Expression::Integer(_)
            | Expression::Float(_)
            | Expression::Boolean(_)
            | Expression::Str(_)
            | Expression::Identifier(_)
            | Expression::Reference(_)
            | Expression::Sizeof(_) => {}
        }
    }
}
