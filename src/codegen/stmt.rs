//! Statement lowering: declarations, control flow and function bodies.

use inkwell::types::BasicType;
use inkwell::values::BasicValueEnum;

use crate::diagnostics::Diagnostic;
use crate::lexer::token::BaseType;
use crate::parser::ast::{
    BlockStatement, DefStatement, FunctionStatement, IfStatement, ReturnStatement, Statement,
    StructStatement, WhileStatement,
};

use super::scopes::Local;

impl<'ctx> super::Emitter<'ctx> {
    pub(crate) fn lower_statement(&mut self, stmt: &Statement) -> Result<(), Diagnostic> {
        match stmt {
            Statement::Expression(s) => {
                self.require_function(s.expression.position())?;
                self.lower_expression(&s.expression)?;
                Ok(())
            }
            Statement::Def(s) => {
                self.require_function(s.pos)?;
                self.lower_def(s)
            }
            Statement::Return(s) => {
                self.require_function(s.pos)?;
                self.lower_return(s)
            }
            Statement::Function(s) => self.lower_function(s),
            Statement::If(s) => self.lower_if(s),
            Statement::While(s) => self.lower_while(s),
            Statement::Struct(s) => self.lower_struct(s),
            Statement::Import(s) => self.lower_import(s),
        }
    }

    // Lowers a block's statements, collecting per-statement errors so one
    // bad statement doesn't hide diagnostics for its siblings.
    fn lower_block(&mut self, block: &BlockStatement) {
        for stmt in &block.statements {
            if let Err(diagnostic) = self.lower_statement(stmt) {
                self.errors.push(diagnostic);
            }
        }
    }

    fn lower_def(&mut self, def: &DefStatement) -> Result<(), Diagnostic> {
        if self.scope.is_param(&def.name) {
            return Err(Diagnostic::at(
                def.pos,
                format!("{} is already bound as a parameter", def.name),
            ));
        }

        let ir_type = self.ir_type(&def.ty).ok_or_else(|| {
            Diagnostic::at(
                def.pos,
                format!("cannot declare variable of type {}", def.ty),
            )
        })?;

        let (value, _) = self.lower_operand(&def.value)?;

        let ptr = self
            .builder
            .build_alloca(ir_type, &def.name)
            .map_err(|_| Diagnostic::at(def.pos, "failed to build alloca"))?;
        self.builder
            .build_store(ptr, value)
            .map_err(|_| Diagnostic::at(def.pos, "failed to build store"))?;

        self.scope.define(
            def.name.clone(),
            Local {
                ptr,
                ir_type,
                source_type: def.ty.clone(),
            },
        );
        Ok(())
    }

    fn lower_return(&mut self, ret: &ReturnStatement) -> Result<(), Diagnostic> {
        let (value, _) = self.lower_operand(&ret.value)?;
        self.builder
            .build_return(Some(&value))
            .map_err(|_| Diagnostic::at(ret.pos, "failed to build return"))?;
        Ok(())
    }

    fn lower_function(&mut self, func: &FunctionStatement) -> Result<(), Diagnostic> {
        let is_void =
            func.ret.pointer == 0 && matches!(func.ret.base, BaseType::None | BaseType::Void);

        let mut param_irs = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ir = self.ir_type(&param.ty).ok_or_else(|| {
                Diagnostic::at(
                    func.pos,
                    format!("parameter {} has invalid type {}", param.name, param.ty),
                )
            })?;
            param_irs.push(ir.into());
        }

        let fn_type = if is_void {
            self.context.void_type().fn_type(&param_irs, false)
        } else {
            let ret_ir = self.ir_type(&func.ret).ok_or_else(|| {
                Diagnostic::at(
                    func.pos,
                    format!("function {} has invalid return type {}", func.name, func.ret),
                )
            })?;
            ret_ir.fn_type(&param_irs, false)
        };

        let function = self.module.add_function(&func.name, fn_type, None);
        self.functions.insert(func.name.clone(), function);
        self.function_ret_types
            .insert(func.name.clone(), func.ret.clone());

        self.scope.enter_function();
        for (i, param) in func.params.iter().enumerate() {
            let value = function.get_nth_param(i as u32).ok_or_else(|| {
                Diagnostic::at(func.pos, format!("missing parameter {}", param.name))
            })?;
            set_value_name(value, &param.name);
            self.scope
                .define_param(param.name.clone(), value, param.ty.clone());
        }

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        self.current_fn = Some(function);

        let mut found_return = false;
        for stmt in &func.body.statements {
            if matches!(stmt, Statement::Return(_)) {
                found_return = true;
            }
            if let Err(diagnostic) = self.lower_statement(stmt) {
                self.errors.push(diagnostic);
            }
        }

        if !found_return {
            if is_void && !matches!(func.ret.base, BaseType::Struct(_)) {
                if self.needs_terminator() {
                    self.builder
                        .build_return(None)
                        .map_err(|_| Diagnostic::at(func.pos, "failed to build return"))?;
                }
            } else {
                self.errors.push(Diagnostic::at(
                    func.pos,
                    "missing return statement in non-void function",
                ));
            }
        }

        self.scope.exit_function();
        self.current_fn = None;
        Ok(())
    }

    fn lower_if(&mut self, stmt: &IfStatement) -> Result<(), Diagnostic> {
        let function = self
            .current_fn
            .ok_or_else(|| Diagnostic::at(stmt.pos, "if statement outside of a function"))?;

        let (cond, cond_ty) = self.lower_operand(&stmt.condition)?;
        let cond = match cond {
            BasicValueEnum::IntValue(iv)
                if cond_ty.base == BaseType::Bool && cond_ty.pointer == 0 =>
            {
                iv
            }
            _ => {
                return Err(Diagnostic::at(
                    stmt.condition.position(),
                    format!("if condition must be Bool, got {}", cond_ty),
                ));
            }
        };

        let then_block = self.context.append_basic_block(function, "then");
        let else_block = stmt
            .alternative
            .as_ref()
            .map(|_| self.context.append_basic_block(function, "else"));
        let end_block = self.context.append_basic_block(function, "end");

        self.builder
            .build_conditional_branch(cond, then_block, else_block.unwrap_or(end_block))
            .map_err(|_| Diagnostic::at(stmt.pos, "failed to build branch"))?;

        // a def inside an arm lives in its own frame and dies with it
        self.builder.position_at_end(then_block);
        self.scope.push();
        self.lower_block(&stmt.consequence);
        self.scope.pop();
        self.branch_to(end_block)?;

        if let (Some(alternative), Some(else_block)) = (&stmt.alternative, else_block) {
            self.builder.position_at_end(else_block);
            self.scope.push();
            self.lower_block(alternative);
            self.scope.pop();
            self.branch_to(end_block)?;
        }

        self.builder.position_at_end(end_block);
        Ok(())
    }

    fn lower_while(&mut self, stmt: &WhileStatement) -> Result<(), Diagnostic> {
        let function = self
            .current_fn
            .ok_or_else(|| Diagnostic::at(stmt.pos, "while statement outside of a function"))?;

        let cond_block = self.context.append_basic_block(function, "cond");
        let body_block = self.context.append_basic_block(function, "body");
        let end_block = self.context.append_basic_block(function, "end");

        self.builder
            .build_unconditional_branch(cond_block)
            .map_err(|_| Diagnostic::at(stmt.pos, "failed to build branch"))?;

        self.builder.position_at_end(cond_block);
        let (cond, cond_ty) = self.lower_operand(&stmt.condition)?;
        let cond = match cond {
            BasicValueEnum::IntValue(iv)
                if cond_ty.base == BaseType::Bool && cond_ty.pointer == 0 =>
            {
                iv
            }
            _ => {
                return Err(Diagnostic::at(
                    stmt.condition.position(),
                    format!("while condition must be Bool, got {}", cond_ty),
                ));
            }
        };
        self.builder
            .build_conditional_branch(cond, body_block, end_block)
            .map_err(|_| Diagnostic::at(stmt.pos, "failed to build branch"))?;

        self.builder.position_at_end(body_block);
        self.scope.push();
        self.lower_block(&stmt.body);
        self.scope.pop();
        self.branch_to(cond_block)?;

        self.builder.position_at_end(end_block);
        Ok(())
    }

    fn lower_struct(&mut self, stmt: &StructStatement) -> Result<(), Diagnostic> {
        let struct_ty = self.context.opaque_struct_type(&stmt.name);

        // registering the handle first lets pointer fields refer back to the
        // struct being declared
        self.struct_types.insert(stmt.name.clone(), struct_ty);

        let mut field_irs = Vec::with_capacity(stmt.field_types.len());
        for field in &stmt.field_types {
            let ir = self.ir_type(field).ok_or_else(|| {
                Diagnostic::at(
                    stmt.pos,
                    format!("struct {} has field of invalid type {}", stmt.name, field),
                )
            })?;
            field_irs.push(ir);
        }
        struct_ty.set_body(&field_irs, false);

        self.struct_field_indexes
            .insert(stmt.name.clone(), stmt.field_indexes.clone());
        self.struct_field_types
            .insert(stmt.name.clone(), stmt.field_types.clone());
        Ok(())
    }

    // Appends a branch to `target` unless the block already ended (an early
    // `return` inside the arm is its terminator).
    fn branch_to(&mut self, target: inkwell::basic_block::BasicBlock<'ctx>) -> Result<(), Diagnostic> {
        if self.needs_terminator() {
            self.builder
                .build_unconditional_branch(target)
                .map_err(|_| Diagnostic::simple("failed to build branch"))?;
        }
        Ok(())
    }

    fn needs_terminator(&self) -> bool {
        self.builder
            .get_insert_block()
            .map(|block| block.get_terminator().is_none())
            .unwrap_or(false)
    }

    fn require_function(
        &self,
        pos: crate::lexer::token::Position,
    ) -> Result<(), Diagnostic> {
        if self.current_fn.is_none() {
            return Err(Diagnostic::at(pos, "statement outside of a function"));
        }
        Ok(())
    }
}

// gl3 parameters are ints, floats, bools, pointers or structs.
fn set_value_name(value: BasicValueEnum<'_>, name: &str) {
    match value {
        BasicValueEnum::IntValue(v) => v.set_name(name),
        BasicValueEnum::FloatValue(v) => v.set_name(name),
        BasicValueEnum::PointerValue(v) => v.set_name(name),
        BasicValueEnum::StructValue(v) => v.set_name(name),
        _ => {}
    }
}
