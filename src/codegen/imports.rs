//! Import resolution.
//!
//! Three disjoint cases by path: a `.gl3` path re-parses the referenced
//! source file and declares its functions as externals; `asm` switches on
//! the intrinsic lowering; anything else must name a builtin module in the
//! registry.

use inkwell::types::BasicMetadataTypeEnum;

use crate::diagnostics::Diagnostic;
use crate::lexer::token::{BaseType, SourceType};
use crate::lexer::Lexer;
use crate::parser::ast::{ImportStatement, Program, Statement};
use crate::parser::Parser;

use super::builtins;

struct ExternDeclare {
    name: String,
    ret: SourceType,
    params: Vec<SourceType>,
}

// Only top-level `fnc` declarations are exported from an imported file.
fn collect_declares(program: &Program) -> Vec<ExternDeclare> {
    let mut declares = Vec::new();
    for stmt in &program.statements {
        if let Statement::Function(func) = stmt {
            declares.push(ExternDeclare {
                name: func.name.clone(),
                ret: func.ret.clone(),
                params: func.params.iter().map(|p| p.ty.clone()).collect(),
            });
        }
    }
    declares
}

impl<'ctx> super::Emitter<'ctx> {
    pub(crate) fn lower_import(&mut self, import: &ImportStatement) -> Result<(), Diagnostic> {
        if import.path.ends_with(".gl3") {
            return self.import_source_file(import);
        }

        if import.path == "asm" {
            self.asm_enabled = true;
            return Ok(());
        }

        self.add_builtin_module(import)
    }

    fn import_source_file(&mut self, import: &ImportStatement) -> Result<(), Diagnostic> {
        let source = std::fs::read_to_string(&import.path).map_err(|_| {
            Diagnostic::at(
                import.pos,
                format!("cannot find {} file described in import stmt", import.path),
            )
        })?;

        let mut parser = Parser::new(Lexer::new(&source));
        let program = parser.parse_program();
        if !parser.errors.is_empty() {
            return Err(Diagnostic::at(
                import.pos,
                format!(
                    "parse errors in imported file {}: {}",
                    import.path,
                    parser.errors.join("; ")
                ),
            ));
        }

        for declare in collect_declares(&program) {
            if self.functions.contains_key(&declare.name) {
                continue;
            }
            self.declare_external(import, &declare.name, &declare.ret, &declare.params)?;
        }
        Ok(())
    }

    fn add_builtin_module(&mut self, import: &ImportStatement) -> Result<(), Diagnostic> {
        let module = builtins::find_module(&import.path).ok_or_else(|| {
            Diagnostic::at(
                import.pos,
                format!("couldn't import builtin module {}", import.path),
            )
        })?;

        if self.builtin_modules.contains(&module.name) {
            return Ok(());
        }

        for function in &module.functions {
            self.declare_external(import, function.name, &function.ret, &function.params)?;
        }
        self.builtin_modules.push(module.name);
        Ok(())
    }

    fn declare_external(
        &mut self,
        import: &ImportStatement,
        name: &str,
        ret: &SourceType,
        params: &[SourceType],
    ) -> Result<(), Diagnostic> {
        let mut param_irs: Vec<BasicMetadataTypeEnum> = Vec::with_capacity(params.len());
        for param in params {
            let ir = self.ir_type(param).ok_or_else(|| {
                Diagnostic::at(
                    import.pos,
                    format!("parameter of {} has invalid type {}", name, param),
                )
            })?;
            param_irs.push(ir.into());
        }

        let is_void = ret.pointer == 0 && matches!(ret.base, BaseType::None | BaseType::Void);
        let fn_type = if is_void {
            self.context.void_type().fn_type(&param_irs, false)
        } else {
            use inkwell::types::BasicType;
            let ret_ir = self.ir_type(ret).ok_or_else(|| {
                Diagnostic::at(
                    import.pos,
                    format!("return type of {} is invalid: {}", name, ret),
                )
            })?;
            ret_ir.fn_type(&param_irs, false)
        };

        let function = self.module.add_function(name, fn_type, None);
        self.functions.insert(name.to_string(), function);
        self.function_ret_types.insert(name.to_string(), ret.clone());
        Ok(())
    }
}
