//! ASM intrinsics: calls the emitter lowers directly instead of emitting a
//! real call. Enabled by `import "asm"`; every intrinsic name starts with
//! `__asm__`.

use inkwell::types::BasicType;
use inkwell::values::BasicValue;

use crate::diagnostics::Diagnostic;
use crate::lexer::token::SourceType;
use crate::parser::ast::{CallExpression, Expression};

use super::expr::Lowered;

impl<'ctx> super::Emitter<'ctx> {
    pub(crate) fn lower_asm_intrinsic(
        &mut self,
        call: &CallExpression,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        match call.function.name.as_str() {
            "__asm__salloc" => self.lower_salloc(call),
            other => Err(Diagnostic::at(
                call.pos,
                format!("unknown asm intrinsic function: {}", other),
            )),
        }
    }

    // `__asm__salloc(count, sizeof T)` — a stack allocation of
    // `[count x T]`, handed back as a `T*`. Both arguments must be literal
    // forms: the array length is baked into the alloca's type.
    fn lower_salloc(&mut self, call: &CallExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        if call.args.len() != 2 {
            return Err(Diagnostic::at(
                call.pos,
                format!(
                    "invalid amount of arguments for __asm__salloc: {}",
                    call.args.len()
                ),
            ));
        }

        let count = match &call.args[0] {
            Expression::Integer(lit) => {
                if lit.ty.base.is_unsigned_int() {
                    lit.uvalue
                } else {
                    lit.value as u64
                }
            }
            other => {
                return Err(Diagnostic::at(
                    call.pos,
                    format!("first argument of __asm__salloc is not an integer: {}", other),
                ));
            }
        };
        let elem_ty = match &call.args[1] {
            Expression::Sizeof(sizeof) => sizeof.ty.clone(),
            other => {
                return Err(Diagnostic::at(
                    call.pos,
                    format!(
                        "second argument of __asm__salloc is not a sizeof expr: {}",
                        other
                    ),
                ));
            }
        };

        let elem_ir = self.ir_type(&elem_ty).ok_or_else(|| {
            Diagnostic::at(call.pos, format!("cannot allocate elements of {}", elem_ty))
        })?;
        let array_ty = elem_ir.array_type(count as u32);
        let ptr = self
            .builder
            .build_alloca(array_ty, "salloc")
            .map_err(|_| Diagnostic::at(call.pos, "failed to build alloca"))?;

        let ty = SourceType {
            base: elem_ty.base,
            pointer: elem_ty.pointer + 1,
        };
        Ok((Some(ptr.as_basic_value_enum()), ty))
    }
}
