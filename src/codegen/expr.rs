//! Expression lowering.
//!
//! `lower_expression` returns the IR value (absent only for calls to void
//! functions) together with the expression's source type. `lower_operand`
//! is the same but rejects void values, for positions where a value is
//! required.

use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, IntValue, PointerValue,
};
use inkwell::{FloatPredicate, IntPredicate};

use crate::diagnostics::Diagnostic;
use crate::lexer::token::{BaseType, Position, SourceType};
use crate::parser::ast::{
    ArrayLiteral, AssignExpression, BinaryOp, CallExpression, CastExpression,
    DereferenceExpression, Expression, InfixExpression, PrefixExpression, ReferenceExpression,
    SizeofExpression, StructInit, UnaryOp,
};

pub(crate) type Lowered<'ctx> = (Option<BasicValueEnum<'ctx>>, SourceType);

fn int_value(value: BasicValueEnum<'_>, pos: Position) -> Result<IntValue<'_>, Diagnostic> {
    match value {
        BasicValueEnum::IntValue(iv) => Ok(iv),
        _ => Err(Diagnostic::at(pos, "expected an integer value")),
    }
}

fn pointer_value(value: BasicValueEnum<'_>, pos: Position) -> Result<PointerValue<'_>, Diagnostic> {
    match value {
        BasicValueEnum::PointerValue(pv) => Ok(pv),
        _ => Err(Diagnostic::at(pos, "expected a pointer value")),
    }
}

impl<'ctx> super::Emitter<'ctx> {
    pub(crate) fn lower_expression(
        &mut self,
        expr: &Expression,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        match expr {
            Expression::Integer(lit) => {
                let int_ty = match self.ir_type(&lit.ty) {
                    Some(inkwell::types::BasicTypeEnum::IntType(ty)) => ty,
                    _ => {
                        return Err(Diagnostic::at(
                            lit.pos,
                            format!("integer literal with non-integer type {}", lit.ty),
                        ));
                    }
                };
                let bits = if lit.ty.base.is_unsigned_int() {
                    lit.uvalue
                } else {
                    lit.value as u64
                };
                Ok((
                    Some(int_ty.const_int(bits, false).as_basic_value_enum()),
                    lit.ty.clone(),
                ))
            }
            Expression::Float(lit) => Ok((
                Some(self.f32_t.const_float(lit.value as f64).as_basic_value_enum()),
                SourceType::new(BaseType::Float),
            )),
            Expression::Boolean(lit) => Ok((
                Some(
                    self.bool_t
                        .const_int(lit.value as u64, false)
                        .as_basic_value_enum(),
                ),
                SourceType::new(BaseType::Bool),
            )),
            Expression::Str(lit) => {
                let ptr = self.intern_string(&lit.value);
                Ok((
                    Some(ptr.as_basic_value_enum()),
                    SourceType::pointer_to(BaseType::Char, 1),
                ))
            }
            Expression::Identifier(ident) => {
                if let Some((value, ty)) = self.scope.param(&ident.name) {
                    return Ok((Some(*value), ty.clone()));
                }
                let (ptr, ir_type, source_type) = match self.scope.lookup(&ident.name) {
                    Some(local) => (local.ptr, local.ir_type, local.source_type.clone()),
                    None => {
                        return Err(Diagnostic::at(
                            ident.pos,
                            format!("couldn't find variable of name {}", ident.name),
                        ));
                    }
                };
                let loaded = self
                    .builder
                    .build_load(ir_type, ptr, &ident.name)
                    .map_err(|_| Diagnostic::at(ident.pos, "failed to build load"))?;
                Ok((Some(loaded), source_type))
            }
            Expression::Prefix(prefix) => self.lower_prefix(prefix),
            Expression::Infix(infix) => self.lower_infix(infix),
            Expression::Assign(assign) => self.lower_assign(assign),
            Expression::Call(call) => self.lower_call(call),
            Expression::Reference(reference) => self.lower_reference(reference),
            Expression::Dereference(deref) => self.lower_dereference(deref),
            Expression::Cast(cast) => self.lower_cast(cast),
            Expression::Sizeof(sizeof) => self.lower_sizeof(sizeof),
            Expression::Array(array) => self.lower_array_literal(array),
            Expression::StructInit(init) => self.lower_struct_init(init),
        }
    }

    /// Like `lower_expression`, but the expression must produce a value.
    pub(crate) fn lower_operand(
        &mut self,
        expr: &Expression,
    ) -> Result<(BasicValueEnum<'ctx>, SourceType), Diagnostic> {
        let pos = expr.position();
        match self.lower_expression(expr)? {
            (Some(value), ty) => Ok((value, ty)),
            (None, _) => Err(Diagnostic::at(pos, "void value used as an operand")),
        }
    }

    fn lower_prefix(&mut self, prefix: &PrefixExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = Position::span(prefix.pos, prefix.right.position());
        let (value, ty) = self.lower_operand(&prefix.right)?;

        match prefix.op {
            UnaryOp::Not => {
                if ty.base != BaseType::Bool || ty.pointer > 0 {
                    return Err(Diagnostic::at(
                        pos,
                        format!("operator ! invalid for type {}", ty),
                    ));
                }
                let iv = int_value(value, pos)?;
                let one = self.bool_t.const_int(1, false);
                let out = self
                    .builder
                    .build_xor(iv, one, "not")
                    .map_err(|_| Diagnostic::at(pos, "failed to build xor"))?;
                Ok((Some(out.as_basic_value_enum()), ty))
            }
            UnaryOp::Neg => {
                if ty.pointer == 0 && ty.base.is_signed_int() {
                    let iv = int_value(value, pos)?;
                    let zero = iv.get_type().const_zero();
                    let out = self
                        .builder
                        .build_int_sub(zero, iv, "neg")
                        .map_err(|_| Diagnostic::at(pos, "failed to build sub"))?;
                    Ok((Some(out.as_basic_value_enum()), ty))
                } else if ty.pointer == 0 && ty.base == BaseType::Float {
                    let fv = value.into_float_value();
                    let zero = self.f32_t.const_float(0.0);
                    let out = self
                        .builder
                        .build_float_sub(zero, fv, "fneg")
                        .map_err(|_| Diagnostic::at(pos, "failed to build fsub"))?;
                    Ok((Some(out.as_basic_value_enum()), ty))
                } else {
                    Err(Diagnostic::at(
                        pos,
                        format!("operator - invalid for type {}", ty),
                    ))
                }
            }
        }
    }

    fn lower_infix(&mut self, infix: &InfixExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = Position::span(infix.left.position(), infix.right.position());

        if infix.op == BinaryOp::Dot {
            return self.lower_field_access(infix, pos);
        }

        let (left, lt) = self.lower_operand(&infix.left)?;
        let (right, rt) = self.lower_operand(&infix.right)?;

        // pointer +/- integer is pointer arithmetic
        if lt.pointer > 0 && rt.pointer == 0 && rt.base.is_integer() {
            if let BinaryOp::Add | BinaryOp::Sub = infix.op {
                let pointee = SourceType {
                    base: lt.base.clone(),
                    pointer: lt.pointer - 1,
                };
                let pointee_ir = self.ir_type(&pointee).ok_or_else(|| {
                    Diagnostic::at(pos, format!("pointer arithmetic on {} pointer", pointee))
                })?;
                let base_ptr = pointer_value(left, pos)?;
                let index = int_value(right, pos)?;
                let index = if infix.op == BinaryOp::Sub {
                    let zero = index.get_type().const_zero();
                    self.builder
                        .build_int_sub(zero, index, "neg.idx")
                        .map_err(|_| Diagnostic::at(pos, "failed to build sub"))?
                } else {
                    index
                };
                let gep = unsafe {
                    self.builder
                        .build_gep(pointee_ir, base_ptr, &[index], "ptr.idx")
                }
                .map_err(|_| Diagnostic::at(pos, "failed to build gep"))?;
                return Ok((Some(gep.as_basic_value_enum()), lt));
            }
        }

        let char_int8 = |a: &SourceType, b: &SourceType| {
            a.base == BaseType::Char && b.base == BaseType::Int8
        };
        let int_compatible = lt == rt || char_int8(&lt, &rt) || char_int8(&rt, &lt);

        if lt.pointer == 0
            && rt.pointer == 0
            && lt.base.is_integer()
            && rt.base.is_integer()
            && int_compatible
        {
            return self.lower_int_infix(infix.op, left, right, lt, pos);
        }

        if lt.pointer == 0
            && rt.pointer == 0
            && lt.base == BaseType::Float
            && rt.base == BaseType::Float
        {
            return self.lower_float_infix(infix.op, left, right, lt, pos);
        }

        if lt.pointer == 0
            && rt.pointer == 0
            && lt.base == BaseType::Bool
            && rt.base == BaseType::Bool
        {
            if let BinaryOp::And | BinaryOp::Or = infix.op {
                let l = int_value(left, pos)?;
                let r = int_value(right, pos)?;
                // no short-circuit: both sides were already evaluated
                let out = match infix.op {
                    BinaryOp::And => self.builder.build_and(l, r, "and"),
                    _ => self.builder.build_or(l, r, "or"),
                }
                .map_err(|_| Diagnostic::at(pos, "failed to build logical op"))?;
                return Ok((Some(out.as_basic_value_enum()), lt));
            }
            if let BinaryOp::Eq | BinaryOp::NotEq = infix.op {
                let l = int_value(left, pos)?;
                let r = int_value(right, pos)?;
                let predicate = if infix.op == BinaryOp::Eq {
                    IntPredicate::EQ
                } else {
                    IntPredicate::NE
                };
                let out = self
                    .builder
                    .build_int_compare(predicate, l, r, "cmp")
                    .map_err(|_| Diagnostic::at(pos, "failed to build icmp"))?;
                return Ok((Some(out.as_basic_value_enum()), lt));
            }
        }

        Err(Diagnostic::at(
            pos,
            format!(
                "operator {} invalid for types {}, {}",
                infix.op, lt, rt
            ),
        ))
    }

    fn lower_int_infix(
        &mut self,
        op: BinaryOp,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>,
        lt: SourceType,
        pos: Position,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        let l = int_value(left, pos)?;
        let r = int_value(right, pos)?;
        let fail = |_| Diagnostic::at(pos, "failed to build integer op");
        let unsigned = lt.base.is_unsigned_int();

        let arith = match op {
            BinaryOp::Add => Some(self.builder.build_int_add(l, r, "add").map_err(fail)?),
            BinaryOp::Sub => Some(self.builder.build_int_sub(l, r, "sub").map_err(fail)?),
            BinaryOp::Mul => Some(self.builder.build_int_mul(l, r, "mul").map_err(fail)?),
            BinaryOp::Div => Some(if unsigned {
                self.builder
                    .build_int_unsigned_div(l, r, "div")
                    .map_err(fail)?
            } else {
                self.builder
                    .build_int_signed_div(l, r, "div")
                    .map_err(fail)?
            }),
            _ => None,
        };
        if let Some(out) = arith {
            return Ok((Some(out.as_basic_value_enum()), lt));
        }

        // equality is sign-agnostic; the ordering predicates are not
        let predicate = match op {
            BinaryOp::Eq => IntPredicate::EQ,
            BinaryOp::NotEq => IntPredicate::NE,
            BinaryOp::Lt if unsigned => IntPredicate::ULT,
            BinaryOp::Lt => IntPredicate::SLT,
            BinaryOp::Gt if unsigned => IntPredicate::UGT,
            BinaryOp::Gt => IntPredicate::SGT,
            BinaryOp::LtEq if unsigned => IntPredicate::ULE,
            BinaryOp::LtEq => IntPredicate::SLE,
            BinaryOp::GtEq if unsigned => IntPredicate::UGE,
            BinaryOp::GtEq => IntPredicate::SGE,
            _ => {
                return Err(Diagnostic::at(
                    pos,
                    format!("operator {} invalid for type {}", op, lt),
                ));
            }
        };
        let out = self
            .builder
            .build_int_compare(predicate, l, r, "cmp")
            .map_err(fail)?;
        Ok((
            Some(out.as_basic_value_enum()),
            SourceType::new(BaseType::Bool),
        ))
    }

    fn lower_float_infix(
        &mut self,
        op: BinaryOp,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>,
        lt: SourceType,
        pos: Position,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        let l = left.into_float_value();
        let r = right.into_float_value();
        let fail = |_| Diagnostic::at(pos, "failed to build float op");

        let arith = match op {
            BinaryOp::Add => Some(self.builder.build_float_add(l, r, "fadd").map_err(fail)?),
            BinaryOp::Sub => Some(self.builder.build_float_sub(l, r, "fsub").map_err(fail)?),
            BinaryOp::Mul => Some(self.builder.build_float_mul(l, r, "fmul").map_err(fail)?),
            BinaryOp::Div => Some(self.builder.build_float_div(l, r, "fdiv").map_err(fail)?),
            _ => None,
        };
        if let Some(out) = arith {
            return Ok((Some(out.as_basic_value_enum()), lt));
        }

        let predicate = match op {
            BinaryOp::Eq => FloatPredicate::OEQ,
            BinaryOp::NotEq => FloatPredicate::ONE,
            BinaryOp::Lt => FloatPredicate::OLT,
            BinaryOp::Gt => FloatPredicate::OGT,
            BinaryOp::LtEq => FloatPredicate::OLE,
            BinaryOp::GtEq => FloatPredicate::OGE,
            _ => {
                return Err(Diagnostic::at(
                    pos,
                    format!("operator {} invalid for type {}", op, lt),
                ));
            }
        };
        let out = self
            .builder
            .build_float_compare(predicate, l, r, "fcmp")
            .map_err(fail)?;
        Ok((
            Some(out.as_basic_value_enum()),
            SourceType::new(BaseType::Bool),
        ))
    }

    // `expr.field`: constant-index extractvalue on struct values; on struct
    // pointers, a GEP to the field followed by a load.
    fn lower_field_access(
        &mut self,
        infix: &InfixExpression,
        pos: Position,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        let (left, lt) = self.lower_operand(&infix.left)?;

        let struct_name = match lt.struct_name() {
            Some(name) => name.to_string(),
            None => {
                return Err(Diagnostic::at(
                    pos,
                    format!("non struct type {} on lhs of dot operator", lt),
                ));
            }
        };
        let field = match infix.right.as_ref() {
            Expression::Identifier(ident) => ident.name.clone(),
            other => {
                return Err(Diagnostic::at(
                    pos,
                    format!("non identifier {} on rhs of dot operator", other),
                ));
            }
        };

        let struct_ty = *self.struct_types.get(&struct_name).ok_or_else(|| {
            Diagnostic::at(
                pos,
                format!("couldn't find struct type {} in field access", struct_name),
            )
        })?;
        let index = self
            .struct_field_indexes
            .get(&struct_name)
            .and_then(|fields| fields.get(&field))
            .copied()
            .ok_or_else(|| {
                Diagnostic::at(
                    pos,
                    format!("couldn't find field {} on struct {}", field, struct_name),
                )
            })?;
        let field_ty = self
            .struct_field_types
            .get(&struct_name)
            .and_then(|types| types.get(index))
            .cloned()
            .ok_or_else(|| Diagnostic::at(pos, "struct field table out of sync"))?;

        if lt.pointer > 0 {
            let ptr = pointer_value(left, pos)?;
            let gep = self
                .builder
                .build_struct_gep(struct_ty, ptr, index as u32, &field)
                .map_err(|_| Diagnostic::at(pos, "failed to build struct gep"))?;
            let field_ir = self.ir_type(&field_ty).ok_or_else(|| {
                Diagnostic::at(pos, format!("field {} has invalid type {}", field, field_ty))
            })?;
            let loaded = self
                .builder
                .build_load(field_ir, gep, &field)
                .map_err(|_| Diagnostic::at(pos, "failed to build load"))?;
            Ok((Some(loaded), field_ty))
        } else {
            let sv = match left {
                BasicValueEnum::StructValue(sv) => sv,
                _ => return Err(Diagnostic::at(pos, "expected a struct value")),
            };
            let out = self
                .builder
                .build_extract_value(sv, index as u32, &field)
                .map_err(|_| Diagnostic::at(pos, "failed to build extractvalue"))?;
            Ok((Some(out), field_ty))
        }
    }

    fn lower_assign(&mut self, assign: &AssignExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = Position::span(assign.left.position(), assign.right.position());

        match assign.left.as_ref() {
            Expression::Identifier(ident) => {
                if self.scope.is_param(&ident.name) {
                    return Err(Diagnostic::at(
                        pos,
                        format!("cannot assign to parameter {}", ident.name),
                    ));
                }
                let ptr = match self.scope.lookup(&ident.name) {
                    Some(local) => local.ptr,
                    None => {
                        return Err(Diagnostic::at(
                            pos,
                            format!(
                                "couldn't find variable of name {} used in var assignment",
                                ident.name
                            ),
                        ));
                    }
                };
                let (value, ty) = self.lower_operand(&assign.right)?;
                self.builder
                    .build_store(ptr, value)
                    .map_err(|_| Diagnostic::at(pos, "failed to build store"))?;
                Ok((Some(value), ty))
            }
            Expression::Dereference(deref) => {
                let (addr, addr_ty) = self.lower_operand(&deref.expr)?;
                let ptr = pointer_value(addr, pos).map_err(|_| {
                    Diagnostic::at(pos, format!("cannot assign through non-pointer {}", addr_ty))
                })?;
                let (value, ty) = self.lower_operand(&assign.right)?;
                self.builder
                    .build_store(ptr, value)
                    .map_err(|_| Diagnostic::at(pos, "failed to build store"))?;
                Ok((Some(value), ty))
            }
            Expression::Infix(infix) if infix.op == BinaryOp::Dot => {
                self.lower_field_assign(infix, assign, pos)
            }
            other => Err(Diagnostic::at(
                pos,
                format!("invalid assignment target {}", other),
            )),
        }
    }

    // `obj.field = v`: load the aggregate, insert the new field value, store
    // the whole aggregate back into the object's slot.
    fn lower_field_assign(
        &mut self,
        infix: &InfixExpression,
        assign: &AssignExpression,
        pos: Position,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        let object = match infix.left.as_ref() {
            Expression::Identifier(ident) => ident.name.clone(),
            _ => {
                return Err(Diagnostic::at(
                    pos,
                    "expected identifier on lhs of dot operator in assignment",
                ));
            }
        };
        let field = match infix.right.as_ref() {
            Expression::Identifier(ident) => ident.name.clone(),
            _ => {
                return Err(Diagnostic::at(
                    pos,
                    "expected identifier on rhs of dot operator in assignment",
                ));
            }
        };

        let (aggregate, lt) = self.lower_operand(&infix.left)?;
        let (value, _) = self.lower_operand(&assign.right)?;

        let struct_name = match lt.struct_name() {
            Some(name) if lt.pointer == 0 => name.to_string(),
            _ => {
                return Err(Diagnostic::at(
                    pos,
                    format!("cannot assign to field of non-struct type {}", lt),
                ));
            }
        };
        let index = self
            .struct_field_indexes
            .get(&struct_name)
            .and_then(|fields| fields.get(&field))
            .copied()
            .ok_or_else(|| {
                Diagnostic::at(
                    pos,
                    format!("couldn't find field {} on struct {}", field, struct_name),
                )
            })?;

        let sv = match aggregate {
            BasicValueEnum::StructValue(sv) => sv,
            _ => return Err(Diagnostic::at(pos, "expected a struct value")),
        };
        let inserted = self
            .builder
            .build_insert_value(sv, value, index as u32, "field.set")
            .map_err(|_| Diagnostic::at(pos, "failed to build insertvalue"))?
            .into_struct_value();

        let slot = match self.scope.lookup(&object) {
            Some(local) => local.ptr,
            None => {
                return Err(Diagnostic::at(
                    pos,
                    format!("couldn't find variable with name {}", object),
                ));
            }
        };
        self.builder
            .build_store(slot, inserted)
            .map_err(|_| Diagnostic::at(pos, "failed to build store"))?;

        Ok((Some(inserted.as_basic_value_enum()), lt))
    }

    fn lower_call(&mut self, call: &CallExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        if self.asm_enabled && call.function.name.starts_with("__asm__") {
            return self.lower_asm_intrinsic(call);
        }

        let mut args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let (value, _) = self.lower_operand(arg)?;
            args.push(value.into());
        }

        let function = *self.functions.get(&call.function.name).ok_or_else(|| {
            Diagnostic::at(
                call.pos,
                format!("couldn't find function with name {}", call.function.name),
            )
        })?;
        let ret_ty = self
            .function_ret_types
            .get(&call.function.name)
            .cloned()
            .unwrap_or(SourceType::new(BaseType::Void));

        let site = self
            .builder
            .build_call(function, &args, &call.function.name)
            .map_err(|_| Diagnostic::at(call.pos, "failed to build call"))?;
        Ok((site.try_as_basic_value().left(), ret_ty))
    }

    // `&x` yields the stack slot itself; the type gains one level of
    // indirection. Parameters have no slot and cannot be referenced.
    fn lower_reference(
        &mut self,
        reference: &ReferenceExpression,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = Position::span(reference.pos, reference.var.pos);
        if self.scope.is_param(&reference.var.name) {
            return Err(Diagnostic::at(
                pos,
                format!("cannot take the address of parameter {}", reference.var.name),
            ));
        }
        let local = self.scope.lookup(&reference.var.name).ok_or_else(|| {
            Diagnostic::at(
                pos,
                format!(
                    "couldn't find variable with name {} in reference expr",
                    reference.var.name
                ),
            )
        })?;

        let mut ty = local.source_type.clone();
        ty.pointer += 1;
        Ok((Some(local.ptr.as_basic_value_enum()), ty))
    }

    fn lower_dereference(
        &mut self,
        deref: &DereferenceExpression,
    ) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = Position::span(deref.pos, deref.expr.position());
        let (value, ty) = self.lower_operand(&deref.expr)?;

        if ty.pointer == 0 {
            return Err(Diagnostic::at(
                pos,
                format!("cannot deref non-ptr type {}", ty),
            ));
        }
        let ptr = pointer_value(value, pos)?;
        let pointee = SourceType {
            base: ty.base.clone(),
            pointer: ty.pointer - 1,
        };
        let pointee_ir = self
            .ir_type(&pointee)
            .ok_or_else(|| Diagnostic::at(pos, format!("cannot deref pointer to {}", pointee)))?;

        let loaded = self
            .builder
            .build_load(pointee_ir, ptr, "deref")
            .map_err(|_| Diagnostic::at(pos, "failed to build load"))?;
        Ok((Some(loaded), pointee))
    }

    fn lower_cast(&mut self, cast: &CastExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = cast.pos;
        let (value, st) = self.lower_operand(&cast.expr)?;
        let dst = &cast.ty;

        let int_like = |ty: &SourceType| {
            ty.pointer == 0 && (ty.base.is_integer() || ty.base == BaseType::Bool)
        };
        let src_int = int_like(&st);
        let dst_int = int_like(dst);
        let src_float = st.pointer == 0 && st.base == BaseType::Float;
        let dst_float = dst.pointer == 0 && dst.base == BaseType::Float;
        let src_ptr = st.pointer > 0;
        let dst_ptr = dst.pointer > 0;

        if src_int && dst_int {
            let iv = int_value(value, pos)?;
            let dst_ty = match self.ir_type(dst) {
                Some(inkwell::types::BasicTypeEnum::IntType(ty)) => ty,
                _ => return Err(Diagnostic::at(pos, format!("cannot cast to {}", dst))),
            };
            let src_width = iv.get_type().get_bit_width();
            let dst_width = dst_ty.get_bit_width();

            if src_width == dst_width {
                return Ok((Some(value), dst.clone()));
            }
            let out = if src_width == 1 {
                self.builder.build_int_z_extend(iv, dst_ty, "zext")
            } else if src_width < dst_width {
                self.builder.build_int_s_extend(iv, dst_ty, "sext")
            } else {
                self.builder.build_int_truncate(iv, dst_ty, "trunc")
            }
            .map_err(|_| Diagnostic::at(pos, "failed to build int cast"))?;
            return Ok((Some(out.as_basic_value_enum()), dst.clone()));
        }

        if src_int && dst_ptr {
            let iv = int_value(value, pos)?;
            let out = self
                .builder
                .build_int_to_ptr(iv, self.ptr_t, "inttoptr")
                .map_err(|_| Diagnostic::at(pos, "failed to build inttoptr"))?;
            return Ok((Some(out.as_basic_value_enum()), dst.clone()));
        }

        if src_ptr && dst_int {
            if self.size_of(dst) != 8 {
                // warning only: the cast still lowers
                self.errors.push(Diagnostic::at(
                    pos,
                    "compile warning: pointer to int cast may truncate",
                ));
            }
            let pv = pointer_value(value, pos)?;
            let dst_ty = match self.ir_type(dst) {
                Some(inkwell::types::BasicTypeEnum::IntType(ty)) => ty,
                _ => return Err(Diagnostic::at(pos, format!("cannot cast to {}", dst))),
            };
            let out = self
                .builder
                .build_ptr_to_int(pv, dst_ty, "ptrtoint")
                .map_err(|_| Diagnostic::at(pos, "failed to build ptrtoint"))?;
            return Ok((Some(out.as_basic_value_enum()), dst.clone()));
        }

        if src_int && dst_float {
            let iv = int_value(value, pos)?;
            let out = self
                .builder
                .build_signed_int_to_float(iv, self.f32_t, "sitofp")
                .map_err(|_| Diagnostic::at(pos, "failed to build sitofp"))?;
            return Ok((Some(out.as_basic_value_enum()), dst.clone()));
        }

        if src_float && dst_int {
            let fv = value.into_float_value();
            let dst_ty = match self.ir_type(dst) {
                Some(inkwell::types::BasicTypeEnum::IntType(ty)) => ty,
                _ => return Err(Diagnostic::at(pos, format!("cannot cast to {}", dst))),
            };
            let out = self
                .builder
                .build_float_to_signed_int(fv, dst_ty, "fptosi")
                .map_err(|_| Diagnostic::at(pos, "failed to build fptosi"))?;
            return Ok((Some(out.as_basic_value_enum()), dst.clone()));
        }

        if src_ptr && dst_ptr {
            let pv = pointer_value(value, pos)?;
            let out = self
                .builder
                .build_pointer_cast(pv, self.ptr_t, "ptr.cast")
                .map_err(|_| Diagnostic::at(pos, "failed to build pointer cast"))?;
            return Ok((Some(out.as_basic_value_enum()), dst.clone()));
        }

        Err(Diagnostic::at(
            pos,
            format!("unsupported cast from {} to {}", st, dst),
        ))
    }

    fn lower_sizeof(&mut self, sizeof: &SizeofExpression) -> Result<Lowered<'ctx>, Diagnostic> {
        let size = self.size_of(&sizeof.ty);
        Ok((
            Some(self.i64_t.const_int(size, false).as_basic_value_enum()),
            SourceType::new(BaseType::Uint),
        ))
    }

    // `[T; a, b, …]` lowers to `arr_new(sizeof T)` plus one `arr_push` per
    // element, through a fresh stack slot so `arr_push` can reallocate.
    fn lower_array_literal(&mut self, array: &ArrayLiteral) -> Result<Lowered<'ctx>, Diagnostic> {
        let pos = array.pos;
        let arr_new = *self.functions.get("arr_new").ok_or_else(|| {
            Diagnostic::at(pos, "cannot find arr_new while emitting array literal")
        })?;
        let arr_push = *self.functions.get("arr_push").ok_or_else(|| {
            Diagnostic::at(pos, "cannot find arr_push while emitting array literal")
        })?;

        let elem_size = self.i64_t.const_int(self.size_of(&array.elem_ty), false);
        let site = self
            .builder
            .build_call(arr_new, &[elem_size.into()], "arr_new")
            .map_err(|_| Diagnostic::at(pos, "failed to build call"))?;
        let data = match site.try_as_basic_value().left() {
            Some(BasicValueEnum::PointerValue(ptr)) => ptr,
            _ => return Err(Diagnostic::at(pos, "arr_new did not return a pointer")),
        };

        let slot = self
            .builder
            .build_alloca(self.ptr_t, "arr")
            .map_err(|_| Diagnostic::at(pos, "failed to build alloca"))?;
        self.builder
            .build_store(slot, data)
            .map_err(|_| Diagnostic::at(pos, "failed to build store"))?;

        for item in &array.items {
            let item_pos = item.position();
            let (value, _) = self.lower_operand(item)?;
            let bits = self.value_bits_as_pointer(value, item_pos)?;
            self.builder
                .build_call(arr_push, &[slot.into(), bits.into()], "")
                .map_err(|_| Diagnostic::at(item_pos, "failed to build call"))?;
        }

        let ty = SourceType {
            base: array.elem_ty.base.clone(),
            pointer: array.elem_ty.pointer + 1,
        };
        Ok((Some(data.as_basic_value_enum()), ty))
    }

    // The runtime reads the element's value bits out of the pointer-sized
    // `elem` argument slot, so scalars travel as bits, not addresses.
    fn value_bits_as_pointer(
        &mut self,
        value: BasicValueEnum<'ctx>,
        pos: Position,
    ) -> Result<PointerValue<'ctx>, Diagnostic> {
        let fail = |_| Diagnostic::at(pos, "failed to build element cast");

        let wide = match value {
            BasicValueEnum::PointerValue(pv) => return Ok(pv),
            BasicValueEnum::IntValue(iv) => {
                if iv.get_type().get_bit_width() < 64 {
                    self.builder
                        .build_int_z_extend(iv, self.i64_t, "elem.bits")
                        .map_err(fail)?
                } else {
                    iv
                }
            }
            BasicValueEnum::FloatValue(fv) => {
                let bits = self
                    .builder
                    .build_bit_cast(fv, self.i32_t, "elem.raw")
                    .map_err(fail)?;
                let iv = int_value(bits, pos)?;
                self.builder
                    .build_int_z_extend(iv, self.i64_t, "elem.bits")
                    .map_err(fail)?
            }
            _ => return Err(Diagnostic::at(pos, "unsupported array element value")),
        };
        self.builder
            .build_int_to_ptr(wide, self.ptr_t, "elem.ptr")
            .map_err(fail)
    }

    // Struct initialization builds a named-struct constant, so every field
    // value must itself be a constant.
    fn lower_struct_init(&mut self, init: &StructInit) -> Result<Lowered<'ctx>, Diagnostic> {
        let struct_ty = *self.struct_types.get(&init.name).ok_or_else(|| {
            Diagnostic::at(
                init.pos,
                format!("couldn't find struct with name {} for initialization", init.name),
            )
        })?;

        let mut fields = Vec::with_capacity(init.values.len());
        for value in &init.values {
            let value_pos = value.position();
            let (lowered, _) = self.lower_operand(value)?;
            let is_const = match lowered {
                BasicValueEnum::IntValue(iv) => iv.is_const(),
                BasicValueEnum::FloatValue(fv) => fv.is_const(),
                BasicValueEnum::PointerValue(pv) => pv.is_const(),
                BasicValueEnum::StructValue(_) => true,
                _ => false,
            };
            if !is_const {
                return Err(Diagnostic::at(
                    value_pos,
                    "non constant field in struct initialization",
                ));
            }
            fields.push(lowered);
        }

        let out = struct_ty.const_named_struct(&fields);
        Ok((
            Some(out.as_basic_value_enum()),
            SourceType::new(BaseType::Struct(init.name.clone())),
        ))
    }
}
