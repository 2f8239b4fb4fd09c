//! AST-to-LLVM-IR lowering.
//!
//! Single-pass walk over the parsed program. Every expression lowers to a
//! `(value, source type)` pair: the IR type alone cannot tell signed from
//! unsigned integers, or recover the pointee of an opaque pointer, so the
//! source type rides along and drives instruction selection (`sdiv` vs
//! `udiv`, `icmp slt` vs `icmp ult`, GEP pointee types).
//!
//! Statement lowering collects `Diagnostic`s into `errors` rather than
//! aborting, so one bad statement still leaves the rest of the module
//! diagnosable.

pub mod builtins;
mod expr;
mod imports;
mod intrinsics;
mod scopes;
mod stmt;

use std::collections::HashMap;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicType, BasicTypeEnum, FloatType, IntType, PointerType, StructType};
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::AddressSpace;

use crate::diagnostics::Diagnostic;
use crate::lexer::token::{BaseType, SourceType};
use crate::parser::ast::Program;
use scopes::FunctionScope;

pub struct Emitter<'ctx> {
    context: &'ctx Context,
    pub module: Module<'ctx>,
    builder: Builder<'ctx>,

    // cached LLVM types
    bool_t: IntType<'ctx>,
    i8_t: IntType<'ctx>,
    i16_t: IntType<'ctx>,
    i32_t: IntType<'ctx>,
    i64_t: IntType<'ctx>,
    f32_t: FloatType<'ctx>,
    ptr_t: PointerType<'ctx>,

    // per-module registries
    functions: HashMap<String, FunctionValue<'ctx>>,
    function_ret_types: HashMap<String, SourceType>,
    struct_types: HashMap<String, StructType<'ctx>>,
    struct_field_indexes: HashMap<String, HashMap<String, usize>>,
    struct_field_types: HashMap<String, Vec<SourceType>>,
    string_literals: HashMap<String, PointerValue<'ctx>>,
    next_str_id: u32,
    builtin_modules: Vec<&'static str>,
    asm_enabled: bool,

    // per-function state, reset on function exit
    scope: FunctionScope<'ctx>,
    current_fn: Option<FunctionValue<'ctx>>,

    pub errors: Vec<Diagnostic>,
}

impl<'ctx> Emitter<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Emitter<'ctx> {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        Emitter {
            context,
            module,
            builder,
            bool_t: context.bool_type(),
            i8_t: context.i8_type(),
            i16_t: context.i16_type(),
            i32_t: context.i32_type(),
            i64_t: context.i64_type(),
            f32_t: context.f32_type(),
            ptr_t: context.ptr_type(AddressSpace::default()),
            functions: HashMap::new(),
            function_ret_types: HashMap::new(),
            struct_types: HashMap::new(),
            struct_field_indexes: HashMap::new(),
            struct_field_types: HashMap::new(),
            string_literals: HashMap::new(),
            next_str_id: 0,
            builtin_modules: Vec::new(),
            asm_enabled: false,
            scope: FunctionScope::default(),
            current_fn: None,
            errors: Vec::new(),
        }
    }

    pub fn emit_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            if let Err(diagnostic) = self.lower_statement(stmt) {
                self.errors.push(diagnostic);
            }
        }
    }

    /// Names of the builtin modules this program imported; the driver links
    /// the matching runtime module for each.
    pub fn enabled_builtin_modules(&self) -> &[&'static str] {
        &self.builtin_modules
    }

    // Maps a source type to its IR type. `None` means the type has no IR
    // representation: a `none`/`void` return slot, or a struct that was
    // never declared.
    pub(crate) fn ir_type(&self, ty: &SourceType) -> Option<BasicTypeEnum<'ctx>> {
        if ty.pointer > 0 {
            return Some(self.ptr_t.as_basic_type_enum());
        }

        match &ty.base {
            BaseType::None | BaseType::Void => None,
            BaseType::Bool => Some(self.bool_t.as_basic_type_enum()),
            BaseType::Int8 | BaseType::Uint8 | BaseType::Char => {
                Some(self.i8_t.as_basic_type_enum())
            }
            BaseType::Int16 | BaseType::Uint16 => Some(self.i16_t.as_basic_type_enum()),
            BaseType::Int32 | BaseType::Uint32 => Some(self.i32_t.as_basic_type_enum()),
            BaseType::Int | BaseType::Uint => Some(self.i64_t.as_basic_type_enum()),
            BaseType::Float => Some(self.f32_t.as_basic_type_enum()),
            BaseType::Struct(name) => {
                self.struct_types.get(name).map(|st| st.as_basic_type_enum())
            }
        }
    }

    /// Byte size of a value of `ty`; drives `sizeof` and cast decisions.
    /// Struct sizes are the unpadded sum of their field sizes.
    pub(crate) fn size_of(&self, ty: &SourceType) -> u64 {
        if ty.pointer > 0 {
            return 8;
        }

        match &ty.base {
            BaseType::Bool | BaseType::Int8 | BaseType::Uint8 | BaseType::Char => 1,
            BaseType::Int16 | BaseType::Uint16 => 2,
            BaseType::Int32 | BaseType::Uint32 | BaseType::Float => 4,
            BaseType::Int | BaseType::Uint => 8,
            BaseType::Struct(name) => self
                .struct_field_types
                .get(name)
                .map(|fields| fields.iter().map(|f| self.size_of(f)).sum())
                .unwrap_or(0),
            BaseType::None | BaseType::Void => 0,
        }
    }

    // Interns a string literal: one private unnamed_addr global per
    // distinct content, keyed by the literal's exact bytes (including the
    // trailing NUL the parser appended).
    pub(crate) fn intern_string(&mut self, value: &str) -> PointerValue<'ctx> {
        if let Some(ptr) = self.string_literals.get(value) {
            return *ptr;
        }

        let bytes = value.as_bytes();
        let array_ty = self.i8_t.array_type(bytes.len() as u32);
        let name = format!("strlit.{}", self.next_str_id);
        self.next_str_id += 1;

        let global = self.module.add_global(array_ty, None, &name);
        global.set_initializer(&self.context.const_string(bytes, false));
        global.set_linkage(Linkage::Private);
        global.set_unnamed_address(inkwell::values::UnnamedAddress::Global);
        global.set_constant(true);

        let zero = self.i32_t.const_zero();
        let ptr = unsafe { global.as_pointer_value().const_gep(array_ty, &[zero, zero]) };
        self.string_literals.insert(value.to_string(), ptr);
        ptr
    }
}
