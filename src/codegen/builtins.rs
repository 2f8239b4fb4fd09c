//! The closed registry of builtin runtime modules.
//!
//! Each module is a named collection of externally-defined functions plus
//! the textual IR of its pre-compiled runtime, which the driver writes next
//! to the program modules at link time. The checker derives its
//! function-name table from the same registry.

use std::sync::OnceLock;

use crate::lexer::token::{BaseType, SourceType};

pub struct BuiltinFunction {
    pub name: &'static str,
    pub ret: SourceType,
    pub params: Vec<SourceType>,
}

pub struct BuiltinModule {
    pub name: &'static str,
    pub functions: Vec<BuiltinFunction>,
    pub runtime_ir: &'static str,
}

const VOID: SourceType = SourceType::new(BaseType::Void);
const I8: SourceType = SourceType::new(BaseType::Int8);
const I16: SourceType = SourceType::new(BaseType::Int16);
const I32: SourceType = SourceType::new(BaseType::Int32);
const I64: SourceType = SourceType::new(BaseType::Int);
const U8: SourceType = SourceType::new(BaseType::Uint8);
const U16: SourceType = SourceType::new(BaseType::Uint16);
const U32: SourceType = SourceType::new(BaseType::Uint32);
const U64: SourceType = SourceType::new(BaseType::Uint);
const F32: SourceType = SourceType::new(BaseType::Float);
const BOOL: SourceType = SourceType::new(BaseType::Bool);
const CHAR: SourceType = SourceType::new(BaseType::Char);
const STR: SourceType = SourceType::pointer_to(BaseType::Char, 1);
const RAW_PTR: SourceType = SourceType::pointer_to(BaseType::None, 1);

fn f(name: &'static str, ret: SourceType, params: &[SourceType]) -> BuiltinFunction {
    BuiltinFunction {
        name,
        ret,
        params: params.to_vec(),
    }
}

fn builtin_modules() -> Vec<BuiltinModule> {
    vec![
        BuiltinModule {
            name: "dbg",
            functions: vec![
                f("dbg_i64", VOID, &[I64]),
                f("dbg_i32", VOID, &[I32]),
                f("dbg_i16", VOID, &[I16]),
                f("dbg_i8", VOID, &[I8]),
                f("dbg_u64", VOID, &[U64]),
                f("dbg_u32", VOID, &[U32]),
                f("dbg_u16", VOID, &[U16]),
                f("dbg_u8", VOID, &[U8]),
                f("dbg_float", VOID, &[F32]),
                f("dbg_bool", VOID, &[BOOL]),
                f("dbg_str", VOID, &[STR]),
                f("dbg_char", VOID, &[CHAR]),
            ],
            runtime_ir: include_str!("../../runtime/dbg.ll"),
        },
        BuiltinModule {
            name: "arrays",
            functions: vec![
                f("arr_new", RAW_PTR, &[I64]),
                f("arr_push", VOID, &[RAW_PTR, RAW_PTR]),
                f("arr_free", VOID, &[RAW_PTR]),
            ],
            runtime_ir: include_str!("../../runtime/arrays.ll"),
        },
        BuiltinModule {
            name: "strings",
            functions: vec![
                f("dynstr", STR, &[STR]),
                f("str_append", STR, &[STR, STR]),
                f("str_len", U64, &[STR]),
            ],
            runtime_ir: include_str!("../../runtime/strings.ll"),
        },
    ]
}

pub fn builtin_modules_ref() -> &'static [BuiltinModule] {
    static MODULES: OnceLock<Vec<BuiltinModule>> = OnceLock::new();
    MODULES.get_or_init(builtin_modules)
}

pub fn find_module(name: &str) -> Option<&'static BuiltinModule> {
    builtin_modules_ref()
        .iter()
        .find(|module| module.name == name)
}

/// The builtin module providing `function`, if any.
pub fn module_providing(function: &str) -> Option<&'static str> {
    builtin_modules_ref()
        .iter()
        .find(|module| module.functions.iter().any(|f| f.name == function))
        .map(|module| module.name)
}
