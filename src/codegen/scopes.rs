use std::collections::HashMap;

use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, PointerValue};

use crate::lexer::token::SourceType;

/// A stack-allocated local: its slot, the slot's IR type, and the
/// source-level type the IR type was derived from.
#[derive(Debug, Clone)]
pub struct Local<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub ir_type: BasicTypeEnum<'ctx>,
    pub source_type: SourceType,
}

/// Per-function name bindings: a stack of scope frames for locals plus a
/// flat parameter map. A frame is pushed around each `if`/`while` arm, so a
/// `def` inside an arm dies with the frame and cannot leak past the join
/// block. A name is a parameter or a local, never both.
#[derive(Debug, Default)]
pub struct FunctionScope<'ctx> {
    frames: Vec<HashMap<String, Local<'ctx>>>,
    params: HashMap<String, (BasicValueEnum<'ctx>, SourceType)>,
}

impl<'ctx> FunctionScope<'ctx> {
    pub fn enter_function(&mut self) {
        self.frames.clear();
        self.params.clear();
        self.frames.push(HashMap::new());
    }

    pub fn exit_function(&mut self) {
        self.frames.clear();
        self.params.clear();
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn define(&mut self, name: String, local: Local<'ctx>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, local);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Local<'ctx>> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn define_param(&mut self, name: String, value: BasicValueEnum<'ctx>, ty: SourceType) {
        self.params.insert(name, (value, ty));
    }

    pub fn param(&self, name: &str) -> Option<&(BasicValueEnum<'ctx>, SourceType)> {
        self.params.get(name)
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }
}
