//! gl3c — an ahead-of-time compiler front-end for the gl3 language.
//!
//! The pipeline is lexer → parser → checker → emitter, each stage
//! independently usable: the lexer produces positioned tokens, the parser a
//! printable AST, the checker import-hygiene warnings, and the emitter a
//! textual LLVM-IR module. The binary in `main.rs` drives the pipeline per
//! input file and links the results with `clang`.

pub mod checker;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
