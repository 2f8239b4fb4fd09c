use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context as _, Result};
use clap::Parser as ClapParser;
use inkwell::context::Context;

use gl3c::checker::Checker;
use gl3c::codegen::{builtins, Emitter};
use gl3c::diagnostics;
use gl3c::lexer::Lexer;
use gl3c::parser::Parser;

#[derive(ClapParser)]
#[command(name = "gl3c", about = "Compile gl3 source files into an executable")]
struct Cli {
    /// Keep the staged .ll files and print their location
    #[arg(long)]
    keepll: bool,

    /// Name of the linked executable
    #[arg(long, default_value = "out")]
    out: String,

    /// Source files to compile
    #[arg(required = true)]
    files: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let staging = tempfile::Builder::new()
        .prefix("gl3c")
        .tempdir()
        .context("failed to create staging directory")?;

    let mut ll_files: Vec<PathBuf> = Vec::new();
    let mut enabled_modules: BTreeSet<&'static str> = BTreeSet::new();

    for file in &cli.files {
        let ll_file = compile_file(file, staging.path(), &mut enabled_modules)?;
        ll_files.push(ll_file);
    }

    // one runtime module per enabled builtin, shared across input files
    for name in &enabled_modules {
        let module = builtins::find_module(name)
            .with_context(|| format!("unknown builtin module {}", name))?;
        let path = staging.path().join(format!("{}.ll", name));
        fs::write(&path, module.runtime_ir)
            .with_context(|| format!("failed to write {}", path.display()))?;
        ll_files.push(path);
    }

    let status = Command::new("clang")
        .args(&ll_files)
        .arg("-o")
        .arg(&cli.out)
        .status()
        .context("failed to run clang")?;
    if !status.success() {
        bail!("clang failed to link {}", cli.out);
    }

    if cli.keepll {
        let kept = staging.keep();
        println!("kept staged IR in {}", kept.display());
    }

    Ok(())
}

fn compile_file(
    file: &str,
    staging: &Path,
    enabled_modules: &mut BTreeSet<&'static str>,
) -> Result<PathBuf> {
    let source = fs::read_to_string(file).with_context(|| format!("failed to read {}", file))?;

    let mut parser = Parser::new(Lexer::new(&source));
    let program = parser.parse_program();
    if !parser.errors.is_empty() {
        for error in &parser.errors {
            eprintln!("{}: parser error: {}", file, error);
        }
        bail!("{}: exiting after parser errors", file);
    }

    let mut checker = Checker::new();
    checker.check_program(&program);
    if !checker.errors.is_empty() {
        for warning in &checker.errors {
            eprintln!("{}: {}", file, warning);
        }
        bail!("{}: exiting after checker warnings", file);
    }

    let stem = Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("module");

    let context = Context::create();
    let mut emitter = Emitter::new(&context, stem);
    emitter.emit_program(&program);
    if !emitter.errors.is_empty() {
        for diagnostic in &emitter.errors {
            diagnostics::report(Some(file), diagnostic);
        }
        bail!("{}: exiting after emitter errors", file);
    }

    for module in emitter.enabled_builtin_modules() {
        enabled_modules.insert(module);
    }

    let ir = emitter.module.print_to_string().to_string();
    let out_path = staging.join(format!("{}.ll", stem));
    fs::write(&out_path, ir).with_context(|| format!("failed to write {}", out_path.display()))?;
    Ok(out_path)
}
