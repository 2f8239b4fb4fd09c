use anyhow::Result;
use inkwell::context::Context;

use gl3c::codegen::Emitter;
use gl3c::lexer::Lexer;
use gl3c::parser::Parser;

/// Lowers `src` to IR text, verifying the module with LLVM's own verifier.
fn gen_ir(src: &str) -> Result<String> {
    let mut parser = Parser::new(Lexer::new(src));
    let program = parser.parse_program();
    anyhow::ensure!(
        parser.errors.is_empty(),
        "parser errors: {:?}",
        parser.errors
    );

    let context = Context::create();
    let mut emitter = Emitter::new(&context, "test_module");
    emitter.emit_program(&program);
    anyhow::ensure!(
        emitter.errors.is_empty(),
        "emitter errors: {:?}",
        emitter.errors
    );

    let ir = emitter.module.print_to_string().to_string();
    emitter
        .module
        .verify()
        .map_err(|e| anyhow::anyhow!("module failed to verify: {}\n{}", e.to_string(), ir))?;
    Ok(ir)
}

/// Lowers `src` expecting emitter errors; returns their messages.
fn gen_errors(src: &str) -> Vec<String> {
    let mut parser = Parser::new(Lexer::new(src));
    let program = parser.parse_program();
    assert!(
        parser.errors.is_empty(),
        "parser errors: {:?}",
        parser.errors
    );

    let context = Context::create();
    let mut emitter = Emitter::new(&context, "test_module");
    emitter.emit_program(&program);
    assert!(!emitter.errors.is_empty(), "expected emitter errors");
    emitter.errors.iter().map(|d| d.message.clone()).collect()
}

#[test]
fn main_returning_zero() -> Result<()> {
    let ir = gen_ir("fnc main() -> int32 { return 0i32 }")?;
    assert!(ir.contains("define i32 @main()"), "{}", ir);
    assert!(ir.contains("ret i32 0"), "{}", ir);
    Ok(())
}

#[test]
fn def_allocates_stores_and_loads_once() -> Result<()> {
    let ir = gen_ir("fnc main() -> int { def int x = 7 return x }")?;
    assert_eq!(ir.matches("alloca i64").count(), 1, "{}", ir);
    assert!(ir.contains("store i64 7"), "{}", ir);
    assert!(ir.contains("load i64"), "{}", ir);
    Ok(())
}

#[test]
fn if_else_lowers_to_three_blocks() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> int32 {
            def int32 x = 1i32
            if x > 5i32 { x = 2i32 } else { x = 3i32 }
            return x
        }",
    )?;
    assert!(ir.contains("icmp sgt i32"), "{}", ir);
    assert!(ir.contains("br i1"), "{}", ir);
    assert!(ir.contains("then:"), "{}", ir);
    assert!(ir.contains("else:"), "{}", ir);
    // both arms join at the end block
    assert_eq!(ir.matches("br label %end").count(), 2, "{}", ir);
    Ok(())
}

#[test]
fn while_loop_shape() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> int {
            def int i = 0
            while i < 10 { i = i + 1 }
            return i
        }",
    )?;
    assert!(ir.contains("icmp slt i64"), "{}", ir);
    assert!(ir.contains("br i1"), "{}", ir);
    // entry to cond, then the back-edge from the body
    assert_eq!(ir.matches("br label %cond").count(), 2, "{}", ir);
    Ok(())
}

#[test]
fn unsigned_types_pick_unsigned_instructions() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> bool {
            def uint32 a = 8u32
            def uint32 b = 2u32
            def uint32 c = a / b
            return a < b
        }",
    )?;
    assert!(ir.contains("udiv i32"), "{}", ir);
    assert!(ir.contains("icmp ult i32"), "{}", ir);
    Ok(())
}

#[test]
fn signed_types_pick_signed_instructions() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> bool {
            def int a = 8
            def int b = 2
            def int c = a / b
            return a < b
        }",
    )?;
    assert!(ir.contains("sdiv i64"), "{}", ir);
    assert!(ir.contains("icmp slt i64"), "{}", ir);
    Ok(())
}

#[test]
fn float_arithmetic_and_comparison() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> bool {
            def float x = 1.5
            def float y = 2.5
            def float sum = x + y
            return x < y
        }",
    )?;
    assert!(ir.contains("fadd float"), "{}", ir);
    assert!(ir.contains("fcmp olt float"), "{}", ir);
    Ok(())
}

#[test]
fn bool_operators_lower_bitwise() -> Result<()> {
    let ir = gen_ir("fnc both(bool a, bool b) -> bool { return a && b }")?;
    assert!(ir.contains("and i1"), "{}", ir);
    let ir = gen_ir("fnc either(bool a, bool b) -> bool { return a || b }")?;
    assert!(ir.contains("or i1"), "{}", ir);
    let ir = gen_ir("fnc negate(bool a) -> bool { return !a }")?;
    assert!(ir.contains("xor i1"), "{}", ir);
    Ok(())
}

#[test]
fn negation_subtracts_from_zero() -> Result<()> {
    let ir = gen_ir("fnc n(int x) -> int { return -x }")?;
    assert!(ir.contains("sub i64 0"), "{}", ir);
    let ir = gen_ir("fnc n(float x) -> float { return -x }")?;
    assert!(ir.contains("fsub float"), "{}", ir);
    Ok(())
}

#[test]
fn identical_string_literals_share_one_global() -> Result<()> {
    let ir = gen_ir(
        "import \"dbg\"
        fnc main() -> none {
            dbg_str(\"hi\")
            dbg_str(\"hi\")
        }",
    )?;
    assert!(ir.contains("@strlit.0 = private unnamed_addr constant"), "{}", ir);
    assert!(!ir.contains("@strlit.1"), "{}", ir);
    assert!(ir.contains("declare void @dbg_str(ptr)"), "{}", ir);
    Ok(())
}

#[test]
fn distinct_string_literals_get_distinct_globals() -> Result<()> {
    let ir = gen_ir(
        "import \"dbg\"
        fnc main() -> none {
            dbg_str(\"a\")
            dbg_str(\"b\")
        }",
    )?;
    assert!(ir.contains("@strlit.0"), "{}", ir);
    assert!(ir.contains("@strlit.1"), "{}", ir);
    Ok(())
}

#[test]
fn void_function_gets_implicit_return() -> Result<()> {
    let ir = gen_ir("fnc f() -> none { }")?;
    assert!(ir.contains("define void @f()"), "{}", ir);
    assert!(ir.contains("ret void"), "{}", ir);
    Ok(())
}

#[test]
fn missing_return_in_non_void_function_errors() {
    let errors = gen_errors("fnc main() -> int32 { def int32 x = 1i32 }");
    assert!(
        errors.iter().any(|e| e.contains("missing return")),
        "{:?}",
        errors
    );
}

#[test]
fn variable_defined_in_if_arm_is_scoped_to_the_arm() {
    let errors = gen_errors(
        "fnc main() -> int {
            if true { def int y = 1 } else { }
            return y
        }",
    );
    assert!(
        errors.iter().any(|e| e.contains("couldn't find variable")),
        "{:?}",
        errors
    );
}

#[test]
fn outer_variable_survives_if_arm_assignment() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> int {
            def int x = 1
            if true { x = 2 } else { }
            return x
        }",
    )?;
    assert_eq!(ir.matches("alloca i64").count(), 1, "{}", ir);
    assert!(ir.contains("store i64 2"), "{}", ir);
    Ok(())
}

#[test]
fn pointer_indexing_lowers_to_gep_and_load() -> Result<()> {
    let ir = gen_ir("fnc get(int* a, int i) -> int { return a[i] }")?;
    assert!(ir.contains("getelementptr i64"), "{}", ir);
    assert!(ir.contains("load i64"), "{}", ir);
    Ok(())
}

#[test]
fn pointer_subtraction_negates_the_index() -> Result<()> {
    let ir = gen_ir("fnc get(int* a, int i) -> int { return *(a - i) }")?;
    assert!(ir.contains("sub i64 0"), "{}", ir);
    assert!(ir.contains("getelementptr i64"), "{}", ir);
    Ok(())
}

#[test]
fn reference_and_store_through_pointer() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> int {
            def int x = 1
            def int* p = &x
            *p = 2
            return *p
        }",
    )?;
    assert!(ir.contains("alloca ptr"), "{}", ir);
    assert!(ir.contains("store i64 2"), "{}", ir);
    Ok(())
}

#[test]
fn casts_cover_the_decision_table() -> Result<()> {
    let ir = gen_ir(
        "fnc main() -> int {
            def int32 small = 5i32
            def int big = small as int
            def int8 tiny = small as int8
            def float f = big as float
            def int back = f as int
            def int* p = big as int*
            def int addr = p as int
            def bool flag = true
            def int wide = flag as int
            return big
        }",
    )?;
    assert!(ir.contains("sext i32"), "{}", ir);
    assert!(ir.contains("trunc i32"), "{}", ir);
    assert!(ir.contains("sitofp i64"), "{}", ir);
    assert!(ir.contains("fptosi float"), "{}", ir);
    assert!(ir.contains("inttoptr i64"), "{}", ir);
    assert!(ir.contains("ptrtoint ptr"), "{}", ir);
    assert!(ir.contains("zext i1"), "{}", ir);
    Ok(())
}

#[test]
fn narrow_pointer_to_int_cast_warns() {
    let errors = gen_errors(
        "fnc main() -> int32 {
            def int x = 1
            def int* p = &x
            def int32 addr = p as int32
            return addr
        }",
    );
    assert!(
        errors.iter().any(|e| e.contains("may truncate")),
        "{:?}",
        errors
    );
}

#[test]
fn sizeof_uses_the_size_table() -> Result<()> {
    let ir = gen_ir("fnc main() -> uint { return sizeof int }")?;
    assert!(ir.contains("ret i64 8"), "{}", ir);
    let ir = gen_ir("fnc main() -> uint { return sizeof int32 }")?;
    assert!(ir.contains("ret i64 4"), "{}", ir);
    let ir = gen_ir("fnc main() -> uint { return sizeof char* }")?;
    assert!(ir.contains("ret i64 8"), "{}", ir);
    let ir = gen_ir("fnc main() -> uint { return sizeof bool }")?;
    assert!(ir.contains("ret i64 1"), "{}", ir);
    Ok(())
}

#[test]
fn struct_declaration_and_field_access() -> Result<()> {
    let ir = gen_ir(
        "struct Player { int32 health bool alive }
        fnc main() -> int32 {
            def Player p = Player:{7i32, true}
            return p.health
        }",
    )?;
    assert!(ir.contains("%Player = type { i32, i1 }"), "{}", ir);
    assert!(ir.contains("extractvalue %Player"), "{}", ir);
    Ok(())
}

#[test]
fn struct_field_assignment_uses_insertvalue() -> Result<()> {
    let ir = gen_ir(
        "struct Player { int32 health bool alive }
        fnc main() -> int32 {
            def Player p = Player:{7i32, true}
            p.health = 3i32
            return p.health
        }",
    )?;
    assert!(ir.contains("insertvalue %Player"), "{}", ir);
    Ok(())
}

#[test]
fn struct_pointer_field_access_uses_gep() -> Result<()> {
    let ir = gen_ir(
        "struct Player { int32 health bool alive }
        fnc hp(Player* p) -> int32 { return p.health }",
    )?;
    assert!(ir.contains("getelementptr"), "{}", ir);
    assert!(ir.contains("%Player"), "{}", ir);
    Ok(())
}

#[test]
fn non_constant_struct_field_is_rejected() {
    let errors = gen_errors(
        "struct Pair { int a int b }
        fnc make(int x) -> Pair { return Pair:{x, 2} }",
    );
    assert!(
        errors.iter().any(|e| e.contains("non constant field")),
        "{:?}",
        errors
    );
}

#[test]
fn array_literal_builds_through_the_arrays_runtime() -> Result<()> {
    let ir = gen_ir(
        "import \"arrays\"
        fnc main() -> none {
            def int32* xs = [int32; 1i32, 2i32]
            arr_free(&xs)
        }",
    )?;
    assert!(ir.contains("call ptr @arr_new(i64 4)"), "{}", ir);
    assert_eq!(ir.matches("call void @arr_push").count(), 2, "{}", ir);
    assert!(ir.contains("call void @arr_free"), "{}", ir);
    Ok(())
}

#[test]
fn array_literal_without_arrays_import_errors() {
    let errors = gen_errors(
        "fnc main() -> none {
            def int32* xs = [int32; 1i32]
        }",
    );
    assert!(
        errors.iter().any(|e| e.contains("arr_new")),
        "{:?}",
        errors
    );
}

#[test]
fn salloc_intrinsic_lowers_to_an_array_alloca() -> Result<()> {
    let ir = gen_ir(
        "import \"asm\"
        fnc main() -> int32 {
            def int32* buf = __asm__salloc(4, sizeof int32)
            return 0i32
        }",
    )?;
    assert!(ir.contains("alloca [4 x i32]"), "{}", ir);
    Ok(())
}

#[test]
fn unknown_asm_intrinsic_errors() {
    let errors = gen_errors(
        "import \"asm\"
        fnc main() -> none { __asm__frobnicate(1, 2) }",
    );
    assert!(
        errors.iter().any(|e| e.contains("unknown asm intrinsic")),
        "{:?}",
        errors
    );
}

#[test]
fn unknown_function_call_errors() {
    let errors = gen_errors("fnc main() -> none { frobnicate(1) }");
    assert!(
        errors.iter().any(|e| e.contains("couldn't find function")),
        "{:?}",
        errors
    );
}

#[test]
fn unknown_builtin_module_errors() {
    let errors = gen_errors("import \"nonsense\"");
    assert!(
        errors
            .iter()
            .any(|e| e.contains("couldn't import builtin module")),
        "{:?}",
        errors
    );
}

#[test]
fn mismatched_operand_types_error() {
    let errors = gen_errors("fnc main() -> none { def int x = 1 + true }");
    assert!(
        errors.iter().any(|e| e.contains("operator + invalid")),
        "{:?}",
        errors
    );
}

#[test]
fn dbg_import_declares_externals() -> Result<()> {
    let ir = gen_ir(
        "import \"dbg\"
        fnc main() -> none {
            dbg_i32(1i32)
            dbg_bool(true)
            dbg_float(1.5)
        }",
    )?;
    assert!(ir.contains("declare void @dbg_i32(i32)"), "{}", ir);
    assert!(ir.contains("declare void @dbg_bool(i1)"), "{}", ir);
    assert!(ir.contains("declare void @dbg_float(float)"), "{}", ir);
    Ok(())
}

#[test]
fn strings_module_declares_externals() -> Result<()> {
    let ir = gen_ir(
        "import \"strings\"
        fnc main() -> uint {
            def char* joined = str_append(\"a\", \"b\")
            return str_len(joined)
        }",
    )?;
    assert!(ir.contains("declare ptr @str_append(ptr, ptr)"), "{}", ir);
    assert!(ir.contains("declare i64 @str_len(ptr)"), "{}", ir);
    Ok(())
}

#[test]
fn gl3_imports_declare_external_functions() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let helper = dir.path().join("helpers.gl3");
    std::fs::write(&helper, "fnc add(int a, int b) -> int { return a + b }")?;

    let src = format!(
        "import \"{}\"
        fnc main() -> int {{ return add(1, 2) }}",
        helper.display()
    );
    let ir = gen_ir(&src)?;
    assert!(ir.contains("declare i64 @add(i64, i64)"), "{}", ir);
    assert!(ir.contains("call i64 @add"), "{}", ir);
    Ok(())
}

#[test]
fn early_return_inside_if_keeps_blocks_terminated() -> Result<()> {
    let ir = gen_ir(
        "fnc pick(int x) -> int {
            if x > 0 { return 1 } else { }
            return 2
        }",
    )?;
    assert_eq!(ir.matches("ret i64").count(), 2, "{}", ir);
    // the then arm ends at its return; only the else arm branches to end
    assert_eq!(ir.matches("br label %end").count(), 1, "{}", ir);
    Ok(())
}
