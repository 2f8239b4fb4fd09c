use gl3c::checker::Checker;
use gl3c::lexer::Lexer;
use gl3c::parser::Parser;

fn warnings(src: &str) -> Vec<String> {
    let mut parser = Parser::new(Lexer::new(src));
    let program = parser.parse_program();
    assert!(
        parser.errors.is_empty(),
        "parser errors: {:?}",
        parser.errors
    );

    let mut checker = Checker::new();
    checker.check_program(&program);
    checker.errors
}

#[test]
fn imported_builtin_function_passes() {
    let found = warnings(
        "import \"dbg\"
        fnc main() -> none { dbg_i32(1i32) }",
    );
    assert!(found.is_empty(), "{:?}", found);
}

#[test]
fn unimported_builtin_function_warns_with_module_name() {
    let found = warnings("fnc main() -> none { dbg_i32(1i32) }");
    assert_eq!(found.len(), 1, "{:?}", found);
    assert!(found[0].contains("dbg_i32"), "{:?}", found);
    assert!(found[0].contains("'dbg'"), "{:?}", found);
}

#[test]
fn import_must_precede_the_call() {
    let found = warnings(
        "fnc main() -> none { dbg_i32(1i32) }
        import \"dbg\"",
    );
    assert_eq!(found.len(), 1, "{:?}", found);
}

#[test]
fn unknown_names_are_ignored() {
    let found = warnings("fnc main() -> none { frobnicate(1) }");
    assert!(found.is_empty(), "{:?}", found);
}

#[test]
fn gl3_imports_are_not_modules() {
    // a .gl3 path named like a module must not satisfy the module check
    let found = warnings(
        "import \"dbg.gl3\"
        fnc main() -> none { dbg_i32(1i32) }",
    );
    assert_eq!(found.len(), 1, "{:?}", found);
}

#[test]
fn strings_module_is_checked() {
    let found = warnings("fnc main() -> none { str_append(\"a\", \"b\") }");
    assert_eq!(found.len(), 1, "{:?}", found);
    assert!(found[0].contains("'strings'"), "{:?}", found);

    let found = warnings(
        "import \"strings\"
        fnc main() -> none { str_append(\"a\", \"b\") }",
    );
    assert!(found.is_empty(), "{:?}", found);
}

#[test]
fn calls_are_found_in_nested_positions() {
    let found = warnings(
        "fnc main() -> none {
            if true { dbg_bool(true) } else { dbg_bool(false) }
            while false { dbg_i64(1) }
            def int x = 1 + str_len(\"a\") as int
        }",
    );
    assert_eq!(found.len(), 4, "{:?}", found);
}
