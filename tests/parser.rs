use gl3c::lexer::token::BaseType;
use gl3c::lexer::Lexer;
use gl3c::parser::ast::Statement;
use gl3c::parser::Parser;

fn parse(input: &str) -> String {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program();
    assert!(
        parser.errors.is_empty(),
        "parser errors for {:?}: {:?}",
        input,
        parser.errors
    );
    program.to_string()
}

fn check(cases: &[(&str, &str)]) {
    for (input, want) in cases {
        assert_eq!(&parse(input), want, "input: {:?}", input);
    }
}

#[test]
fn literals() {
    check(&[
        ("4", "4(Int);"),
        ("4i32", "4(Int32);"),
        ("4i16", "4(Int16);"),
        ("4i8", "4(Int8);"),
        ("4u32", "4(Uint32);"),
        ("4u16", "4(Uint16);"),
        ("4u8", "4(Uint8);"),
        ("4u64", "4(Uint);"),
        ("1.5", "1.5(Float);"),
        ("true", "true;"),
        ("false", "false;"),
        ("'a'", "97(Int8);"),
        ("\"hello\"", "\"hello\0\";"),
    ]);
}

#[test]
fn hex_literals() {
    check(&[
        ("0x10", "16(Int);"),
        ("0x1F", "31(Int);"),
        ("0xff u8", "255(Uint8);"),
    ]);
}

#[test]
fn def_statements() {
    check(&[
        ("def int x = 7", "def Int x = 7(Int);"),
        ("def int32 x = 7i32", "def Int32 x = 7(Int32);"),
        ("def uint32 x = 7u32", "def Uint32 x = 7(Uint32);"),
        ("def float x = 1.5", "def Float x = 1.5(Float);"),
        ("def bool x = true", "def Bool x = true;"),
        ("def char x = 'a'", "def Char x = 97(Int8);"),
        ("def char* x = \"hello\"", "def Char* x = \"hello\0\";"),
        ("def char*** x = \"hello\"", "def Char*** x = \"hello\0\";"),
    ]);
}

#[test]
fn fnc_statements() {
    check(&[
        (
            "fnc main() -> int32 { \n return 0i32 \n }",
            "fnc main() -> Int32 { return 0(Int32) };",
        ),
        (
            "fnc stuff(int8 x, int32** other) -> none { \n }",
            "fnc stuff(Int8 x, Int32** other) -> Void {  };",
        ),
        (
            "fnc foo() -> none { \n }",
            "fnc foo() -> Void {  };",
        ),
        (
            "fnc x(int8 x, int32** other) -> int8 { \n return x; \n }",
            "fnc x(Int8 x, Int32** other) -> Int8 { return x };",
        ),
        (
            "fnc isok() -> bool { \n return true; \n }",
            "fnc isok() -> Bool { return true };",
        ),
        (
            "fnc greet() -> char* { \n return \"hi\"; \n }",
            "fnc greet() -> Char* { return \"hi\0\" };",
        ),
    ]);
}

#[test]
fn import_statements() {
    check(&[
        ("import \"arrays\"", "import \"arrays\";"),
        ("import \"stuff.gl3\"", "import \"stuff.gl3\";"),
    ]);
}

#[test]
fn if_statements() {
    check(&[
        ("if true { \n  \n }", "if true {  };"),
        ("if false { \n  \n }", "if false {  };"),
        ("if x > 5i32 { \n \n }", "if (x > 5(Int32)) {  };"),
        (
            "if x == 7u32 { \n stuff()\n }",
            "if (x == 7(Uint32)) { stuff(); };",
        ),
        (
            "if true { \n \n } else { \n \n }",
            "if true {  } else {  };",
        ),
        (
            "if x < 1 { \n return 0 \n } else { \n return 1 \n }",
            "if (x < 1(Int)) { return 0(Int) } else { return 1(Int) };",
        ),
        (
            "if true { \n if false { \n \n } \n }",
            "if true { if false {  } };",
        ),
        (
            "if x > 5 && y < 2 { \n \n }",
            "if ((x > 5(Int)) && (y < 2(Int))) {  };",
        ),
    ]);
}

#[test]
fn while_statements() {
    check(&[
        ("while true { \n  \n }", "while true {  };"),
        ("while false { \n  \n }", "while false {  };"),
        ("while x > 5i32 { \n \n }", "while (x > 5(Int32)) {  };"),
        (
            "while x == 7u32 { \n stuff()\n }",
            "while (x == 7(Uint32)) { stuff(); };",
        ),
        (
            "while true { \n while false { \n \n } \n }",
            "while true { while false {  } };",
        ),
        (
            "while x > 5 && y < 2 { \n \n }",
            "while ((x > 5(Int)) && (y < 2(Int))) {  };",
        ),
    ]);
}

#[test]
fn infix_expressions() {
    check(&[
        ("5i32 + 3i32", "(5(Int32) + 3(Int32));"),
        ("8u32 - 2u32", "(8(Uint32) - 2(Uint32));"),
        ("x * 4i16", "(x * 4(Int16));"),
        ("12i32 / 3i32", "(12(Int32) / 3(Int32));"),
        ("ok && ready", "(ok && ready);"),
        ("ok || ready", "(ok || ready);"),
        ("x == 7i8", "(x == 7(Int8));"),
        ("x != 7i8", "(x != 7(Int8));"),
        ("x < 5i32", "(x < 5(Int32));"),
        ("x > 5i32", "(x > 5(Int32));"),
        ("x <= 5i32", "(x <= 5(Int32));"),
        ("x >= 5i32", "(x >= 5(Int32));"),
        ("player.health", "(player . health);"),
        ("a[1]", "*(a + 1(Int));"),
        ("items[i]", "*(items + i);"),
        ("1 == true", "(1(Int) == true);"),
    ]);
}

#[test]
fn precedence() {
    check(&[
        ("1 + 2 * 3", "(1(Int) + (2(Int) * 3(Int)));"),
        ("(1 + 2) * 3", "((1(Int) + 2(Int)) * 3(Int));"),
        (
            "1 + 2 == 3 && 4 > 5",
            "(((1(Int) + 2(Int)) == 3(Int)) && (4(Int) > 5(Int)));",
        ),
        ("-1 + 2", "((-1(Int)) + 2(Int));"),
        (
            "1 + 2 < 3 == 4",
            "(((1(Int) + 2(Int)) < 3(Int)) == 4(Int));",
        ),
    ]);
}

#[test]
fn assignment_expressions() {
    check(&[
        ("x = 1i32", "x = 1(Int32);"),
        ("*ptr = 3i8", "*ptr = 3(Int8);"),
        ("player.health = 0", "(player . health) = 0(Int);"),
        ("items[i] = 2u16", "*(items + i) = 2(Uint16);"),
    ]);
}

#[test]
fn cast_expressions() {
    check(&[
        ("1i32 as float", "1(Int32) as Float;"),
        ("x as int8*", "x as Int8*;"),
    ]);
}

#[test]
fn prefix_expressions() {
    check(&[
        ("!true", "(!true);"),
        ("!ready", "(!ready);"),
        ("!(x == 1i8)", "(!(x == 1(Int8)));"),
        ("-5i32", "(-5(Int32));"),
        ("-count", "(-count);"),
        ("-(x + 2i32)", "(-(x + 2(Int32)));"),
    ]);
}

#[test]
fn call_expressions() {
    check(&[
        ("foo()", "foo();"),
        ("foo(1i32)", "foo(1(Int32));"),
        ("foo(1i8, x, true)", "foo(1(Int8), x, true);"),
        ("sum(1i32 + 2i32)", "sum((1(Int32) + 2(Int32)));"),
        ("outer(inner(2u16))", "outer(inner(2(Uint16)));"),
        (
            "print(\"hi\", 'a')",
            "print(\"hi\0\", 97(Int8));",
        ),
    ]);
}

#[test]
fn sizeof_expressions() {
    check(&[
        ("sizeof int32", "sizeof Int32;"),
        ("sizeof char*", "sizeof Char*;"),
        ("sizeof Player", "sizeof Player;"),
    ]);
}

#[test]
fn struct_initialization() {
    check(&[
        ("Player:{1i32, true}", "Player:{1(Int32),true};"),
        ("Cooked:{1i32}", "Cooked:{1(Int32)};"),
        ("Empty:{}", "Empty:{};"),
    ]);
}

#[test]
fn array_literals() {
    check(&[
        ("[int32; 1i32, 2i32]", "[Int32;1(Int32),2(Int32)];"),
        ("[uint8;]", "[Uint8;];"),
    ]);
}

#[test]
fn reference_and_dereference() {
    check(&[
        ("&x", "&x;"),
        ("*ptr", "*ptr;"),
        ("***ptr", "***ptr;"),
    ]);
}

#[test]
fn struct_statements() {
    struct Case {
        input: &'static str,
        name: &'static str,
        fields: &'static [(&'static str, BaseType, u8)],
    }

    let cases = [
        Case {
            input: "struct Player { int32 health }",
            name: "Player",
            fields: &[("health", BaseType::Int32, 0)],
        },
        Case {
            input: "struct Player { int32 health char* name bool alive }",
            name: "Player",
            fields: &[
                ("health", BaseType::Int32, 0),
                ("name", BaseType::Char, 1),
                ("alive", BaseType::Bool, 0),
            ],
        },
        Case {
            input: "struct Empty { }",
            name: "Empty",
            fields: &[],
        },
    ];

    for case in cases {
        let mut parser = Parser::new(Lexer::new(case.input));
        let program = parser.parse_program();
        assert!(
            parser.errors.is_empty(),
            "parser errors: {:?}",
            parser.errors
        );
        assert_eq!(program.statements.len(), 1);
        let stmt = match &program.statements[0] {
            Statement::Struct(s) => s,
            other => panic!("expected struct statement, got {}", other),
        };
        assert_eq!(stmt.name, case.name);
        assert_eq!(stmt.field_types.len(), case.fields.len());
        assert_eq!(stmt.field_indexes.len(), case.fields.len());
        for (field, base, pointer) in case.fields {
            let idx = stmt.field_indexes[*field];
            assert_eq!(stmt.field_types[idx].base, *base, "field {}", field);
            assert_eq!(stmt.field_types[idx].pointer, *pointer, "field {}", field);
        }
    }
}

// Printed forms that are themselves valid source should parse back to the
// same printed form.
#[test]
fn printing_is_stable_under_reparse() {
    let inputs = [
        "(x + y);",
        "((a * b) + c);",
        "*(a + i);",
        "(ok && ready);",
        "x = y;",
        "*ptr = x;",
        "foo(x, y);",
        "if (x > y) { stuff(); };",
        "while (x > y) { stuff(); };",
        "&x;",
    ];
    for input in inputs {
        let printed = parse(input);
        assert_eq!(parse(&printed), printed, "input: {:?}", input);
    }
}

#[test]
fn parse_errors_are_collected() {
    let cases = [
        ("1 = 2", "lhs of assignment"),
        ("|", "no prefix parse function for UNKNOWN"),
        ("def x = 3", "expected next token to be"),
        ("fnc broken( -> int { }", "expected next token to be"),
    ];
    for (input, needle) in cases {
        let mut parser = Parser::new(Lexer::new(input));
        parser.parse_program();
        assert!(
            parser.errors.iter().any(|e| e.contains(needle)),
            "input {:?}: errors {:?} missing {:?}",
            input,
            parser.errors,
            needle
        );
    }
}
