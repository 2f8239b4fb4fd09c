use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn no_inputs_prints_usage() {
    Command::cargo_bin("gl3c")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_input_file_fails() {
    Command::cargo_bin("gl3c")
        .unwrap()
        .arg("does-not-exist.gl3")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn parse_errors_stop_the_compile() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("broken.gl3");
    std::fs::write(&src, "fnc broken( -> int { }").unwrap();

    Command::cargo_bin("gl3c")
        .unwrap()
        .arg(&src)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parser error"));
}

#[test]
fn checker_warnings_stop_the_compile() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("nohygiene.gl3");
    std::fs::write(&src, "fnc main() -> int32 { dbg_i32(1i32) return 0i32 }").unwrap();

    Command::cargo_bin("gl3c")
        .unwrap()
        .arg(&src)
        .assert()
        .failure()
        .stderr(predicate::str::contains("without stdlib module 'dbg'"));
}
