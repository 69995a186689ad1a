use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join("cli")
        .join(name)
}

fn run_tether(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tether"))
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run tether with args {:?}: {e}", args))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn eval_prints_every_value() {
    let output = run_tether(&["eval", "1 + 2, 'x', nil"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "3\tx\tnil\n");
}

#[test]
fn eval_reports_errors_with_exit_code() {
    let output = run_tether(&["eval", "error('nope', 0)"]);
    assert!(!output.status.success());
    insta::assert_snapshot!(stderr(&output).trim_end(), @"Logic error in: nope");
}

#[test]
fn run_prints_output_in_argument_order() {
    let hello = fixture_path("hello.lua");
    let counter = fixture_path("counter.lua");
    let output = run_tether(&[
        "run",
        counter.to_str().unwrap(),
        hello.to_str().unwrap(),
        counter.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "count\t3\nhello\t2\ncount\t3\n");
}

#[test]
fn run_fails_when_any_script_fails() {
    let hello = fixture_path("hello.lua");
    let failing = fixture_path("failing.lua");
    let output = run_tether(&["run", hello.to_str().unwrap(), failing.to_str().unwrap()]);
    assert!(!output.status.success());

    let out = stdout(&output);
    assert!(out.contains("hello\t2"), "{}", out);
    assert!(out.contains("before"), "{}", out);
    let err = stderr(&output);
    assert!(err.contains("Logic error in: script failed"), "{}", err);
}

#[test]
fn config_file_limits_the_runtime() {
    let config = fixture_path("config.json");
    let recurse = fixture_path("recurse.lua");
    let output = run_tether(&[
        "--config",
        config.to_str().unwrap(),
        "run",
        recurse.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("stack overflow"), "{}", stderr(&output));
}

#[test]
fn bad_config_is_rejected() {
    let output = run_tether(&["--config", "/nonexistent/config.json", "eval", "1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("loading config"), "{}", stderr(&output));
}

#[test]
fn leak_detector_reports_counters() {
    let output = run_tether(&["--leak-detector", "eval", "{}"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("[leak] refs created="), "{}", stderr(&output));
}

#[test]
fn help_lists_commands() {
    let output = run_tether(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("tether run <file.lua>"));
}
