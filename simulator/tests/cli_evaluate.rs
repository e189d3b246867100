//! CLI tests for `simulator evaluate`, `check`, and `replay`.
//!
//! Spawns the simulator binary in a scratch project and verifies exit codes
//! and the printed trace for presets, file inputs, and invalid inputs.

use std::fs;
use std::process::{Command, Output};

use simulator::core::input::{Direction, NettingMode, SecType};
use simulator::exit_codes;
use simulator::io::input_store::write_input;
use simulator::test_support::{TestProject, position};

fn simulator(project: &TestProject, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_simulator"))
        .current_dir(project.root())
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("spawn simulator")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn evaluate_preset_matches_expected_value() {
    let project = TestProject::new().expect("project");
    let output = simulator(&project, &["evaluate", "--preset", "2"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let text = stdout(&output);
    assert!(text.starts_with("Decision trace: netting"));
    assert!(text.contains("Result: -22400"));
    assert!(text.contains("Expected: -22400 (match)"));
}

#[test]
fn evaluate_with_wrong_expectation_reports_mismatch() {
    let project = TestProject::new().expect("project");
    let output = simulator(&project, &["evaluate", "--preset", "0", "--expected=1"]);

    assert_eq!(output.status.code(), Some(exit_codes::MISMATCH));
    assert!(stdout(&output).contains("mismatch"));
}

#[test]
fn evaluate_scaffolded_input_file() {
    let project = TestProject::new().expect("project");
    let path = project.paths().input_path("opt-netting-long");
    let output = simulator(
        &project,
        &["evaluate", "--json", "--input", path.to_str().expect("utf-8 path")],
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["trace"]["outcome"], "netting");
    assert_eq!(value["trace"]["result"], 64000.0);
    assert!(value.get("expectation").is_none());
}

#[test]
fn ineligible_type_exits_with_skipped() {
    let project = TestProject::new().expect("project");
    let mut input = position(10, NettingMode::NoNetting, Direction::Long);
    input.sec_type = SecType::from("STK");
    let path = project.root().join("stock.json");
    write_input(&path, &input).expect("write input");

    let output = simulator(&project, &["evaluate", "--input", "stock.json"]);

    assert_eq!(output.status.code(), Some(exit_codes::SKIPPED));
    assert!(stdout(&output).contains("Skipped: type not eligible"));
}

#[test]
fn malformed_input_exits_with_invalid() {
    let project = TestProject::new().expect("project");
    fs::write(
        project.root().join("bad.json"),
        r#"{"secType":"FUT","msgType":5,"multiplier":1,"latestPrice":1,"direction":1,"nettingMode":2}"#,
    )
    .expect("write bad input");

    let output = simulator(&project, &["evaluate", "--input", "bad.json"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(output.stdout.is_empty());
}

#[test]
fn check_passes_for_builtin_presets() {
    let project = TestProject::new().expect("project");
    let output = simulator(&project, &["check"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let text = stdout(&output);
    assert_eq!(text.lines().filter(|line| line.starts_with("ok")).count(), 3);
}

#[test]
fn replay_prints_one_line_per_item_then_done() {
    let project = TestProject::new().expect("project");
    let mut input = position(10, NettingMode::NoNetting, Direction::Long);
    input.sec_type = SecType::from("STK");
    write_input(&project.root().join("stock.json"), &input).expect("write input");

    let output = simulator(
        &project,
        &["replay", "--input", "stock.json", "--interval-ms", "1"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::SKIPPED));
    let text = stdout(&output);
    let frames: Vec<&str> = text.lines().filter(|line| line.starts_with('[')).collect();
    assert_eq!(frames.len(), 6);
    assert!(frames[0].starts_with("[ 1/5] start"));
    assert!(frames[4].starts_with("[ 5/5] skipType"));
    assert!(frames[5].starts_with("[done 5]"));
    assert!(frames[5].ends_with("activated: start, e1, checkType, e-skip1, skipType"));
}

#[test]
fn replay_rejects_zero_interval() {
    let project = TestProject::new().expect("project");
    let output = simulator(&project, &["replay", "--preset", "0", "--interval-ms", "0"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn out_of_range_product_exits_with_invalid() {
    let project = TestProject::new().expect("project");
    fs::write(
        project.root().join("huge.json"),
        r#"{"secType":"FUT","msgType":6,"holdQty":1000000000000000000,"multiplier":1e300,"latestPrice":0,"direction":1,"nettingMode":2}"#,
    )
    .expect("write huge input");

    let output = simulator(&project, &["evaluate", "--json", "--input", "huge.json"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
}
