use assert_cmd::Command;
use perf_baseline::BaselineStore;
use std::path::PathBuf;

#[test]
fn test_cli_exits_with_success_on_help() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn test_cli_list_on_missing_file_prints_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.baseline");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    cmd.args(["--file", path.to_str().unwrap(), "list"]);
    let assert = cmd.assert().success();
    assert!(assert.get_output().stdout.is_empty());
}

#[test]
fn test_cli_check_records_then_flags_regression() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cli.baseline");
    let file = path.to_str().unwrap();

    let mut record = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    record.args(["--file", file, "--threshold", "2.0", "check", "op", "0.001"]);
    let assert = record.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.starts_with("recorded op"));

    let mut within = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    within.args(["--file", file, "--threshold", "2.0", "check", "op", "0.0015"]);
    within.assert().success();

    let mut regressed = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    regressed.args(["--file", file, "--threshold", "2.0", "check", "op", "0.003"]);
    regressed.assert().code(1);

    let store = BaselineStore::open(path.clone());
    assert_eq!(store.get("op").expect("get").expect("record").elapsed, 0.001);
}

#[test]
fn test_cli_list_and_show_existing_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = prepare_store(dir.path().join("list.baseline"));

    let mut list = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    list.args(["--file", path.to_str().unwrap()]);
    let assert = list.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(names, vec!["decode", "encode"]);

    let mut show = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    show.args(["--file", path.to_str().unwrap(), "show", "encode"]);
    let assert = show.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("\"elapsed\": 0.02"));

    let mut missing = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    missing.args(["--file", path.to_str().unwrap(), "show", "nope"]);
    missing.assert().code(1);
}

#[test]
fn test_cli_reset_removes_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = prepare_store(dir.path().join("reset.baseline"));
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    cmd.args(["--file", path.to_str().unwrap(), "reset"]);
    cmd.assert().success();
    assert!(!path.exists());
}

#[test]
fn test_cli_rejects_bad_arguments() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_perf-baseline"));
    cmd.args(["check", "op", "not-a-number"]);
    cmd.assert().code(2);
}

fn prepare_store(path: PathBuf) -> PathBuf {
    let store = BaselineStore::open(path.clone());
    store.record_or_compare_elapsed("encode", 0.02).expect("encode");
    store.record_or_compare_elapsed("decode", 0.01).expect("decode");
    path
}
