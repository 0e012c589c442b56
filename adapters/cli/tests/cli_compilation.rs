use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "droidworks"])
        .status()
        .expect("failed to invoke cargo check for droidworks CLI binary");

    assert!(status.success(), "cargo check --bin droidworks should succeed");
}

#[test]
fn demo_run_prints_a_snapshot() {
    let output = Command::new(env!("CARGO_BIN_EXE_droidworks"))
        .args(["--ticks", "6", "--walkers", "2", "--json"])
        .output()
        .expect("failed to run droidworks");
    assert!(output.status.success(), "droidworks exited with {}", output.status);

    let snapshot: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON snapshot");
    assert_eq!(snapshot["tick"], 6);
    assert_eq!(snapshot["entities"].as_array().map(Vec::len), Some(6));
}
