use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "barrage"])
        .status()
        .expect("failed to invoke cargo check for barrage CLI binary");

    assert!(status.success(), "cargo check --bin barrage should succeed");
}

#[test]
fn cli_runs_the_bundled_scenario() {
    let output = Command::new(env!("CARGO_BIN_EXE_barrage"))
        .current_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../.."))
        .args(["--ticks", "180", "--dt-ms", "20", "--seed", "3"])
        .output()
        .expect("failed to run barrage binary");

    assert!(
        output.status.success(),
        "barrage exited with {}",
        output.status
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("final damage"));
    assert!(stdout.contains("t=  1.0s"));
}
