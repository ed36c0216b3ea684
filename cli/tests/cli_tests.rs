use assert_cmd::Command;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn octet() -> Command {
    let mut command = Command::cargo_bin("octet").unwrap();
    command.env_remove("RUST_LOG").arg("--no-color");
    command
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn run_hex_image() {
    let assert = octet()
        .arg("run")
        .arg(fixture("end_to_end.hex"))
        .assert()
        .success();

    let stdout = stdout(assert.get_output());
    assert!(stdout.starts_with("AX = 128 | BX = 255 |"), "{stdout}");
}

#[test]
fn logs_stay_off_stdout() {
    let assert = octet()
        .arg("-vv")
        .arg("--json")
        .arg("run")
        .arg(fixture("end_to_end.hex"))
        .assert()
        .success();

    let output = assert.get_output();
    let stdout = stdout(output);
    assert_eq!(stdout.lines().count(), 1, "{stdout}");
    assert!(stdout.starts_with("AX = 128 |"), "{stdout}");

    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    assert!(stderr.contains("Executing instruction"), "{stderr}");
}

#[test]
fn run_binary_image() {
    let path = std::env::temp_dir().join(format!("octet-{}.bin", std::process::id()));
    // LOAD_AX 0x2a, LOAD_BXAX, HALT
    std::fs::write(&path, [0x01, 0x2a, 0x06, 0x00]).unwrap();

    let assert = octet().arg("run").arg(&path).assert().success();
    std::fs::remove_file(&path).unwrap();

    let stdout = stdout(assert.get_output());
    assert!(stdout.starts_with("AX = 42 | BX = 42 |"), "{stdout}");
}

#[test]
fn run_step_limit() {
    octet()
        .arg("run")
        .arg("--max-steps")
        .arg("50")
        .arg(fixture("spin.hex"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn invalid_opcode_halts_by_default() {
    octet()
        .arg("run")
        .arg(fixture("invalid.hex"))
        .assert()
        .success();
}

#[test]
fn invalid_opcode_triple_faults_when_strict() {
    let assert = octet()
        .arg("run")
        .arg("--strict")
        .arg(fixture("invalid.hex"))
        .assert()
        .failure()
        .code(1);

    let stdout = stdout(assert.get_output());
    assert!(stdout.starts_with("AX = 2 |"), "{stdout}");
}

#[test]
fn run_parse_error() {
    octet()
        .arg("run")
        .arg(fixture("broken.hex"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn dump_hex_image() {
    let assert = octet()
        .arg("dump")
        .arg(fixture("end_to_end.hex"))
        .assert()
        .success();

    let stdout = stdout(assert.get_output());
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[0], "0x00  LOAD_BX   0xff");
    assert_eq!(lines[1], "0x02  LOAD_SPBX");
    assert!(lines.contains(&"0x0b  JUMP_LESS 0x20"), "{stdout}");
    assert!(lines.contains(&"0x20  LOAD_AX   0x80"), "{stdout}");
}

#[test]
fn dump_skips_trailing_padding() {
    let path = std::env::temp_dir().join(format!("octet-dump-{}.bin", std::process::id()));
    // LOAD_AX 0x2a, LOAD_BX 0x00, then padding
    std::fs::write(&path, [0x01, 0x2a, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap();

    let assert = octet().arg("dump").arg(&path).assert().success();
    std::fs::remove_file(&path).unwrap();

    let stdout = stdout(assert.get_output());
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines, ["0x00  LOAD_AX   0x2a", "0x02  LOAD_BX   0x00"]);
}

#[test]
fn completion() {
    octet().arg("completion").arg("bash").assert().success();
}
