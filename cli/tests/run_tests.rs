use assert_cmd::Command;
use emu8086::constants::MAX_PROGRAM_SIZE;
use predicates::prelude::*;
use predicates::str::contains;

fn emu8086() -> Command {
    let mut cmd = Command::cargo_bin("emu8086-cli").unwrap();
    cmd.env_remove("RUST_LOG").arg("--no-color");
    cmd
}

#[test]
fn prints_hello() {
    emu8086()
        .arg("tests/programs/hello.com")
        .assert()
        .success()
        .stdout(contains("Hi"))
        .stdout(contains("Program terminated"))
        .stdout(contains("hello.com"));
}

#[test]
fn nop_then_terminate() {
    emu8086()
        .arg("tests/programs/nop.com")
        .assert()
        .success()
        .stdout(contains("Running program"))
        .stdout(contains("halted with code 0"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn call_and_return() {
    emu8086()
        .arg("tests/programs/call.com")
        .assert()
        .success()
        .stdout(contains("A"))
        .stdout(contains("SP=0000"));
}

#[test]
fn rejects_invalid_opcode() {
    emu8086()
        .arg("tests/programs/invalid_opcode.com")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid opcode 0x01"))
        .stderr(contains("offset 0x0000"));
}

#[test]
fn rejects_invalid_interrupt() {
    emu8086()
        .arg("tests/programs/invalid_interrupt.com")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid interrupt 0x21 (vector 1)"))
        .stderr(contains("ah: 0x63"));
}

#[test]
fn rejects_missing_file() {
    emu8086()
        .arg("tests/programs/missing.com")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to load tests/programs/missing.com"));
}

#[test]
fn requires_an_input() {
    emu8086().assert().failure().code(2);
}

#[test]
fn rejects_oversized_program() {
    let path = std::env::temp_dir().join(format!("emu8086-too-large-{}.com", std::process::id()));
    std::fs::write(&path, vec![90; MAX_PROGRAM_SIZE + 1]).unwrap();

    let assert = emu8086().arg(&path).assert();
    std::fs::remove_file(&path).unwrap();

    assert
        .failure()
        .code(1)
        .stderr(contains("too big"))
        .stdout(contains("Running program").not());
}

#[test]
fn stops_runaway_loop() {
    emu8086()
        .args(["--max-steps", "500", "tests/programs/loop.com"])
        .assert()
        .success()
        .stdout(contains("Step limit reached"));
}

#[test]
fn propagates_exit_code() {
    emu8086()
        .args(["--exit-code", "tests/programs/exit.com"])
        .write_stdin("*")
        .assert()
        .code(42);

    // Without the flag, a controlled termination always succeeds
    emu8086()
        .arg("tests/programs/exit.com")
        .write_stdin("*")
        .assert()
        .success();
}

#[test]
fn generates_completions() {
    Command::cargo_bin("emu8086-cli")
        .unwrap()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(contains("emu8086-cli"));
}
