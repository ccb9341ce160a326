//! Launcher failure paths. The happy path runs until Ctrl-C, so these stick
//! to descriptors that fail fast.

use std::io::Write;
use std::process::Command;

fn foxtail() -> Command {
    Command::new(env!("CARGO_BIN_EXE_foxtail"))
}

#[test]
fn missing_descriptor_file_fails() {
    let output = foxtail()
        .arg("/no/such/descriptor.json")
        .output()
        .expect("run foxtail");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reading"), "stderr: {stderr}");
}

#[test]
fn malformed_descriptor_reports_the_build_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ \"node\": {{ \"chassis\": [] }} }}").unwrap();

    let output = foxtail().arg(file.path()).output().expect("run foxtail");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("node build failed"), "stderr: {stderr}");
    assert!(stderr.contains("NODE:NO_CHASSIS"), "stderr: {stderr}");
}
