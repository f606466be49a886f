//! Exit status and messages of the `pptx-name` binary.

use std::process::{Command, Output};

fn pptx_name(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pptx-name"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_missing_source_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.pptx");

    let output = pptx_name(&["insert", missing.to_str().unwrap(), "Ann", "true"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "File not found\n");
    assert!(!dir.path().join("missing_updated.pptx").exists());
}

#[test]
fn test_missing_template_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.pptx");
    let target = dir.path().join("out.pptx");

    let output = pptx_name(&[
        "template",
        template.to_str().unwrap(),
        target.to_str().unwrap(),
        "Ann",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Template file not found\n"
    );
    assert!(!target.exists());
}

#[test]
fn test_unreadable_input_exits_one_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.pptx");
    std::fs::write(&source, b"plain text").unwrap();
    let target = dir.path().join("out.pptx");

    let output = pptx_name(&[
        "substitute",
        source.to_str().unwrap(),
        target.to_str().unwrap(),
        "Ann",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Failed to update"));
    assert!(!target.exists());
}
