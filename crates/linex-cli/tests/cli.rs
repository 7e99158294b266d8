/// End-to-end tests for the `linex` binary

use std::process::Command;

use tempfile::TempDir;

fn linex() -> Command {
    Command::new(env!("CARGO_BIN_EXE_linex"))
}

fn write_program(dir: &TempDir, source: &str) -> std::path::PathBuf {
    let path = dir.path().join("main.lx");
    std::fs::write(&path, source).unwrap();
    path
}

#[test]
fn test_prints_output_lines() {
    let dir = TempDir::new().unwrap();
    let program = write_program(&dir, "linex init project\ninput name\nlinex print \"Hi \" + name\n");

    let output = linex().arg(&program).args(["-i", "Ana"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "✅ Project started successfully!",
            "⌨️ Variable 'name' received input 'Ana'",
            "📢 Hi Ana",
            "**--- End of Execution ---**",
        ]
    );
}

#[test]
fn test_failed_program_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let program = write_program(&dir, "print \"no directive\"\n");

    let output = linex().arg(&program).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("❌ Execution error:"));
}

#[test]
fn test_save_uses_working_dir() {
    let dir = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    let program = write_program(&dir, "linex init project\nvar x = 1\nsave \"state\"\n");

    let output = linex().arg(&program).arg("-C").arg(state.path()).output().unwrap();
    assert!(output.status.success());
    assert!(state.path().join("state.json").exists());
}

#[test]
fn test_unreadable_file_exits_with_two() {
    let output = linex().arg("/definitely/not/here.lx").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr).unwrap().contains("failed to read"));
}
