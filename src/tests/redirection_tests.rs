use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process;

use tempfile::{tempdir, NamedTempFile};

use super::plan;
use crate::executor::Executor;
use crate::types::ShellError;

#[test]
fn test_output_redirection() -> Result<(), ShellError> {
    let executor = Executor::new();
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    let result = executor.execute(&plan(&format!("printf hello > {}", path))?)?;
    assert!(result.success());
    assert_eq!(result.raw_status(), 0);
    assert_eq!(fs::read_to_string(path)?, "hello");

    // Truncates what was there before
    executor.execute(&plan(&format!("printf hi > {}", path))?)?;
    assert_eq!(fs::read_to_string(path)?, "hi");

    Ok(())
}

#[test]
fn test_output_redirection_creates_file() -> Result<(), ShellError> {
    let executor = Executor::new();
    let dir = tempdir()?;
    let path = dir.path().join("out.txt");

    executor.execute(&plan(&format!("echo first > {}", path.display()))?)?;
    assert_eq!(fs::read_to_string(&path)?, "first\n");
    let mode = fs::metadata(&path)?.permissions().mode();
    assert_eq!(mode & 0o022, 0);
    assert_eq!(mode & 0o600, 0o600);

    Ok(())
}

#[test]
fn test_append_redirection() -> Result<(), ShellError> {
    let executor = Executor::new();
    let dir = tempdir()?;
    let path = dir.path().join("log.txt");

    // Creates the file on first use
    executor.execute(&plan(&format!("echo first >> {}", path.display()))?)?;
    executor.execute(&plan(&format!("echo second >> {}", path.display()))?)?;
    assert_eq!(fs::read_to_string(&path)?, "first\nsecond\n");

    Ok(())
}

#[test]
fn test_large_output_is_not_truncated() -> Result<(), ShellError> {
    let executor = Executor::new();
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    executor.execute(&plan(&format!("seq 1 50000 > {}", path))?)?;
    let expected = process::Command::new("seq").args(["1", "50000"]).output()?.stdout;
    assert!(expected.len() > 65536);
    assert_eq!(fs::read(path)?, expected);

    Ok(())
}

#[test]
fn test_capture_limit_truncates() -> Result<(), ShellError> {
    let executor = Executor::new().capture_limit(Some(4096));
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    let result = executor.execute(&plan(&format!("seq 1 50000 > {}", path))?)?;
    assert!(result.success());
    let expected = process::Command::new("seq").args(["1", "50000"]).output()?.stdout;
    let written = fs::read(path)?;
    assert_eq!(written.len(), 4096);
    assert_eq!(written, &expected[..4096]);

    Ok(())
}

#[test]
fn test_input_redirection() -> Result<(), ShellError> {
    let executor = Executor::new();
    let input = NamedTempFile::new()?;
    fs::write(input.path(), "line1\nline2\n")?;
    let output = NamedTempFile::new()?;

    let cmd = format!(
        "tee {} < {}",
        output.path().display(),
        input.path().display()
    );
    let result = executor.execute(&plan(&cmd)?)?;
    assert!(result.success());
    assert_eq!(fs::read_to_string(output.path())?, "line1\nline2\n");

    Ok(())
}

#[test]
fn test_redirection_errors() -> Result<(), ShellError> {
    let executor = Executor::new();
    let dir = tempdir()?;

    // Missing input file aborts before anything is spawned
    let missing = dir.path().join("missing.txt");
    let result = executor.execute(&plan(&format!("cat < {}", missing.display()))?);
    assert!(matches!(result, Err(ShellError::Redirect { .. })));

    // Target cannot be created
    let result = executor.execute(&plan("echo hello > /dev/null/file")?);
    assert!(matches!(result, Err(ShellError::Redirect { .. })));

    // Unknown program
    let result = executor.execute(&plan(&format!(
        "nonexistentcmd-pipeshell > {}",
        dir.path().join("x").display()
    ))?);
    assert!(matches!(result, Err(ShellError::CommandNotFound(_))));
    assert!(!dir.path().join("x").exists());

    Ok(())
}

#[test]
fn test_exit_status_is_reported() -> Result<(), ShellError> {
    let executor = Executor::new();

    let result = executor.execute(&plan("false")?)?;
    assert!(!result.success());
    assert_eq!(result.status.code(), Some(1));
    assert_eq!(result.raw_status(), 1 << 8);
    assert!(result.pid > 0);

    Ok(())
}
