use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process;
use std::time::{Duration, Instant};

use tempfile::{tempdir, NamedTempFile};

use super::plan;
use crate::executor::Executor;
use crate::types::ShellError;

#[test]
fn test_pipeline_features() -> Result<(), ShellError> {
    let executor = Executor::new();
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    // Basic pipeline
    let cmd = format!("printf hello | tee {}", path);
    executor.execute(&plan(&cmd)?)?;
    assert_eq!(fs::read_to_string(path)?, "hello");

    // Multiple pipes
    let cmd = format!("printf hello | tr a-z A-Z | tr L l | tee {}", path);
    let result = executor.execute(&plan(&cmd)?)?;
    assert!(result.success());
    assert_eq!(fs::read_to_string(path)?, "HEllO");

    Ok(())
}

#[test]
fn test_pipeline_streams_large_output() -> Result<(), ShellError> {
    let executor = Executor::new();
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    let cmd = format!("seq 1 100000 | cat | tee {}", path);
    executor.execute(&plan(&cmd)?)?;
    let expected = process::Command::new("seq").args(["1", "100000"]).output()?.stdout;
    assert_eq!(fs::read(path)?, expected);

    Ok(())
}

#[test]
fn test_pipeline_reports_last_stage() -> Result<(), ShellError> {
    let executor = Executor::new();

    let result = executor.execute(&plan("true | false")?)?;
    assert_eq!(result.status.code(), Some(1));

    let result = executor.execute(&plan("false | true")?)?;
    assert!(result.success());

    Ok(())
}

#[test]
fn test_pipeline_upstream_sees_closed_reader() -> Result<(), ShellError> {
    let executor = Executor::new();
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    // `head` exits early; `seq` must not hang on a pipe nobody reads.
    let cmd = format!("seq 1 1000000 | head -n 2 | tee {}", path);
    let result = executor.execute(&plan(&cmd)?)?;
    assert!(result.success());
    assert_eq!(fs::read_to_string(path)?, "1\n2\n");

    Ok(())
}

#[test]
fn test_pipeline_errors() -> Result<(), ShellError> {
    let executor = Executor::new();

    // Missing command after pipe
    assert!(matches!(plan("echo hello |"), Err(ShellError::InvalidSyntax(_))));

    // Missing command before pipe
    assert!(matches!(plan("| echo hello"), Err(ShellError::InvalidSyntax(_))));

    // Command not found in pipeline
    let result = executor.execute(&plan("echo hello | nonexistentcmd-pipeshell")?);
    assert!(matches!(result, Err(ShellError::CommandNotFound(ref name)) if name == "nonexistentcmd-pipeshell"));

    Ok(())
}

#[test]
fn test_pipeline_spawn_failure_stops_running_stages() -> Result<(), ShellError> {
    let executor = Executor::new();
    let dir = tempdir()?;

    // Executable bit set, but not something the kernel can run.
    let broken = dir.path().join("broken");
    fs::write(&broken, [0u8, 1, 2, 3])?;
    fs::set_permissions(&broken, fs::Permissions::from_mode(0o755))?;

    // `sleep` would outlive the test if the failed line waited on it.
    let started = Instant::now();
    let cmd = format!("sleep 30 | {}", broken.display());
    let result = executor.execute(&plan(&cmd)?);
    assert!(matches!(result, Err(ShellError::Spawn { .. })));
    assert!(started.elapsed() < Duration::from_secs(10));

    Ok(())
}

#[test]
fn test_pipeline_waits_on_every_stage() -> Result<(), ShellError> {
    let executor = Executor::new();
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_str().unwrap();

    // The first stage finishes last; its output must still land.
    let cmd = format!("sleep 1 | true | tee {}", path);
    let started = Instant::now();
    let result = executor.execute(&plan(&cmd)?)?;
    assert!(result.success());
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(fs::read_to_string(path)?, "");

    Ok(())
}
