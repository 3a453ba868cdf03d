//! Helpers for running external tools (python, ffmpeg, ffprobe).

use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::StageError;

/// Runs `program` to completion, killing it if `cancel` fires first.
///
/// Non-zero exit codes become [`StageError::ProcessFailed`] with stderr attached.
pub(crate) async fn run<I, S>(
    program: &Path,
    args: I,
    cancel: &CancellationToken,
) -> Result<Output, StageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StageError::ExecutableNotFound {
                    path: program.to_path_buf(),
                }
            } else {
                StageError::Io(e)
            }
        })?;

    debug!(program = %program.display(), "Spawned external process");

    // Dropping the wait future drops the child, which kills it.
    let output = tokio::select! {
        output = child.wait_with_output() => output?,
        _ = cancel.cancelled() => return Err(StageError::Cancelled),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(StageError::process_failed(
            format!(
                "{} exited with code: {:?}",
                program.display(),
                output.status.code()
            ),
            if stderr.is_empty() { None } else { Some(stderr) },
        ));
    }

    Ok(output)
}

/// Reads the container duration of a media file with ffprobe.
pub(crate) async fn probe_duration(
    ffprobe: &Path,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<f64, StageError> {
    let args = [
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new("-show_format"),
        path.as_os_str(),
    ];
    let output = run(ffprobe, args, cancel).await?;
    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(json: &str) -> Result<f64, StageError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(json).map_err(|e| {
        StageError::InvalidResponse(format!("Failed to parse ffprobe output: {}", e))
    })?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| StageError::InvalidResponse("ffprobe reported no duration".to_string()))
}

/// Fails with [`StageError::OutputMissing`] unless `path` exists.
pub(crate) async fn ensure_output(path: &Path) -> Result<(), StageError> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(StageError::OutputMissing {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_duration() {
        let json = r#"{"format": {"filename": "a.wav", "duration": "5.000000"}}"#;
        assert_eq!(parse_duration(json).unwrap(), 5.0);
    }

    #[test]
    fn test_parse_duration_missing() {
        let json = r#"{"format": {"filename": "a.wav"}}"#;
        assert!(parse_duration(json).is_err());
        assert!(parse_duration("not json").is_err());
    }

    #[tokio::test]
    async fn test_run_missing_executable() {
        let cancel = CancellationToken::new();
        let result = run(
            &PathBuf::from("/nonexistent/definitely-not-a-binary"),
            ["--version"],
            &cancel,
        )
        .await;
        assert!(matches!(result, Err(StageError::ExecutableNotFound { .. })));
    }

    #[tokio::test]
    async fn test_ensure_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.mp4");
        assert!(matches!(
            ensure_output(&path).await,
            Err(StageError::OutputMissing { .. })
        ));
        std::fs::write(&path, b"x").unwrap();
        assert!(ensure_output(&path).await.is_ok());
    }
}
