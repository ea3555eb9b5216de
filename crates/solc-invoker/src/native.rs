//! Native solc executable driven over stdin/stdout.
//!
//! Invocation: `<solc> --standard-json [--no-import-callback | --base-path <dir>]`.
//! The request is written to stdin, stdin is closed, and stdout is collected
//! into one bounded buffer once the process exits.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::document::{CompilerInput, CompilerOutput};
use crate::error::{CompilerError, OutputOrigin, Result};
use crate::invoker::CompilerInvoker;
use crate::version::SolcVersion;

/// Upper bound on captured stdout (500 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 500 * 1024 * 1024;

/// Stderr kept for error reports; the rest is drained and dropped.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// First release with `--no-import-callback`.
const NO_IMPORT_CALLBACK_SINCE: SolcVersion = SolcVersion::new(0, 8, 22);

/// First release where `--base-path` disables the filesystem import callback.
const BASE_PATH_SINCE: SolcVersion = SolcVersion::new(0, 6, 9);

/// Directory handed to `--base-path` when no override is configured.
pub fn default_base_path_dir() -> PathBuf {
    std::env::temp_dir().join("solc-invoker")
}

/// A solc executable invoked once per compile.
#[derive(Debug, Clone)]
pub struct NativeCompiler {
    path: PathBuf,
    version: Option<SolcVersion>,
    max_output_bytes: usize,
    base_path_dir: PathBuf,
}

impl NativeCompiler {
    /// Create a compiler for the executable at `path`.
    ///
    /// `version` selects version-specific flags; an unknown version adds none.
    pub fn new(path: impl Into<PathBuf>, version: Option<&str>) -> Result<Self> {
        let version = version.map(str::parse::<SolcVersion>).transpose()?;
        Ok(Self {
            path: path.into(),
            version,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            base_path_dir: default_base_path_dir(),
        })
    }

    /// Override the captured-output bound.
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Override the directory passed as `--base-path`.
    pub fn with_base_path_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_path_dir = dir.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Option<&SolcVersion> {
        self.version.as_ref()
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Build the argument list for this compiler's version.
    ///
    /// For the base-path range this creates the directory (and parents) if it
    /// does not exist yet.
    pub async fn command_args(&self) -> Result<Vec<OsString>> {
        let mut args = vec![OsString::from("--standard-json")];

        let Some(version) = &self.version else {
            return Ok(args);
        };

        if *version >= NO_IMPORT_CALLBACK_SINCE {
            args.push("--no-import-callback".into());
        } else if *version >= BASE_PATH_SINCE {
            tokio::fs::create_dir_all(&self.base_path_dir)
                .await
                .map_err(|source| CompilerError::Io {
                    path: self.base_path_dir.clone(),
                    source,
                })?;
            args.push("--base-path".into());
            args.push(self.base_path_dir.clone().into_os_string());
        } else {
            debug!(
                version = %version,
                "solc predates import callback suppression, passing no extra flags"
            );
        }

        Ok(args)
    }

    fn version_label(&self) -> Option<String> {
        self.version.as_ref().map(ToString::to_string)
    }

    /// Spawn the compiler, feed it `payload`, and return its stdout.
    async fn run(&self, payload: Vec<u8>) -> Result<Vec<u8>> {
        let args = self.command_args().await?;
        info!(
            compiler = %self.path.display(),
            version = self.version_label().as_deref().unwrap_or("unknown"),
            input_bytes = payload.len(),
            "spawning native compiler"
        );
        debug!(?args, "native compiler arguments");

        let mut child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                warn!(compiler = %self.path.display(), error = %source, "cannot start native compiler");
                CompilerError::CannotRunNative {
                    path: self.path.clone(),
                    source,
                }
            })?;

        let (Some(mut stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(CompilerError::CannotRunNative {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "child stdio not captured"),
            });
        };

        let limit = self.max_output_bytes;
        let child_ref = &mut child;

        // All three pipes are serviced together so neither side stalls on a
        // full pipe buffer.
        let write_input = async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        };
        let read_output = async move {
            let captured = read_bounded(stdout, limit).await;
            if matches!(captured, Ok(None)) {
                let _ = child_ref.start_kill();
            }
            captured
        };
        let read_diagnostics = read_truncated(stderr, MAX_STDERR_BYTES);

        let (written, captured, stderr) = tokio::join!(write_input, read_output, read_diagnostics);

        let status = child.wait().await.map_err(|source| CompilerError::Io {
            path: self.path.clone(),
            source,
        })?;

        let captured = captured.map_err(|source| CompilerError::Io {
            path: self.path.clone(),
            source,
        })?;
        let Some(stdout) = captured else {
            warn!(compiler = %self.path.display(), limit, "native compiler output exceeded bound");
            return Err(CompilerError::OutputTooLarge {
                path: self.path.clone(),
                limit,
            });
        };

        if !status.success() {
            let stderr = stderr
                .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
                .unwrap_or_default();
            warn!(
                compiler = %self.path.display(),
                exit_code = ?status.code(),
                "native compiler failed"
            );
            return Err(CompilerError::NativeExecution {
                path: self.path.clone(),
                version: self.version_label(),
                exit_code: status.code(),
                stderr,
            });
        }

        // A successful exit after a failed write means the compiler saw a
        // truncated request; its output cannot be trusted.
        written.map_err(|source| CompilerError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(output_bytes = stdout.len(), "native compiler finished");
        Ok(stdout)
    }
}

/// Read to EOF, or `None` as soon as more than `limit` bytes arrive.
async fn read_bounded<R: AsyncRead + Unpin>(reader: R, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .await?;
    if buf.len() > limit {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}

/// Read to EOF keeping only the first `keep` bytes.
async fn read_truncated<R: AsyncRead + Unpin>(mut reader: R, keep: usize) -> io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(kept);
        }
        let room = keep.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
}

#[async_trait]
impl CompilerInvoker for NativeCompiler {
    async fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput> {
        let payload = input.to_json_string()?;
        let stdout = self.run(payload.into_bytes()).await?;
        CompilerOutput::parse(&stdout, OutputOrigin::Process(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn compiler(version: Option<&str>, base: &Path) -> NativeCompiler {
        NativeCompiler::new("/usr/local/bin/solc", version)
            .unwrap()
            .with_base_path_dir(base.join("nested").join("solc-base"))
    }

    fn has(args: &[OsString], flag: &str) -> bool {
        args.iter().any(|a| a == flag)
    }

    #[tokio::test]
    async fn test_args_0_8_22_disable_import_callback() {
        let dir = tempdir().unwrap();
        let args = compiler(Some("0.8.22"), dir.path()).command_args().await.unwrap();
        assert_eq!(args[0], "--standard-json");
        assert!(has(&args, "--no-import-callback"));
        assert!(!has(&args, "--base-path"));
        assert!(!dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_args_0_7_0_use_base_path() {
        let dir = tempdir().unwrap();
        let args = compiler(Some("0.7.0"), dir.path()).command_args().await.unwrap();
        assert!(!has(&args, "--no-import-callback"));

        let pos = args.iter().position(|a| a == "--base-path").expect("base path flag");
        let base = PathBuf::from(&args[pos + 1]);
        assert!(base.is_dir());
        assert_eq!(base, dir.path().join("nested").join("solc-base"));
    }

    #[tokio::test]
    async fn test_base_path_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let solc = compiler(Some("0.8.21"), dir.path());
        let first = solc.command_args().await.unwrap();
        let second = solc.command_args().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_args_old_or_unknown_version_are_minimal() {
        let dir = tempdir().unwrap();
        for version in [Some("0.5.0"), Some("0.6.8"), None] {
            let args = compiler(version, dir.path()).command_args().await.unwrap();
            assert_eq!(args, vec![OsString::from("--standard-json")], "{version:?}");
        }
    }

    #[tokio::test]
    async fn test_gate_boundaries() {
        let dir = tempdir().unwrap();
        let at_base = compiler(Some("0.6.9"), dir.path()).command_args().await.unwrap();
        assert!(has(&at_base, "--base-path"));

        // A 0.8.22 nightly predates the 0.8.22 release.
        let nightly = compiler(Some("0.8.22-nightly.2023.10.1+commit.aaaa"), dir.path())
            .command_args()
            .await
            .unwrap();
        assert!(has(&nightly, "--base-path"));

        let release = compiler(Some("0.8.22+commit.4fc1097e"), dir.path())
            .command_args()
            .await
            .unwrap();
        assert!(has(&release, "--no-import-callback"));
    }

    #[test]
    fn test_new_rejects_malformed_version() {
        let err = NativeCompiler::new("solc", Some("0.8")).unwrap_err();
        assert!(matches!(err, CompilerError::InvalidVersion(v) if v == "0.8"));
    }

    #[test]
    fn test_defaults() {
        let solc = NativeCompiler::new("solc", None).unwrap();
        assert_eq!(solc.max_output_bytes(), 500 * 1024 * 1024);
        assert!(solc.version().is_none());
        assert_eq!(solc.path(), Path::new("solc"));
    }

    #[tokio::test]
    async fn test_read_bounded_detects_overflow() {
        let data: &[u8] = b"0123456789";
        assert_eq!(read_bounded(data, 10).await.unwrap(), Some(data.to_vec()));
        assert_eq!(read_bounded(data, 9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_truncated_keeps_prefix() {
        let data = vec![b'x'; 20_000];
        let kept = read_truncated(&data[..], 100).await.unwrap();
        assert_eq!(kept.len(), 100);
    }
}
