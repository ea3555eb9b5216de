//! Error taxonomy for compiler invocation.

use std::path::PathBuf;

use thiserror::Error;

/// Where a compiler response came from, for parse error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputOrigin {
    /// Text returned by a loaded compiler module.
    Module(PathBuf),
    /// Stdout captured from a native compiler process.
    Process(PathBuf),
}

impl std::fmt::Display for OutputOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputOrigin::Module(path) => write!(f, "compiler module {}", path.display()),
            OutputOrigin::Process(path) => write!(f, "native compiler {}", path.display()),
        }
    }
}

/// Errors produced while invoking a Solidity compiler.
#[derive(Error, Debug)]
pub enum CompilerError {
    /// The compiler module could not be opened.
    #[error("failed to load compiler module {path}: {source}")]
    BundleLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The module opened but does not export a required entry point.
    #[error("compiler module {path} does not export `{symbol}`")]
    MissingEntryPoint { path: PathBuf, symbol: String },

    /// The loaded module failed while compiling.
    #[error("compiler module {path} failed during compile: {reason}")]
    Invocation { path: PathBuf, reason: String },

    /// The native executable could not be started.
    #[error("cannot run native compiler {path}: {source}")]
    CannotRunNative {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The native process exited unsuccessfully.
    #[error(
        "native compiler {path} (version {}) exited with {}: {stderr}",
        .version.as_deref().unwrap_or("unknown"),
        describe_exit(.exit_code)
    )]
    NativeExecution {
        path: PathBuf,
        version: Option<String>,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The native process produced more output than the configured bound.
    #[error("native compiler {path} output exceeded {limit} bytes")]
    OutputTooLarge { path: PathBuf, limit: usize },

    /// Compiler output was not a well-formed JSON document.
    #[error("malformed output from {origin}: {source}")]
    OutputParse {
        origin: OutputOrigin,
        #[source]
        source: serde_json::Error,
    },

    /// The request document could not be serialized.
    #[error("failed to serialize compiler input: {0}")]
    InputSerialization(#[source] serde_json::Error),

    /// A version string did not parse as MAJOR.MINOR.PATCH.
    #[error("invalid compiler version: {0}")]
    InvalidVersion(String),

    /// Compiler configuration is incomplete or inconsistent.
    #[error("invalid compiler configuration: {0}")]
    Config(String),

    /// Filesystem or pipe failure around a compiler invocation.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

impl CompilerError {
    /// Whether the error means the compiler could not be run at all, as
    /// opposed to running and failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            CompilerError::BundleLoad { .. }
                | CompilerError::MissingEntryPoint { .. }
                | CompilerError::CannotRunNative { .. }
        )
    }
}

/// Result type for compiler invocation.
pub type Result<T> = std::result::Result<T, CompilerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_native_execution_display_includes_context() {
        let err = CompilerError::NativeExecution {
            path: PathBuf::from("/opt/solc"),
            version: Some("0.8.24".to_string()),
            exit_code: Some(1),
            stderr: "Invalid option".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/opt/solc"));
        assert!(msg.contains("0.8.24"));
        assert!(msg.contains("code 1"));
        assert!(msg.contains("Invalid option"));
    }

    #[test]
    fn test_native_execution_without_version_or_code() {
        let err = CompilerError::NativeExecution {
            path: PathBuf::from("solc"),
            version: None,
            exit_code: None,
            stderr: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unknown"));
        assert!(msg.contains("a signal"));
    }

    #[test]
    fn test_cannot_run_native_keeps_io_source() {
        let err = CompilerError::CannotRunNative {
            path: PathBuf::from("/missing/solc"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.is_unavailable());
        let source = err.source().expect("source attached");
        let io = source
            .downcast_ref::<std::io::Error>()
            .expect("io error source");
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_output_parse_names_origin() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CompilerError::OutputParse {
            origin: OutputOrigin::Process(PathBuf::from("/usr/bin/solc")),
            source,
        };
        assert!(err.to_string().contains("native compiler /usr/bin/solc"));
        assert!(!err.is_unavailable());
    }
}
