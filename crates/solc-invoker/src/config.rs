//! Compiler selection and construction.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CompilerError, Result};
use crate::in_process::InProcessCompiler;
use crate::invoker::CompilerInvoker;
use crate::native::{NativeCompiler, DEFAULT_MAX_OUTPUT_BYTES};

/// How the compiler is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompilerMode {
    /// Executable spawned once per compile.
    #[default]
    Native,
    /// Shared library loaded into this process.
    InProcess,
}

impl std::str::FromStr for CompilerMode {
    type Err = CompilerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(CompilerMode::Native),
            "in_process" | "in-process" | "inprocess" => Ok(CompilerMode::InProcess),
            other => Err(CompilerError::Config(format!("unknown compiler mode `{other}`"))),
        }
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Delivery mode.
    #[serde(default)]
    pub mode: CompilerMode,
    /// Executable (native) or shared library (in-process).
    pub path: PathBuf,
    /// Compiler version, used by the native mode to select flags.
    #[serde(default)]
    pub version: Option<String>,
    /// Captured stdout bound for the native mode.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Directory passed as `--base-path` (native mode, 0.6.9 to 0.8.21).
    #[serde(default)]
    pub base_path_dir: Option<PathBuf>,
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            mode: CompilerMode::Native,
            path: PathBuf::from("solc"),
            version: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            base_path_dir: None,
        }
    }
}

impl CompilerConfig {
    /// Native executable at `path`.
    pub fn native(path: impl Into<PathBuf>) -> Self {
        CompilerConfig {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Shared library at `path` loaded in process.
    pub fn in_process(path: impl Into<PathBuf>) -> Self {
        CompilerConfig {
            mode: CompilerMode::InProcess,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Read `SOLC_PATH`, `SOLC_MODE`, `SOLC_VERSION`,
    /// `SOLC_MAX_OUTPUT_BYTES` and `SOLC_BASE_PATH_DIR`; unset values keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = lookup("SOLC_PATH") {
            config.path = PathBuf::from(path);
        }
        if let Some(mode) = lookup("SOLC_MODE") {
            config.mode = mode.parse()?;
        }
        config.version = lookup("SOLC_VERSION").filter(|v| !v.trim().is_empty());
        if let Some(limit) = lookup("SOLC_MAX_OUTPUT_BYTES") {
            config.max_output_bytes = limit.trim().parse().map_err(|_| {
                CompilerError::Config(format!("SOLC_MAX_OUTPUT_BYTES is not a byte count: {limit}"))
            })?;
        }
        config.base_path_dir = lookup("SOLC_BASE_PATH_DIR").map(PathBuf::from);
        Ok(config)
    }

    /// Set the compiler version.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Set the captured stdout bound.
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Build the configured compiler.
    pub fn build_invoker(&self) -> Result<Arc<dyn CompilerInvoker>> {
        if self.path.as_os_str().is_empty() {
            return Err(CompilerError::Config("compiler path is empty".to_string()));
        }
        if self.max_output_bytes == 0 {
            return Err(CompilerError::Config(
                "max_output_bytes must be greater than zero".to_string(),
            ));
        }

        info!(
            mode = ?self.mode,
            path = %self.path.display(),
            version = self.version.as_deref().unwrap_or("unknown"),
            "configuring solidity compiler"
        );

        match self.mode {
            CompilerMode::Native => {
                let mut compiler = NativeCompiler::new(&self.path, self.version.as_deref())?
                    .with_max_output_bytes(self.max_output_bytes);
                if let Some(dir) = &self.base_path_dir {
                    compiler = compiler.with_base_path_dir(dir);
                }
                Ok(Arc::new(compiler))
            }
            CompilerMode::InProcess => Ok(Arc::new(InProcessCompiler::new(&self.path))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let cfg = CompilerConfig::default();
        assert_eq!(cfg.mode, CompilerMode::Native);
        assert_eq!(cfg.path, PathBuf::from("solc"));
        assert_eq!(cfg.max_output_bytes, 500 * 1024 * 1024);
        assert!(cfg.version.is_none());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let cfg = CompilerConfig::from_lookup(lookup(&[
            ("SOLC_PATH", "/opt/solc/libsolc.so"),
            ("SOLC_MODE", "in-process"),
            ("SOLC_VERSION", "0.8.24"),
            ("SOLC_MAX_OUTPUT_BYTES", "1024"),
            ("SOLC_BASE_PATH_DIR", "/tmp/solc-base"),
        ]))
        .unwrap();
        assert_eq!(cfg.mode, CompilerMode::InProcess);
        assert_eq!(cfg.path, PathBuf::from("/opt/solc/libsolc.so"));
        assert_eq!(cfg.version.as_deref(), Some("0.8.24"));
        assert_eq!(cfg.max_output_bytes, 1024);
        assert_eq!(cfg.base_path_dir, Some(PathBuf::from("/tmp/solc-base")));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = CompilerConfig::from_lookup(lookup(&[("SOLC_MODE", "wasm")])).unwrap_err();
        assert!(err.to_string().contains("wasm"));

        let err =
            CompilerConfig::from_lookup(lookup(&[("SOLC_MAX_OUTPUT_BYTES", "lots")])).unwrap_err();
        assert!(matches!(err, CompilerError::Config(_)));
    }

    #[test]
    fn test_blank_version_is_unknown() {
        let cfg = CompilerConfig::from_lookup(lookup(&[("SOLC_VERSION", "  ")])).unwrap();
        assert!(cfg.version.is_none());
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let cfg: CompilerConfig = serde_json::from_str(r#"{"path": "/usr/bin/solc"}"#).unwrap();
        assert_eq!(cfg, CompilerConfig::native("/usr/bin/solc"));

        let cfg: CompilerConfig =
            serde_json::from_str(r#"{"mode": "in_process", "path": "libsolc.so"}"#).unwrap();
        assert_eq!(cfg.mode, CompilerMode::InProcess);
    }

    #[test]
    fn test_build_invoker_validates() {
        assert!(CompilerConfig::native("").build_invoker().is_err());
        assert!(CompilerConfig::native("solc")
            .with_max_output_bytes(0)
            .build_invoker()
            .is_err());
        assert!(matches!(
            CompilerConfig::native("solc").with_version("eight").build_invoker(),
            Err(CompilerError::InvalidVersion(_))
        ));
        assert!(CompilerConfig::native("solc")
            .with_version("0.8.24")
            .build_invoker()
            .is_ok());
        // Loading is deferred until the first compile.
        assert!(CompilerConfig::in_process("/nonexistent/libsolc.so")
            .build_invoker()
            .is_ok());
    }
}
