//! In-process compiler: a compiler module loaded once and called directly.
//!
//! - [`module`]: `CompilerModule` / `ModuleLoader` seams
//! - [`libsolc`]: `DylibLoader` for libsolc shared libraries

pub mod libsolc;
pub mod module;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::document::{CompilerInput, CompilerOutput};
use crate::error::{CompilerError, OutputOrigin, Result};
use crate::invoker::CompilerInvoker;

pub use libsolc::{DylibLoader, LibSolc};
pub use module::{CompilerModule, LoadedCompilerHandle, ModuleLoader};

/// A compiler module loaded lazily into this process.
///
/// The module is loaded on the first [`get_compiler`](Self::get_compiler) or
/// [`compile`](CompilerInvoker::compile) call and cached for the lifetime of
/// this value. Concurrent first calls wait on a single load. A failed load
/// is not cached.
///
/// The module's compile entry point blocks; calls run on tokio's blocking
/// pool and are serialized by the module. Use separate instances for
/// parallel compilation.
pub struct InProcessCompiler {
    path: PathBuf,
    loader: Arc<dyn ModuleLoader>,
    handle: OnceCell<LoadedCompilerHandle>,
}

impl std::fmt::Debug for InProcessCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessCompiler")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl InProcessCompiler {
    /// Compiler backed by the libsolc shared library at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_loader(path, Arc::new(DylibLoader))
    }

    /// Compiler whose module is opened by a custom loader.
    pub fn with_loader(path: impl Into<PathBuf>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
            handle: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the module has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.handle.initialized()
    }

    /// Return the loaded module, loading it on first use.
    pub async fn get_compiler(&self) -> Result<LoadedCompilerHandle> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let path = self.path.clone();
                info!(module = %self.path.display(), "loading in-process compiler");

                tokio::task::spawn_blocking(move || loader.load(&path))
                    .await
                    .map_err(|join_err| CompilerError::BundleLoad {
                        path: self.path.clone(),
                        source: Box::new(join_err),
                    })?
                    .inspect_err(|e| warn!(module = %self.path.display(), error = %e, "compiler module load failed"))
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// Version reported by the loaded module, loading it if needed.
    pub async fn version(&self) -> Result<Option<String>> {
        let module = self.get_compiler().await?;
        Ok(module.version().map(str::to_owned))
    }
}

#[async_trait]
impl CompilerInvoker for InProcessCompiler {
    async fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput> {
        let module = self.get_compiler().await?;
        let request = input.to_json_string()?;
        debug!(module = %self.path.display(), input_bytes = request.len(), "compiling in process");

        let text = tokio::task::spawn_blocking(move || module.compile(&request))
            .await
            .map_err(|join_err| CompilerError::Invocation {
                path: self.path.clone(),
                reason: format!("compile call did not complete: {join_err}"),
            })??;

        CompilerOutput::parse(text.as_bytes(), OutputOrigin::Module(self.path.clone()))
    }
}
