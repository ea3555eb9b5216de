//! Seams between the in-process compiler and whatever it loads.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// A loaded compiler exposing a synchronous standard JSON entry point.
pub trait CompilerModule: Send + Sync {
    /// Compile one serialized request and return the serialized response.
    ///
    /// Blocks for the duration of the compilation.
    fn compile(&self, input: &str) -> Result<String>;

    /// Version the module reports about itself, if it exports one.
    fn version(&self) -> Option<&str> {
        None
    }
}

/// Opens a compiler module from disk.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedCompilerHandle>;
}

/// The cached reference an in-process compiler keeps after the first load.
pub type LoadedCompilerHandle = Arc<dyn CompilerModule>;
