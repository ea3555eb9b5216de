//! libsolc shared library loading.
//!
//! The library is opened in its own symbol scope: on Unix with
//! `RTLD_NOW | RTLD_LOCAL`, so unresolved symbols fail at load time and
//! nothing it exports leaks into the global namespace other modules of
//! the host resolve against. No process-wide loader state is touched, so
//! there is nothing to restore afterwards.
//!
//! The library handle lives as long as the [`LibSolc`] value. Entry points
//! are copied out as plain function pointers and are only called while
//! that handle is alive.

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use libloading::Library;
use tracing::{debug, info};

use super::module::{CompilerModule, LoadedCompilerHandle, ModuleLoader};
use crate::error::{CompilerError, Result};

type ReadFileCallback = Option<
    unsafe extern "C" fn(
        context: *mut c_void,
        kind: *const c_char,
        data: *const c_char,
        contents: *mut *mut c_char,
        error: *mut *mut c_char,
    ),
>;
type CompileFn =
    unsafe extern "C" fn(input: *const c_char, callback: ReadFileCallback, context: *mut c_void) -> *mut c_char;
type FreeFn = unsafe extern "C" fn(data: *mut c_char);
type VersionFn = unsafe extern "C" fn() -> *const c_char;
type ResetFn = unsafe extern "C" fn();

const COMPILE_SYMBOL: &[u8] = b"solidity_compile\0";
const FREE_SYMBOL: &[u8] = b"solidity_free\0";
const VERSION_SYMBOL: &[u8] = b"solidity_version\0";
const RESET_SYMBOL: &[u8] = b"solidity_reset\0";

/// Loads libsolc builds (`libsolc.so`, `libsolc.dylib`, `solc.dll`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl ModuleLoader for DylibLoader {
    fn load(&self, path: &Path) -> Result<LoadedCompilerHandle> {
        Ok(Arc::new(LibSolc::open(path)?))
    }
}

/// A loaded libsolc.
pub struct LibSolc {
    path: PathBuf,
    compile: CompileFn,
    free: Option<FreeFn>,
    reset: Option<ResetFn>,
    version: Option<String>,
    // libsolc keeps global compiler state; one call at a time.
    call_lock: Mutex<()>,
    _library: Library,
}

impl std::fmt::Debug for LibSolc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibSolc")
            .field("path", &self.path)
            .field("version", &self.version)
            .finish()
    }
}

#[cfg(unix)]
fn open_isolated(path: &Path) -> std::result::Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};
    // SAFETY: libsolc has no load-time initializers beyond static C++ setup.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_LOCAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_isolated(path: &Path) -> std::result::Result<Library, libloading::Error> {
    // SAFETY: see the unix variant.
    unsafe { Library::new(path) }
}

/// Copy an exported function pointer out of `library`, if present.
///
/// # Safety
/// `T` must match the exported symbol's real signature.
unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Option<T> {
    library.get::<T>(name).ok().map(|sym| *sym)
}

impl LibSolc {
    /// Open the library at `path` and resolve its entry points.
    pub fn open(path: &Path) -> Result<Self> {
        info!(module = %path.display(), "loading compiler module");

        let library = open_isolated(path).map_err(|e| CompilerError::BundleLoad {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        // SAFETY: signatures follow libsolc's exported C interface.
        let compile = unsafe { symbol::<CompileFn>(&library, COMPILE_SYMBOL) }.ok_or_else(|| {
            CompilerError::MissingEntryPoint {
                path: path.to_path_buf(),
                symbol: "solidity_compile".to_string(),
            }
        })?;
        let free = unsafe { symbol::<FreeFn>(&library, FREE_SYMBOL) };
        let reset = unsafe { symbol::<ResetFn>(&library, RESET_SYMBOL) };
        let version = unsafe { symbol::<VersionFn>(&library, VERSION_SYMBOL) }.and_then(|f| {
            // SAFETY: solidity_version returns a static NUL-terminated string.
            let raw = unsafe { f() };
            (!raw.is_null()).then(|| unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
        });

        debug!(
            module = %path.display(),
            version = version.as_deref().unwrap_or("unknown"),
            has_free = free.is_some(),
            has_reset = reset.is_some(),
            "compiler module loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            compile,
            free,
            reset,
            version,
            call_lock: Mutex::new(()),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn invocation_error(&self, reason: impl Into<String>) -> CompilerError {
        CompilerError::Invocation {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl CompilerModule for LibSolc {
    fn compile(&self, input: &str) -> Result<String> {
        let request = CString::new(input)
            .map_err(|_| self.invocation_error("request contains an interior NUL byte"))?;

        let _guard = self.call_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // No read callback: every source is part of the request.
        // SAFETY: `request` outlives the call; the library is still loaded.
        let raw = unsafe { (self.compile)(request.as_ptr(), None, std::ptr::null_mut()) };
        if raw.is_null() {
            return Err(self.invocation_error("solidity_compile returned a null pointer"));
        }

        // SAFETY: libsolc returns a NUL-terminated buffer it owns until freed.
        let text = unsafe { CStr::from_ptr(raw) }.to_str().map(str::to_owned);

        if let Some(free) = self.free {
            // SAFETY: `raw` came from solidity_compile and is freed exactly once.
            unsafe { free(raw) };
        }
        if let Some(reset) = self.reset {
            // SAFETY: no outstanding pointers into compiler state remain.
            unsafe { reset() };
        }

        text.map_err(|e| self.invocation_error(format!("output is not valid UTF-8: {e}")))
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
