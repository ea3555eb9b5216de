//! solc-invoker: drive a Solidity compiler over the standard JSON protocol.
//!
//! Two transports implement [`CompilerInvoker`]:
//!
//! - [`InProcessCompiler`] loads a libsolc shared library once and calls
//!   its `solidity_compile` entry point directly.
//! - [`NativeCompiler`] spawns a `solc` executable per compile, feeding the
//!   request on stdin and reading the response from stdout.
//!
//! Requests and responses are opaque JSON documents ([`CompilerInput`],
//! [`CompilerOutput`]); diagnostics are passed through untouched.

pub mod config;
pub mod document;
pub mod error;
pub mod in_process;
pub mod invoker;
pub mod native;
pub mod version;

pub use config::{CompilerConfig, CompilerMode};
pub use document::{CompilerInput, CompilerOutput};
pub use error::{CompilerError, OutputOrigin, Result};
pub use in_process::{
    CompilerModule, DylibLoader, InProcessCompiler, LibSolc, LoadedCompilerHandle, ModuleLoader,
};
pub use invoker::CompilerInvoker;
pub use native::{default_base_path_dir, NativeCompiler, DEFAULT_MAX_OUTPUT_BYTES};
pub use version::SolcVersion;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
