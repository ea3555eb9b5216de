//! The contract shared by every compiler transport.

use async_trait::async_trait;

use crate::document::{CompilerInput, CompilerOutput};
use crate::error::Result;

/// Something that turns a standard JSON request into a standard JSON response.
///
/// Implementations own their transport (loaded module or spawned process)
/// and surface every failure as a [`crate::CompilerError`]; nothing is retried.
#[async_trait]
pub trait CompilerInvoker: Send + Sync {
    /// Compile one request.
    async fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput>;
}

#[async_trait]
impl<T: CompilerInvoker + ?Sized> CompilerInvoker for Box<T> {
    async fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput> {
        (**self).compile(input).await
    }
}

#[async_trait]
impl<T: CompilerInvoker + ?Sized> CompilerInvoker for std::sync::Arc<T> {
    async fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput> {
        (**self).compile(input).await
    }
}
