//! Standard JSON request and response documents.
//!
//! Both sides are kept as open `serde_json::Value` trees so new compiler
//! settings or output sections pass through without code changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CompilerError, OutputOrigin, Result};

/// A standard JSON compilation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerInput(Value);

impl CompilerInput {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serialize the whole request as a single JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(CompilerError::InputSerialization)
    }
}

impl From<Value> for CompilerInput {
    fn from(document: Value) -> Self {
        Self(document)
    }
}

/// A standard JSON compilation response.
///
/// Contents are not validated against the compiler schema; diagnostics,
/// contracts and sources are whatever the compiler produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerOutput(Value);

impl CompilerOutput {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Parse compiler text into a structured document.
    pub fn parse(text: &[u8], origin: OutputOrigin) -> Result<Self> {
        serde_json::from_slice(text)
            .map(Self)
            .map_err(|source| CompilerError::OutputParse { origin, source })
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Top-level field lookup, e.g. `"errors"` or `"contracts"`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Value> for CompilerOutput {
    fn from(document: Value) -> Self {
        Self(document)
    }
}
