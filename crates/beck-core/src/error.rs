//! Error types for the foundation layer.
use thiserror::Error;

use crate::types::ScriptKind;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeError {
    #[error("unsupported script type: {0}")] UnsupportedScriptType(ScriptKind),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("backend: {0}")] Backend(String),
}
