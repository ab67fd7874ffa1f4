//! Errors returned by session commands.

use thiserror::Error;

use cloudshelf_nav::NavError;
use cloudshelf_ops::{GateError, GuardViolation};

/// A command the current state does not allow.
///
/// These never reach the banner; the session only logs them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No bucket named {0}")]
    UnknownContainer(String),

    #[error("No folder named {0} at this level")]
    UnknownFolder(String),

    #[error("No file named {0} at this level")]
    UnknownFile(String),

    #[error(transparent)]
    Nav(#[from] NavError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Guard(#[from] GuardViolation),
}
