// This module defines the error types for cuda-scope using the thiserror crate. ArchError is
// the main error enum covering malformed arch arguments (unsupported shapes, short forms with
// no compute capability, directive lists missing the -gencode marker), scope misuse (popping
// the root scope), malformed target descriptors, registry lookups and failures of the external
// device compiler, which are wrapped unchanged. ArchResult<T> is the convenience alias used
// throughout the crate.

//! Error types for arch configuration.

use thiserror::Error;

use crate::nvcc::ToolchainError;

/// Main error type for arch parsing, scoping and dispatch.
#[derive(Error, Debug)]
pub enum ArchError {
    #[error("arch is expected to be a str, a list of str or none, but received {found}")]
    InvalidSpecType {
        found: String,
    },

    #[error("explicit arch list {entries:?} does not contain the `{marker}` directive")]
    MissingDirectiveMarker {
        entries: Vec<String>,
        marker: &'static str,
    },

    #[error("arch `{raw}` has no compute capability after `_`")]
    InvalidShortForm {
        raw: String,
    },

    #[error("the root arch scope cannot be popped")]
    RootScope,

    #[error("invalid target `{raw}`: {reason}")]
    InvalidTarget {
        raw: String,
        reason: String,
    },

    #[error("function not registered: {name}")]
    UnknownFunction {
        name: String,
    },

    #[error("{func}: {reason}")]
    InvalidArgument {
        func: String,
        reason: String,
    },

    #[error(transparent)]
    ExternalToolchain(#[from] ToolchainError),
}

impl ArchError {
    /// True for errors that indicate caller misuse rather than a runtime condition.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            ArchError::MissingDirectiveMarker { .. } | ArchError::RootScope
        )
    }
}

/// Result type alias for arch operations.
pub type ArchResult<T> = Result<T, ArchError>;
