// This module defines the canonical arch representation. ArchSpec is the tagged variant kept
// in scopes: Unset, a single nvcc -arch short form, or a GencodeList of explicit directive
// tokens. GencodeList can only be built through its validating constructor, so every list
// stored anywhere in the crate is known to carry the -gencode marker. ArchValue is the
// external-facing shape (none, a string, or a list of strings) used both as the raw input to
// the parser and as the value handed back to callers and to the device compiler.

//! Canonical arch specifications and their external shape.

use std::fmt;

use super::error::{ArchError, ArchResult};

/// The nvcc flag that introduces a virtual/real architecture pair.
pub const GENCODE_FLAG: &str = "-gencode";

/// Explicit nvcc directive tokens, guaranteed to contain [`GENCODE_FLAG`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GencodeList(Vec<String>);

impl GencodeList {
    /// Validate and wrap a list of directive tokens.
    pub fn new(entries: Vec<String>) -> ArchResult<Self> {
        if !entries.iter().any(|e| e == GENCODE_FLAG) {
            return Err(ArchError::MissingDirectiveMarker {
                entries,
                marker: GENCODE_FLAG,
            });
        }
        Ok(Self(entries))
    }

    /// Build the two-token list for a single compute capability.
    pub fn for_compute_capability(version: &str) -> Self {
        Self(vec![
            GENCODE_FLAG.to_string(),
            format!("arch=compute_{version},code=sm_{version}"),
        ])
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<String> {
        self.0
    }
}

/// The active arch configuration of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArchSpec {
    /// No architecture configured; nvcc picks its default.
    #[default]
    Unset,
    /// Raw nvcc `-arch` value such as `sm_75`.
    Single(String),
    /// Explicit directive list for a multi-architecture build.
    GencodeList(GencodeList),
}

impl ArchSpec {
    pub fn is_unset(&self) -> bool {
        matches!(self, ArchSpec::Unset)
    }

    /// Translate to the shape handed to callers.
    pub fn to_value(&self) -> ArchValue {
        match self {
            ArchSpec::Unset => ArchValue::None,
            ArchSpec::Single(code) => ArchValue::Str(code.clone()),
            ArchSpec::GencodeList(list) => ArchValue::List(list.entries().to_vec()),
        }
    }
}

impl fmt::Display for ArchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// External shape of an arch value: none, a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArchValue {
    #[default]
    None,
    Str(String),
    List(Vec<String>),
}

impl ArchValue {
    pub fn is_list(&self) -> bool {
        matches!(self, ArchValue::List(_))
    }

    /// Short name of the shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            ArchValue::None => "none",
            ArchValue::Str(_) => "str",
            ArchValue::List(_) => "list",
        }
    }
}

impl From<&str> for ArchValue {
    fn from(s: &str) -> Self {
        ArchValue::Str(s.to_string())
    }
}

impl From<String> for ArchValue {
    fn from(s: String) -> Self {
        ArchValue::Str(s)
    }
}

impl From<Vec<String>> for ArchValue {
    fn from(entries: Vec<String>) -> Self {
        ArchValue::List(entries)
    }
}

impl From<&[&str]> for ArchValue {
    fn from(entries: &[&str]) -> Self {
        ArchValue::List(entries.iter().map(|e| e.to_string()).collect())
    }
}

impl<T: Into<ArchValue>> From<Option<T>> for ArchValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArchValue::None, Into::into)
    }
}

impl fmt::Display for ArchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchValue::None => write!(f, "none"),
            ArchValue::Str(s) => write!(f, "{}", s),
            ArchValue::List(entries) => write!(f, "[{}]", entries.join(", ")),
        }
    }
}
