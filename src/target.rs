// This module provides a minimal target descriptor. A target string has the form
// "cuda -arch=sm_80 -max_num_threads=1024": a kind followed by -key=value attributes. Only the
// arch attribute matters to this crate, where an explicit target overrides the scoped arch
// configuration when resolving which architecture to report.

//! Target descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::{ArchError, ArchResult};

/// A parsed target such as `cuda -arch=sm_80`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    kind: String,
    attrs: BTreeMap<String, String>,
}

impl Target {
    /// Parse a target string.
    pub fn parse(raw: &str) -> ArchResult<Self> {
        let invalid = |reason: String| ArchError::InvalidTarget {
            raw: raw.to_string(),
            reason,
        };

        let mut tokens = raw.split_whitespace();
        let kind = tokens
            .next()
            .ok_or_else(|| invalid("empty target".to_string()))?;
        if kind.starts_with('-') {
            return Err(invalid(format!("expected a target kind, found `{kind}`")));
        }

        let mut attrs = BTreeMap::new();
        for token in tokens {
            let attr = token
                .strip_prefix('-')
                .ok_or_else(|| invalid(format!("attribute `{token}` must start with `-`")))?;
            let (key, value) = attr
                .split_once('=')
                .ok_or_else(|| invalid(format!("attribute `{token}` has no value")))?;
            if key.is_empty() {
                return Err(invalid(format!("attribute `{token}` has no name")));
            }
            attrs.insert(key.to_string(), value.to_string());
        }

        Ok(Self {
            kind: kind.to_string(),
            attrs,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// The `arch` attribute, if the target carries one.
    pub fn arch(&self) -> Option<&str> {
        self.attr("arch")
    }
}

impl FromStr for Target {
    type Err = ArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (key, value) in &self.attrs {
            write!(f, " -{}={}", key, value)?;
        }
        Ok(())
    }
}
