// This module turns raw user arch arguments into canonical ArchSpec values. A short form such
// as "sm_75" is either expanded into a one-architecture -gencode pair or kept verbatim as the
// nvcc -arch value, depending on the gencode switch. Explicit lists are copied and must carry
// the -gencode marker. The parser is pure: it never looks at or changes scope state.

//! Arch argument parsing and validation.

use super::error::{ArchError, ArchResult};
use super::spec::{ArchSpec, ArchValue, GencodeList};

/// Separator between the arch family prefix and the compute capability (`sm_75`).
const VERSION_SEPARATOR: char = '_';

/// Normalizes raw arch arguments into [`ArchSpec`].
pub struct ArchSpecParser;

impl ArchSpecParser {
    /// Parse `raw`, expanding string short forms into a gencode pair when
    /// `gencode` is set.
    pub fn parse(raw: ArchValue, gencode: bool) -> ArchResult<ArchSpec> {
        match raw {
            ArchValue::None => Ok(ArchSpec::Unset),
            ArchValue::Str(code) if gencode => {
                let version = Self::compute_version(&code)?;
                Ok(ArchSpec::GencodeList(GencodeList::for_compute_capability(version)))
            }
            ArchValue::Str(code) => Ok(ArchSpec::Single(code)),
            ArchValue::List(entries) => Ok(ArchSpec::GencodeList(GencodeList::new(entries)?)),
        }
    }

    /// Extract the compute capability from a short form: `sm_75` -> `75`.
    ///
    /// Only the segment directly after the first separator is used, so
    /// `sm_90a` yields `90a`.
    pub fn compute_version(code: &str) -> ArchResult<&str> {
        match code.split(VERSION_SEPARATOR).nth(1) {
            Some(version) if !version.is_empty() => Ok(version),
            _ => Err(ArchError::InvalidShortForm {
                raw: code.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_none_is_unset() {
        assert_eq!(ArchSpecParser::parse(ArchValue::None, true).unwrap(), ArchSpec::Unset);
        assert_eq!(ArchSpecParser::parse(ArchValue::None, false).unwrap(), ArchSpec::Unset);
    }

    #[test]
    fn test_short_form_expansion() {
        let spec = ArchSpecParser::parse("sm_75".into(), true).unwrap();
        assert_eq!(
            spec.to_value(),
            ArchValue::List(strings(&["-gencode", "arch=compute_75,code=sm_75"]))
        );
    }

    #[test]
    fn test_short_form_passthrough() {
        let spec = ArchSpecParser::parse("sm_75".into(), false).unwrap();
        assert_eq!(spec, ArchSpec::Single("sm_75".to_string()));

        // No validation of the passthrough content.
        let spec = ArchSpecParser::parse("whatever".into(), false).unwrap();
        assert_eq!(spec, ArchSpec::Single("whatever".to_string()));
    }

    #[test]
    fn test_short_form_variants() {
        assert_eq!(ArchSpecParser::compute_version("sm_90a").unwrap(), "90a");
        assert_eq!(ArchSpecParser::compute_version("compute_80").unwrap(), "80");
        assert_eq!(ArchSpecParser::compute_version("sm_86_extra").unwrap(), "86");
    }

    #[test]
    fn test_short_form_without_version() {
        for raw in ["sm75", "sm_", ""] {
            let err = ArchSpecParser::parse(raw.into(), true).unwrap_err();
            assert!(matches!(err, ArchError::InvalidShortForm { .. }), "{raw}");
        }
    }

    #[test]
    fn test_explicit_list() {
        let entries = strings(&[
            "-gencode",
            "arch=compute_52,code=sm_52",
            "-gencode",
            "arch=compute_70,code=sm_70",
        ]);
        let spec = ArchSpecParser::parse(ArchValue::List(entries.clone()), true).unwrap();
        assert_eq!(spec.to_value(), ArchValue::List(entries.clone()));

        // The gencode switch only affects strings.
        let spec = ArchSpecParser::parse(ArchValue::List(entries.clone()), false).unwrap();
        assert_eq!(spec.to_value(), ArchValue::List(entries));
    }

    #[test]
    fn test_explicit_list_missing_marker() {
        let err = ArchSpecParser::parse(
            ArchValue::List(strings(&["arch=compute_75,code=sm_75"])),
            true,
        )
        .unwrap_err();
        assert!(err.is_misuse());
        assert!(matches!(err, ArchError::MissingDirectiveMarker { .. }));

        let err = ArchSpecParser::parse(ArchValue::List(Vec::new()), true).unwrap_err();
        assert!(matches!(err, ArchError::MissingDirectiveMarker { .. }));
    }
}
