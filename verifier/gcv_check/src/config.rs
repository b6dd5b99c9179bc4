//! Verifier configuration.
//!
//! An explicit value passed into the engine at construction; no globals.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed or unrecognized plugin flag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("unknown flag '{0}'")]
    Unknown(String),
    #[error("flag '{0}' requires a value")]
    MissingValue(String),
}

/// Behavior switches for one verifier pass.
#[derive(Clone, Debug, Default)]
pub struct VerifierOptions {
    /// Tighten field-validity rules: smart-pointer-to-managed findings
    /// become errors instead of warnings.
    pub enable_transition_mode: bool,
    /// Serialize the class/edge graph as JSON to this file.
    pub dump_graph: Option<PathBuf>,
    /// Demote raw-pointer-to-managed findings to warnings.
    pub warn_raw_ptr: bool,
    /// Enable the unneeded-finalizer advisory.
    pub warn_unneeded_finalizer: bool,
    /// Promote warnings to errors at flush time.
    pub warnings_as_errors: bool,
    /// Exact class names exempt from all checks.
    pub ignored_class_names: Vec<String>,
    /// Class-name prefixes exempt from all checks.
    pub ignored_class_prefixes: Vec<String>,
    /// Source-directory substrings exempt from all checks.
    pub ignored_directories: Vec<String>,
}

impl VerifierOptions {
    /// Parse the recognized plugin flags. Unknown flags are errors.
    pub fn from_args(args: &[String]) -> Result<Self, FlagError> {
        let mut options = VerifierOptions::default();
        for arg in args {
            let (flag, value) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (arg.as_str(), None),
            };
            match flag {
                "transition-mode" => options.enable_transition_mode = true,
                "warn-raw-ptr" => options.warn_raw_ptr = true,
                "warn-unneeded-finalizer" => options.warn_unneeded_finalizer = true,
                "warnings-as-errors" => options.warnings_as_errors = true,
                "dump-graph" => {
                    let value = require_value(flag, value)?;
                    options.dump_graph = Some(PathBuf::from(value));
                }
                "ignore-class" => {
                    options.ignored_class_names.push(require_value(flag, value)?.to_owned());
                }
                "ignore-class-prefix" => {
                    options
                        .ignored_class_prefixes
                        .push(require_value(flag, value)?.to_owned());
                }
                "ignore-dir" => {
                    options
                        .ignored_directories
                        .push(require_value(flag, value)?.to_owned());
                }
                _ => return Err(FlagError::Unknown(arg.clone())),
            }
        }
        Ok(options)
    }

    /// True when every check is suppressed for the named class.
    pub fn is_ignored_class(&self, name: &str) -> bool {
        self.ignored_class_names.iter().any(|n| n == name)
            || self
                .ignored_class_prefixes
                .iter()
                .any(|p| name.starts_with(p.as_str()))
    }

    /// True when every check is suppressed for declarations in the file.
    pub fn is_ignored_file(&self, file: &str) -> bool {
        self.ignored_directories
            .iter()
            .any(|dir| file.contains(dir.as_str()))
    }
}

fn require_value<'a>(flag: &str, value: Option<&'a str>) -> Result<&'a str, FlagError> {
    value.ok_or_else(|| FlagError::MissingValue(flag.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn parses_recognized_flags() {
        let options = VerifierOptions::from_args(&args(&[
            "transition-mode",
            "warn-raw-ptr",
            "dump-graph=graph.json",
            "ignore-class=TestSupport",
            "ignore-class-prefix=Mock",
            "ignore-dir=third_party/",
        ]))
        .unwrap();

        assert!(options.enable_transition_mode);
        assert!(options.warn_raw_ptr);
        assert_eq!(options.dump_graph.as_deref(), Some("graph.json".as_ref()));
        assert!(options.is_ignored_class("TestSupport"));
        assert!(options.is_ignored_class("MockWidget"));
        assert!(!options.is_ignored_class("Widget"));
        assert!(options.is_ignored_file("src/third_party/lib/foo.cpp"));
        assert!(!options.is_ignored_file("src/core/foo.cpp"));
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = VerifierOptions::from_args(&args(&["frobnicate"])).unwrap_err();
        assert_eq!(err, FlagError::Unknown("frobnicate".to_owned()));
    }

    #[test]
    fn rejects_flags_missing_a_value() {
        let err = VerifierOptions::from_args(&args(&["dump-graph"])).unwrap_err();
        assert_eq!(err, FlagError::MissingValue("dump-graph".to_owned()));
    }
}
