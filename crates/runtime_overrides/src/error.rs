//! Error types for overlay parsing and reconciliation.
//!
//! # Error Variants
//!
//! | Variant | When It Occurs |
//! |---------|----------------|
//! | [`Error::UnknownField`] | Document contains a key the registry does not expose |
//! | [`Error::TypeMismatch`] | Known key with a value of the wrong type |
//! | [`Error::Syntax`] | Document is not valid JSON/YAML/TOML |
//! | [`Error::NotAMapping`] | Document root is a list or scalar |
//! | [`Error::InvalidUtf8`] | Document bytes are not UTF-8 |
//! | [`Error::UnknownFormat`] | File extension does not name a supported format |
//! | [`Error::Io`] | Overrides file could not be read |
//! | [`Error::Log`] | Change sink failed to record a change |
//!
//! Every parse-side error means "configuration unchanged": no overlay is
//! produced and nothing is reconciled. [`Error::Log`] is the only error
//! produced after values were applied.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};

/// Errors produced while parsing overlays or reconciling them.
///
/// Integrates with [`miette`] so that a typo in an overrides file is reported
/// with the offending line highlighted:
///
/// ```text
/// runtime_overrides::unknown_field
///
///   × unknown runtime override `autoschema_enbaled`
///    ╭─[overrides.yaml:1:1]
///  1 │ autoschema_enbaled: false
///    · ─────────┬────────
///    ·          ╰── not a known override
///    ╰────
///   help: expected one of: autoschema_enabled, maximum_allowed_collections_count
/// ```
#[derive(Debug, Diagnostic, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The document contains a key that is not part of the schema.
    #[error("unknown runtime override `{key}`")]
    #[diagnostic(code(runtime_overrides::unknown_field))]
    UnknownField {
        /// The offending key, exactly as written.
        key: String,

        /// The document, for display.
        #[source_code]
        src: NamedSource<String>,

        /// Location of the key, when it could be found.
        #[label("not a known override")]
        span: Option<SourceSpan>,

        /// List of accepted keys.
        #[help]
        help: String,
    },

    /// A known key carries a value of the wrong type.
    #[error("invalid value for runtime override `{key}`: {message}")]
    #[diagnostic(code(runtime_overrides::type_mismatch))]
    TypeMismatch {
        /// The key whose value failed to convert.
        key: String,

        /// What the deserializer reported.
        message: String,

        /// The document, for display.
        #[source_code]
        src: NamedSource<String>,

        /// Location of the value, when it could be found.
        #[label("{message}")]
        span: Option<SourceSpan>,

        /// Suggestion for how to fix.
        #[help]
        help: String,
    },

    /// The document is not well-formed.
    #[error("{format} syntax error in runtime overrides: {message}")]
    #[diagnostic(code(runtime_overrides::syntax))]
    Syntax {
        /// Format name (JSON, YAML, TOML).
        format: &'static str,

        /// Description of what went wrong.
        message: String,

        /// The document, for display.
        #[source_code]
        src: NamedSource<String>,

        /// Location of the error, when the decoder reported one.
        #[label("here")]
        span: Option<SourceSpan>,

        /// Suggestion for how to fix.
        #[help]
        help: &'static str,
    },

    /// The document root is not a key/value mapping.
    #[error("runtime overrides must be a {format} mapping, found {found}")]
    #[diagnostic(
        code(runtime_overrides::not_a_mapping),
        help("write one `key: value` entry per override at the top level")
    )]
    NotAMapping {
        /// Format name.
        format: &'static str,

        /// Kind of value found at the root (e.g. "a list").
        found: &'static str,
    },

    /// The document bytes are not valid UTF-8.
    #[error("runtime overrides are not valid UTF-8")]
    #[diagnostic(
        code(runtime_overrides::invalid_utf8),
        help("save the overrides file as UTF-8 text")
    )]
    InvalidUtf8 {
        /// Underlying decoding error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// The file extension does not name a supported document format.
    #[error("unknown runtime overrides format: {}", path.display())]
    #[diagnostic(code(runtime_overrides::unknown_format))]
    UnknownFormat {
        /// Path that was given.
        path: PathBuf,

        /// Extensions this build accepts.
        #[help]
        help: String,
    },

    /// The overrides file could not be read.
    #[error("failed to read runtime overrides file: {}", path.display())]
    #[diagnostic(
        code(runtime_overrides::io),
        help("check that the file exists and is readable")
    )]
    Io {
        /// Path that was read.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A change sink failed to record a change.
    ///
    /// The new values are already applied when this is returned.
    #[error("failed to record change of runtime override `{field}`")]
    #[diagnostic(
        code(runtime_overrides::log),
        severity(Warning),
        help("the new values are active; only the audit record was lost")
    )]
    Log {
        /// Label of the field whose record was lost.
        field: String,

        /// Underlying sink error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The document key this error is about, if any.
    ///
    /// ```rust,ignore
    /// let err = parse_yaml::<Overlay>(b"autoschema_enbaled: false").unwrap_err();
    /// assert_eq!(err.key(), Some("autoschema_enbaled"));
    /// ```
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnknownField { key, .. } | Self::TypeMismatch { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Returns `true` when the error came from the sink after values were
    /// applied, i.e. the live configuration did change.
    #[must_use]
    pub const fn is_log_failure(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display_names_key() {
        let err = Error::UnknownField {
            key: "autoschema_enbaled".to_string(),
            src: NamedSource::new("overrides.yaml", String::new()),
            span: None,
            help: String::new(),
        };
        assert!(err.to_string().contains("autoschema_enbaled"));
        assert_eq!(err.key(), Some("autoschema_enbaled"));
        assert!(!err.is_log_failure());
    }

    #[test]
    fn test_log_failure() {
        let err = Error::Log {
            field: "AutoschemaEnabled".to_string(),
            source: std::io::Error::other("sink closed"),
        };
        assert!(err.is_log_failure());
        assert_eq!(err.key(), None);
        assert!(err.to_string().contains("AutoschemaEnabled"));
    }
}
