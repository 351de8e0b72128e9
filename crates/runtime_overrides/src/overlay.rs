//! Strict overlay parsing.
//!
//! An overlay is the sparse set of values found in one overrides document.
//! Presence matters: a key that is absent means "revert to the default", so
//! an overlay is never merged with defaults while parsing.
//!
//! Parsing runs in two phases:
//!
//! 1. The document is decoded into a [`serde_json::Value`] tree with the
//!    decoder for its format, and every root key is checked against the
//!    schema. The first unknown key fails the whole parse.
//! 2. The tree is deserialized into the overlay struct through
//!    [`serde_path_to_error`], so a type mismatch names the offending key.
//!
//! Either way no partial overlay is returned.

use std::path::Path;

use miette::{NamedSource, SourceSpan};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::format::DocumentFormat;
use crate::value::OverrideValue;

/// Name shown in diagnostics for documents parsed from memory.
const INLINE_SOURCE: &str = "runtime overrides";

/// A parsed overrides document.
///
/// Implemented by the struct `#[derive(RuntimeOverrides)]` generates next to
/// each registry. Every field is an `Option`; `None` means the key was absent.
pub trait Overlay: Serialize + DeserializeOwned + Default {
    /// Canonical lower_snake_case keys, in declared order.
    const FIELD_NAMES: &'static [&'static str];

    /// Keys present in this overlay, in declared order.
    fn present_keys(&self) -> Vec<&'static str>;

    /// Returns `true` if no key is present.
    fn is_empty(&self) -> bool {
        self.present_keys().is_empty()
    }
}

/// Serde adapter for overlay fields, used through
/// `#[serde(with = "::runtime_overrides::overlay::field")]`.
///
/// Routes each value through its [`OverrideValue`] hooks so durations are
/// read as `10s` rather than as a struct. An explicit `null` reads as absent.
pub mod field {
    use super::{Deserialize, Deserializer, OverrideValue, Serialize, Serializer};

    struct Wire<T>(T);

    impl<'de, T: OverrideValue> Deserialize<'de> for Wire<T> {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            T::deserialize_value(deserializer).map(Wire)
        }
    }

    struct WireRef<'a, T>(&'a T);

    impl<T: OverrideValue> Serialize for WireRef<'_, T> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.0.serialize_value(serializer)
        }
    }

    /// Serialize an optional overlay value.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    #[allow(clippy::ref_option, reason = "signature required by serde(with)")]
    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: OverrideValue,
        S: Serializer,
    {
        value.as_ref().map(WireRef).serialize(serializer)
    }

    /// Deserialize an optional overlay value.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error when the value has the wrong type.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: OverrideValue,
        D: Deserializer<'de>,
    {
        Ok(Option::<Wire<T>>::deserialize(deserializer)?.map(|wire| wire.0))
    }
}

/// Parse an overlay from a document buffer.
///
/// # Errors
///
/// - [`Error::InvalidUtf8`] if `buf` is not UTF-8
/// - [`Error::Syntax`] if the document is malformed
/// - [`Error::NotAMapping`] if the root is not a mapping
/// - [`Error::UnknownField`] naming the first key the schema does not know
/// - [`Error::TypeMismatch`] naming the first key whose value has the wrong type
///
/// # Example
///
/// ```rust,ignore
/// let overlay: ServerRuntimeConfigOverlay =
///     parse_overlay(b"autoschema_enabled: true", DocumentFormat::Yaml)?;
/// assert_eq!(overlay.autoschema_enabled, Some(true));
/// ```
pub fn parse_overlay<O: Overlay>(buf: &[u8], format: DocumentFormat) -> Result<O, Error> {
    parse_named(INLINE_SOURCE, buf, format)
}

/// Parse an overlay from a JSON buffer.
///
/// # Errors
///
/// See [`parse_overlay`].
pub fn parse_json<O: Overlay>(buf: &[u8]) -> Result<O, Error> {
    parse_overlay(buf, DocumentFormat::Json)
}

/// Parse an overlay from a YAML buffer.
///
/// # Errors
///
/// See [`parse_overlay`].
#[cfg(feature = "yaml")]
pub fn parse_yaml<O: Overlay>(buf: &[u8]) -> Result<O, Error> {
    parse_overlay(buf, DocumentFormat::Yaml)
}

/// Read and parse an overrides file, detecting the format from its extension.
///
/// # Errors
///
/// [`Error::UnknownFormat`] for an unsupported extension, [`Error::Io`] if
/// the file cannot be read, otherwise see [`parse_overlay`].
pub fn load_overlay<O: Overlay>(path: impl AsRef<Path>) -> Result<O, Error> {
    let path = path.as_ref();

    let format = DocumentFormat::from_path(path).ok_or_else(|| Error::UnknownFormat {
        path: path.to_path_buf(),
        help: format!(
            "supported extensions: {}",
            DocumentFormat::supported_extensions()
        ),
    })?;

    let buf = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_named(&path.display().to_string(), &buf, format)
}

pub(crate) fn parse_named<O: Overlay>(
    name: &str,
    buf: &[u8],
    format: DocumentFormat,
) -> Result<O, Error> {
    let content = std::str::from_utf8(buf).map_err(|source| Error::InvalidUtf8 { source })?;

    let mut map = if content.trim().is_empty() {
        Map::new()
    } else {
        match decode(name, content, format)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::NotAMapping {
                    format: format.name(),
                    found: value_kind(&other),
                });
            }
        }
    };

    if let Some(key) = map.keys().find(|k| !O::FIELD_NAMES.contains(&k.as_str())) {
        return Err(Error::UnknownField {
            key: key.clone(),
            span: locate_key(content, key, format),
            src: NamedSource::new(name, content.to_string()),
            help: format!("expected one of: {}", O::FIELD_NAMES.join(", ")),
        });
    }

    map.retain(|_, v| !v.is_null());

    let overlay: O = if map.is_empty() {
        O::default()
    } else {
        deserialize_typed(name, content, format, map)?
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        source = name,
        format = format.name(),
        keys = ?overlay.present_keys(),
        "parsed runtime overrides"
    );

    Ok(overlay)
}

/// Second phase: deserialize the overlay with its real field types.
///
/// YAML is read again from `content` so that plain scalars such as `off` or
/// `13` stay strings when the slot is a string. JSON and TOML scalars carry
/// their type in the syntax, so the decoded tree is used as is.
fn deserialize_typed<O: Overlay>(
    name: &str,
    content: &str,
    format: DocumentFormat,
    map: Map<String, Value>,
) -> Result<O, Error> {
    #[cfg(feature = "yaml")]
    if format == DocumentFormat::Yaml {
        return serde_saphyr::from_str::<KeyTracked<O>>(content)
            .map(|tracked| tracked.0)
            .map_err(|e| {
                let key = FAILED_KEY.with(|k| k.borrow_mut().take()).unwrap_or_default();
                let message = match e {
                    serde_saphyr::Error::Message { msg, .. } => msg,
                    other => other.to_string(),
                };
                type_mismatch(name, content, format, key, message)
            });
    }

    serde_path_to_error::deserialize(Value::Object(map)).map_err(|e| {
        let key = e.path().to_string();
        let message = e.inner().to_string();
        type_mismatch(name, content, format, key, message)
    })
}

fn type_mismatch(
    name: &str,
    content: &str,
    format: DocumentFormat,
    key: String,
    message: String,
) -> Error {
    Error::TypeMismatch {
        span: locate_key(content, &key, format),
        src: NamedSource::new(name, content.to_string()),
        help: "check that the value matches the override's type".to_string(),
        key,
        message,
    }
}

#[cfg(feature = "yaml")]
std::thread_local! {
    /// Path of the value that failed the last typed YAML pass on this thread.
    static FAILED_KEY: std::cell::RefCell<Option<String>> =
        const { std::cell::RefCell::new(None) };
}

/// Runs the overlay's own `Deserialize` under `serde_path_to_error`.
///
/// `serde_saphyr` only exposes `from_str`, so the failing path is handed back
/// through [`FAILED_KEY`] instead of the return value.
#[cfg(feature = "yaml")]
struct KeyTracked<O>(O);

#[cfg(feature = "yaml")]
impl<'de, O: Overlay> Deserialize<'de> for KeyTracked<O> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        FAILED_KEY.with(|k| k.borrow_mut().take());
        serde_path_to_error::deserialize(deserializer)
            .map(KeyTracked)
            .map_err(|e| {
                FAILED_KEY.with(|k| *k.borrow_mut() = Some(e.path().to_string()));
                e.into_inner()
            })
    }
}

fn decode(name: &str, content: &str, format: DocumentFormat) -> Result<Value, Error> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| {
            let offset = line_col_to_offset(content, e.line(), e.column());
            let span = Some(offset_to_span(offset, content));
            syntax_error(name, content, format, e.to_string(), span)
        }),

        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_saphyr::from_str(content).map_err(|e| {
            let message = e.to_string();
            let span = extract_line_col(&message)
                .map(|(line, col)| offset_to_span(line_col_to_offset(content, line, col), content));
            syntax_error(name, content, format, message, span)
        }),

        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| {
            let span = e
                .span()
                .map(|range| SourceSpan::new(range.start.into(), range.end - range.start));
            syntax_error(
                name,
                content,
                format,
                e.message().to_string(),
                span,
            )
        }),
    }
}

fn syntax_error(
    name: &str,
    content: &str,
    format: DocumentFormat,
    message: String,
    span: Option<SourceSpan>,
) -> Error {
    Error::Syntax {
        format: format.name(),
        message,
        src: NamedSource::new(name, content.to_string()),
        span,
        help: format.syntax_help(),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Find where a top-level key is written in the document.
///
/// Best effort: used only to point diagnostics at the right line.
fn locate_key(content: &str, key: &str, format: DocumentFormat) -> Option<SourceSpan> {
    if key.is_empty() {
        return None;
    }

    if format == DocumentFormat::Json {
        let quoted = format!("\"{key}\"");
        let pos = content.find(&quoted)?;
        return Some(SourceSpan::new(pos.into(), quoted.len()));
    }

    let delimiter = match format {
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => '=',
        _ => ':',
    };

    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if let Some(rest) = line[indent..].strip_prefix(key)
            && rest.trim_start().starts_with(delimiter)
        {
            return Some(SourceSpan::new((offset + indent).into(), key.len()));
        }
        offset += line.len();
    }
    None
}

/// Converts a byte offset to a [`SourceSpan`] covering the token there.
fn offset_to_span(offset: usize, content: &str) -> SourceSpan {
    let offset = offset.min(content.len());
    let remaining = content.get(offset..).unwrap_or_default();
    let len = remaining
        .find(|c: char| c.is_whitespace() || c == ',' || c == '}' || c == ']')
        .unwrap_or_else(|| remaining.len().min(20))
        .max(usize::from(!remaining.is_empty()));

    SourceSpan::new(offset.into(), len)
}

/// Convert line/column (1-indexed) to byte offset.
fn line_col_to_offset(content: &str, line: usize, col: usize) -> usize {
    let mut offset = 0;

    for (i, l) in content.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return offset + col.saturating_sub(1);
        }
        offset += l.len();
    }

    offset
}

/// Try to extract `line N column M` from a decoder message.
#[cfg(feature = "yaml")]
fn extract_line_col(msg: &str) -> Option<(usize, usize)> {
    let line_idx = msg.find("line ")?;
    let after_line = &msg[line_idx + 5..];
    let line_end = after_line.find(|c: char| !c.is_ascii_digit())?;
    let line = after_line[..line_end].parse::<usize>().ok()?;

    let col_idx = after_line.find("column ")?;
    let after_col = &after_line[col_idx + 7..];
    let col_end = after_col
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_col.len());
    let col = after_col[..col_end].parse::<usize>().ok()?;

    Some((line, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_key_json() {
        let content = r#"{"autoschema_enabled": true, "other": 1}"#;
        let span = locate_key(content, "other", DocumentFormat::Json).unwrap();
        assert_eq!(span.offset(), 29);
        assert_eq!(span.len(), 7);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_locate_key_yaml_skips_prefix_matches() {
        let content = "autoschema_enabled_x: 1\nautoschema_enabled: true\n";
        let span = locate_key(content, "autoschema_enabled", DocumentFormat::Yaml).unwrap();
        assert_eq!(span.offset(), 24);
        assert_eq!(span.len(), "autoschema_enabled".len());
    }

    #[test]
    fn test_line_col_to_offset() {
        let content = "a: 1\nbb: 2\n";
        assert_eq!(line_col_to_offset(content, 1, 1), 0);
        assert_eq!(line_col_to_offset(content, 2, 1), 5);
        assert_eq!(line_col_to_offset(content, 2, 4), 8);
    }

    #[test]
    fn test_offset_to_span_clamps() {
        let span = offset_to_span(100, "short");
        assert_eq!(span.offset(), 5);
        assert_eq!(span.len(), 0);

        let span = offset_to_span(0, "tru");
        assert_eq!(span.len(), 3);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_extract_line_col() {
        assert_eq!(
            extract_line_col("invalid type at line 3 column 7"),
            Some((3, 7))
        );
        assert_eq!(extract_line_col("no location"), None);
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&serde_json::json!([1, 2])), "a list");
        assert_eq!(value_kind(&serde_json::json!("x")), "a string");
    }
}
