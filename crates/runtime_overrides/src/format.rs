//! Which decoder reads an overrides document.
//!
//! Only formats whose cargo feature is enabled exist as variants, so a build
//! without `yaml` cannot be asked to parse YAML.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// An overrides document format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DocumentFormat {
    /// Always available.
    Json,

    /// `yaml` feature (on by default).
    #[cfg(feature = "yaml")]
    Yaml,

    /// `toml` feature.
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Formats compiled into this build, in detection order.
    pub const ENABLED: &'static [Self] = &[
        Self::Json,
        #[cfg(feature = "yaml")]
        Self::Yaml,
        #[cfg(feature = "toml")]
        Self::Toml,
    ];

    /// File extensions that select this format, without the dot.
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            #[cfg(feature = "yaml")]
            Self::Yaml => &["yaml", "yml"],
            #[cfg(feature = "toml")]
            Self::Toml => &["toml"],
        }
    }

    /// Look up a format by extension, ignoring ASCII case.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ENABLED
            .iter()
            .copied()
            .find(|format| format.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Pick the format for an overrides file, e.g. `/etc/server/overrides.yml`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str().and_then(Self::from_extension)
    }

    /// Upper-case name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            #[cfg(feature = "yaml")]
            Self::Yaml => "YAML",
            #[cfg(feature = "toml")]
            Self::Toml => "TOML",
        }
    }

    pub(crate) const fn syntax_help(self) -> &'static str {
        match self {
            Self::Json => "check for missing commas, quotes, or brackets",
            #[cfg(feature = "yaml")]
            Self::Yaml => "check indentation and that each override is a `key: value` line",
            #[cfg(feature = "toml")]
            Self::Toml => "check that each override is a `key = value` line with quoted strings",
        }
    }

    /// `.json, .yaml, .yml` for the formats in this build.
    pub(crate) fn supported_extensions() -> String {
        Self::ENABLED
            .iter()
            .flat_map(|format| format.extensions())
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for DocumentFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
