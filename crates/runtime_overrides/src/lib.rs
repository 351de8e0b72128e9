//! # runtime_overrides
//!
//! Live configuration values that change without a restart.
//!
//! A long-running process keeps a handful of settings in [`DynamicValue`]
//! cells that any thread may read at any time. When an overrides document is
//! (re)read, it is parsed strictly into an overlay and reconciled into a
//! registry of those cells: present keys set their value, absent keys revert
//! to the value the cell was constructed with, and every actual change is
//! recorded.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`DynamicValue`] | Thread-safe cell with a fixed default |
//! | [`Slot`] | Optional reference from a registry field to a cell |
//! | [`RuntimeOverrides`](macro@RuntimeOverrides) | Derive that turns a struct of slots into a registry |
//! | [`parse_overlay`] | Strict document parser (unknown keys are errors) |
//! | [`update`] | Reconciler: applies an overlay and records changes |
//! | [`ChangeSink`] | Where change records go |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runtime_overrides::{DynamicValue, RuntimeOverrides, Slot, TracingSink, parse_yaml, update};
//!
//! #[derive(RuntimeOverrides, Default)]
//! struct Live {
//!     autoschema_enabled: Slot<bool>,
//!     maximum_allowed_collections_count: Slot<i64>,
//! }
//!
//! let autoschema = Arc::new(DynamicValue::new(false));
//! let live = Live {
//!     autoschema_enabled: Slot::from(&autoschema),
//!     ..Live::default()
//! };
//!
//! let overlay = parse_yaml(b"autoschema_enabled: true")?;
//! update(&mut TracingSink, &live, &overlay)?;
//!
//! assert!(autoschema.get());
//! ```
//!
//! ## Unknown Keys
//!
//! A typo in the document fails the whole parse with an error naming the key,
//! and nothing is reconciled:
//!
//! ```text
//! runtime_overrides::unknown_field
//!
//!   × unknown runtime override `autoschema_enbaled`
//!   help: expected one of: autoschema_enabled, maximum_allowed_collections_count
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `yaml` | YAML documents via `serde-saphyr` | **Yes** |
//! | `tracing` | [`TracingSink`] and parse/reconcile diagnostics | **Yes** |
//! | `toml` | TOML documents | No |

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// Generated code refers to `::runtime_overrides`, including inside this crate.
extern crate self as runtime_overrides;

pub use runtime_overrides_macro::RuntimeOverrides;

/// Re-export serde so generated overlays do not require a direct dependency.
pub use serde;

/// Re-export miette for rendering [`Error`] diagnostics.
pub use miette;

mod error;
mod format;
pub mod overlay;
mod reconcile;
mod registry;
pub mod server;
mod sink;
mod value;

pub use error::Error;
pub use format::DocumentFormat;
#[cfg(feature = "yaml")]
pub use overlay::parse_yaml;
pub use overlay::{Overlay, load_overlay, parse_json, parse_overlay};
pub use reconcile::{ChangeRecord, apply_file, reconcile_slot, update};
pub use registry::RuntimeOverrides;
#[cfg(feature = "tracing")]
pub use sink::TracingSink;
pub use sink::{CHANGE_ACTION, ChangeSink, MemorySink, WriterSink};
pub use value::{DynamicValue, OverrideValue, Slot};
