//! # runtime_overrides_macro
//!
//! Procedural macro implementation for the `runtime_overrides` crate.
//!
//! **Note:** Users should depend on the `runtime_overrides` crate, not this
//! one directly. It re-exports the derive along with the runtime types the
//! generated code refers to.
//!
//! # Module Structure
//!
//! - `parse` - Attribute parsing for `#[overrides(...)]` and slot type extraction
//! - `expand` - Code generation

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod expand;
mod parse;

/// Derive a runtime overrides registry from a struct of `Slot<T>` fields.
///
/// # Generated Items
///
/// - `<Name>Overlay`: a struct with one `Option<T>` per slot that
///   deserializes strictly (unknown keys are rejected)
/// - `impl Overlay for <Name>Overlay`
/// - `impl RuntimeOverrides for <Name>`: the slot-by-slot reconciliation walk
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `key = "name"` | Document key (default: the field name) |
/// | `label = "Name"` | Label in change records (default: field name in UpperCamelCase) |
///
/// # Struct Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `overlay = "Name"` | Name of the generated overlay struct |
///
/// # Example
///
/// ```ignore
/// use runtime_overrides::{RuntimeOverrides, Slot};
/// use std::time::Duration;
///
/// #[derive(RuntimeOverrides, Default)]
/// struct Live {
///     autoschema_enabled: Slot<bool>,
///
///     #[overrides(key = "min_async_wait")]
///     replica_movement_minimum_async_wait: Slot<Duration>,
/// }
/// ```
///
/// Keys must match `^[a-z]+(_[a-z]+)*$`; anything else is a compile error.
#[proc_macro_derive(RuntimeOverrides, attributes(overrides))]
pub fn derive_runtime_overrides(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand::Expander::expand(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
