//! Attribute parsing for `#[overrides(...)]`.
//!
//! # Supported Syntax
//!
//! ```ignore
//! #[overrides(overlay = "LiveOverlay")]     // struct: name of the generated overlay
//! struct Live {
//!     #[overrides(key = "min_wait")]          // document key (default: field name)
//!     #[overrides(label = "MinWait")]         // change-record label (default: UpperCamelCase)
//!     replica_movement_minimum_async_wait: Slot<Duration>,
//! }
//! ```
//!
//! Keys must be lower_snake_case (`^[a-z]+(_[a-z]+)*$`).

use std::collections::HashSet;

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{
    Attribute, DeriveInput, Error as SynError, Field, GenericArgument, Ident, LitStr,
    PathArguments, Result as SynResult, Type, TypePath,
};

const ATTR: &str = "overrides";

/// Struct-level options.
#[derive(Default)]
pub struct RegistryAttr {
    /// Name of the generated overlay struct.
    pub overlay: Option<Ident>,
}

impl RegistryAttr {
    pub fn parse_from_struct(input: &DeriveInput) -> SynResult<Self> {
        let mut attr = Self::default();

        for a in overrides_attrs(&input.attrs) {
            a.parse_nested_meta(|meta| {
                if meta.path.is_ident("overlay") {
                    if attr.overlay.is_some() {
                        return Err(meta.error("duplicate `overlay` option"));
                    }
                    let lit: LitStr = meta.value()?.parse()?;
                    attr.overlay = Some(lit.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unknown option; expected `overlay = \"Name\"`"))
                }
            })?;
        }

        Ok(attr)
    }
}

/// One registry slot, fully resolved.
pub struct SlotField<'a> {
    pub ident: &'a Ident,

    /// `T` in `Slot<T>`.
    pub value_ty: &'a Type,

    /// Document key.
    pub key: String,

    /// Change-record label.
    pub label: String,
}

impl<'a> SlotField<'a> {
    pub fn parse(field: &'a Field) -> SynResult<Self> {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| SynError::new_spanned(field, "expected a named field"))?;

        let value_ty = slot_value_type(&field.ty).ok_or_else(|| {
            SynError::new_spanned(
                &field.ty,
                "RuntimeOverrides fields must have type `Slot<T>`",
            )
        })?;

        let mut key: Option<(String, Span)> = None;
        let mut label: Option<String> = None;

        for a in overrides_attrs(&field.attrs) {
            a.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    if key.is_some() {
                        return Err(meta.error("duplicate `key` option"));
                    }
                    let lit: LitStr = meta.value()?.parse()?;
                    key = Some((lit.value(), lit.span()));
                    Ok(())
                } else if meta.path.is_ident("label") {
                    if label.is_some() {
                        return Err(meta.error("duplicate `label` option"));
                    }
                    let lit: LitStr = meta.value()?.parse()?;
                    if lit.value().is_empty() {
                        return Err(SynError::new(lit.span(), "label must not be empty"));
                    }
                    label = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown option; expected `key` or `label`"))
                }
            })?;
        }

        let name = ident.unraw().to_string();
        let (key, key_span) = key.unwrap_or_else(|| (name.clone(), ident.span()));

        if !is_lower_snake_case(&key) {
            return Err(SynError::new(
                key_span,
                format!(
                    "runtime override key `{key}` must be lower_snake_case (e.g. `my_key`); \
                     use #[overrides(key = \"...\")] to rename it"
                ),
            ));
        }

        Ok(Self {
            ident,
            value_ty,
            key,
            label: label.unwrap_or_else(|| upper_camel_case(&name)),
        })
    }
}

/// Reject two slots that would read the same key or log under the same label.
pub fn check_duplicates(fields: &[SlotField<'_>]) -> SynResult<()> {
    let mut keys = HashSet::new();
    let mut labels = HashSet::new();

    for f in fields {
        if !keys.insert(f.key.as_str()) {
            return Err(SynError::new_spanned(
                f.ident,
                format!("duplicate runtime override key `{}`", f.key),
            ));
        }
        if !labels.insert(f.label.as_str()) {
            return Err(SynError::new_spanned(
                f.ident,
                format!("duplicate runtime override label `{}`", f.label),
            ));
        }
    }

    Ok(())
}

fn overrides_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident(ATTR))
}

/// Extract `T` from `Slot<T>` (any path ending in `Slot`).
fn slot_value_type(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };

    let last = path.segments.last()?;
    if last.ident != "Slot" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }

    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// `^[a-z]+(_[a-z]+)*$`
fn is_lower_snake_case(key: &str) -> bool {
    !key.is_empty()
        && key
            .split('_')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase()))
}

/// `maximum_allowed_collections_count` → `MaximumAllowedCollectionsCount`
fn upper_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for part in name.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_lower_snake_case() {
        assert!(is_lower_snake_case("autoschema_enabled"));
        assert!(is_lower_snake_case("level"));
        assert!(!is_lower_snake_case(""));
        assert!(!is_lower_snake_case("_leading"));
        assert!(!is_lower_snake_case("trailing_"));
        assert!(!is_lower_snake_case("double__underscore"));
        assert!(!is_lower_snake_case("UPPER_CASE"));
        assert!(!is_lower_snake_case("with_digit2"));
    }

    #[test]
    fn test_upper_camel_case() {
        assert_eq!(
            upper_camel_case("maximum_allowed_collections_count"),
            "MaximumAllowedCollectionsCount"
        );
        assert_eq!(upper_camel_case("level"), "Level");
        assert_eq!(upper_camel_case("http2_port"), "Http2Port");
    }

    #[test]
    fn test_slot_value_type() {
        let ty: Type = syn::parse_quote!(Slot<bool>);
        assert!(slot_value_type(&ty).is_some());

        let ty: Type = syn::parse_quote!(::runtime_overrides::Slot<::std::time::Duration>);
        assert!(slot_value_type(&ty).is_some());

        let ty: Type = syn::parse_quote!(Option<bool>);
        assert!(slot_value_type(&ty).is_none());
    }
}
