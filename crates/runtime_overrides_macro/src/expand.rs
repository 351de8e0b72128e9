//! Code generation for `#[derive(RuntimeOverrides)]`.
//!
//! For a registry `Live`, the expander emits:
//!
//! | Item | Purpose |
//! |------|---------|
//! | `struct LiveOverlay` | One `Option<T>` per slot, strict serde schema |
//! | `impl Overlay for LiveOverlay` | Key table and presence query |
//! | `impl RuntimeOverrides for Live` | Label table and the slot-by-slot walk |

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Error as SynError, Field, Fields, Result as SynResult};

use crate::parse::{RegistryAttr, SlotField, check_duplicates};

pub struct Expander;

impl Expander {
    pub fn expand(input: &DeriveInput) -> SynResult<TokenStream> {
        if !input.generics.params.is_empty() {
            return Err(SynError::new_spanned(
                &input.generics,
                "RuntimeOverrides cannot be derived for generic structs",
            ));
        }

        let registry_attr = RegistryAttr::parse_from_struct(input)?;
        let fields = Self::extract_struct_fields(input)?;

        let slots = fields
            .iter()
            .map(SlotField::parse)
            .collect::<SynResult<Vec<_>>>()?;
        check_duplicates(&slots)?;

        let name = &input.ident;
        let vis = &input.vis;
        let overlay = registry_attr
            .overlay
            .unwrap_or_else(|| format_ident!("{}Overlay", name));

        let idents: Vec<_> = slots.iter().map(|s| s.ident).collect();
        let types: Vec<_> = slots.iter().map(|s| s.value_ty).collect();
        let keys: Vec<_> = slots.iter().map(|s| s.key.as_str()).collect();
        let labels: Vec<_> = slots.iter().map(|s| s.label.as_str()).collect();

        let overlay_doc = format!(
            "Overrides parsed for [`{name}`]. Each field is `None` when its key is absent."
        );
        let field_docs: Vec<_> = keys
            .iter()
            .map(|key| format!("Value of `{key}`, if present."))
            .collect();

        Ok(quote! {
            #[doc = #overlay_doc]
            #[derive(
                ::core::clone::Clone,
                ::core::fmt::Debug,
                ::core::default::Default,
                ::core::cmp::PartialEq,
                ::runtime_overrides::serde::Serialize,
                ::runtime_overrides::serde::Deserialize,
            )]
            #[serde(crate = "::runtime_overrides::serde", deny_unknown_fields)]
            #vis struct #overlay {
                #(
                    #[doc = #field_docs]
                    #[serde(
                        rename = #keys,
                        default,
                        with = "::runtime_overrides::overlay::field"
                    )]
                    pub #idents: ::core::option::Option<#types>,
                )*
            }

            impl ::runtime_overrides::Overlay for #overlay {
                const FIELD_NAMES: &'static [&'static str] = &[#(#keys),*];

                fn present_keys(&self) -> ::std::vec::Vec<&'static str> {
                    let mut keys = ::std::vec::Vec::new();
                    #(
                        if self.#idents.is_some() {
                            keys.push(#keys);
                        }
                    )*
                    keys
                }
            }

            impl ::runtime_overrides::RuntimeOverrides for #name {
                type Overlay = #overlay;

                const SLOT_NAMES: &'static [&'static str] = &[#(#labels),*];

                fn reconcile(
                    &self,
                    overlay: &Self::Overlay,
                    changes: &mut ::std::vec::Vec<::runtime_overrides::ChangeRecord>,
                ) {
                    #(
                        ::runtime_overrides::reconcile_slot(
                            #labels,
                            #keys,
                            &self.#idents,
                            overlay.#idents.as_ref(),
                            changes,
                        );
                    )*
                }

                fn wired_count(&self) -> usize {
                    0usize #( + usize::from(self.#idents.is_wired()) )*
                }
            }
        })
    }

    /// Extract named fields from the struct, rejecting invalid types.
    fn extract_struct_fields(input: &DeriveInput) -> SynResult<&Punctuated<Field, Comma>> {
        match &input.data {
            Data::Struct(data_struct) => match &data_struct.fields {
                Fields::Named(fields_named) => Ok(&fields_named.named),

                Fields::Unnamed(_) => Err(SynError::new_spanned(
                    input,
                    "RuntimeOverrides does not support tuple structs",
                )),

                Fields::Unit => Err(SynError::new_spanned(
                    input,
                    "RuntimeOverrides does not support unit structs",
                )),
            },

            Data::Enum(_) => Err(SynError::new_spanned(
                input,
                "RuntimeOverrides can only be derived for structs, not enums",
            )),

            Data::Union(_) => Err(SynError::new_spanned(
                input,
                "RuntimeOverrides can only be derived for structs, not unions",
            )),
        }
    }
}
