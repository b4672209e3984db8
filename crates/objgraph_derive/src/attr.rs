//! Parsing of `#[persist(...)]` attributes.

use syn::{Attribute, Field, LitStr, Path, parse_quote};

const ATTRIBUTE: &str = "persist";

/// Options given on the type itself.
pub struct ContainerAttrs {
    pub crate_path: Path,
    pub tag: Option<LitStr>,
    pub custom: bool,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self {
            crate_path: parse_quote!(::objgraph),
            tag: None,
            custom: false,
        };

        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    result.crate_path = meta.value()?.parse()?;
                } else if meta.path.is_ident("tag") {
                    let tag: LitStr = meta.value()?.parse()?;
                    if tag.value().is_empty() {
                        return Err(meta.error("type tag must not be empty"));
                    }
                    result.tag = Some(tag);
                } else if meta.path.is_ident("custom") {
                    result.custom = true;
                } else {
                    return Err(meta.error("unknown persist attribute"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

/// Checks if a field has the `#[persist(transient)]` attribute.
pub fn is_transient(field: &Field) -> syn::Result<bool> {
    let mut transient = false;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE))
    {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("transient") {
                transient = true;
                Ok(())
            } else {
                Err(meta.error("unknown persist field attribute"))
            }
        })?;
    }

    Ok(transient)
}
