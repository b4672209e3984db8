//! Expansion of `#[derive(Encode)]` and `#[derive(Decode)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Fields, Index, Path, WhereClause,
    parse_quote,
};

use crate::attr::{ContainerAttrs, is_transient};

/// Adds `bound` for every generic type parameter.
fn bounded_where_clause(input: &DeriveInput, bound: &Path) -> WhereClause {
    let mut where_clause = input
        .generics
        .where_clause
        .clone()
        .unwrap_or_else(|| parse_quote!(where));

    for param in input.generics.type_params() {
        let ident = &param.ident;
        where_clause.predicates.push(parse_quote!(#ident: #bound));
    }

    where_clause
}

fn reject_union(input: &DeriveInput, which: &str) -> syn::Error {
    syn::Error::new_spanned(
        input,
        format!("{which} cannot be derived for unions"),
    )
}

pub fn expand_encode(input: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = ContainerAttrs::parse(&input.attrs)?;
    let krate = &attrs.crate_path;
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause =
        bounded_where_clause(input, &parse_quote!(#krate::Encode));

    let body = match &input.data {
        Data::Struct(data) => encode_struct(data, krate)?,
        Data::Enum(data) => encode_enum(data, krate)?,
        Data::Union(_) => return Err(reject_union(input, "Encode")),
    };

    Ok(quote! {
        #[automatically_derived]
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics #krate::Encode for #name #ty_generics #where_clause {
            fn encode(
                &self,
                out: &mut #krate::ObjectOutput<'_>,
            ) -> ::core::result::Result<(), #krate::EncodeError> {
                #body
            }
        }
    })
}

fn encode_struct(data: &DataStruct, krate: &Path) -> syn::Result<TokenStream> {
    let mut writes = Vec::new();

    for (index, field) in data.fields.iter().enumerate() {
        if is_transient(field)? {
            continue;
        }

        let member = field.ident.as_ref().map_or_else(
            || {
                let index = Index::from(index);
                quote!(#index)
            },
            |ident| quote!(#ident),
        );

        writes.push(quote! {
            #krate::Encode::encode(&self.#member, out)?;
        });
    }

    Ok(quote! {
        #(#writes)*
        ::core::result::Result::Ok(())
    })
}

fn encode_enum(data: &DataEnum, krate: &Path) -> syn::Result<TokenStream> {
    let mut arms = Vec::new();

    for (idx, variant) in data.variants.iter().enumerate() {
        let variant_name = &variant.ident;
        let mut bindings = Vec::new();
        let mut writes = Vec::new();

        for (i, field) in variant.fields.iter().enumerate() {
            let binding = field
                .ident
                .clone()
                .unwrap_or_else(|| format_ident!("field_{i}"));

            if is_transient(field)? {
                bindings.push(match &field.ident {
                    Some(ident) => quote!(#ident: _),
                    None => quote!(_),
                });
            } else {
                bindings.push(quote!(#binding));
                writes.push(quote! {
                    #krate::Encode::encode(#binding, out)?;
                });
            }
        }

        let pattern = match &variant.fields {
            Fields::Named(_) => quote!(Self::#variant_name { #(#bindings),* }),
            Fields::Unnamed(_) => quote!(Self::#variant_name(#(#bindings),*)),
            Fields::Unit => quote!(Self::#variant_name),
        };

        arms.push(quote! {
            #pattern => {
                out.encoder().emit_usize(#idx)?;
                #(#writes)*
            }
        });
    }

    Ok(quote! {
        match self {
            #(#arms)*
        }
        ::core::result::Result::Ok(())
    })
}

pub fn expand_decode(input: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = ContainerAttrs::parse(&input.attrs)?;
    let krate = &attrs.crate_path;
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause =
        bounded_where_clause(input, &parse_quote!(#krate::Decode));

    let body = match &input.data {
        Data::Struct(data) => {
            let construct = construct(&data.fields, &quote!(Self), krate)?;
            quote!(::core::result::Result::Ok(#construct))
        }
        Data::Enum(data) => decode_enum(name, data, krate)?,
        Data::Union(_) => return Err(reject_union(input, "Decode")),
    };

    Ok(quote! {
        #[automatically_derived]
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics #krate::Decode for #name #ty_generics #where_clause {
            fn decode(
                input: &mut #krate::ObjectInput<'_>,
            ) -> ::core::result::Result<Self, #krate::DecodeError> {
                #body
            }
        }
    })
}

/// Builds `path { .. }` or `path(..)` reading every persistent field in
/// declaration order and defaulting transient ones.
fn construct(
    fields: &Fields,
    path: &TokenStream,
    krate: &Path,
) -> syn::Result<TokenStream> {
    let mut values = Vec::new();

    for field in fields {
        let ty = &field.ty;
        let value = if is_transient(field)? {
            quote!(<#ty as ::core::default::Default>::default())
        } else {
            quote!(<#ty as #krate::Decode>::decode(input)?)
        };

        values.push(match &field.ident {
            Some(ident) => quote!(#ident: #value),
            None => value,
        });
    }

    Ok(match fields {
        Fields::Named(_) => quote!(#path { #(#values),* }),
        Fields::Unnamed(_) => quote!(#path(#(#values),*)),
        Fields::Unit => quote!(#path),
    })
}

fn decode_enum(
    name: &syn::Ident,
    data: &DataEnum,
    krate: &Path,
) -> syn::Result<TokenStream> {
    let variant_count = data.variants.len();
    let mut arms = Vec::new();

    for (idx, variant) in data.variants.iter().enumerate() {
        let variant_name = &variant.ident;
        let construct =
            construct(&variant.fields, &quote!(Self::#variant_name), krate)?;

        arms.push(quote! {
            #idx => ::core::result::Result::Ok(#construct),
        });
    }

    let name_str = name.to_string();

    Ok(quote! {
        let variant_idx = input.decoder().read_usize()?;
        match variant_idx {
            #(#arms)*
            _ => ::core::result::Result::Err(#krate::DecodeError::corrupt(
                ::std::format!(
                    "invalid variant index {} for enum {} (expected 0..{})",
                    variant_idx,
                    #name_str,
                    #variant_count
                ),
            )),
        }
    })
}
