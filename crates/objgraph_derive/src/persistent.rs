//! Expansion of `#[derive(Persistent)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Index, Member, ext::IdentExt};

use crate::attr::{ContainerAttrs, is_transient};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Persistent cannot be derived for generic types: each persistent \
             type owns exactly one static descriptor",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Persistent can only be derived for structs",
        ));
    };

    let attrs = ContainerAttrs::parse(&input.attrs)?;
    let krate = &attrs.crate_path;
    let name = &input.ident;

    let tag = attrs.tag.as_ref().map_or_else(
        || {
            quote! {
                ::core::concat!(
                    ::core::module_path!(),
                    "::",
                    ::core::stringify!(#name)
                )
            }
        },
        |tag| quote!(#tag),
    );

    let hook = if attrs.custom {
        quote!(::core::option::Option::Some(#krate::Hook::<#name>::of()))
    } else {
        quote!(::core::option::Option::None)
    };

    let mut accessors = Vec::new();
    let mut descriptors = Vec::new();
    let mut placeholders = Vec::new();

    for (index, field) in data.fields.iter().enumerate() {
        let (member, field_name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.unraw().to_string()),
            None => (Member::Unnamed(Index::from(index)), index.to_string()),
        };
        let ty = &field.ty;

        placeholders.push(quote! {
            #member: <#ty as ::core::default::Default>::default()
        });

        if is_transient(field)? {
            descriptors.push(quote! {
                #krate::FieldDescriptor::transient(
                    #field_name,
                    ::core::stringify!(#ty),
                )
            });
            continue;
        }

        let encode_fn = format_ident!("__persist_encode_{}", field_name);
        let decode_fn = format_ident!("__persist_decode_{}", field_name);

        // Inherent fns rather than nested ones so `Self` in field types
        // still resolves.
        accessors.push(quote! {
            #[doc(hidden)]
            fn #encode_fn(
                value: &Self,
                out: &mut #krate::ObjectOutput<'_>,
            ) -> ::core::result::Result<(), #krate::EncodeError> {
                out.write(&value.#member)
            }

            #[doc(hidden)]
            fn #decode_fn(
                target: &#krate::Obj<Self>,
                input: &mut #krate::ObjectInput<'_>,
            ) -> ::core::result::Result<(), #krate::DecodeError> {
                let value: #ty = input.read()?;
                target.borrow_mut().#member = value;
                ::core::result::Result::Ok(())
            }
        });

        descriptors.push(quote! {
            #krate::FieldDescriptor::persistent(
                #field_name,
                ::core::stringify!(#ty),
                #krate::FieldAccess::new(#name::#encode_fn, #name::#decode_fn),
            )
        });
    }

    Ok(quote! {
        #[automatically_derived]
        #[allow(non_snake_case, clippy::used_underscore_items)]
        impl #name {
            #(#accessors)*
        }

        #[automatically_derived]
        impl #krate::Persistent for #name {
            fn descriptor() -> &'static #krate::TypeDescriptor<Self> {
                static FIELDS: &[#krate::FieldDescriptor<#name>] = &[
                    #(#descriptors),*
                ];

                static DESCRIPTOR: #krate::TypeDescriptor<#name> =
                    #krate::TypeDescriptor::new(#tag, FIELDS, #hook);

                &DESCRIPTOR
            }

            fn placeholder() -> Self {
                Self { #(#placeholders),* }
            }
        }
    })
}
