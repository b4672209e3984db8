//! Derive macros for the `objgraph` crate.
//!
//! - `#[derive(Persistent)]` makes a struct an object type usable behind
//!   `Obj<T>`.
//! - `#[derive(Encode, Decode)]` makes a struct or enum a plain value copied
//!   into the stream.
//!
//! # Persistent
//!
//! ```ignore
//! use objgraph::{Obj, Persistent};
//!
//! #[derive(Persistent)]
//! #[persist(tag = "inventory.Item")]
//! struct Item {
//!     name: String,
//!     parent: Option<Obj<Item>>,
//!     #[persist(transient)]
//!     cached_price: Option<u64>,
//! }
//! ```
//!
//! Every field type must implement `Default`: the decoder allocates a
//! placeholder from those defaults before it reads any field, so that
//! backreferences to the object can resolve while it is being populated.
//! Object handles therefore appear as `Option<Obj<T>>` or inside
//! collections.
//!
//! ## Type attributes
//!
//! - `#[persist(tag = "...")]` sets the type tag written into the stream.
//!   Defaults to the module path followed by the type name.
//! - `#[persist(custom)]` uses the type's `PersistHook` implementation in
//!   place of the default field walk.
//! - `#[persist(crate = path)]` names the `objgraph` crate when it is not
//!   available as `::objgraph`.
//!
//! ## Field attributes
//!
//! - `#[persist(transient)]` excludes the field. It is never written and
//!   decodes to its `Default`.
//!
//! # Encode and Decode
//!
//! Structs encode their non-transient fields in declaration order. Enums
//! encode the variant index as a `usize` followed by the variant's fields.
//!
//! ```ignore
//! use objgraph::{Decode, Encode};
//!
//! #[derive(Encode, Decode)]
//! enum Message {
//!     Quit,
//!     Move { x: i32, y: i32 },
//!     Write(String),
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attr;
mod persistent;
mod value;

/// Derive macro for `Persistent`.
///
/// Generates the type's static descriptor, listing every field in
/// declaration order, and its placeholder built from field defaults. Only
/// non-generic structs are supported.
#[proc_macro_derive(Persistent, attributes(persist))]
pub fn derive_persistent(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    persistent::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive macro for `Encode`.
///
/// - For structs: all non-transient fields are encoded in declaration order
/// - For enums: the variant index is encoded first (as `usize`), followed by
///   any variant data
#[proc_macro_derive(Encode, attributes(persist))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    value::expand_encode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive macro for `Decode`.
///
/// - For structs: all fields are decoded in declaration order (transient
///   fields use `Default::default()`)
/// - For enums: the variant index is decoded first (as `usize`), then the
///   variant data is decoded
#[proc_macro_derive(Decode, attributes(persist))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    value::expand_decode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
