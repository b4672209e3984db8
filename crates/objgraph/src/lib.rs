//! Object graph serialization with preserved identity.
//!
//! `objgraph` writes an arbitrary graph of interior-mutable objects to a
//! compact byte stream and restores an isomorphic graph from it. Objects
//! shared by several referrers are written once and restored as one shared
//! object; cycles, including an object that refers to itself, are restored
//! as cycles.
//!
//! # Overview
//!
//! - [`Obj<T>`] and [`AnyObj`] are handles with identity. Everything else is
//!   a plain value copied into the stream by [`Encode`] / [`Decode`].
//! - `#[derive(Persistent)]` makes a struct usable behind [`Obj`]. It
//!   records the struct's fields, in declaration order, in a
//!   [`TypeDescriptor`]; fields marked `#[persist(transient)]` are skipped
//!   and come back as their `Default`.
//! - A type marked `#[persist(custom)]` implements [`PersistHook`] and
//!   writes its own record body.
//! - [`TypeRegistry`] lists the types that may appear behind an [`AnyObj`].
//! - [`Serializer`] drives one encode or decode call, with limits taken from
//!   a [`Config`].
//!
//! # Example
//!
//! ```ignore
//! use objgraph::{Obj, Persistent, Serializer};
//!
//! #[derive(Persistent)]
//! struct Node {
//!     label: String,
//!     next: Option<Obj<Node>>,
//! }
//!
//! let a = Obj::new(Node { label: "a".into(), next: None });
//! let b = Obj::new(Node { label: "b".into(), next: Some(a.clone()) });
//! a.borrow_mut().next = Some(b.clone());
//!
//! let serializer = Serializer::<objgraph::DefaultConfig>::default();
//! let bytes = serializer.encode(&a)?;
//! let copy: Obj<Node> = serializer.decode(&bytes)?;
//!
//! let back = copy.borrow().next.clone().unwrap().borrow().next.clone().unwrap();
//! assert!(Obj::ptr_eq(&back, &copy));
//! ```

// Allow derive macros to reference this crate as `objgraph` internally
extern crate self as objgraph;

pub mod config;
pub mod error;
pub mod hook;
pub mod input;
pub mod marker;
pub mod object;
pub mod output;
pub mod policy;
pub mod reference;
pub mod registry;
pub mod serializer;
pub mod value;
pub mod wire;

pub use config::{Config, DefaultConfig};
pub use error::{DecodeError, EncodeError, RegisterError};
pub use hook::{Hook, HookRegistry, PersistHook};
pub use input::ObjectInput;
pub use marker::Marker;
pub use object::{AnyObj, Obj};
// Re-export derive macros
pub use objgraph_derive::{Decode, Encode, Persistent};
pub use output::ObjectOutput;
pub use policy::{
    FieldAccess, FieldDescriptor, FieldPolicy, Persistence, Persistent,
    TypeDescriptor,
};
pub use registry::TypeRegistry;
pub use serializer::Serializer;
pub use value::{Decode, Encode};
pub use wire::{Decoder, Encoder, PostcardDecoder, PostcardEncoder};
