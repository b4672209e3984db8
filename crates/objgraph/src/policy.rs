//! Field metadata and the field policy.
//!
//! Rust has no runtime reflection, so the metadata the encoder walks is
//! generated at compile time by `#[derive(Persistent)]`: one
//! [`TypeDescriptor`] per type, listing a [`FieldDescriptor`] for every field
//! in declaration order. [`FieldPolicy`] answers which of those fields take
//! part in the default walk.
//!
//! Type-level state never appears here. Rust keeps it in `static` items,
//! which are not fields of any instance, so the derive cannot see them and
//! neither encode nor decode can touch them.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Persistent)]
//! struct Account {
//!     owner: String,
//!     #[persist(transient)]
//!     session_token: Option<String>,
//! }
//!
//! let names: Vec<_> = FieldPolicy::persistent_fields::<Account>()
//!     .map(FieldDescriptor::name)
//!     .collect();
//! assert_eq!(names, ["owner"]);
//! ```

use std::{any::Any, fmt};

use crate::{
    error::{DecodeError, EncodeError},
    hook::Hook,
    input::ObjectInput,
    object::Obj,
    output::ObjectOutput,
};

/// A type whose instances are objects in a graph: they have identity, can be
/// shared and can take part in cycles when held through [`Obj`].
///
/// Implement it with `#[derive(Persistent)]`.
pub trait Persistent: Any + Sized {
    /// Returns the compile-time metadata of this type.
    fn descriptor() -> &'static TypeDescriptor<Self>;

    /// Creates the empty instance the decoder allocates before populating
    /// any field. Transient fields keep the values set here.
    fn placeholder() -> Self;

    /// Returns the type tag written into every definition record.
    #[must_use]
    fn type_tag() -> &'static str { Self::descriptor().tag() }
}

/// Writes one field of `T` during the default walk.
pub type EncodeFieldFn<T> =
    fn(&T, &mut ObjectOutput<'_>) -> Result<(), EncodeError>;

/// Reads one field value and assigns it into the placeholder.
pub type DecodeFieldFn<T> =
    fn(&Obj<T>, &mut ObjectInput<'_>) -> Result<(), DecodeError>;

/// Whether a field takes part in the default walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persistence {
    /// Written by the encoder and restored by the decoder.
    Persistent,

    /// Skipped by both; decodes to the field type's `Default`.
    Transient,
}

/// The accessor pair of a persistent field.
pub struct FieldAccess<T> {
    encode: EncodeFieldFn<T>,
    decode: DecodeFieldFn<T>,
}

impl<T> FieldAccess<T> {
    /// Creates an accessor pair.
    #[must_use]
    pub const fn new(encode: EncodeFieldFn<T>, decode: DecodeFieldFn<T>) -> Self {
        Self { encode, decode }
    }

    pub(crate) fn encode(
        &self,
        value: &T,
        output: &mut ObjectOutput<'_>,
    ) -> Result<(), EncodeError> {
        (self.encode)(value, output)
    }

    pub(crate) fn decode(
        &self,
        target: &Obj<T>,
        input: &mut ObjectInput<'_>,
    ) -> Result<(), DecodeError> {
        (self.decode)(target, input)
    }
}

/// Describes one declared field of a persistent type.
pub struct FieldDescriptor<T> {
    name: &'static str,
    declared_type: &'static str,
    access: Option<FieldAccess<T>>,
}

impl<T> FieldDescriptor<T> {
    /// Describes a field that takes part in the default walk.
    #[must_use]
    pub const fn persistent(
        name: &'static str,
        declared_type: &'static str,
        access: FieldAccess<T>,
    ) -> Self {
        Self { name, declared_type, access: Some(access) }
    }

    /// Describes a field excluded from the default walk.
    #[must_use]
    pub const fn transient(
        name: &'static str,
        declared_type: &'static str,
    ) -> Self {
        Self { name, declared_type, access: None }
    }

    /// The field's name; tuple fields are named by their index.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The field's type as written in the source.
    #[must_use]
    pub const fn declared_type(&self) -> &'static str { self.declared_type }

    /// Whether the field is persistent or transient.
    #[must_use]
    pub const fn persistence(&self) -> Persistence {
        if self.access.is_some() {
            Persistence::Persistent
        } else {
            Persistence::Transient
        }
    }

    pub(crate) const fn access(&self) -> Option<&FieldAccess<T>> {
        self.access.as_ref()
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("persistence", &self.persistence())
            .finish()
    }
}

/// The compile-time metadata of a persistent type.
pub struct TypeDescriptor<T: 'static> {
    tag: &'static str,
    fields: &'static [FieldDescriptor<T>],
    hook: Option<Hook<T>>,
}

impl<T: 'static> TypeDescriptor<T> {
    /// Creates a descriptor. Used by the derive macro.
    #[must_use]
    pub const fn new(
        tag: &'static str,
        fields: &'static [FieldDescriptor<T>],
        hook: Option<Hook<T>>,
    ) -> Self {
        Self { tag, fields, hook }
    }

    /// The type tag written into definition records.
    #[must_use]
    pub const fn tag(&self) -> &'static str { self.tag }

    /// Every declared field, persistent or not, in declaration order.
    #[must_use]
    pub const fn fields(&self) -> &'static [FieldDescriptor<T>] { self.fields }

    pub(crate) const fn hook(&self) -> Option<&Hook<T>> { self.hook.as_ref() }
}

impl<T: 'static> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("tag", &self.tag)
            .field("fields", &self.fields)
            .field("custom", &self.hook.is_some())
            .finish()
    }
}

/// Decides which fields of a type the default walk covers.
///
/// The order is declaration order, the same on both sides of a stream, and a
/// type without persistent fields simply yields nothing.
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy;

impl FieldPolicy {
    /// Returns the persistent fields of `T` in declaration order.
    pub fn persistent_fields<T: Persistent>()
    -> impl Iterator<Item = &'static FieldDescriptor<T>> {
        T::descriptor().fields().iter().filter(|field| {
            field.persistence() == Persistence::Persistent
        })
    }

    /// Returns every field of `T`, persistent or not, in declaration order.
    #[must_use]
    pub fn all_fields<T: Persistent>() -> &'static [FieldDescriptor<T>] {
        T::descriptor().fields()
    }

    /// Returns the transient fields of `T` in declaration order.
    pub fn transient_fields<T: Persistent>()
    -> impl Iterator<Item = &'static FieldDescriptor<T>> {
        T::descriptor().fields().iter().filter(|field| {
            field.persistence() == Persistence::Transient
        })
    }

    /// Returns the number of persistent fields of `T`.
    #[must_use]
    pub fn persistent_count<T: Persistent>() -> usize {
        Self::persistent_fields::<T>().count()
    }
}
