//! The table of types that may appear behind an [`AnyObj`].
//!
//! Typed handles ([`Obj<T>`](crate::object::Obj)) carry their type in the
//! Rust signature, so they need no registration. A type-erased handle only
//! knows a `TypeId` when encoding and only a type tag when decoding; the
//! [`TypeRegistry`] maps both to type-erased entry points monomorphized at
//! registration time.
//!
//! The registry is built once, then shared read-only (usually through an
//! `Arc`) by every encode and decode call.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = TypeRegistry::new();
//! registry.register::<Circle>()?;
//! registry.register::<Square>()?;
//!
//! let serializer = Serializer::<DefaultConfig>::new(Arc::new(registry));
//! ```

use std::{
    any::{Any, TypeId},
    rc::Rc,
};

use fxhash::FxHashMap;

use crate::{
    error::{DecodeError, EncodeError, RegisterError},
    hook::HookRegistry,
    input::ObjectInput,
    object::{AnyObj, Obj},
    output::ObjectOutput,
    policy::{FieldDescriptor, FieldPolicy, Persistent},
};


type WriteBodyFn =
    fn(&Rc<dyn Any>, &mut ObjectOutput<'_>) -> Result<(), EncodeError>;
type AllocateFn = fn() -> Rc<dyn Any>;
type ReadBodyFn =
    fn(&Rc<dyn Any>, &mut ObjectInput<'_>) -> Result<(), DecodeError>;

fn write_body<T: Persistent>(
    cell: &Rc<dyn Any>,
    output: &mut ObjectOutput<'_>,
) -> Result<(), EncodeError> {
    let object = Obj::<T>::from_erased(Rc::clone(cell))
        .expect("registry entry selected by type id");

    output.write_body(&object)
}

fn allocate<T: Persistent>() -> Rc<dyn Any> {
    Obj::new(T::placeholder()).erase()
}

fn read_body<T: Persistent>(
    cell: &Rc<dyn Any>,
    input: &mut ObjectInput<'_>,
) -> Result<(), DecodeError> {
    let object = Obj::<T>::from_erased(Rc::clone(cell))
        .expect("placeholder allocated by the same entry");

    input.read_body(&object)
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    tag: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    custom: bool,
    persistent_fields: Vec<&'static str>,
    write_body: WriteBodyFn,
    allocate: AllocateFn,
    read_body: ReadBodyFn,
}

impl Entry {
    fn new<T: Persistent>() -> Self {
        Self {
            tag: T::type_tag(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            custom: HookRegistry::has_hook::<T>(),
            persistent_fields: FieldPolicy::persistent_fields::<T>()
                .map(FieldDescriptor::name)
                .collect(),
            write_body: write_body::<T>,
            allocate: allocate::<T>,
            read_body: read_body::<T>,
        }
    }

    pub(crate) const fn tag(&self) -> &'static str { self.tag }

    pub(crate) fn write_body(
        &self,
        object: &AnyObj,
        output: &mut ObjectOutput<'_>,
    ) -> Result<(), EncodeError> {
        (self.write_body)(object.cell(), output)
    }

    /// Allocates the placeholder and returns it already erased.
    pub(crate) fn allocate(&self) -> AnyObj {
        AnyObj::from_parts((self.allocate)(), self.type_id, self.type_name)
    }

    pub(crate) fn read_body(
        &self,
        object: &AnyObj,
        input: &mut ObjectInput<'_>,
    ) -> Result<(), DecodeError> {
        (self.read_body)(object.cell(), input)
    }
}

/// Maps type tags and `TypeId`s of registered persistent types to their
/// type-erased encode and decode entry points.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    by_tag: FxHashMap<&'static str, Entry>,
    tag_by_type_id: FxHashMap<TypeId, &'static str>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers `T` so it can be encoded and decoded behind an [`AnyObj`].
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError`] if another type already holds `T`'s tag.
    pub fn register<T: Persistent>(&mut self) -> Result<(), RegisterError> {
        let entry = Entry::new::<T>();

        if let Some(existing) = self.by_tag.get(entry.tag) {
            if existing.type_id == entry.type_id {
                return Ok(());
            }

            return Err(RegisterError {
                tag: entry.tag,
                existing: existing.type_name,
            });
        }

        tracing::debug!(tag = entry.tag, ty = entry.type_name, "registered type");

        self.tag_by_type_id.insert(entry.type_id, entry.tag);
        self.by_tag.insert(entry.tag, entry);

        Ok(())
    }

    /// Returns `true` if a type is registered under `tag`.
    #[must_use]
    pub fn contains_tag(&self, tag: &str) -> bool { self.by_tag.contains_key(tag) }

    /// Returns `true` if `T` is registered.
    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.tag_by_type_id.contains_key(&TypeId::of::<T>())
    }

    /// Returns the Rust type name registered under `tag`.
    #[must_use]
    pub fn type_name(&self, tag: &str) -> Option<&'static str> {
        self.by_tag.get(tag).map(|entry| entry.type_name)
    }

    /// Returns `true` if the type registered under `tag` uses a custom hook.
    #[must_use]
    pub fn has_hook(&self, tag: &str) -> bool {
        self.by_tag.get(tag).is_some_and(|entry| entry.custom)
    }

    /// Returns the persistent field names of the type registered under
    /// `tag`, in stream order.
    #[must_use]
    pub fn persistent_fields(&self, tag: &str) -> Option<&[&'static str]> {
        self.by_tag.get(tag).map(|entry| entry.persistent_fields.as_slice())
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize { self.by_tag.len() }

    /// Returns `true` if no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.by_tag.is_empty() }

    pub(crate) fn entry_by_tag(&self, tag: &str) -> Option<&Entry> {
        self.by_tag.get(tag)
    }

    pub(crate) fn entry_by_type_id(&self, type_id: TypeId) -> Option<&Entry> {
        self.tag_by_type_id.get(&type_id).and_then(|tag| self.by_tag.get(tag))
    }
}
