//! The decoding half of the object layer.
//!
//! [`ObjectInput`] mirrors [`ObjectOutput`](crate::output::ObjectOutput).
//! A definition record is decoded in three steps: the placeholder is
//! allocated, it is registered under the record's id, and only then are its
//! fields read. A field that refers back to an object still being populated
//! therefore resolves to that very placeholder, which is how cycles are
//! restored.

use std::io::Read;

use crate::{
    config::{STACK_RED_ZONE, STACK_SEGMENT},
    error::DecodeError,
    hook::HookRegistry,
    marker::Marker,
    object::{AnyObj, Obj},
    policy::{FieldPolicy, Persistent},
    reference::{PlaceholderTable, ReferenceId},
    registry::TypeRegistry,
    value::Decode,
    wire::{Decoder, PostcardDecoder},
};


/// The source handed to [`Decode`] implementations and custom hooks.
pub struct ObjectInput<'a> {
    decoder: PostcardDecoder<&'a mut dyn Read>,
    placeholders: PlaceholderTable,
    registry: &'a TypeRegistry,
    depth: usize,
    max_depth: usize,
}

impl<'a> ObjectInput<'a> {
    pub(crate) fn new(
        reader: &'a mut dyn Read,
        registry: &'a TypeRegistry,
        max_depth: usize,
        max_length: usize,
    ) -> Self {
        Self {
            decoder: PostcardDecoder::new(reader, max_length),
            placeholders: PlaceholderTable::new(),
            registry,
            depth: 0,
            max_depth,
        }
    }

    /// Returns the scalar decoder, for hooks reading primitives directly.
    pub fn decoder(&mut self) -> &mut dyn Decoder { &mut self.decoder }

    /// Reads any decodable value.
    ///
    /// # Errors
    ///
    /// Propagates the value's [`DecodeError`].
    pub fn read<V: Decode>(&mut self) -> Result<V, DecodeError> {
        V::decode(self)
    }

    /// Reads an object record that must hold a `T`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::CorruptStream`] for a null or unknown marker, a
    ///   backreference to an undefined id or a malformed body.
    /// - [`DecodeError::TypeMismatch`] if the record holds another known
    ///   type.
    /// - [`DecodeError::ClassResolution`] if the record's tag is unknown.
    pub fn read_object<T: Persistent>(&mut self) -> Result<Obj<T>, DecodeError> {
        let marker = self.read_marker()?;
        self.read_object_marked(marker)
    }

    /// Reads an object record of any registered type.
    ///
    /// # Errors
    ///
    /// As [`read_object`](Self::read_object), except that any registered tag
    /// is accepted.
    pub fn read_any(&mut self) -> Result<AnyObj, DecodeError> {
        let marker = self.read_marker()?;
        self.read_any_marked(marker)
    }

    /// Returns the number of bytes consumed so far, header included.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 { self.decoder.consumed() }

    /// Returns the number of distinct objects restored so far.
    #[must_use]
    pub fn objects_read(&self) -> usize { self.placeholders.len() }

    pub(crate) fn read_marker(&mut self) -> Result<Marker, DecodeError> {
        Marker::try_from(self.decoder.read_u8()?)
    }

    pub(crate) fn read_object_marked<T: Persistent>(
        &mut self,
        marker: Marker,
    ) -> Result<Obj<T>, DecodeError> {
        match marker {
            Marker::Reference => {
                let object = self.read_reference()?;

                object.downcast::<T>().ok_or_else(|| {
                    DecodeError::TypeMismatch {
                        expected: T::type_tag(),
                        found: self.tag_of(&object),
                    }
                })
            }

            Marker::Definition => {
                let (id, tag) = self.read_definition_header()?;

                if tag != T::type_tag() {
                    return Err(if self.registry.contains_tag(&tag) {
                        DecodeError::TypeMismatch {
                            expected: T::type_tag(),
                            found: tag,
                        }
                    } else {
                        DecodeError::ClassResolution { tag }
                    });
                }

                self.nested(id, &tag, |input| {
                    let object = Obj::new(T::placeholder());

                    input
                        .placeholders
                        .register_placeholder(id, object.clone().into())?;
                    input.read_body(&object)?;

                    Ok(object)
                })
            }

            other => Err(unexpected_marker(other)),
        }
    }

    pub(crate) fn read_any_marked(
        &mut self,
        marker: Marker,
    ) -> Result<AnyObj, DecodeError> {
        match marker {
            Marker::Reference => self.read_reference(),

            Marker::Definition => {
                let (id, tag) = self.read_definition_header()?;

                let registry = self.registry;
                let entry = registry
                    .entry_by_tag(&tag)
                    .ok_or_else(|| DecodeError::ClassResolution {
                        tag: tag.clone(),
                    })?;

                self.nested(id, &tag, |input| {
                    let object = entry.allocate();

                    input.placeholders.register_placeholder(id, object.clone())?;
                    entry.read_body(&object, input)?;

                    Ok(object)
                })
            }

            other => Err(unexpected_marker(other)),
        }
    }

    /// Populates a registered placeholder from its record body.
    pub(crate) fn read_body<T: Persistent>(
        &mut self,
        object: &Obj<T>,
    ) -> Result<(), DecodeError> {
        if let Some(hook) = HookRegistry::hook_for::<T>() {
            hook.decode(&mut object.borrow_mut(), self)?;

            return match self.read_marker()? {
                Marker::EndBlock => Ok(()),
                other => Err(DecodeError::corrupt(format!(
                    "custom body of `{}` ended at a {other:?} marker instead \
                     of an end-of-block marker",
                    T::type_tag()
                ))),
            };
        }

        let count = self.decoder.read_length()?;
        let expected = FieldPolicy::persistent_count::<T>();

        if count != expected {
            return Err(DecodeError::corrupt(format!(
                "record of `{}` has {count} fields, the type declares \
                 {expected}",
                T::type_tag()
            )));
        }

        for field in FieldPolicy::persistent_fields::<T>() {
            let Some(access) = field.access() else { continue };

            let name = self.decoder.read_str()?;
            if name != field.name() {
                return Err(DecodeError::corrupt(format!(
                    "expected field `{}` of `{}`, found `{name}`",
                    field.name(),
                    T::type_tag()
                )));
            }

            access.decode(object, self)?;
        }

        Ok(())
    }

    fn read_reference(&mut self) -> Result<AnyObj, DecodeError> {
        let id = ReferenceId::new(self.decoder.read_u32()?);
        tracing::trace!(id = id.get(), "backreference");

        self.placeholders.resolve(id)
    }

    fn read_definition_header(
        &mut self,
    ) -> Result<(ReferenceId, String), DecodeError> {
        let id = ReferenceId::new(self.decoder.read_u32()?);
        let tag = self.decoder.read_str()?;

        Ok((id, tag))
    }

    /// Runs `populate` one definition level deeper. The depth is checked
    /// before anything is allocated and restored however `populate` exits.
    fn nested<V>(
        &mut self,
        id: ReferenceId,
        tag: &str,
        populate: impl FnOnce(&mut Self) -> Result<V, DecodeError>,
    ) -> Result<V, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::DepthLimitExceeded { limit: self.max_depth });
        }

        tracing::trace!(id = id.get(), tag, depth = self.depth, "definition");

        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
            populate(self)
        });
        self.depth -= 1;

        result
    }

    fn tag_of(&self, object: &AnyObj) -> String {
        self.registry
            .entry_by_type_id(object.type_id())
            .map_or_else(|| object.type_name().to_owned(), |entry| {
                entry.tag().to_owned()
            })
    }
}

fn unexpected_marker(marker: Marker) -> DecodeError {
    DecodeError::corrupt(format!(
        "unexpected {marker:?} marker where an object record was expected"
    ))
}

impl std::fmt::Debug for ObjectInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectInput")
            .field("consumed", &self.decoder.consumed())
            .field("placeholders", &self.placeholders)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
