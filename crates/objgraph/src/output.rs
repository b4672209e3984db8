//! The encoding half of the object layer.
//!
//! [`ObjectOutput`] walks an object graph depth-first. The first time it
//! meets an object it numbers it and writes a definition record; every later
//! meeting, including one that closes a cycle, becomes a backreference to
//! that number.
//!
//! ```text
//! record     := NULL
//!             | REFERENCE id
//!             | DEFINITION id tag body
//! body       := hook-bytes END_BLOCK
//!             | count (name value){count}
//! ```

use std::io::Write;

use crate::{
    config::{STACK_RED_ZONE, STACK_SEGMENT},
    error::EncodeError,
    hook::HookRegistry,
    marker::Marker,
    object::{AnyObj, Obj},
    policy::{FieldPolicy, Persistent},
    reference::{ReferenceId, ReferenceTable},
    registry::TypeRegistry,
    value::Encode,
    wire::{Encoder, PostcardEncoder},
};

#[cfg(test)]
mod test;

/// The sink handed to [`Encode`] implementations and custom hooks.
///
/// One `ObjectOutput` exists per encode call, so its reference table never
/// outlives or leaks into another call.
pub struct ObjectOutput<'a> {
    encoder: PostcardEncoder<&'a mut dyn Write>,
    references: ReferenceTable,
    registry: &'a TypeRegistry,
    depth: usize,
    max_depth: usize,
    path: Vec<&'static str>,
}

impl<'a> ObjectOutput<'a> {
    pub(crate) fn new(
        writer: &'a mut dyn Write,
        registry: &'a TypeRegistry,
        max_depth: usize,
    ) -> Self {
        Self {
            encoder: PostcardEncoder::new(writer),
            references: ReferenceTable::new(),
            registry,
            depth: 0,
            max_depth,
            path: Vec::new(),
        }
    }

    /// Returns the scalar encoder, for hooks writing primitives directly.
    pub fn encoder(&mut self) -> &mut dyn Encoder { &mut self.encoder }

    /// Writes any encodable value.
    ///
    /// # Errors
    ///
    /// Propagates the value's [`EncodeError`].
    pub fn write<V: Encode + ?Sized>(
        &mut self,
        value: &V,
    ) -> Result<(), EncodeError> {
        value.encode(self)
    }

    /// Writes `object` as a definition record the first time it is met in
    /// this call and as a backreference afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::DepthLimitExceeded`] if definitions nest too
    /// deep, or any error raised while writing the object's body.
    pub fn write_object<T: Persistent>(
        &mut self,
        object: &Obj<T>,
    ) -> Result<(), EncodeError> {
        let (id, fresh) = self.references.id_for(&object.erase());

        if !fresh {
            return self.write_reference(id);
        }

        self.write_definition(id, T::type_tag(), |out| out.write_body(object))
    }

    /// Writes a type-erased object.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::NotSerializable`] if the object's runtime type
    /// is not registered and the object has not been written yet in this
    /// call, plus everything [`write_object`](Self::write_object) returns.
    pub fn write_any(&mut self, object: &AnyObj) -> Result<(), EncodeError> {
        if let Some(id) = self.references.lookup(object.cell()) {
            return self.write_reference(id);
        }

        let registry = self.registry;
        let Some(entry) = registry.entry_by_type_id(object.type_id()) else {
            return Err(EncodeError::NotSerializable {
                type_name: object.type_name(),
                path: self.path_string(),
            });
        };

        let (id, _) = self.references.id_for(object.cell());

        self.write_definition(id, entry.tag(), |out| {
            entry.write_body(object, out)
        })
    }

    /// Returns the number of bytes written so far, header included.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 { self.encoder.written() }

    /// Returns the number of distinct objects written so far.
    #[must_use]
    pub fn objects_written(&self) -> usize { self.references.len() }

    pub(crate) fn write_marker(
        &mut self,
        marker: Marker,
    ) -> Result<(), EncodeError> {
        self.encoder.emit_u8(marker.byte())?;
        Ok(())
    }

    /// Writes the record body of `object`: either its hook output closed by
    /// an end-of-block marker or its persistent fields in declaration order.
    pub(crate) fn write_body<T: Persistent>(
        &mut self,
        object: &Obj<T>,
    ) -> Result<(), EncodeError> {
        let value = object.borrow();

        if let Some(hook) = HookRegistry::hook_for::<T>() {
            hook.encode(&value, self)?;
            return self.write_marker(Marker::EndBlock);
        }

        self.encoder.emit_usize(FieldPolicy::persistent_count::<T>())?;

        for field in FieldPolicy::persistent_fields::<T>() {
            let Some(access) = field.access() else { continue };

            self.encoder.emit_str(field.name())?;

            self.path.push(field.name());
            access.encode(&value, self)?;
            self.path.pop();
        }

        Ok(())
    }

    fn write_reference(&mut self, id: ReferenceId) -> Result<(), EncodeError> {
        tracing::trace!(id = id.get(), "backreference");

        self.write_marker(Marker::Reference)?;
        self.encoder.emit_u32(id.get())?;
        Ok(())
    }

    fn write_definition(
        &mut self,
        id: ReferenceId,
        tag: &'static str,
        body: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        if self.depth >= self.max_depth {
            return Err(EncodeError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        tracing::trace!(id = id.get(), tag, depth = self.depth, "definition");

        self.write_marker(Marker::Definition)?;
        self.encoder.emit_u32(id.get())?;
        self.encoder.emit_str(tag)?;

        self.depth += 1;
        let result =
            stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || body(self));
        self.depth -= 1;

        result
    }

    fn path_string(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_owned()
        } else {
            self.path.join(".")
        }
    }
}

impl std::fmt::Debug for ObjectOutput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectOutput")
            .field("written", &self.encoder.written())
            .field("references", &self.references)
            .field("depth", &self.depth)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
