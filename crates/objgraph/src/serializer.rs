//! The entry point: encoding a root to bytes and decoding bytes to a root.
//!
//! Every call builds its own [`ObjectOutput`] or [`ObjectInput`], so a
//! [`Serializer`] holds no per-call state and one instance can serve any
//! number of sequential or concurrent calls.

use std::{
    fmt,
    io::{Read, Write},
    marker::PhantomData,
    sync::Arc,
};

use tracing::instrument;

use crate::{
    config::{Config, DefaultConfig},
    error::{DecodeError, EncodeError},
    input::ObjectInput,
    marker::{STREAM_MAGIC, STREAM_VERSION},
    output::ObjectOutput,
    registry::TypeRegistry,
    value::{Decode, Encode},
};

#[cfg(test)]
mod test;

/// Encodes object graphs to bytes and decodes them back.
///
/// # Example
///
/// ```ignore
/// let serializer = Serializer::<DefaultConfig>::default();
///
/// let bytes = serializer.encode(&root)?;
/// let copy: Obj<Node> = serializer.decode(&bytes)?;
/// ```
pub struct Serializer<C: Config = DefaultConfig> {
    registry: Arc<TypeRegistry>,
    _config: PhantomData<fn() -> C>,
}

impl<C: Config> Serializer<C> {
    /// Creates a serializer resolving type-erased objects through
    /// `registry`.
    #[must_use]
    pub const fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry, _config: PhantomData }
    }

    /// Returns the type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry { &self.registry }

    /// Encodes the graph reachable from `root` into a fresh buffer.
    ///
    /// # Errors
    ///
    /// See [`encode_to`](Self::encode_to).
    pub fn encode<V: Encode + ?Sized>(
        &self,
        root: &V,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        self.encode_to(root, &mut bytes)?;
        Ok(bytes)
    }

    /// Encodes the graph reachable from `root` into `writer` and returns
    /// the number of bytes written.
    ///
    /// On error the bytes already written are not a valid stream.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::NotSerializable`] if a reachable object's runtime
    ///   type is not registered.
    /// - [`EncodeError::DepthLimitExceeded`] if definition records nest
    ///   deeper than [`Config::max_depth`].
    /// - [`EncodeError::Io`] if `writer` fails.
    #[instrument(
        skip_all,
        level = "debug",
        fields(root = std::any::type_name::<V>())
    )]
    pub fn encode_to<V: Encode + ?Sized>(
        &self,
        root: &V,
        writer: &mut dyn Write,
    ) -> Result<u64, EncodeError> {
        let mut out = ObjectOutput::new(writer, &self.registry, C::max_depth());

        out.encoder().emit_raw_bytes(&STREAM_MAGIC)?;
        out.encoder().emit_u8(STREAM_VERSION)?;

        if let Err(error) = out.write(root) {
            tracing::warn!(%error, "encode failed");
            return Err(error);
        }

        tracing::debug!(
            bytes = out.bytes_written(),
            objects = out.objects_written(),
            "encoded"
        );

        Ok(out.bytes_written())
    }

    /// Decodes a complete stream. Bytes left over after the root record are
    /// rejected.
    ///
    /// # Errors
    ///
    /// See [`decode_from`](Self::decode_from).
    pub fn decode<V: Decode>(&self, bytes: &[u8]) -> Result<V, DecodeError> {
        let mut remaining = bytes;
        let value = self.decode_from(&mut remaining)?;

        if !remaining.is_empty() {
            let error = DecodeError::corrupt(format!(
                "{} trailing bytes after the root record",
                remaining.len()
            ));
            tracing::warn!(%error, "decode failed");
            return Err(error);
        }

        Ok(value)
    }

    /// Decodes one stream from `reader`, leaving anything after the root
    /// record unread.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::CorruptStream`] for a bad header, an unknown
    ///   marker, a truncated stream or a record that does not match its
    ///   type.
    /// - [`DecodeError::ClassResolution`] for an unknown type tag.
    /// - [`DecodeError::TypeMismatch`] if a record holds a type other than
    ///   the one expected at its position.
    /// - [`DecodeError::DepthLimitExceeded`] if definition records nest
    ///   deeper than [`Config::max_depth`].
    /// - [`DecodeError::Io`] if `reader` fails.
    #[instrument(
        skip_all,
        level = "debug",
        fields(root = std::any::type_name::<V>())
    )]
    pub fn decode_from<V: Decode>(
        &self,
        reader: &mut dyn Read,
    ) -> Result<V, DecodeError> {
        let mut input = ObjectInput::new(
            reader,
            &self.registry,
            C::max_depth(),
            C::max_length(),
        );

        let result = read_header(&mut input).and_then(|()| input.read::<V>());

        match &result {
            Ok(_) => tracing::debug!(
                bytes = input.bytes_read(),
                objects = input.objects_read(),
                "decoded"
            ),
            Err(error) => tracing::warn!(%error, "decode failed"),
        }

        result
    }
}

fn read_header(input: &mut ObjectInput<'_>) -> Result<(), DecodeError> {
    let magic = input.decoder().read_raw_bytes(STREAM_MAGIC.len())?;
    if magic != STREAM_MAGIC {
        return Err(DecodeError::corrupt(format!(
            "bad stream magic {magic:02x?}"
        )));
    }

    let version = input.decoder().read_u8()?;
    if version != STREAM_VERSION {
        return Err(DecodeError::corrupt(format!(
            "unsupported stream version {version}"
        )));
    }

    Ok(())
}

impl<C: Config> Default for Serializer<C> {
    fn default() -> Self { Self::new(Arc::new(TypeRegistry::new())) }
}

impl<C: Config> Clone for Serializer<C> {
    fn clone(&self) -> Self { Self::new(Arc::clone(&self.registry)) }
}

impl<C: Config> fmt::Debug for Serializer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("config", &C::default())
            .field("registered_types", &self.registry.len())
            .finish()
    }
}
