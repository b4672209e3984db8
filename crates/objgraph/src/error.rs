//! Error types reported by encode and decode.

use std::io;

/// An error raised while encoding an object graph.
///
/// Bytes already written to a sink before the error are not a valid stream
/// and must be discarded by the caller.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A reachable value's runtime type cannot be encoded.
    #[error("`{type_name}` is not serializable (reached through `{path}`)")]
    NotSerializable {
        /// The Rust type name of the offending value.
        type_name: &'static str,

        /// The field path from the root to the offending value.
        path: String,
    },

    /// The graph nests object records deeper than the configured limit.
    #[error("object graph exceeds the nesting limit of {limit}")]
    DepthLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// The byte sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An error raised while decoding a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The stream is malformed: an unknown marker, a bad header, a truncated
    /// record, a field list that does not match the type, or a reference to
    /// an object that was never defined.
    #[error("corrupt stream: {reason}")]
    CorruptStream {
        /// What was wrong with the stream.
        reason: String,
    },

    /// A type tag does not name any known type.
    #[error("cannot resolve type tag `{tag}`")]
    ClassResolution {
        /// The unresolved tag.
        tag: String,
    },

    /// A type tag names a known type, but not the one expected at this
    /// position of the graph.
    #[error("expected an object of type `{expected}`, found `{found}`")]
    TypeMismatch {
        /// The type tag expected by the receiving field.
        expected: &'static str,

        /// The type tag found in the stream.
        found: String,
    },

    /// The stream nests object records deeper than the configured limit.
    #[error("object graph exceeds the nesting limit of {limit}")]
    DepthLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// The byte source failed for a reason other than malformed input.
    #[error(transparent)]
    Io(io::Error),
}

impl DecodeError {
    /// Creates a [`DecodeError::CorruptStream`] with the given reason.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptStream { reason: reason.into() }
    }

    /// Returns `true` for [`DecodeError::CorruptStream`].
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptStream { .. })
    }
}

impl From<io::Error> for DecodeError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => {
                Self::corrupt(format!("stream ended early: {error}"))
            }
            io::ErrorKind::InvalidData => Self::corrupt(error.to_string()),
            _ => Self::Io(error),
        }
    }
}

/// An error raised while registering a type in a
/// [`TypeRegistry`](crate::registry::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type tag `{tag}` is already registered for `{existing}`")]
pub struct RegisterError {
    /// The tag that was registered twice.
    pub tag: &'static str,

    /// The Rust type name already holding the tag.
    pub existing: &'static str,
}
