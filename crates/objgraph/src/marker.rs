//! Record markers and the stream header.
//!
//! Every marker byte is at Hamming distance 4 from every other marker, so a
//! single flipped bit always produces an unknown marker instead of a
//! different valid one.

use crate::error::DecodeError;

/// The first two bytes of every stream.
pub const STREAM_MAGIC: [u8; 2] = [0x0B, 0x6A];

/// The wire format version following [`STREAM_MAGIC`].
pub const STREAM_VERSION: u8 = 1;

/// The one-byte tag that starts an object occurrence or an optional value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    /// An absent value (`None`).
    Null = 0x66,

    /// A backreference to an object already defined in this stream.
    Reference = 0x3C,

    /// The first occurrence of an object: id, type tag and body follow.
    Definition = 0x5A,

    /// A present non-reference optional value.
    Value = 0x99,

    /// Terminates a hook-written record body.
    EndBlock = 0x0F,
}

impl Marker {
    /// Returns the byte written for this marker.
    #[must_use]
    pub const fn byte(self) -> u8 { self as u8 }
}

impl TryFrom<u8> for Marker {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x66 => Ok(Self::Null),
            0x3C => Ok(Self::Reference),
            0x5A => Ok(Self::Definition),
            0x99 => Ok(Self::Value),
            0x0F => Ok(Self::EndBlock),
            _ => Err(DecodeError::corrupt(format!(
                "unknown marker byte {byte:#04x}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Marker; 5] = [
        Marker::Null,
        Marker::Reference,
        Marker::Definition,
        Marker::Value,
        Marker::EndBlock,
    ];

    #[test]
    fn markers_round_trip_through_bytes() {
        for marker in ALL {
            assert_eq!(Marker::try_from(marker.byte()).unwrap(), marker);
        }
    }

    #[test]
    fn single_bit_flip_never_yields_another_marker() {
        for marker in ALL {
            for bit in 0..8 {
                let flipped = marker.byte() ^ (1 << bit);
                assert!(Marker::try_from(flipped).is_err());
            }
        }
    }
}
