//! By-value encoding.
//!
//! [`Encode`] and [`Decode`] cover everything that appears inside an object
//! record: scalars, strings, collections, plain structs and enums deriving
//! `Encode`/`Decode`, and the object handles [`Obj`] and [`AnyObj`], which
//! delegate to the object layer and so take part in identity tracking.
//!
//! # Optional values
//!
//! `Option<T>` always starts with a marker. `None` is a null marker. `Some`
//! of a plain value is a value marker followed by the value, while `Some` of
//! an object handle is the handle's own reference or definition record; the
//! associated constant [`Encode::IS_REFERENCE`] tells the two apart.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Encode, Decode)]
//! enum Shape {
//!     Circle { radius: f64 },
//!     Square(f64),
//! }
//! ```

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::{BuildHasher, Hash},
    time::Duration,
};

use crate::{
    error::{DecodeError, EncodeError},
    input::ObjectInput,
    marker::Marker,
    object::{AnyObj, Obj},
    output::ObjectOutput,
    policy::Persistent,
};


/// The most elements preallocated for a decoded collection before any of
/// them has actually been read.
const PREALLOCATION_LIMIT: usize = 4096;

/// A value that can be written into an object record.
pub trait Encode {
    /// `true` for object handles, which write their own reference or
    /// definition marker.
    const IS_REFERENCE: bool = false;

    /// Writes `self`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the sink fails or a reachable object
    /// cannot be encoded.
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError>;
}

/// A value that can be read back from an object record.
pub trait Decode: Sized {
    /// Must agree with the [`Encode::IS_REFERENCE`] of the same type.
    const IS_REFERENCE: bool = false;

    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the source fails or the bytes do not
    /// form a valid value of this type.
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError>;

    /// Reads a value whose leading marker was already consumed. Only object
    /// handles start with a marker of their own.
    ///
    /// # Errors
    ///
    /// The default rejects every marker as corrupt.
    fn decode_marked(
        marker: Marker,
        input: &mut ObjectInput<'_>,
    ) -> Result<Self, DecodeError> {
        let _ = input;
        Err(DecodeError::corrupt(format!(
            "unexpected {marker:?} marker before a plain value"
        )))
    }
}

// =============================================================================
// Scalars
// =============================================================================

macro_rules! impl_scalar {
    ($($ty:ty => $emit:ident, $read:ident;)*) => {
        $(
            impl Encode for $ty {
                fn encode(
                    &self,
                    out: &mut ObjectOutput<'_>,
                ) -> Result<(), EncodeError> {
                    out.encoder().$emit(*self)?;
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode(
                    input: &mut ObjectInput<'_>,
                ) -> Result<Self, DecodeError> {
                    Ok(input.decoder().$read()?)
                }
            }
        )*
    };
}

impl_scalar! {
    u8 => emit_u8, read_u8;
    u16 => emit_u16, read_u16;
    u32 => emit_u32, read_u32;
    u64 => emit_u64, read_u64;
    u128 => emit_u128, read_u128;
    usize => emit_usize, read_usize;
    i8 => emit_i8, read_i8;
    i16 => emit_i16, read_i16;
    i32 => emit_i32, read_i32;
    i64 => emit_i64, read_i64;
    i128 => emit_i128, read_i128;
    isize => emit_isize, read_isize;
    bool => emit_bool, read_bool;
    char => emit_char, read_char;
    f32 => emit_f32, read_f32;
    f64 => emit_f64, read_f64;
}

impl Encode for () {
    fn encode(&self, _out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        Ok(())
    }
}

impl Decode for () {
    fn decode(_input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl Encode for str {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        out.encoder().emit_str(self)?;
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        self.as_str().encode(out)
    }
}

impl Decode for String {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        Ok(input.decoder().read_str()?)
    }
}

impl Encode for Duration {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        out.write(&self.as_secs())?;
        out.write(&self.subsec_nanos())
    }
}

impl Decode for Duration {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let secs: u64 = input.read()?;
        let nanos: u32 = input.read()?;

        if nanos >= 1_000_000_000 {
            return Err(DecodeError::corrupt(format!(
                "duration has {nanos} sub-second nanoseconds"
            )));
        }

        Ok(Self::new(secs, nanos))
    }
}

// =============================================================================
// Pointers and options
// =============================================================================

impl<T: Encode + ?Sized> Encode for &T {
    const IS_REFERENCE: bool = T::IS_REFERENCE;

    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        (**self).encode(out)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    const IS_REFERENCE: bool = T::IS_REFERENCE;

    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        (**self).encode(out)
    }
}

impl<T: Decode> Decode for Box<T> {
    const IS_REFERENCE: bool = T::IS_REFERENCE;

    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        T::decode(input).map(Box::new)
    }

    fn decode_marked(
        marker: Marker,
        input: &mut ObjectInput<'_>,
    ) -> Result<Self, DecodeError> {
        T::decode_marked(marker, input).map(Box::new)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        match self {
            None => out.write_marker(Marker::Null),
            Some(value) if T::IS_REFERENCE => value.encode(out),
            Some(value) => {
                out.write_marker(Marker::Value)?;
                value.encode(out)
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        match input.read_marker()? {
            Marker::Null => Ok(None),
            Marker::Value if !T::IS_REFERENCE => T::decode(input).map(Some),
            marker @ (Marker::Reference | Marker::Definition)
                if T::IS_REFERENCE =>
            {
                T::decode_marked(marker, input).map(Some)
            }
            marker => Err(DecodeError::corrupt(format!(
                "unexpected {marker:?} marker in an optional value"
            ))),
        }
    }
}

// =============================================================================
// Object handles
// =============================================================================

impl<T: Persistent> Encode for Obj<T> {
    const IS_REFERENCE: bool = true;

    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        out.write_object(self)
    }
}

impl<T: Persistent> Decode for Obj<T> {
    const IS_REFERENCE: bool = true;

    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        input.read_object()
    }

    fn decode_marked(
        marker: Marker,
        input: &mut ObjectInput<'_>,
    ) -> Result<Self, DecodeError> {
        input.read_object_marked(marker)
    }
}

impl Encode for AnyObj {
    const IS_REFERENCE: bool = true;

    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        out.write_any(self)
    }
}

impl Decode for AnyObj {
    const IS_REFERENCE: bool = true;

    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        input.read_any()
    }

    fn decode_marked(
        marker: Marker,
        input: &mut ObjectInput<'_>,
    ) -> Result<Self, DecodeError> {
        input.read_any_marked(marker)
    }
}

// =============================================================================
// Collections
// =============================================================================

fn encode_sequence<'v, T, I>(
    len: usize,
    items: I,
    out: &mut ObjectOutput<'_>,
) -> Result<(), EncodeError>
where
    T: Encode + 'v,
    I: IntoIterator<Item = &'v T>,
{
    out.encoder().emit_usize(len)?;
    for item in items {
        out.write(item)?;
    }
    Ok(())
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_sequence(self.len(), self, out)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_sequence(self.len(), self, out)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let len = input.decoder().read_length()?;
        let mut vec = Self::with_capacity(len.min(PREALLOCATION_LIMIT));
        for _ in 0..len {
            vec.push(input.read()?);
        }
        Ok(vec)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_sequence(self.len(), self, out)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let len = input.decoder().read_length()?;
        let mut deque = Self::with_capacity(len.min(PREALLOCATION_LIMIT));
        for _ in 0..len {
            deque.push_back(input.read()?);
        }
        Ok(deque)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        for item in self {
            out.write(item)?;
        }
        Ok(())
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let items = (0..N)
            .map(|_| input.read())
            .collect::<Result<Vec<T>, _>>()?;

        items.try_into().map_err(|_| {
            DecodeError::corrupt(format!("array of {N} elements came up short"))
        })
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_sequence(self.len(), self, out)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let len = input.decoder().read_length()?;
        let mut set = Self::new();
        for _ in 0..len {
            set.insert(input.read()?);
        }
        Ok(set)
    }
}

impl<T: Encode, S> Encode for HashSet<T, S> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_sequence(self.len(), self, out)
    }
}

impl<T, S> Decode for HashSet<T, S>
where
    T: Decode + Eq + Hash,
    S: BuildHasher + Default,
{
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let len = input.decoder().read_length()?;
        let mut set = Self::with_capacity_and_hasher(
            len.min(PREALLOCATION_LIMIT),
            S::default(),
        );
        for _ in 0..len {
            set.insert(input.read()?);
        }
        Ok(set)
    }
}

fn encode_entries<'v, K, V, I>(
    len: usize,
    entries: I,
    out: &mut ObjectOutput<'_>,
) -> Result<(), EncodeError>
where
    K: Encode + 'v,
    V: Encode + 'v,
    I: IntoIterator<Item = (&'v K, &'v V)>,
{
    out.encoder().emit_usize(len)?;
    for (key, value) in entries {
        out.write(key)?;
        out.write(value)?;
    }
    Ok(())
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_entries(self.len(), self, out)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let len = input.decoder().read_length()?;
        let mut map = Self::new();
        for _ in 0..len {
            let key = input.read()?;
            let value = input.read()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        encode_entries(self.len(), self, out)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode(input: &mut ObjectInput<'_>) -> Result<Self, DecodeError> {
        let len = input.decoder().read_length()?;
        let mut map = Self::with_capacity_and_hasher(
            len.min(PREALLOCATION_LIMIT),
            S::default(),
        );
        for _ in 0..len {
            let key = input.read()?;
            let value = input.read()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

// =============================================================================
// Tuples
// =============================================================================

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode(
                &self,
                out: &mut ObjectOutput<'_>,
            ) -> Result<(), EncodeError> {
                let ($($name,)+) = self;
                $(out.write($name)?;)+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode(
                input: &mut ObjectInput<'_>,
            ) -> Result<Self, DecodeError> {
                Ok(($(input.read::<$name>()?,)+))
            }
        }
    };
}

impl_tuple!(A);
impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);
impl_tuple!(A, B, C, D, E);
impl_tuple!(A, B, C, D, E, F);
impl_tuple!(A, B, C, D, E, F, G);
impl_tuple!(A, B, C, D, E, F, G, H);
