//! Custom record bodies.
//!
//! A type that wants to control its own serialized form, for example to
//! write the logical contents of a linked list instead of its node pointers,
//! implements [`PersistHook`] and marks itself `#[persist(custom)]`. The
//! derive then records a [`Hook`] in the type's descriptor and the encoder
//! and decoder call it in place of the default field walk.
//!
//! The hook body is opaque to the engine. The engine terminates it with an
//! end-of-block marker and checks that marker after `read_object` returns,
//! so a hook that reads back less or more than it wrote is reported as a
//! corrupt stream instead of desynchronizing the rest of the decode.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Persistent)]
//! #[persist(custom)]
//! struct Tally {
//!     #[persist(transient)]
//!     counts: Vec<u32>,
//! }
//!
//! impl PersistHook for Tally {
//!     fn write_object(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
//!         out.write(&self.counts.iter().sum::<u32>())
//!     }
//!
//!     fn read_object(&mut self, input: &mut ObjectInput<'_>) -> Result<(), DecodeError> {
//!         self.counts = vec![input.read()?];
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;

use crate::{
    error::{DecodeError, EncodeError},
    input::ObjectInput,
    output::ObjectOutput,
    policy::Persistent,
};

/// Custom encode/decode logic replacing the default field walk.
///
/// Both halves live in one trait, so a type cannot supply one without the
/// other.
pub trait PersistHook: Persistent {
    /// Writes the record body of `self`.
    ///
    /// # Errors
    ///
    /// Propagates any error from writing values to `out`.
    fn write_object(
        &self,
        out: &mut ObjectOutput<'_>,
    ) -> Result<(), EncodeError>;

    /// Restores `self`, a freshly allocated placeholder, from the body
    /// written by [`write_object`](Self::write_object).
    ///
    /// The placeholder is already registered while this runs, so
    /// backreferences to it resolve; it is mutably borrowed for the duration
    /// of the call.
    ///
    /// # Errors
    ///
    /// Propagates any error from reading values from `input`.
    fn read_object(
        &mut self,
        input: &mut ObjectInput<'_>,
    ) -> Result<(), DecodeError>;
}

/// The encode/decode fn pointers of a [`PersistHook`] implementation.
pub struct Hook<T> {
    encode: fn(&T, &mut ObjectOutput<'_>) -> Result<(), EncodeError>,
    decode: fn(&mut T, &mut ObjectInput<'_>) -> Result<(), DecodeError>,
}

impl<T: PersistHook> Hook<T> {
    /// Captures `T`'s hook. Used by the derive macro.
    #[must_use]
    pub const fn of() -> Self {
        Self { encode: T::write_object, decode: T::read_object }
    }
}

impl<T> Hook<T> {
    pub(crate) fn encode(
        &self,
        value: &T,
        output: &mut ObjectOutput<'_>,
    ) -> Result<(), EncodeError> {
        (self.encode)(value, output)
    }

    pub(crate) fn decode(
        &self,
        value: &mut T,
        input: &mut ObjectInput<'_>,
    ) -> Result<(), DecodeError> {
        (self.decode)(value, input)
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Looks up custom hooks by type.
#[derive(Debug, Clone, Copy)]
pub struct HookRegistry;

impl HookRegistry {
    /// Returns `T`'s hook if it declared one with `#[persist(custom)]`.
    #[must_use]
    pub fn hook_for<T: Persistent>() -> Option<&'static Hook<T>> {
        T::descriptor().hook()
    }

    /// Returns `true` if `T` replaces the default walk with a hook.
    #[must_use]
    pub fn has_hook<T: Persistent>() -> bool { Self::hook_for::<T>().is_some() }
}
