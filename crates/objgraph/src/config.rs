//! Configuration for encode and decode limits.
//!
//! The [`Config`] trait is a type-level parameter of
//! [`Serializer`](crate::Serializer). Its methods have defaults, so a custom
//! configuration only overrides what it needs:
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, Default)]
//! struct Shallow;
//!
//! impl Config for Shallow {
//!     fn max_depth() -> usize { 64 }
//! }
//!
//! let serializer = Serializer::<Shallow>::new(Arc::new(TypeRegistry::new()));
//! ```

use std::fmt::Debug;

/// Remaining stack below which a nested record moves to a fresh segment.
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment allocated for deeply nested records.
pub(crate) const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Limits applied by a [`Serializer`](crate::Serializer).
///
/// Implementations must be `Send + Sync` so a serializer can be shared
/// between threads.
pub trait Config: Debug + Default + Clone + Copy + Send + Sync + 'static {
    /// The maximum number of object records nested inside one another.
    ///
    /// Encoding and decoding recurse once per nested definition record and
    /// grow the stack on demand while doing so; this bounds how much memory a
    /// deep chain or a hostile stream can claim that way. Backreferences do
    /// not count.
    ///
    /// # Default Value
    ///
    /// 1024 nested records.
    #[must_use]
    fn max_depth() -> usize { 1024 }

    /// The largest length prefix (string bytes, element count or field
    /// count) the decoder accepts before allocating.
    ///
    /// # Default Value
    ///
    /// 16 MiB.
    #[must_use]
    fn max_length() -> usize { 16 * 1024 * 1024 }
}

/// The default configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DefaultConfig;

impl Config for DefaultConfig {}
