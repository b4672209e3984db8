//! Per-pass identity tables.
//!
//! The encoder numbers every object the first time it meets it and writes a
//! backreference on every later meeting; the decoder keeps the inverse
//! mapping from number to allocated object. Both tables live exactly as long
//! as one `encode` or `decode` call, so concurrent calls never share one.

use std::{any::Any, rc::Rc};

use fxhash::FxHashMap;

use crate::{error::DecodeError, object::AnyObj};

/// The number assigned to an object the first time a pass meets it.
///
/// Ids are dense and assigned in depth-first pre-order, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferenceId(u32);

impl ReferenceId {
    /// Wraps a raw id read from a stream.
    #[must_use]
    pub const fn new(raw: u32) -> Self { Self(raw) }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    const fn index(self) -> usize { self.0 as usize }
}

/// Maps object identity to [`ReferenceId`] during one encode pass.
///
/// The table keeps every object it has numbered alive until the pass ends,
/// so an allocation freed mid-pass (say, a temporary built by a hook) can
/// never hand its address, and with it a stale id, to a different object.
#[derive(Default)]
pub struct ReferenceTable {
    ids: FxHashMap<*const (), ReferenceId>,
    pinned: Vec<Rc<dyn Any>>,
}

impl ReferenceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the id of `object` and whether it was assigned by this call.
    ///
    /// # Panics
    ///
    /// Panics if a single pass meets more than `u32::MAX` distinct objects.
    pub fn id_for(&mut self, object: &Rc<dyn Any>) -> (ReferenceId, bool) {
        let address = Rc::as_ptr(object).cast::<()>();

        if let Some(id) = self.ids.get(&address) {
            return (*id, false);
        }

        let raw = u32::try_from(self.pinned.len())
            .expect("more than u32::MAX objects in one pass");
        let id = ReferenceId(raw);

        self.ids.insert(address, id);
        self.pinned.push(Rc::clone(object));

        (id, true)
    }

    /// Returns the id of `object` if it was already numbered.
    #[must_use]
    pub fn lookup(&self, object: &Rc<dyn Any>) -> Option<ReferenceId> {
        self.ids.get(&Rc::as_ptr(object).cast::<()>()).copied()
    }

    /// Returns the number of distinct objects numbered so far.
    #[must_use]
    pub fn len(&self) -> usize { self.pinned.len() }

    /// Returns `true` if no object has been numbered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.pinned.is_empty() }
}

impl std::fmt::Debug for ReferenceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceTable")
            .field("count", &self.pinned.len())
            .finish_non_exhaustive()
    }
}

/// Maps [`ReferenceId`] back to allocated objects during one decode pass.
///
/// An object is registered as soon as its placeholder is allocated, before
/// any of its fields are read; that ordering is what lets a field refer back
/// to an object that is still being populated.
#[derive(Default)]
pub struct PlaceholderTable {
    objects: Vec<AnyObj>,
}

impl PlaceholderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers the placeholder allocated for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::CorruptStream`] if `id` is not the next id in
    /// sequence; an encoder never skips or repeats one.
    pub fn register_placeholder(
        &mut self,
        id: ReferenceId,
        object: AnyObj,
    ) -> Result<(), DecodeError> {
        if id.index() != self.objects.len() {
            return Err(DecodeError::corrupt(format!(
                "object id {} defined out of order (expected {})",
                id.get(),
                self.objects.len()
            )));
        }

        self.objects.push(object);
        Ok(())
    }

    /// Returns the object registered for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::CorruptStream`] if nothing was registered for
    /// `id`.
    pub fn resolve(&self, id: ReferenceId) -> Result<AnyObj, DecodeError> {
        self.objects.get(id.index()).cloned().ok_or_else(|| {
            DecodeError::corrupt(format!(
                "backreference to undefined object id {}",
                id.get()
            ))
        })
    }

    /// Returns the number of objects registered so far.
    #[must_use]
    pub fn len(&self) -> usize { self.objects.len() }

    /// Returns `true` if nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
}

impl std::fmt::Debug for PlaceholderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderTable")
            .field("count", &self.objects.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: i32) -> Rc<dyn Any> { Rc::new(value) }

    #[test]
    fn first_meeting_assigns_a_fresh_id() {
        let mut table = ReferenceTable::new();
        let a = object(1);
        let b = object(2);

        assert_eq!(table.id_for(&a), (ReferenceId::new(0), true));
        assert_eq!(table.id_for(&b), (ReferenceId::new(1), true));
        assert_eq!(table.id_for(&a), (ReferenceId::new(0), false));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn aliases_share_an_id() {
        let mut table = ReferenceTable::new();
        let a = object(1);
        let alias = Rc::clone(&a);

        table.id_for(&a);
        assert_eq!(table.id_for(&alias), (ReferenceId::new(0), false));
    }

    #[test]
    fn numbered_objects_stay_pinned() {
        let mut table = ReferenceTable::new();
        let a = object(1);
        let weak = Rc::downgrade(&a);

        table.id_for(&a);
        drop(a);

        assert!(weak.upgrade().is_some());
    }

    #[test]
    fn lookup_does_not_number() {
        let mut table = ReferenceTable::new();
        let a = object(1);

        assert_eq!(table.lookup(&a), None);
        table.id_for(&a);
        assert_eq!(table.lookup(&a), Some(ReferenceId::new(0)));
    }

    #[test]
    fn resolve_returns_the_registered_placeholder() {
        let mut table = PlaceholderTable::new();
        let a = AnyObj::new(7_i32);

        table.register_placeholder(ReferenceId::new(0), a.clone()).unwrap();

        assert!(AnyObj::ptr_eq(&table.resolve(ReferenceId::new(0)).unwrap(), &a));
    }

    #[test]
    fn resolving_an_unregistered_id_is_corruption() {
        let table = PlaceholderTable::new();
        let err = table.resolve(ReferenceId::new(3)).unwrap_err();

        assert!(err.is_corrupt());
    }

    #[test]
    fn out_of_order_definition_is_corruption() {
        let mut table = PlaceholderTable::new();
        let err = table
            .register_placeholder(ReferenceId::new(1), AnyObj::new(0_i32))
            .unwrap_err();

        assert!(err.is_corrupt());
        assert!(table.is_empty());
    }
}
