//! Handles for values that have identity.
//!
//! Plain Rust values are copied into the stream by value. Anything that can
//! be shared, aliased or take part in a cycle lives behind an [`Obj<T>`] (or
//! its type-erased form [`AnyObj`]). Two handles are the *same object* when
//! they point to the same allocation; that address is what the
//! [`ReferenceTable`](crate::reference::ReferenceTable) keys on.
//!
//! # Example
//!
//! ```ignore
//! let shared = Obj::new(Leaf::default());
//! let a = shared.clone();
//!
//! assert!(Obj::ptr_eq(&a, &shared));
//! ```

use std::{
    any::{Any, TypeId},
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

/// A shared, interior-mutable handle to a `T` with object identity.
///
/// Cloning the handle is cheap and yields another alias of the same object.
/// Equality of handles is identity, checked with [`Obj::ptr_eq`]; compare
/// the borrowed contents for value equality.
///
/// Cycles built from `Obj` handles keep each other alive; break them (for
/// example by clearing a `next` field) if the graph must be freed before the
/// end of the program.
pub struct Obj<T>(Rc<RefCell<T>>);

impl<T> Obj<T> {
    /// Allocates a new object.
    #[must_use]
    pub fn new(value: T) -> Self { Self(Rc::new(RefCell::new(value))) }

    /// Immutably borrows the object's state.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, T> { self.0.borrow() }

    /// Mutably borrows the object's state.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool { Rc::ptr_eq(&this.0, &other.0) }

    /// Returns the number of handles currently aliasing this object.
    #[must_use]
    pub fn alias_count(this: &Self) -> usize { Rc::strong_count(&this.0) }

    pub(crate) fn address(&self) -> *const () { Rc::as_ptr(&self.0).cast() }
}

impl<T: Any> Obj<T> {
    pub(crate) fn erase(&self) -> Rc<dyn Any> {
        let cell: Rc<dyn Any> = self.0.clone();
        cell
    }

    pub(crate) fn from_erased(cell: Rc<dyn Any>) -> Option<Self> {
        cell.downcast::<RefCell<T>>().ok().map(Self)
    }
}

impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self { Self(Rc::clone(&self.0)) }
}

// Only the address is printed: the contents may lead back to this object.
impl<T> fmt::Debug for Obj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obj<{}>({:p})", std::any::type_name::<T>(), self.address())
    }
}

/// A type-erased [`Obj`].
///
/// An `AnyObj` can hold an object of any `'static` type, which is what lets a
/// field declare "some object" and receive any registered type when decoded.
/// Whether the runtime type can actually be encoded is checked against the
/// [`TypeRegistry`](crate::registry::TypeRegistry) when the encoder reaches
/// it.
#[derive(Clone)]
pub struct AnyObj {
    cell: Rc<dyn Any>,
    type_id: TypeId,
    type_name: &'static str,
}

impl AnyObj {
    /// Allocates a new object and erases its type.
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self { Obj::new(value).into() }

    /// Returns the typed handle if the object is a `T`.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Obj<T>> {
        Obj::from_erased(Rc::clone(&self.cell))
    }

    /// Returns `true` if the object is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool { self.type_id == TypeId::of::<T>() }

    /// Returns the Rust type name of the object.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.address() == other.address()
    }

    pub(crate) const fn type_id(&self) -> TypeId { self.type_id }

    pub(crate) const fn cell(&self) -> &Rc<dyn Any> { &self.cell }

    pub(crate) fn address(&self) -> *const () { Rc::as_ptr(&self.cell).cast() }

    pub(crate) const fn from_parts(
        cell: Rc<dyn Any>,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Self {
        Self { cell, type_id, type_name }
    }
}

impl<T: Any> From<Obj<T>> for AnyObj {
    fn from(obj: Obj<T>) -> Self {
        Self {
            cell: obj.0,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Debug for AnyObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyObj<{}>({:p})", self.type_name, self.address())
    }
}
