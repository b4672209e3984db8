//! Common fixtures shared by the `objgraph` integration tests.
//!
//! This crate provides the object types the tests build graphs from.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]

use std::sync::{
    Arc,
    atomic::{AtomicI32, Ordering},
};

use objgraph::{
    AnyObj, DecodeError, DefaultConfig, EncodeError, Obj, ObjectInput,
    ObjectOutput, PersistHook, Persistent, Serializer, TypeRegistry,
};

// ============================================================================
// Serializable and Non-Serializable Types
// ============================================================================

/// A type with no state that opts into persistence.
#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.CanSerialize")]
pub struct CanSerialize;

/// A type that never opts into persistence.
#[derive(Debug, Default)]
pub struct CanNotSerialize {
    pub secret: u64,
}

/// Declares "some object" and may receive a value of any runtime type.
#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Wrapper")]
pub struct Wrapper {
    pub payload: Option<AnyObj>,
}

// ============================================================================
// Transient and Type-Level State
// ============================================================================

/// Type-level state of [`Record`]: shared by every instance and outside the
/// serialization boundary.
pub static RECORD_STATIC: AtomicI32 = AtomicI32::new(5);

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Record")]
pub struct Record {
    pub persistent_int: i32,
    pub persistent_string: String,
    #[persist(transient)]
    pub transient_int: i32,
    #[persist(transient)]
    pub transient_string: Option<String>,
}

impl Record {
    pub fn new(
        persistent_int: i32,
        persistent_string: &str,
        transient_int: i32,
        transient_string: &str,
    ) -> Self {
        Self {
            persistent_int,
            persistent_string: persistent_string.to_owned(),
            transient_int,
            transient_string: Some(transient_string.to_owned()),
        }
    }

    pub fn static_value() -> i32 { RECORD_STATIC.load(Ordering::SeqCst) }

    pub fn set_static_value(value: i32) {
        RECORD_STATIC.store(value, Ordering::SeqCst);
    }
}

// ============================================================================
// Custom Hook: Circular String List
// ============================================================================

#[derive(Debug)]
struct ListNode {
    datum: Option<String>,
    next: Option<Obj<ListNode>>,
}

/// A circular singly-linked list of strings with a sentinel head.
///
/// Its node pointers are transient; the hook writes only the logical
/// contents (a count followed by the strings) and rebuilds the nodes when
/// read back.
#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.StringList", custom)]
pub struct StringList {
    #[persist(transient)]
    size: usize,
    #[persist(transient)]
    head: Option<Obj<ListNode>>,
}

impl StringList {
    pub fn new() -> Self {
        let mut list = Self::default();
        list.initialize();
        list
    }

    fn initialize(&mut self) {
        self.clear_links();

        let head = Obj::new(ListNode { datum: None, next: None });
        head.borrow_mut().next = Some(head.clone());

        self.head = Some(head);
        self.size = 0;
    }

    /// Inserts `datum` at the front.
    pub fn push_front(&mut self, datum: &str) {
        if self.head.is_none() {
            self.initialize();
        }
        let Some(head) = &self.head else { return };

        let first = head.borrow().next.clone();
        let node = Obj::new(ListNode { datum: Some(datum.to_owned()), next: first });
        head.borrow_mut().next = Some(node);

        self.size += 1;
    }

    pub fn len(&self) -> usize { self.size }

    pub fn is_empty(&self) -> bool { self.size == 0 }

    pub fn contains(&self, datum: &str) -> bool {
        self.to_vec().iter().any(|item| item == datum)
    }

    /// Returns the strings from front to back.
    pub fn to_vec(&self) -> Vec<String> {
        let Some(head) = &self.head else { return Vec::new() };

        let mut items = Vec::with_capacity(self.size);
        let mut current = head.borrow().next.clone();

        while let Some(node) = current {
            if Obj::ptr_eq(&node, head) {
                break;
            }

            let node = node.borrow();
            items.extend(node.datum.clone());
            current = node.next.clone();
        }

        items
    }

    /// Opens the ring so the nodes can be freed.
    fn clear_links(&mut self) {
        let Some(head) = self.head.take() else { return };

        let mut current = head.borrow_mut().next.take();
        while let Some(node) = current {
            if Obj::ptr_eq(&node, &head) {
                break;
            }
            current = node.borrow_mut().next.take();
        }
    }
}

impl Drop for StringList {
    fn drop(&mut self) { self.clear_links(); }
}

impl PersistHook for StringList {
    fn write_object(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        out.write(&self.to_vec())
    }

    fn read_object(&mut self, input: &mut ObjectInput<'_>) -> Result<(), DecodeError> {
        let items: Vec<String> = input.read()?;

        self.initialize();
        for item in items.iter().rev() {
            self.push_front(item);
        }

        Ok(())
    }
}

// ============================================================================
// Rings
// ============================================================================

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.RingNode")]
pub struct RingNode {
    pub label: String,
    pub next: Option<Obj<RingNode>>,
}

/// Builds a ring of `size` nodes labelled `node0`, `node1`, ... where the
/// last node points back to the first. Returns the nodes in ring order.
pub fn ring(size: usize) -> Vec<Obj<RingNode>> {
    let nodes: Vec<_> = (0..size)
        .map(|i| Obj::new(RingNode { label: format!("node{i}"), next: None }))
        .collect();

    for (i, node) in nodes.iter().enumerate() {
        node.borrow_mut().next = Some(nodes[(i + 1) % size].clone());
    }

    nodes
}

/// Follows `next` from `start` until it returns to `start`, collecting
/// labels. Gives up after `limit` steps and returns `None`.
pub fn walk_ring(start: &Obj<RingNode>, limit: usize) -> Option<Vec<String>> {
    let mut labels = vec![start.borrow().label.clone()];
    let mut current = start.borrow().next.clone()?;

    while !Obj::ptr_eq(&current, start) {
        if labels.len() >= limit {
            return None;
        }

        labels.push(current.borrow().label.clone());
        let next = current.borrow().next.clone()?;
        current = next;
    }

    Some(labels)
}

/// Opens a ring so its nodes can be freed.
pub fn break_ring(start: &Obj<RingNode>) {
    let mut current = start.borrow_mut().next.take();

    while let Some(node) = current {
        if Obj::ptr_eq(&node, start) {
            break;
        }
        current = node.borrow_mut().next.take();
    }
}

// ============================================================================
// Shared Sub-Objects
// ============================================================================

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Person")]
pub struct Person {
    pub name: String,
    pub age: u8,
}

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Team")]
pub struct Team {
    pub name: String,
    pub members: Vec<Obj<Person>>,
    pub lead: Option<Obj<Person>>,
}

pub fn person(name: &str, age: u8) -> Obj<Person> {
    Obj::new(Person { name: name.to_owned(), age })
}

// ============================================================================
// Polymorphic Shapes
// ============================================================================

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Circle")]
pub struct Circle {
    pub radius: f64,
}

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Square")]
pub struct Square {
    pub side: f64,
}

#[derive(Debug, Default, Persistent)]
#[persist(tag = "fixtures.Drawing")]
pub struct Drawing {
    pub shapes: Vec<AnyObj>,
}

/// Returns a registry holding every fixture that may appear behind an
/// [`AnyObj`].
pub fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();

    registry.register::<CanSerialize>().expect("unique tag");
    registry.register::<Record>().expect("unique tag");
    registry.register::<StringList>().expect("unique tag");
    registry.register::<RingNode>().expect("unique tag");
    registry.register::<Person>().expect("unique tag");
    registry.register::<Circle>().expect("unique tag");
    registry.register::<Square>().expect("unique tag");
    registry.register::<Drawing>().expect("unique tag");

    Arc::new(registry)
}

/// Returns a serializer over [`registry`].
pub fn serializer() -> Serializer<DefaultConfig> { Serializer::new(registry()) }
