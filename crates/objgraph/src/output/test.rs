use std::sync::Arc;

use crate::{
    AnyObj, Config, DecodeError, DefaultConfig, EncodeError, Marker, Obj,
    ObjectInput, ObjectOutput, PersistHook, Persistent, Serializer,
    TypeRegistry,
};

#[derive(Debug, Default, Persistent)]
#[persist(tag = "t.Node")]
struct Node {
    id: u8,
    next: Option<Obj<Node>>,
}

#[derive(Debug, Default, Persistent)]
#[persist(tag = "t.Pair")]
struct Pair {
    left: Option<Obj<Node>>,
    right: Option<Obj<Node>>,
}

#[derive(Debug, Default, Persistent)]
#[persist(tag = "t.Holder")]
struct Holder {
    name: String,
    payload: Option<AnyObj>,
}

/// Not registered anywhere, so it cannot be written behind an `AnyObj`.
#[derive(Debug, Default)]
struct Opaque;

#[derive(Debug, Default, Persistent)]
#[persist(tag = "t.Counter", custom)]
struct Counter {
    #[persist(transient)]
    hits: u32,
}

impl PersistHook for Counter {
    fn write_object(&self, out: &mut ObjectOutput<'_>) -> Result<(), EncodeError> {
        out.write(&self.hits)
    }

    fn read_object(&mut self, input: &mut ObjectInput<'_>) -> Result<(), DecodeError> {
        self.hits = input.read()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Shallow;

impl Config for Shallow {
    fn max_depth() -> usize { 2 }
}

fn count(bytes: &[u8], marker: Marker) -> usize {
    bytes.iter().filter(|byte| **byte == marker.byte()).count()
}

#[test]
fn shared_object_is_defined_once() {
    let shared = Obj::new(Node { id: 9, next: None });
    let pair = Obj::new(Pair {
        left: Some(shared.clone()),
        right: Some(shared),
    });

    let bytes = Serializer::<DefaultConfig>::default().encode(&pair).unwrap();

    // One definition for the pair, one for the node, then a backreference.
    assert_eq!(count(&bytes, Marker::Definition), 2);
    assert_eq!(count(&bytes, Marker::Reference), 1);
}

#[test]
fn self_reference_becomes_a_backreference() {
    let node = Obj::new(Node { id: 1, next: None });
    node.borrow_mut().next = Some(node.clone());

    let bytes = Serializer::<DefaultConfig>::default().encode(&node).unwrap();

    assert_eq!(count(&bytes, Marker::Definition), 1);
    assert_eq!(count(&bytes, Marker::Reference), 1);

    node.borrow_mut().next = None;
}

#[test]
fn unregistered_runtime_type_is_not_serializable() {
    let holder = Obj::new(Holder {
        name: "h".to_owned(),
        payload: Some(AnyObj::new(Opaque)),
    });

    let err = Serializer::<DefaultConfig>::default().encode(&holder).unwrap_err();

    match err {
        EncodeError::NotSerializable { type_name, path } => {
            assert!(type_name.ends_with("Opaque"));
            assert_eq!(path, "payload");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unregistered_root_reports_the_root_path() {
    let err = Serializer::<DefaultConfig>::default()
        .encode(&AnyObj::new(Opaque))
        .unwrap_err();

    assert!(matches!(
        err,
        EncodeError::NotSerializable { ref path, .. } if path == "<root>"
    ));
}

#[test]
fn registered_runtime_type_is_written() {
    let mut registry = TypeRegistry::new();
    registry.register::<Node>().unwrap();

    let holder = Obj::new(Holder {
        name: "h".to_owned(),
        payload: Some(AnyObj::new(Node::default())),
    });

    let serializer = Serializer::<DefaultConfig>::new(Arc::new(registry));
    assert!(serializer.encode(&holder).is_ok());
}

#[test]
fn typed_handle_already_written_may_reappear_erased() {
    let node = Obj::new(Node::default());
    let root = (node.clone(), AnyObj::from(node));

    // `Node` is not registered, but the erased handle is a backreference.
    assert!(Serializer::<DefaultConfig>::default().encode(&root).is_ok());
}

#[test]
fn hook_body_is_closed_by_an_end_marker() {
    let counter = Obj::new(Counter { hits: 3 });

    let bytes = Serializer::<DefaultConfig>::default().encode(&counter).unwrap();

    assert_eq!(bytes.last(), Some(&Marker::EndBlock.byte()));
}

#[test]
fn nesting_beyond_the_limit_is_rejected() {
    let tail = Obj::new(Node { id: 3, next: None });
    let middle = Obj::new(Node { id: 2, next: Some(tail) });
    let head = Obj::new(Node { id: 1, next: Some(middle) });

    let err = Serializer::<Shallow>::default().encode(&head).unwrap_err();

    assert!(matches!(err, EncodeError::DepthLimitExceeded { limit: 2 }));
}

#[test]
fn backreferences_do_not_count_towards_depth() {
    let a = Obj::new(Node { id: 1, next: None });
    let b = Obj::new(Node { id: 2, next: Some(a.clone()) });
    a.borrow_mut().next = Some(b);

    assert!(Serializer::<Shallow>::default().encode(&a).is_ok());

    a.borrow_mut().next = None;
}
