use std::{io::Cursor, sync::Arc, thread};

use tracing_test::traced_test;

use crate::{DecodeError, DefaultConfig, Obj, Persistent, Serializer, TypeRegistry};

#[derive(Debug, Default, Persistent)]
#[persist(tag = "t.Item")]
struct Item {
    name: String,
    children: Vec<Obj<Item>>,
}

fn tree() -> Obj<Item> {
    let leaf = Obj::new(Item { name: "leaf".to_owned(), children: Vec::new() });
    Obj::new(Item {
        name: "root".to_owned(),
        children: vec![leaf.clone(), leaf],
    })
}

#[test]
fn stream_starts_with_the_header() {
    let bytes = Serializer::<DefaultConfig>::default().encode(&tree()).unwrap();

    assert_eq!(bytes[..3], [0x0B, 0x6A, 0x01]);
}

#[test]
fn bad_magic_is_corrupt() {
    let serializer = Serializer::<DefaultConfig>::default();
    let mut bytes = serializer.encode(&tree()).unwrap();
    bytes[0] = 0xFF;

    assert!(serializer.decode::<Obj<Item>>(&bytes).unwrap_err().is_corrupt());
}

#[test]
fn unsupported_version_is_corrupt() {
    let serializer = Serializer::<DefaultConfig>::default();
    let mut bytes = serializer.encode(&tree()).unwrap();
    bytes[2] = 2;

    assert!(serializer.decode::<Obj<Item>>(&bytes).unwrap_err().is_corrupt());
}

#[test]
fn empty_input_is_corrupt() {
    let err = Serializer::<DefaultConfig>::default()
        .decode::<Obj<Item>>(&[])
        .unwrap_err();

    assert!(err.is_corrupt());
}

#[test]
fn trailing_bytes_are_rejected() {
    let serializer = Serializer::<DefaultConfig>::default();
    let mut bytes = serializer.encode(&tree()).unwrap();
    bytes.push(0);

    let err = serializer.decode::<Obj<Item>>(&bytes).unwrap_err();

    assert!(matches!(err, DecodeError::CorruptStream { ref reason } if reason.contains("trailing")));
}

#[test]
fn decode_from_leaves_the_rest_of_the_reader() {
    let serializer = Serializer::<DefaultConfig>::default();
    let mut buffer = Vec::new();

    let first = serializer.encode_to(&tree(), &mut buffer).unwrap();
    serializer.encode_to(&7_u32, &mut buffer).unwrap();

    assert_eq!(usize::try_from(first).unwrap(), buffer.len() - 4);

    let mut reader = Cursor::new(buffer);
    let root: Obj<Item> = serializer.decode_from(&mut reader).unwrap();
    let number: u32 = serializer.decode_from(&mut reader).unwrap();

    assert_eq!(root.borrow().name, "root");
    assert_eq!(number, 7);
}

#[test]
fn one_serializer_serves_many_threads() {
    let serializer = Serializer::<DefaultConfig>::new(Arc::new(TypeRegistry::new()));

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let bytes = serializer.encode(&tree()).unwrap();
                let root: Obj<Item> = serializer.decode(&bytes).unwrap();

                let root = root.borrow();
                assert!(Obj::ptr_eq(&root.children[0], &root.children[1]));
            });
        }
    });
}

#[test]
#[traced_test]
fn failures_are_logged() {
    let serializer = Serializer::<DefaultConfig>::default();

    let _ = serializer.decode::<Obj<Item>>(&[0x0B, 0x6A, 0x01, 0x13]);

    assert!(logs_contain("decode failed"));
}

#[test]
#[traced_test]
fn successful_calls_are_logged() {
    let serializer = Serializer::<DefaultConfig>::default();

    let bytes = serializer.encode(&tree()).unwrap();
    let _: Obj<Item> = serializer.decode(&bytes).unwrap();

    assert!(logs_contain("encoded"));
    assert!(logs_contain("decoded"));
}
