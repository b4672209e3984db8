//! Tests for which values can and cannot be serialized.
#![allow(missing_docs)]

use objgraph::{AnyObj, EncodeError, Obj};
use objgraph_integration_test::{
    CanNotSerialize, CanSerialize, Wrapper, registry, serializer,
};

#[test]
fn serializable_type_round_trips_to_a_distinct_copy() {
    let serializer = serializer();
    let instance = Obj::new(CanSerialize);

    let bytes = serializer.encode(&instance).unwrap();
    let copy: Obj<CanSerialize> = serializer.decode(&bytes).unwrap();

    assert!(!Obj::ptr_eq(&instance, &copy));
}

#[test]
fn serializable_type_round_trips_behind_an_erased_handle() {
    let serializer = serializer();

    let bytes = serializer.encode(&AnyObj::new(CanSerialize)).unwrap();
    let copy: AnyObj = serializer.decode(&bytes).unwrap();

    assert!(copy.is::<CanSerialize>());
}

#[test]
fn non_serializable_root_is_rejected() {
    let err = serializer()
        .encode(&AnyObj::new(CanNotSerialize { secret: 7 }))
        .unwrap_err();

    assert!(matches!(err, EncodeError::NotSerializable { .. }));
}

#[test]
fn non_serializable_runtime_value_is_rejected_where_it_is_reached() {
    let wrapper = Obj::new(Wrapper {
        payload: Some(AnyObj::new(CanNotSerialize::default())),
    });

    let err = serializer().encode(&wrapper).unwrap_err();

    match err {
        EncodeError::NotSerializable { type_name, path } => {
            assert!(type_name.ends_with("CanNotSerialize"));
            assert_eq!(path, "payload");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn serializable_runtime_value_behind_the_same_field_is_accepted() {
    let serializer = serializer();
    let wrapper = Obj::new(Wrapper {
        payload: Some(AnyObj::new(CanSerialize)),
    });

    let bytes = serializer.encode(&wrapper).unwrap();
    let copy: Obj<Wrapper> = serializer.decode(&bytes).unwrap();

    let copy = copy.borrow();
    assert!(copy.payload.as_ref().is_some_and(AnyObj::is::<CanSerialize>));
}

#[test]
fn empty_wrapper_round_trips() {
    let serializer = serializer();

    let bytes = serializer.encode(&Obj::new(Wrapper::default())).unwrap();
    let copy: Obj<Wrapper> = serializer.decode(&bytes).unwrap();

    assert!(copy.borrow().payload.is_none());
}

#[test]
fn registry_lists_every_fixture_tag() {
    let registry = registry();

    assert!(registry.contains_tag("fixtures.CanSerialize"));
    assert!(!registry.contains::<CanNotSerialize>());
}
