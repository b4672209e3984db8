//! Tests for types that write their own record body.
#![allow(missing_docs)]

use objgraph::{HookRegistry, Obj};
use objgraph_integration_test::{StringList, registry, serializer};

fn list(items: &[&str]) -> StringList {
    let mut list = StringList::new();
    for item in items.iter().rev() {
        list.push_front(item);
    }
    list
}

#[test]
fn list_tracks_its_contents() {
    let list = list(&["cats", "dogs"]);

    assert_eq!(list.len(), 2);
    assert!(list.contains("cats"));
    assert!(!list.contains("birds"));
    assert_eq!(list.to_vec(), ["cats", "dogs"]);
}

#[test]
fn hook_is_selected_for_the_list() {
    assert!(HookRegistry::has_hook::<StringList>());
    assert!(registry().has_hook("fixtures.StringList"));
}

#[test]
fn logical_contents_survive_a_round_trip() {
    let serializer = serializer();
    let original = Obj::new(list(&["cats", "dogs", "fish"]));

    let bytes = serializer.encode(&original).unwrap();
    let copy: Obj<StringList> = serializer.decode(&bytes).unwrap();

    let copy = copy.borrow();
    assert_eq!(copy.len(), 3);
    assert!(copy.contains("cats"));
    assert!(copy.contains("dogs"));
    assert!(copy.contains("fish"));
    assert_eq!(copy.to_vec(), ["cats", "dogs", "fish"]);
}

#[test]
fn empty_list_round_trips() {
    let serializer = serializer();

    let bytes = serializer.encode(&Obj::new(StringList::new())).unwrap();
    let copy: Obj<StringList> = serializer.decode(&bytes).unwrap();

    assert!(copy.borrow().is_empty());
}

#[test]
fn decoded_list_accepts_new_items() {
    let serializer = serializer();

    let bytes = serializer.encode(&Obj::new(list(&["cats"]))).unwrap();
    let copy: Obj<StringList> = serializer.decode(&bytes).unwrap();

    copy.borrow_mut().push_front("dogs");

    assert_eq!(copy.borrow().to_vec(), ["dogs", "cats"]);
}

#[test]
fn node_pointers_are_not_written() {
    let bytes = serializer().encode(&Obj::new(list(&["cats"]))).unwrap();

    // One definition record: the list itself, none for its nodes.
    let definitions = bytes
        .iter()
        .filter(|byte| **byte == objgraph::Marker::Definition.byte())
        .count();
    assert_eq!(definitions, 1);
}

#[test]
fn shared_list_is_restored_once() {
    let serializer = serializer();
    let shared = Obj::new(list(&["cats"]));

    let bytes = serializer.encode(&vec![shared.clone(), shared]).unwrap();
    let copies: Vec<Obj<StringList>> = serializer.decode(&bytes).unwrap();

    assert!(Obj::ptr_eq(&copies[0], &copies[1]));
}
