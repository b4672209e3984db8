//! Tests for shared sub-objects and cyclic graphs.
#![allow(missing_docs)]

use objgraph::{AnyObj, Obj};
use objgraph_integration_test::{
    Circle, Drawing, RingNode, Square, Team, break_ring, person, ring,
    serializer, walk_ring,
};
use tracing_test::traced_test;

#[test]
#[traced_test]
fn two_node_ring_closes_on_itself() {
    let serializer = serializer();
    let nodes = ring(2);

    let bytes = serializer.encode(&nodes[0]).unwrap();
    let decoded0: Obj<RingNode> = serializer.decode(&bytes).unwrap();

    let decoded1 = decoded0.borrow().next.clone().unwrap();
    let back = decoded1.borrow().next.clone().unwrap();

    assert!(Obj::ptr_eq(&back, &decoded0));
    assert!(!Obj::ptr_eq(&decoded1, &decoded0));
    assert_eq!(walk_ring(&decoded0, 10).unwrap(), ["node0", "node1"]);

    break_ring(&nodes[0]);
    break_ring(&decoded0);
}

#[test]
fn large_ring_keeps_its_size_and_order() {
    let serializer = serializer();
    let nodes = ring(100);

    let bytes = serializer.encode(&nodes[0]).unwrap();
    let decoded: Obj<RingNode> = serializer.decode(&bytes).unwrap();

    let labels = walk_ring(&decoded, 200).unwrap();
    let expected: Vec<_> = (0..100).map(|i| format!("node{i}")).collect();
    assert_eq!(labels, expected);

    break_ring(&nodes[0]);
    break_ring(&decoded);
}

#[test]
fn ring_entered_from_the_middle_starts_there() {
    let serializer = serializer();
    let nodes = ring(3);

    let bytes = serializer.encode(&nodes[1]).unwrap();
    let decoded: Obj<RingNode> = serializer.decode(&bytes).unwrap();

    assert_eq!(walk_ring(&decoded, 10).unwrap(), ["node1", "node2", "node0"]);

    break_ring(&nodes[0]);
    break_ring(&decoded);
}

#[test]
fn self_loop_round_trips() {
    let serializer = serializer();
    let nodes = ring(1);

    let bytes = serializer.encode(&nodes[0]).unwrap();
    let decoded: Obj<RingNode> = serializer.decode(&bytes).unwrap();

    let next = decoded.borrow().next.clone().unwrap();
    assert!(Obj::ptr_eq(&next, &decoded));

    break_ring(&nodes[0]);
    break_ring(&decoded);
}

#[test]
fn every_handle_into_a_ring_resolves_to_the_same_nodes() {
    let serializer = serializer();
    let nodes = ring(4);

    let bytes = serializer.encode(&nodes).unwrap();
    let decoded: Vec<Obj<RingNode>> = serializer.decode(&bytes).unwrap();

    assert_eq!(decoded.len(), 4);
    for (i, node) in decoded.iter().enumerate() {
        let next = node.borrow().next.clone().unwrap();
        assert!(Obj::ptr_eq(&next, &decoded[(i + 1) % 4]));
    }

    break_ring(&nodes[0]);
    break_ring(&decoded[0]);
}

#[test]
fn shared_member_is_restored_as_one_object() {
    let serializer = serializer();
    let alice = person("alice", 31);
    let bob = person("bob", 27);

    let team = Obj::new(Team {
        name: "core".to_owned(),
        members: vec![alice.clone(), bob],
        lead: Some(alice),
    });

    let bytes = serializer.encode(&team).unwrap();
    let copy: Obj<Team> = serializer.decode(&bytes).unwrap();

    let copy = copy.borrow();
    let lead = copy.lead.clone().unwrap();
    assert!(Obj::ptr_eq(&lead, &copy.members[0]));
    assert!(!Obj::ptr_eq(&lead, &copy.members[1]));

    // A change through one alias is visible through the other.
    lead.borrow_mut().age = 32;
    assert_eq!(copy.members[0].borrow().age, 32);
}

#[test]
fn aliases_across_separate_roots_share_identity() {
    let serializer = serializer();
    let shared = person("carol", 40);
    let first = Obj::new(Team {
        name: "a".to_owned(),
        members: vec![shared.clone()],
        lead: None,
    });
    let second = Obj::new(Team {
        name: "b".to_owned(),
        members: vec![shared],
        lead: None,
    });

    let bytes = serializer.encode(&(first, second)).unwrap();
    let (first, second): (Obj<Team>, Obj<Team>) = serializer.decode(&bytes).unwrap();

    assert!(Obj::ptr_eq(
        &first.borrow().members[0],
        &second.borrow().members[0]
    ));
}

#[test]
fn separate_calls_never_share_identity() {
    let serializer = serializer();
    let shared = person("dave", 50);

    let first = serializer.encode(&shared).unwrap();
    let second = serializer.encode(&shared).unwrap();
    assert_eq!(first, second);

    let a: Obj<objgraph_integration_test::Person> = serializer.decode(&first).unwrap();
    let b: Obj<objgraph_integration_test::Person> = serializer.decode(&second).unwrap();
    assert!(!Obj::ptr_eq(&a, &b));
}

#[test]
fn polymorphic_shapes_keep_their_types_and_sharing() {
    let serializer = serializer();
    let circle = AnyObj::new(Circle { radius: 2.0 });

    let drawing = Obj::new(Drawing {
        shapes: vec![circle.clone(), AnyObj::new(Square { side: 3.0 }), circle],
    });

    let bytes = serializer.encode(&drawing).unwrap();
    let copy: Obj<Drawing> = serializer.decode(&bytes).unwrap();

    let copy = copy.borrow();
    assert!(copy.shapes[0].is::<Circle>());
    assert!(copy.shapes[1].is::<Square>());
    assert!(AnyObj::ptr_eq(&copy.shapes[0], &copy.shapes[2]));

    let square = copy.shapes[1].downcast::<Square>().unwrap();
    assert!((square.borrow().side - 3.0).abs() < f64::EPSILON);
}
