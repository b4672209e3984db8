//! Property tests over generated graphs.
#![allow(missing_docs)]

use objgraph::{Obj, Serializer};
use objgraph_integration_test::{
    Person, RingNode, Team, break_ring, ring, serializer, walk_ring,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ring_of_any_size_keeps_size_and_order(size in 1_usize..64, start in 0_usize..64) {
        let serializer = serializer();
        let nodes = ring(size);
        let start = start % size;

        let bytes = serializer.encode(&nodes[start]).unwrap();
        let decoded: Obj<RingNode> = serializer.decode(&bytes).unwrap();

        let expected: Vec<_> = (0..size)
            .map(|i| format!("node{}", (start + i) % size))
            .collect();
        let walked = walk_ring(&decoded, size + 1);

        break_ring(&nodes[0]);
        break_ring(&decoded);

        prop_assert_eq!(walked, Some(expected));
    }

    #[test]
    fn aliasing_pattern_is_preserved(
        people in 1_usize..8,
        picks in prop::collection::vec(0_usize..8, 0..24),
    ) {
        let serializer = serializer();
        let pool: Vec<_> = (0..people)
            .map(|i| Obj::new(Person { name: format!("p{i}"), age: 30 }))
            .collect();
        let members: Vec<_> = picks.iter().map(|pick| pool[pick % people].clone()).collect();

        let team = Obj::new(Team { name: "t".to_owned(), members, lead: None });

        let bytes = serializer.encode(&team).unwrap();
        let copy: Obj<Team> = serializer.decode(&bytes).unwrap();
        let copy = copy.borrow();

        prop_assert_eq!(copy.members.len(), picks.len());
        for (i, a) in picks.iter().enumerate() {
            for (j, b) in picks.iter().enumerate() {
                let same = a % people == b % people;
                prop_assert_eq!(Obj::ptr_eq(&copy.members[i], &copy.members[j]), same);
            }
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let serializer = Serializer::<objgraph::DefaultConfig>::default();

        let _ = serializer.decode::<Obj<RingNode>>(&bytes);
        let _ = serializer.decode::<Vec<Option<String>>>(&bytes);
    }
}
