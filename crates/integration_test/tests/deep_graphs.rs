//! Tests for graphs nested up to and beyond the depth limit.
#![allow(missing_docs)]

use objgraph::{
    Config, DecodeError, DefaultConfig, EncodeError, Obj, Serializer,
};
use objgraph_integration_test::{
    RingNode, break_ring, registry, ring, serializer, walk_ring,
};

#[derive(Debug, Clone, Copy, Default)]
struct Deep;

impl Config for Deep {
    fn max_depth() -> usize { 50_000 }
}

fn deep_serializer() -> Serializer<Deep> { Serializer::new(registry()) }

#[test]
fn ring_at_the_default_limit_round_trips() {
    let size = DefaultConfig::max_depth();
    let serializer = serializer();
    let nodes = ring(size);

    let bytes = serializer.encode(&nodes[0]).unwrap();
    let decoded: Obj<RingNode> = serializer.decode(&bytes).unwrap();

    let labels = walk_ring(&decoded, size + 1).unwrap();
    assert_eq!(labels.len(), size);
    assert_eq!(labels[size - 1], format!("node{}", size - 1));

    break_ring(&nodes[0]);
    break_ring(&decoded);
}

#[test]
fn ring_one_past_the_default_limit_fails_to_encode() {
    let limit = DefaultConfig::max_depth();
    let nodes = ring(limit + 1);

    let err = serializer().encode(&nodes[0]).unwrap_err();

    assert!(matches!(err, EncodeError::DepthLimitExceeded { limit: l } if l == limit));

    break_ring(&nodes[0]);
}

#[test]
fn ring_one_past_the_default_limit_fails_to_decode() {
    let limit = DefaultConfig::max_depth();
    let nodes = ring(limit + 1);

    let bytes = deep_serializer().encode(&nodes[0]).unwrap();
    break_ring(&nodes[0]);

    let err = serializer().decode::<Obj<RingNode>>(&bytes).unwrap_err();

    assert!(matches!(err, DecodeError::DepthLimitExceeded { limit: l } if l == limit));
}

#[test]
fn ring_far_deeper_than_one_thread_stack_round_trips() {
    let size = 20_000;
    let serializer = deep_serializer();
    let nodes = ring(size);

    let bytes = serializer.encode(&nodes[0]).unwrap();
    let decoded: Obj<RingNode> = serializer.decode(&bytes).unwrap();

    assert_eq!(walk_ring(&decoded, size + 1).map(|labels| labels.len()), Some(size));

    break_ring(&nodes[0]);
    break_ring(&decoded);
}
