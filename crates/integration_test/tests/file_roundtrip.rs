//! Tests for streams written to and read from files.
#![allow(missing_docs)]

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
};

use objgraph::{DefaultConfig, Obj, Serializer};
use objgraph_integration_test::{Team, person, serializer};
use tempfile::TempDir;

#[test]
fn array_of_longs_round_trips_through_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("longs.bin");
    let serializer = Serializer::<DefaultConfig>::default();

    let longs = vec![0_i64; 10];

    let mut writer = BufWriter::new(File::create(&path).unwrap());
    serializer.encode_to(&longs, &mut writer).unwrap();
    writer.flush().unwrap();
    drop(writer);

    let mut reader = BufReader::new(File::open(&path).unwrap());
    let decoded: Vec<i64> = serializer.decode_from(&mut reader).unwrap();

    assert_eq!(decoded, longs);
}

#[test]
fn graph_round_trips_through_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("team.bin");
    let serializer = serializer();

    let alice = person("alice", 31);
    let team = Obj::new(Team {
        name: "core".to_owned(),
        members: vec![alice.clone()],
        lead: Some(alice),
    });

    let bytes = serializer.encode(&team).unwrap();
    std::fs::write(&path, &bytes).unwrap();

    let read_back = std::fs::read(&path).unwrap();
    let copy: Obj<Team> = serializer.decode(&read_back).unwrap();

    let copy = copy.borrow();
    assert_eq!(copy.name, "core");
    assert!(Obj::ptr_eq(copy.lead.as_ref().unwrap(), &copy.members[0]));
}

#[test]
fn several_streams_share_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("many.bin");
    let serializer = serializer();

    let mut writer = BufWriter::new(File::create(&path).unwrap());
    for i in 0..3_u32 {
        serializer.encode_to(&person(&format!("p{i}"), 20), &mut writer).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    let mut reader = BufReader::new(File::open(&path).unwrap());
    let names: Vec<String> = (0..3)
        .map(|_| {
            let person: Obj<objgraph_integration_test::Person> =
                serializer.decode_from(&mut reader).unwrap();
            person.borrow().name.clone()
        })
        .collect();

    assert_eq!(names, ["p0", "p1", "p2"]);
}
