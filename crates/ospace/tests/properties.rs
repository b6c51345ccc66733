//! Property tests over random mutation sequences.
//!
//! - differential saves followed by a reload reproduce the volatile result
//! - the store built by differential saves is identical to a single full save

use std::collections::BTreeMap;

use ospace::{ObjectSpace, SpaceError, SpaceResult};
use ospace_state::{InMemoryStateStore, StateReader};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    ListAdd(i32),
    ListInsert(usize, i32),
    ListRemoveAt(usize),
    ListSet(usize, i32),
    DictInsert(u8, i32),
    DictRemove(u8),
    Enqueue(i32),
    Dequeue,
    SetAdd(u8),
    SetRemove(u8),
    SortedSetAdd(u8),
    SortedSetRemove(u8),
    LinkedAddFirst(i32),
    LinkedAddLast(i32),
    LinkedRemoveFirst,
    Push(i32),
    Pop,
    RecreateList,
    Save,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::ListAdd),
        (0usize..8, any::<i32>()).prop_map(|(i, v)| Op::ListInsert(i, v)),
        (0usize..8).prop_map(Op::ListRemoveAt),
        (0usize..8, any::<i32>()).prop_map(|(i, v)| Op::ListSet(i, v)),
        (0u8..6, any::<i32>()).prop_map(|(k, v)| Op::DictInsert(k, v)),
        (0u8..6).prop_map(Op::DictRemove),
        any::<i32>().prop_map(Op::Enqueue),
        Just(Op::Dequeue),
        (0u8..6).prop_map(Op::SetAdd),
        (0u8..6).prop_map(Op::SetRemove),
        (0u8..6).prop_map(Op::SortedSetAdd),
        (0u8..6).prop_map(Op::SortedSetRemove),
        any::<i32>().prop_map(Op::LinkedAddFirst),
        any::<i32>().prop_map(Op::LinkedAddLast),
        Just(Op::LinkedRemoveFirst),
        any::<i32>().prop_map(Op::Push),
        Just(Op::Pop),
        Just(Op::RecreateList),
        Just(Op::Save),
    ]
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn setup(space: &mut ObjectSpace) {
    space.create_list::<i32>("l").unwrap();
    space.create_dictionary::<u8, i32>("d").unwrap();
    space.create_queue::<i32>("q").unwrap();
    space.create_set::<u8>("s").unwrap();
    space.create_sorted_set::<u8>("ss").unwrap();
    space.create_linked_list::<i32>("ll").unwrap();
    space.create_stack::<i32>("st").unwrap();
}

/// Apply one operation. Out-of-range and empty-collection failures are part
/// of the contract, so they are tolerated as long as both spaces agree.
fn apply(space: &mut ObjectSpace, op: &Op, store: &InMemoryStateStore) {
    let result: SpaceResult<()> = match op {
        Op::ListAdd(v) => space.get_list::<i32>("l").map(|l| l.add(*v)),
        Op::ListInsert(i, v) => space.get_list::<i32>("l").and_then(|l| l.insert(*i, *v)),
        Op::ListRemoveAt(i) => space
            .get_list::<i32>("l")
            .and_then(|l| l.remove_at(*i).map(|_| ())),
        Op::ListSet(i, v) => space.get_list::<i32>("l").and_then(|l| l.set(*i, *v)),
        Op::DictInsert(k, v) => space.get_dictionary::<u8, i32>("d").map(|d| {
            d.insert(*k, *v);
        }),
        Op::DictRemove(k) => space.get_dictionary::<u8, i32>("d").map(|d| {
            d.remove(k);
        }),
        Op::Enqueue(v) => space.get_queue::<i32>("q").map(|q| q.enqueue(*v)),
        Op::Dequeue => space
            .get_queue::<i32>("q")
            .and_then(|q| q.dequeue().map(|_| ())),
        Op::SetAdd(v) => space.get_set::<u8>("s").map(|s| {
            s.add(*v);
        }),
        Op::SetRemove(v) => space.get_set::<u8>("s").map(|s| {
            s.remove(v);
        }),
        Op::SortedSetAdd(v) => space.get_sorted_set::<u8>("ss").map(|s| {
            s.add(*v);
        }),
        Op::SortedSetRemove(v) => space.get_sorted_set::<u8>("ss").map(|s| {
            s.remove(v);
        }),
        Op::LinkedAddFirst(v) => space.get_linked_list::<i32>("ll").map(|l| {
            l.add_first(*v);
        }),
        Op::LinkedAddLast(v) => space.get_linked_list::<i32>("ll").map(|l| {
            l.add_last(*v);
        }),
        Op::LinkedRemoveFirst => space
            .get_linked_list::<i32>("ll")
            .and_then(|l| l.remove_first().map(|_| ())),
        Op::Push(v) => space.get_stack::<i32>("st").map(|s| s.push(*v)),
        Op::Pop => space.get_stack::<i32>("st").and_then(|s| s.pop().map(|_| ())),
        Op::RecreateList => space
            .delete("l")
            .and_then(|_| space.create_list::<i32>("l").map(|_| ())),
        Op::Save => space.save_to(store, true).map(|_| ()),
    };
    match result {
        Ok(()) | Err(SpaceError::OutOfRange { .. }) | Err(SpaceError::EmptyCollection { .. }) => {}
        Err(other) => panic!("{op:?} failed: {other}"),
    }
}

#[derive(Debug, PartialEq)]
struct Snapshot {
    list: Vec<i32>,
    dict: BTreeMap<u8, i32>,
    queue: Vec<i32>,
    set: Vec<u8>,
    sorted_set: Vec<u8>,
    linked: Vec<i32>,
    stack: Vec<i32>,
}

fn snapshot(space: &mut ObjectSpace) -> Snapshot {
    let list = space.get_list::<i32>("l").unwrap().as_slice().to_vec();
    let dict = space
        .get_dictionary::<u8, i32>("d")
        .unwrap()
        .iter()
        .map(|(k, v)| (*k, *v))
        .collect();
    let queue = space.get_queue::<i32>("q").unwrap().iter().copied().collect();
    let mut set = space.get_set::<u8>("s").unwrap().to_vec();
    set.sort();
    let sorted_set = space.get_sorted_set::<u8>("ss").unwrap().to_vec();
    let linked = space
        .get_linked_list::<i32>("ll")
        .unwrap()
        .iter()
        .copied()
        .collect();
    let stack = space.get_stack::<i32>("st").unwrap().iter().copied().collect();
    Snapshot {
        list,
        dict,
        queue,
        set,
        sorted_set,
        linked,
        stack,
    }
}

fn dump(store: &InMemoryStateStore) -> BTreeMap<(String, String), Vec<u8>> {
    let mut out = BTreeMap::new();
    for category in store.categories().unwrap() {
        for (key, value) in store.entries(&category).unwrap() {
            out.insert((category.clone(), key), value);
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn reload_matches_volatile(ops in prop::collection::vec(op(), 0..60)) {
        init_tracing();
        let store = InMemoryStateStore::new();
        let scratch = InMemoryStateStore::new();
        let mut persisted = ObjectSpace::new();
        let mut volatile = ObjectSpace::volatile();
        setup(&mut persisted);
        setup(&mut volatile);

        for op in &ops {
            apply(&mut persisted, op, &store);
            apply(&mut volatile, op, &scratch);
        }
        persisted.save_to(&store, true).unwrap();
        prop_assert!(scratch.is_empty());

        let mut reloaded = ObjectSpace::new();
        reloaded.load(&store).unwrap();
        prop_assert_eq!(snapshot(&mut reloaded), snapshot(&mut volatile));
        prop_assert_eq!(snapshot(&mut persisted), snapshot(&mut volatile));
    }

    #[test]
    fn differential_store_equals_full_snapshot(ops in prop::collection::vec(op(), 0..60)) {
        let store = InMemoryStateStore::new();
        let mut space = ObjectSpace::new();
        setup(&mut space);
        for op in &ops {
            apply(&mut space, op, &store);
        }
        space.save_to(&store, true).unwrap();

        let full = InMemoryStateStore::new();
        space.save_to(&full, false).unwrap();
        prop_assert_eq!(dump(&store), dump(&full));
        prop_assert!(space.save(true).unwrap().is_empty());
    }
}
