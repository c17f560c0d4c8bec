use std::{cell::Cell, rc::Rc};

use ripple::{GraphValue, NodeKind};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_map_on_replays_items_in_insertion_order() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let first = items.set(value(json!({"v": 1}))).unwrap();
    let second = items.set(value(json!({"v": 2}))).unwrap();

    let recorder = Recorder::new();
    items.map().unwrap().on(recorder.listener()).unwrap();

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0["v"], json!(1));
    assert_eq!(events[1].0["v"], json!(2));
    // Each item carries its own soul, matching the key it is delivered under
    for (payload, key) in &events {
        assert_eq!(payload["_"]["#"], json!(key));
    }
    assert_eq!(Some(events[0].1.clone()), first.key());
    assert_eq!(Some(events[1].1.clone()), second.key());
    assert_ne!(events[0].1, events[1].1);
}

#[test]
fn test_set_keys_are_uuids() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let item = items.set("hello").unwrap();
    let key = item.key().unwrap();
    assert!(uuid::Uuid::parse_str(&key).is_ok(), "{key}");
}

#[test]
fn test_set_ack_waits_for_scheduler_turn() {
    let (graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let log = EventLog::new();
    items.map().unwrap().on(log.listener("item")).unwrap();
    items.on(log.listener("own")).unwrap();

    items
        .set_with_ack(value(json!({"v": 1})), log.ack("ack"))
        .unwrap();
    assert_eq!(log.entries(), vec!["item", "own"]);
    assert_eq!(graph.pending(), 1);

    assert_eq!(graph.tick(), 1);
    assert_eq!(log.entries(), vec!["item", "own", "ack"]);
    assert_eq!(graph.pending(), 0);
}

#[test]
fn test_set_notifies_own_listeners_with_soul_reference() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let recorder = Recorder::new();
    items.on(recorder.listener()).unwrap();

    let item = items.set(value(json!({"v": 1}))).unwrap();
    let key = item.key().unwrap();

    let (payload, delivered_key) = recorder.last().unwrap();
    assert_eq!(delivered_key, "items");
    assert_eq!(payload[key.as_str()], json!({"#": key}));
}

#[test]
fn test_set_item_updates_reach_set_listeners() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let item = items.set(value(json!({"v": 1}))).unwrap();

    let recorder = Recorder::new();
    items.map().unwrap().on(recorder.listener()).unwrap();
    recorder.clear();

    item.put(value(json!({"v": 5}))).unwrap();
    let (payload, key) = recorder.last().unwrap();
    assert_eq!(payload["v"], json!(5));
    assert_eq!(Some(key), item.key());
}

#[test]
fn test_set_node_item_aliases_it() {
    let (_graph, scope) = setup();
    let people = scope.get("people").unwrap();
    let alice = scope.get("alice").unwrap();
    alice.put(value(json!({"name": "Alice"}))).unwrap();

    let recorder = Recorder::new();
    people.map().unwrap().on(recorder.listener()).unwrap();

    let slot = people.set(&alice).unwrap();
    assert_eq!(slot.key().as_deref(), Some("alice"));
    assert_eq!(slot.kind(), NodeKind::Edge);
    assert_eq!(
        recorder.events(),
        vec![(json!({"_": {"#": "alice"}, "name": "Alice"}), "alice".to_string())]
    );

    // Changes to the referenced node keep flowing to the set's listeners
    alice.put(value(json!({"age": 30}))).unwrap();
    let (payload, key) = recorder.last().unwrap();
    assert_eq!(key, "alice");
    assert_eq!(payload["age"], json!(30));
}

#[test]
fn test_set_primitive_items() {
    let (_graph, scope) = setup();
    let tags = scope.get("tags").unwrap();
    tags.set("red").unwrap();
    tags.set(7).unwrap();

    let recorder = Recorder::new();
    tags.map().unwrap().on(recorder.listener()).unwrap();
    assert_eq!(recorder.values(), vec![json!("red"), json!(7)]);
}

#[test]
fn test_set_rejections() {
    let (_graph, scope) = setup();

    let leaf = scope.get("leaf").unwrap();
    leaf.put(5).unwrap();
    assert!(leaf.set(1).unwrap_err().is_logic_error());

    let cleared = scope.get("cleared").unwrap();
    cleared.put(GraphValue::Null).unwrap();
    assert!(cleared.set(1).unwrap_err().is_logic_error());

    let items = scope.get("items").unwrap();
    assert!(items.set(f64::NAN).unwrap_err().is_type_error());
    assert_eq!(items.kind(), NodeKind::Undefined);
}

#[test]
fn test_set_forwards_through_edge() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    items.set(1).unwrap();
    let alias = scope.get("alias").unwrap();
    alias.put(&items).unwrap();

    let item = alias.set(2).unwrap();
    assert_eq!(alias.kind(), NodeKind::Edge);

    let recorder = Recorder::new();
    items.once_map().unwrap().once(recorder.listener()).unwrap();
    assert_eq!(recorder.len(), 2);
    assert_eq!(recorder.keys()[1], item.key().unwrap());
}

#[test]
fn test_empty_set_bootstrap() {
    let (_graph, scope) = setup();
    let owner = scope.get("owner").unwrap();
    owner.put(value(json!({"chats": {"unused": true}}))).unwrap();

    let chats = owner.get("chats").unwrap();
    assert_eq!(chats.kind(), NodeKind::Undefined);
    chats.set(value(json!({"text": "hi"}))).unwrap();
    assert_eq!(chats.kind(), NodeKind::Set);

    let recorder = Recorder::new();
    chats.map().unwrap().on(recorder.listener()).unwrap();
    assert_eq!(recorder.len(), 2);
    assert_eq!(recorder.events()[0], (json!(true), "unused".to_string()));
    assert_eq!(recorder.values()[1]["text"], json!("hi"));
}

#[test]
fn test_map_commits_set_and_locks_out_put() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    items.map().unwrap();
    assert_eq!(items.kind(), NodeKind::Set);
    assert!(items.put(value(json!({"a": 1}))).unwrap_err().is_logic_error());
}

#[test]
fn test_map_on_leaf_reads_it_as_map() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    node.put(value(json!({"a": 1}))).unwrap();

    let recorder = Recorder::new();
    node.map().unwrap().on(recorder.listener()).unwrap();
    assert_eq!(node.kind(), NodeKind::Leaf);
    assert_eq!(recorder.events(), vec![(json!(1), "a".to_string())]);

    node.put(value(json!({"b": 2}))).unwrap();
    assert_eq!(recorder.last(), Some((json!(2), "b".to_string())));
}

#[test]
fn test_map_on_primitive_is_logic_error() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    node.put("text").unwrap();
    assert!(node.map().unwrap_err().is_logic_error());
    assert!(node.once_map().unwrap_err().is_logic_error());
}

#[test]
fn test_once_map_replays_without_registering() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let calls = Rc::new(Cell::new(0));

    let counter = calls.clone();
    items
        .once_map()
        .unwrap()
        .once(move |_, _| counter.set(counter.get() + 1))
        .unwrap();
    assert_eq!(calls.get(), 0);
    // once_map does not commit a kind
    assert_eq!(items.kind(), NodeKind::Undefined);

    items.set(1).unwrap();
    items.set(2).unwrap();
    let counter = calls.clone();
    let view = items.once_map().unwrap();
    view.once(move |_, _| counter.set(counter.get() + 1)).unwrap();
    assert_eq!(calls.get(), 2);

    items.set(3).unwrap();
    assert_eq!(calls.get(), 2);
    assert!(view.node().ptr_eq(&items));
}
