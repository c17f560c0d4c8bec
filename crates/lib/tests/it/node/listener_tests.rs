use std::{cell::Cell, rc::Rc};

use ripple::GraphValue;
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_on_replays_resolved_data() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    node.put("hello").unwrap();

    let recorder = Recorder::new();
    node.on(recorder.listener()).unwrap();
    assert_eq!(recorder.events(), vec![(json!("hello"), "node".to_string())]);
    assert_eq!(node.listener_count(), 1);
}

#[test]
fn test_on_unresolved_waits_for_first_write() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    let recorder = Recorder::new();
    node.on(recorder.listener()).unwrap();
    assert_eq!(recorder.len(), 0);

    node.put(1).unwrap();
    node.put(2).unwrap();
    assert_eq!(recorder.values(), vec![json!(1), json!(2)]);
}

#[test]
fn test_once_delivers_undefined_for_unresolved_node() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    let seen = Rc::new(Cell::new(false));

    let flag = seen.clone();
    node.once(move |data, key| {
        assert!(data.is_undefined());
        assert_eq!(key, "node");
        flag.set(true);
    })
    .unwrap();
    assert!(seen.get());

    // once never registers
    node.put(1).unwrap();
    assert_eq!(node.listener_count(), 0);
}

#[test]
fn test_once_reads_current_value() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    node.put(value(json!({"a": 1, "b": {"c": 2}}))).unwrap();

    let recorder = Recorder::new();
    node.once(recorder.listener()).unwrap();
    let (payload, key) = recorder.last().unwrap();
    assert_eq!(key, "node");
    assert_eq!(payload, json!({"_": {"#": "node"}, "a": 1, "b": {"#": "b"}}));

    let record = {
        let slot = Rc::new(std::cell::RefCell::new(None));
        let sink = slot.clone();
        node.once(move |data, _| *sink.borrow_mut() = data.as_record().cloned())
            .unwrap();
        slot.borrow_mut().take().unwrap()
    };
    assert_eq!(record.soul(), "node");
    assert_eq!(record.len(), 2);
    assert_eq!(record.fields_json(), json!({"a": 1, "b": {"#": "b"}}));
}

#[test]
fn test_listeners_fire_in_subscription_order() {
    let (_graph, scope) = setup();
    let node = scope.get("node").unwrap();
    let log = EventLog::new();
    node.on(log.listener("first")).unwrap();
    node.on(log.listener("second")).unwrap();
    node.on(log.listener("third")).unwrap();

    node.put(1).unwrap();
    assert_eq!(log.entries(), vec!["first", "second", "third"]);
}

#[test]
fn test_off_clears_only_own_listeners() {
    let (_graph, scope) = setup();
    let items = scope.get("items").unwrap();
    let own = Recorder::new();
    let per_item = Recorder::new();
    items.map().unwrap().on(per_item.listener()).unwrap();
    items.on(own.listener()).unwrap();

    items.off().unwrap();
    assert_eq!(items.listener_count(), 0);

    items.set(1).unwrap();
    assert_eq!(own.len(), 0);
    assert_eq!(per_item.values(), vec![json!(1)]);
}

#[test]
fn test_off_leaves_descendants_subscribed() {
    let (_graph, scope) = setup();
    let parent = scope.get("parent").unwrap();
    let child = parent.get("child").unwrap();
    let recorder = Recorder::new();
    child.on(recorder.listener()).unwrap();

    parent.off().unwrap();
    child.put("still here").unwrap();
    assert_eq!(recorder.values(), vec![json!("still here")]);
}

#[test]
fn test_parent_sees_child_writes() {
    let (_graph, scope) = setup();
    let profile = scope.get("profile").unwrap();
    let recorder = Recorder::new();
    profile.on(recorder.listener()).unwrap();

    profile.get("name").unwrap().put("alice").unwrap();
    assert_eq!(
        recorder.last(),
        Some((
            json!({"_": {"#": "profile"}, "name": "alice"}),
            "profile".to_string()
        ))
    );

    profile.get("name").unwrap().put(GraphValue::Null).unwrap();
    assert_eq!(
        recorder.last().unwrap().0,
        json!({"_": {"#": "profile"}, "name": null})
    );
}

#[test]
fn test_unresolved_children_are_left_out_of_records() {
    let (_graph, scope) = setup();
    let parent = scope.get("parent").unwrap();
    parent.get("pending").unwrap();
    assert!(!parent.is_resolved());

    parent.get("ready").unwrap().put(true).unwrap();
    let recorder = Recorder::new();
    parent.once(recorder.listener()).unwrap();
    assert_eq!(
        recorder.values(),
        vec![json!({"_": {"#": "parent"}, "ready": true})]
    );
}

#[test]
fn test_listener_may_write_to_the_store() {
    let (_graph, scope) = setup();
    let source = scope.get("source").unwrap();
    let mirror = scope.get("mirror").unwrap();

    let target = mirror.clone();
    source
        .on(move |data, _| {
            if let Some(primitive) = data.as_primitive() {
                target.put(primitive.clone()).unwrap();
            }
        })
        .unwrap();

    let recorder = Recorder::new();
    mirror.on(recorder.listener()).unwrap();

    source.put(42).unwrap();
    assert_eq!(recorder.values(), vec![json!(42)]);
}

#[test]
fn test_pending_child_keeps_parent_quiet() {
    let (_graph, scope) = setup();
    let parent = scope.get("parent").unwrap();
    parent.get("pending").unwrap();

    let recorder = Recorder::new();
    parent.on(recorder.listener()).unwrap();
    assert_eq!(recorder.len(), 0);

    // Children render by what they hold: primitives raw, maps as references
    parent.get("pending").unwrap().put(value(json!({"v": 1}))).unwrap();
    parent.get("flag").unwrap().put(false).unwrap();
    assert_eq!(
        recorder.values(),
        vec![
            json!({"_": {"#": "parent"}, "pending": {"#": "pending"}}),
            json!({"_": {"#": "parent"}, "pending": {"#": "pending"}, "flag": false}),
        ]
    );
}
