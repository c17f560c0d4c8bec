use ripple::{Graph, GraphOptions, IdentityScheme, constants::USERS};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_get_requires_authentication() {
    let graph = Graph::new();
    let user = graph.user();
    assert!(user.is().is_none());

    let err = user.get("profile").unwrap_err();
    assert!(err.is_logic_error());
    assert!(err.to_string().contains("without authenticating"));
}

#[test]
fn test_auth_opens_namespace() {
    let graph = Graph::new();
    let user = graph.user();

    let ack = capture_ack(|ack| user.auth("alice", "secret", ack)).unwrap();
    assert!(ack.is_ok());

    let identity = user.is().unwrap();
    assert_eq!(identity.alias, "alice");
    assert_eq!(identity.public_key, "alice");
    assert_eq!(user.soul().sea.as_deref(), Some("alice"));

    let profile = user.get("profile").unwrap();
    let direct = graph
        .get(USERS)
        .unwrap()
        .get("alice")
        .unwrap()
        .get("profile")
        .unwrap();
    assert!(profile.ptr_eq(&direct));

    // Second-level nodes accept primitives
    user.get("status").unwrap().put("online").unwrap();
}

#[test]
fn test_user_handles_share_auth_state() {
    let graph = Graph::new();
    graph.user().auth("alice", "secret", |_| {});
    assert!(graph.user().is().is_some());
    assert!(graph.clone().user().get("profile").is_ok());
}

#[test]
fn test_auth_failures_are_acked() {
    let graph = Graph::with_options(GraphOptions::default().fail_auth(true));
    let user = graph.user();
    let ack = capture_ack(|ack| user.auth("alice", "secret", ack)).unwrap();
    assert_eq!(ack.err.as_deref(), Some("Wrong user or password."));
    assert!(user.is().is_none());

    let graph = Graph::new();
    let user = graph.user();
    let ack = capture_ack(|ack| user.auth("", "secret", ack)).unwrap();
    assert!(!ack.is_ok());
    assert!(user.is().is_none());
}

#[test]
fn test_create_does_not_authenticate() {
    let graph = Graph::new();
    let user = graph.user();
    let log = EventLog::new();
    user.create("alice", "secret", log.ack("created"));
    assert_eq!(log.entries(), vec!["created"]);
    assert!(user.is().is_none());

    let failing = Graph::with_options(GraphOptions::default().fail_create(true));
    failing
        .user()
        .create("alice", "secret", log.ack("again"));
    assert_eq!(log.entries()[1], "again:User already created!");
}

#[test]
fn test_leave_drops_identity() {
    let graph = Graph::with_options(GraphOptions::default().pre_authenticated("alice"));
    let user = graph.user();
    assert!(user.get("profile").is_ok());

    user.leave();
    assert!(user.is().is_none());
    assert!(graph.soul().sea.is_none());
    assert!(user.get("profile").unwrap_err().is_logic_error());
}

#[test]
fn test_random_identity_scheme() {
    let graph = Graph::with_options(
        GraphOptions::default().identity_scheme(IdentityScheme::Random),
    );
    let user = graph.user();
    user.auth("alice", "secret", |_| {});
    let identity = user.is().unwrap();

    assert_eq!(identity.public_key.len(), 64);
    assert!(identity.public_key.chars().all(|c| c.is_ascii_hexdigit()));

    let profile = user.get("profile").unwrap();
    let direct = graph
        .get(USERS)
        .unwrap()
        .get(&identity.public_key)
        .unwrap()
        .get("profile")
        .unwrap();
    assert!(profile.ptr_eq(&direct));
}

#[test]
fn test_foreign_user_sees_writes() {
    let graph = Graph::with_options(GraphOptions::default().pre_authenticated("alice"));
    let foreign = graph.user_of("alice");
    assert_eq!(foreign.public_key(), "alice");

    let recorder = Recorder::new();
    foreign.get("profile").unwrap().on(recorder.listener()).unwrap();

    graph
        .user()
        .get("profile")
        .unwrap()
        .put(value(json!({"name": "Alice"})))
        .unwrap();
    assert_eq!(
        recorder.events(),
        vec![(
            json!({"_": {"#": "profile"}, "name": "Alice"}),
            "profile".to_string()
        )]
    );
}

#[test]
fn test_foreign_user_needs_no_authentication() {
    let graph = Graph::new();
    let foreign = graph.user_of("bob");
    let recorder = Recorder::new();
    foreign.get("profile").unwrap().once(recorder.listener()).unwrap();
    assert_eq!(recorder.values(), vec![json!(null)]);
}
