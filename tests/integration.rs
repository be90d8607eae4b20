//! Integration tests for the event store.

use herald::{
    Delivery, Erase, EventStore, Exists, Listener, MemoryBackend, Publish, Scope, Subscribe,
    Unsubscribe,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Listener that records every call it receives.
fn recorder() -> (Listener, Arc<Mutex<Vec<(Value, Delivery)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let listener = Listener::new(move |data, delivery| {
        sink.lock().push((data.clone(), delivery.clone()));
    });
    (listener, calls)
}

fn data_of(calls: &Arc<Mutex<Vec<(Value, Delivery)>>>) -> Vec<Value> {
    calls.lock().iter().map(|(data, _)| data.clone()).collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// --- Delivery ---

#[test]
fn test_publish_reaches_subscriber() {
    init_tracing();
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store.subscribe(Subscribe::new("cart", listener)).unwrap();
    store.publish(Publish::new("cart", json!({"items": 3}))).unwrap();

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, json!({"items": 3}));
    assert_eq!(calls[0].1.event_name, "cart");
    assert_eq!(calls[0].1.extra_args, None);
}

#[test]
fn test_late_subscriber_catches_up() {
    let store = EventStore::new();
    store.publish(Publish::new("x", json!(42))).unwrap();

    let (listener, calls) = recorder();
    store
        .subscribe(Subscribe::new("x", listener).extra_args(json!({"screen": "home"})))
        .unwrap();

    // Delivered during the subscribe call itself.
    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, json!(42));
    assert_eq!(calls[0].1.extra_args, Some(json!({"screen": "home"})));
}

#[test]
fn test_subscribe_before_any_publish_is_quiet() {
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store.subscribe(Subscribe::new("never", listener)).unwrap();
    assert!(calls.lock().is_empty());
    assert_eq!(store.subscription_count("never", Scope::Transient), 1);
}

#[test]
fn test_last_write_wins() {
    let store = EventStore::new();
    store.publish(Publish::new("x", json!(1))).unwrap();
    store.publish(Publish::new("x", json!(2))).unwrap();

    let record = store.get("x", Scope::Transient).unwrap().unwrap();
    assert_eq!(record.data, json!(2));

    let (listener, calls) = recorder();
    store.subscribe(Subscribe::new("x", listener)).unwrap();
    assert_eq!(data_of(&calls), vec![json!(2)]);
}

// --- Deduplication ---

#[test]
fn test_duplicate_subscription_is_replaced() {
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store
        .subscribe(Subscribe::new("x", listener.clone()).extra_args(json!("first")))
        .unwrap();
    let id = store
        .subscribe(Subscribe::new("x", listener.clone()).extra_args(json!("second")))
        .unwrap();
    assert_eq!(store.subscription_count("x", Scope::Transient), 1);

    store.publish(Publish::new("x", json!(1))).unwrap();

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.extra_args, Some(json!("second")));

    let subs = store.registry(Scope::Transient).subscriptions("x");
    assert_eq!(subs[0].id, id);
}

#[test]
fn test_replacement_keeps_position() {
    let store = EventStore::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let make = |label: &'static str| {
        let order = Arc::clone(&order);
        Listener::fallible(move |_, delivery| {
            order.lock().push((label, delivery.extra_args.clone()));
            Ok(())
        })
    };
    let a = make("a");
    let b = make("b");

    store.subscribe(Subscribe::new("x", a.clone())).unwrap();
    store.subscribe(Subscribe::new("x", b)).unwrap();
    store
        .subscribe(Subscribe::new("x", a).extra_args(json!(2)))
        .unwrap();

    store.publish(Publish::new("x", json!(null))).unwrap();
    assert_eq!(
        *order.lock(),
        vec![("a", Some(json!(2))), ("b", None)]
    );
}

#[test]
fn test_identical_closures_are_distinct_listeners() {
    let store = EventStore::new();
    let count = Arc::new(Mutex::new(0));

    for _ in 0..2 {
        let count = Arc::clone(&count);
        let listener = Listener::new(move |_, _| *count.lock() += 1);
        store.subscribe(Subscribe::new("x", listener)).unwrap();
    }

    store.publish(Publish::new("x", json!(1))).unwrap();
    assert_eq!(*count.lock(), 2);
}

// --- Parameter tags ---

#[test]
fn test_param_isolation() {
    let store = EventStore::new();
    let (one, one_calls) = recorder();
    let (two, two_calls) = recorder();
    let (untagged, untagged_calls) = recorder();

    store
        .subscribe(Subscribe::new("x", one).param_tag(json!({"id": 1})))
        .unwrap();
    store
        .subscribe(Subscribe::new("x", two).param_tag(json!({"id": 2})))
        .unwrap();
    store.subscribe(Subscribe::new("x", untagged)).unwrap();

    store
        .publish(Publish::new("x", json!("for one")).param_tag(json!({"id": 1})))
        .unwrap();
    assert_eq!(data_of(&one_calls), vec![json!("for one")]);
    assert!(two_calls.lock().is_empty());
    assert!(untagged_calls.lock().is_empty());

    store.publish(Publish::new("x", json!("for all"))).unwrap();
    assert_eq!(data_of(&untagged_calls), vec![json!("for all")]);
    assert_eq!(one_calls.lock().len(), 1);
    assert!(two_calls.lock().is_empty());
}

#[test]
fn test_catch_up_ignores_subscriber_tag() {
    let store = EventStore::new();
    store
        .publish(Publish::new("api", json!(["a"])).param_tag(json!({"page": 1})))
        .unwrap();

    // Late subscribers receive the last stored value whatever their tag.
    let (other_page, other_calls) = recorder();
    store
        .subscribe(Subscribe::new("api", other_page).param_tag(json!({"page": 2})))
        .unwrap();
    assert_eq!(data_of(&other_calls), vec![json!(["a"])]);

    let (untagged, untagged_calls) = recorder();
    store.subscribe(Subscribe::new("api", untagged)).unwrap();
    assert_eq!(data_of(&untagged_calls), vec![json!(["a"])]);

    // Later broadcasts still filter by tag.
    store
        .publish(Publish::new("api", json!(["b"])).param_tag(json!({"page": 1})))
        .unwrap();
    assert_eq!(other_calls.lock().len(), 1);
    assert_eq!(untagged_calls.lock().len(), 1);
}

#[test]
fn test_numeric_tags_match_by_value() {
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store
        .subscribe(Subscribe::new("api", listener).param_tag(json!({"page": 1})))
        .unwrap();
    store
        .publish(Publish::new("api", json!(["a"])).param_tag(json!({"page": 1.0})))
        .unwrap();

    assert_eq!(data_of(&calls), vec![json!(["a"])]);
    assert!(store
        .exists(Exists::new("api").param_tag(json!({"page": 1})))
        .unwrap());
}

#[test]
fn test_same_listener_under_two_tags() {
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store
        .subscribe(Subscribe::new("api", listener.clone()).param_tag(json!({"page": 1})))
        .unwrap();
    store
        .subscribe(Subscribe::new("api", listener.clone()).param_tag(json!({"page": 2})))
        .unwrap();
    assert_eq!(store.subscription_count("api", Scope::Transient), 2);

    store
        .publish(Publish::new("api", json!(2)).param_tag(json!({"page": 2})))
        .unwrap();
    assert_eq!(data_of(&calls), vec![json!(2)]);

    assert!(store
        .unsubscribe(Unsubscribe::new("api", listener).param_tag(json!({"page": 1})))
        .unwrap());
    assert_eq!(store.subscription_count("api", Scope::Transient), 1);
}

// --- One-shot ---

#[test]
fn test_one_shot_subscription_fires_once() {
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store
        .subscribe(Subscribe::new("x", listener).one_shot())
        .unwrap();
    store.publish(Publish::new("x", json!("v1"))).unwrap();
    store.publish(Publish::new("x", json!("v2"))).unwrap();

    assert_eq!(data_of(&calls), vec![json!("v1")]);
    assert_eq!(store.subscription_count("x", Scope::Transient), 0);
}

#[test]
fn test_one_shot_subscription_consumed_by_catch_up() {
    let store = EventStore::new();
    store.publish(Publish::new("x", json!("stored"))).unwrap();

    let (listener, calls) = recorder();
    store
        .subscribe(Subscribe::new("x", listener).one_shot())
        .unwrap();
    store.publish(Publish::new("x", json!("later"))).unwrap();

    assert_eq!(data_of(&calls), vec![json!("stored")]);
}

#[test]
fn test_one_shot_publish_is_not_retained() {
    let store = EventStore::new();
    let (listener, calls) = recorder();
    store.subscribe(Subscribe::new("toast", listener)).unwrap();

    store
        .publish(Publish::new("toast", json!("saved")).one_shot())
        .unwrap();
    assert_eq!(data_of(&calls), vec![json!("saved")]);
    assert!(!store.exists(Exists::new("toast")).unwrap());

    let (late, late_calls) = recorder();
    store.subscribe(Subscribe::new("toast", late)).unwrap();
    assert!(late_calls.lock().is_empty());
}

#[test]
fn test_one_shot_publish_keeps_previous_record() {
    let store = EventStore::new();
    store.publish(Publish::new("x", json!("kept"))).unwrap();
    store
        .publish(Publish::new("x", json!("passing")).one_shot())
        .unwrap();

    assert_eq!(
        store.get("x", Scope::Transient).unwrap().unwrap().data,
        json!("kept")
    );
}

#[test]
fn test_silent_publish_updates_without_notifying() {
    let store = EventStore::new();
    let (listener, calls) = recorder();
    store.subscribe(Subscribe::new("x", listener)).unwrap();

    store.publish(Publish::new("x", json!(1)).silent()).unwrap();
    assert!(calls.lock().is_empty());
    assert!(store.exists(Exists::new("x")).unwrap());

    let (late, late_calls) = recorder();
    store.subscribe(Subscribe::new("x", late)).unwrap();
    assert_eq!(data_of(&late_calls), vec![json!(1)]);
}

// --- Erase & unsubscribe ---

#[test]
fn test_erase_removes_value() {
    let store = EventStore::new();
    store.publish(Publish::new("x", json!(1))).unwrap();
    assert!(store.exists(Exists::new("x")).unwrap());

    store.erase(Erase::new("x")).unwrap();
    assert!(!store.exists(Exists::new("x")).unwrap());

    let (listener, calls) = recorder();
    store.subscribe(Subscribe::new("x", listener)).unwrap();
    assert!(calls.lock().is_empty());
}

#[test]
fn test_erase_keeps_subscribers() {
    let store = EventStore::new();
    let (listener, calls) = recorder();
    store.subscribe(Subscribe::new("x", listener)).unwrap();

    store.erase(Erase::new("x")).unwrap();
    store.publish(Publish::new("x", json!("after"))).unwrap();
    assert_eq!(data_of(&calls), vec![json!("after")]);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let store = EventStore::new();
    let (listener, calls) = recorder();

    store.subscribe(Subscribe::new("x", listener.clone())).unwrap();
    assert!(store.unsubscribe(Unsubscribe::new("x", listener.clone())).unwrap());
    assert!(!store.unsubscribe(Unsubscribe::new("x", listener)).unwrap());

    store.publish(Publish::new("x", json!(1))).unwrap();
    assert!(calls.lock().is_empty());
}

#[test]
fn test_unsubscribe_from_subscribe_request() {
    let store = EventStore::new();
    let (listener, _calls) = recorder();
    let request = Subscribe::new("x", listener).param_tag(json!({"k": "v"}));

    store.subscribe(request.clone()).unwrap();
    assert!(store.unsubscribe(request.into()).unwrap());
    assert_eq!(store.subscription_count("x", Scope::Transient), 0);
}

// --- Scopes ---

#[test]
fn test_transient_and_durable_are_separate() {
    let store = EventStore::with_backend(MemoryBackend::new());

    store.publish(Publish::new("y", json!(1))).unwrap();
    assert!(store.exists(Exists::new("y")).unwrap());
    assert!(!store.exists(Exists::new("y").durable()).unwrap());

    store.publish(Publish::new("z", json!(2)).durable()).unwrap();
    assert!(store.exists(Exists::new("z").durable()).unwrap());
    assert!(!store.exists(Exists::new("z")).unwrap());
}

#[test]
fn test_listeners_do_not_cross_scopes() {
    let store = EventStore::with_backend(MemoryBackend::new());
    let (transient, transient_calls) = recorder();
    let (durable, durable_calls) = recorder();

    store.subscribe(Subscribe::new("x", transient)).unwrap();
    store
        .subscribe(Subscribe::new("x", durable).durable())
        .unwrap();

    store.publish(Publish::new("x", json!("t"))).unwrap();
    store.publish(Publish::new("x", json!("d")).durable()).unwrap();

    assert_eq!(data_of(&transient_calls), vec![json!("t")]);
    assert_eq!(data_of(&durable_calls), vec![json!("d")]);
}

#[test]
fn test_durable_one_shot_subscription() {
    let store = EventStore::with_backend(MemoryBackend::new());
    let (listener, calls) = recorder();

    store
        .subscribe(Subscribe::new("x", listener).durable().one_shot())
        .unwrap();
    store.publish(Publish::new("x", json!(1)).durable()).unwrap();
    store.publish(Publish::new("x", json!(2)).durable()).unwrap();

    assert_eq!(data_of(&calls), vec![json!(1)]);
    assert_eq!(store.subscription_count("x", Scope::Durable), 0);
}

// --- Re-entrancy ---

#[test]
fn test_one_shot_not_redelivered_on_reentrant_publish() {
    let store = Arc::new(EventStore::new());
    let calls = Arc::new(Mutex::new(Vec::new()));

    let inner_store = Arc::clone(&store);
    let sink = Arc::clone(&calls);
    let listener = Listener::fallible(move |data, _| {
        sink.lock().push(data.clone());
        if data == &json!(1) {
            inner_store.publish(Publish::new("x", json!(2)))?;
        }
        Ok(())
    });

    store
        .subscribe(Subscribe::new("x", listener).one_shot())
        .unwrap();
    store.publish(Publish::new("x", json!(1))).unwrap();

    assert_eq!(*calls.lock(), vec![json!(1)]);
    assert_eq!(
        store.get("x", Scope::Transient).unwrap().unwrap().data,
        json!(2)
    );
}

#[test]
fn test_listener_can_unsubscribe_a_later_listener() {
    let store = Arc::new(EventStore::new());
    let (victim, victim_calls) = recorder();

    let inner_store = Arc::clone(&store);
    let target = victim.clone();
    let remover = Listener::fallible(move |_, _| {
        inner_store.unsubscribe(Unsubscribe::new("x", target.clone()))?;
        Ok(())
    });

    store.subscribe(Subscribe::new("x", remover)).unwrap();
    store.subscribe(Subscribe::new("x", victim)).unwrap();

    store.publish(Publish::new("x", json!(1))).unwrap();
    assert!(victim_calls.lock().is_empty());
    assert_eq!(store.subscription_count("x", Scope::Transient), 1);
}

#[test]
fn test_listener_can_subscribe_during_broadcast() {
    let store = Arc::new(EventStore::new());
    let (newcomer, newcomer_calls) = recorder();

    let inner_store = Arc::clone(&store);
    let recruiter = Listener::fallible(move |_, _| {
        inner_store.subscribe(Subscribe::new("x", newcomer.clone()))?;
        Ok(())
    });

    store.subscribe(Subscribe::new("x", recruiter)).unwrap();
    store.publish(Publish::new("x", json!("hello"))).unwrap();

    // Caught up once by its own subscribe, not visited again by the broadcast.
    assert_eq!(data_of(&newcomer_calls), vec![json!("hello")]);
}
