use super::*;
use crate::core::session::Session;
use std::sync::Arc;

fn new_row(id: &str) -> Session {
    Session::new(id.into(), "test-model".into())
}

#[test]
fn test_upsert_creates_then_updates() {
    let store = MemoryUsageStore::new();
    assert!(store.is_empty());

    let row = store.upsert("s1", &|| new_row("s1"), &mut |s| s.requests += 1);
    assert_eq!(row.requests, 1);
    assert_eq!(row.model, "test-model");

    let row = store.upsert("s1", &|| panic!("row already exists"), &mut |s| s.requests += 1);
    assert_eq!(row.requests, 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_returns_snapshot() {
    let store = MemoryUsageStore::new();
    assert!(store.get("missing").is_none());

    store.upsert("s1", &|| new_row("s1"), &mut |s| s.total_input_tokens = 10);
    let snapshot = store.get("s1").unwrap();
    store.upsert("s1", &|| new_row("s1"), &mut |s| s.total_input_tokens = 99);

    assert_eq!(snapshot.total_input_tokens, 10);
    assert_eq!(store.get("s1").unwrap().total_input_tokens, 99);
}

#[test]
fn test_remove_is_idempotent() {
    let store = MemoryUsageStore::new();
    store.upsert("s1", &|| new_row("s1"), &mut |_| {});

    assert!(store.remove("s1"));
    assert!(!store.remove("s1"));
    assert!(store.get("s1").is_none());
}

#[test]
fn test_concurrent_upserts_on_one_key() {
    let store = Arc::new(MemoryUsageStore::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    store.upsert("shared", &|| new_row("shared"), &mut |s| {
                        s.requests += 1;
                        s.total_output_tokens += 2;
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let row = store.get("shared").unwrap();
    assert_eq!(row.requests, 4000);
    assert_eq!(row.total_output_tokens, 8000);
}
