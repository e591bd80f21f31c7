//! End-to-end tests for the gateway over the reference engine.

use kvgate_core::{
    BatchOp, Datum, Db, Error, HandleState, IterConfig, OpenConfig, ReadConfig, Status,
};
use kvgate_engine::MemoryBackend;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn open_db() -> Db {
    // RUST_LOG=debug surfaces worker and lifecycle events when a test
    // misbehaves; repeated init attempts are fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let dir = tempfile::tempdir().unwrap();
    let db = Db::new(MemoryBackend::new(), dir.path().join("db"));
    db.open(None).unwrap().wait().unwrap();
    db
}

fn collect(db: &Db, config: Option<IterConfig>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut cursor = db.iterator(config).unwrap().wait().unwrap();
    let mut entries = Vec::new();
    while let Some(entry) = cursor.step().unwrap() {
        let key = match entry.key {
            Some(Datum::Bytes(key)) => key,
            other => panic!("expected byte key, got {other:?}"),
        };
        let value = match entry.value {
            Some(Datum::Bytes(value)) => value,
            other => panic!("expected byte value, got {other:?}"),
        };
        entries.push((key, value));
    }
    entries
}

#[test]
fn put_then_get_returns_value() {
    let db = open_db();
    db.put("k", "v", None).unwrap().wait().unwrap();
    let datum = db.get("k", None).unwrap().wait().unwrap();
    assert_eq!(datum, Datum::Bytes(b"v".to_vec()));
}

#[test]
fn del_then_get_is_not_found() {
    let db = open_db();
    db.put("k", "v", None).unwrap().wait().unwrap();
    db.del("k", None).unwrap().wait().unwrap();

    let error = db.get("k", None).unwrap().wait().unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(error.status(), Some(Status::NotFound));
}

#[test]
fn get_decodes_text_on_request() {
    let db = open_db();
    db.put("k", "hello", None).unwrap().wait().unwrap();
    let datum = db
        .get("k", Some(ReadConfig::new().as_buffer(false)))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(datum, Datum::Text("hello".into()));
}

#[test]
fn batch_put_then_del_leaves_key_deleted() {
    let db = open_db();
    db.batch(
        vec![BatchOp::put("k", "v1"), BatchOp::del("k")],
        None,
    )
    .unwrap()
    .wait()
    .unwrap();

    assert!(db.get("k", None).unwrap().wait().unwrap_err().is_not_found());
}

#[test]
fn invalid_batch_entry_commits_nothing() {
    let db = open_db();
    let result = db.batch(
        vec![BatchOp::put("good", "v"), BatchOp::del(Vec::new())],
        None,
    );
    assert!(matches!(result, Err(Error::Validation { .. })));

    // The valid sibling operation must not have been applied either.
    assert!(db
        .get("good", None)
        .unwrap()
        .wait()
        .unwrap_err()
        .is_not_found());
}

#[test]
fn empty_batch_is_a_successful_noop() {
    let db = open_db();
    db.batch(Vec::new(), None).unwrap().wait().unwrap();
}

#[test]
fn forward_cursor_yields_full_ascending_key_set() {
    let db = open_db();
    for key in ["delta", "alpha", "charlie", "bravo"] {
        db.put(key, key.to_uppercase(), None).unwrap().wait().unwrap();
    }
    let keys: Vec<Vec<u8>> = collect(&db, None).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            b"alpha".to_vec(),
            b"bravo".to_vec(),
            b"charlie".to_vec(),
            b"delta".to_vec()
        ]
    );
}

#[test]
fn reverse_cursor_yields_descending_key_set() {
    let db = open_db();
    for key in ["a", "b", "c"] {
        db.put(key, "v", None).unwrap().wait().unwrap();
    }
    let keys: Vec<Vec<u8>> = collect(&db, Some(IterConfig::new().reverse(true)))
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
}

#[test]
fn cursor_limit_delivers_exactly_n_steps() {
    let db = open_db();
    for key in ["a", "b", "c", "d", "e"] {
        db.put(key, "v", None).unwrap().wait().unwrap();
    }
    let entries = collect(&db, Some(IterConfig::new().limit(3)));
    assert_eq!(entries.len(), 3);
}

#[test]
fn cursor_observes_creation_snapshot() {
    let db = open_db();
    db.put("a", "1", None).unwrap().wait().unwrap();

    let mut cursor = db.iterator(None).unwrap().wait().unwrap();
    db.put("b", "2", None).unwrap().wait().unwrap();

    let mut seen = 0;
    while cursor.step().unwrap().is_some() {
        seen += 1;
    }
    assert_eq!(seen, 1);
}

#[test]
fn scenario_fresh_open_put_iterate_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let db = Db::new(MemoryBackend::new(), dir.path().join("fresh"));
    db.open(Some(OpenConfig::new().create_if_missing(true)))
        .unwrap()
        .wait()
        .unwrap();

    db.put("a", "1", None).unwrap().wait().unwrap();
    db.put("b", "2", None).unwrap().wait().unwrap();

    let entries = collect(&db, Some(IterConfig::new()));
    assert_eq!(
        entries,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec())
        ]
    );

    let size = db.approximate_size("a", "c").unwrap().wait().unwrap();
    assert_eq!(size, 4);

    db.close().unwrap().wait().unwrap();
    assert_eq!(db.state(), HandleState::Closed);
}

#[test]
fn concurrent_data_operations_all_complete() {
    let db = open_db();
    let tickets: Vec<_> = (0..32)
        .map(|i| {
            db.put(format!("key-{i:02}"), format!("value-{i}"), None)
                .unwrap()
        })
        .collect();
    for ticket in tickets {
        ticket.wait().unwrap();
    }
    assert_eq!(db.property("kvgate.num-entries").as_deref(), Some("32"));
}

#[tokio::test]
async fn tickets_are_awaitable() {
    // `open_db` blocks on `wait`, which must not run on the async runtime.
    let db = tokio::task::spawn_blocking(open_db).await.unwrap();
    db.put("k", "v", None).unwrap().await.unwrap();
    let datum = db.get("k", None).unwrap().await.unwrap();
    assert_eq!(datum.as_bytes(), b"v");
    db.close().unwrap().await.unwrap();
}

#[test]
fn open_config_deserializes_the_caller_key_set() {
    let config: OpenConfig = serde_json::from_str(
        r#"{
            "cacheSize": 8192,
            "compression": false,
            "createIfMissing": true,
            "errorIfExists": false,
            "writeBufferSize": 1048576,
            "blockSize": 8192,
            "maxOpenFiles": 500,
            "blockRestartInterval": 8
        }"#,
    )
    .unwrap();
    assert_eq!(config.cache_size, Some(8192));
    assert_eq!(config.compression, Some(false));
    assert_eq!(config.max_open_files, Some(500));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let result = serde_json::from_str::<OpenConfig>(r#"{"cacheSizeBytes": 1}"#);
    assert!(result.is_err());
    let result = serde_json::from_str::<IterConfig>(r#"{"backwards": true}"#);
    assert!(result.is_err());
}

#[test]
fn cache_allocation_failure_aborts_open_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let db = Db::new(MemoryBackend::new(), dir.path().join("db"));
    let result = db.open(Some(OpenConfig::new().cache_size(i64::MAX)));
    assert!(matches!(result, Err(Error::Resource { .. })));
    // The failed resolution never reached the engine or the lifecycle.
    assert_eq!(db.state(), HandleState::Unopened);
}

#[test]
fn repair_then_open_without_create() {
    let dir = tempfile::tempdir().unwrap();
    let db = Db::new(MemoryBackend::new(), dir.path().join("db"));
    db.repair(db.path().to_path_buf(), None)
        .unwrap()
        .wait()
        .unwrap();
    db.open(Some(OpenConfig::new().create_if_missing(false)))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(db.state(), HandleState::Open);
}

#[test]
fn destroy_wipes_the_keyspace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db");
    let db = Db::with_workers(MemoryBackend::new(), path.clone(), 1);
    db.open(None).unwrap().wait().unwrap();
    db.put("k", "v", None).unwrap().wait().unwrap();
    db.close().unwrap().wait().unwrap();

    db.destroy(path, None).unwrap().wait().unwrap();

    db.open(None).unwrap().wait().unwrap();
    assert!(db.get("k", None).unwrap().wait().unwrap_err().is_not_found());
}

proptest! {
    #[test]
    fn put_get_roundtrip_arbitrary_bytes(
        key in prop::collection::vec(any::<u8>(), 1..64),
        value in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let db = open_db();
        db.put(key.clone(), value.clone(), None).unwrap().wait().unwrap();
        let datum = db.get(key, None).unwrap().wait().unwrap();
        prop_assert_eq!(datum.as_bytes(), value.as_slice());
    }

    #[test]
    fn cursor_yields_sorted_unique_keys(
        pairs in prop::collection::btree_map(
            prop::collection::vec(any::<u8>(), 1..16),
            prop::collection::vec(any::<u8>(), 0..16),
            0..24,
        ),
    ) {
        let db = open_db();
        for (key, value) in &pairs {
            db.put(key.clone(), value.clone(), None).unwrap().wait().unwrap();
        }
        let walked: BTreeMap<Vec<u8>, Vec<u8>> = collect(&db, None).into_iter().collect();
        prop_assert_eq!(walked, pairs);
    }
}
