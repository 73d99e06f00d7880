use sheetpipe::error::RetryError;
use sheetpipe::retry::{
    ChunkLoadRetryConfig, LoadError, RetryController, RetryOptions, RetryPhase, RetryState,
};
use sheetpipe::store::{KeyValueStore, MemoryStore, SledStore};
use std::sync::Arc;
use tempfile::TempDir;

fn config(key: &str) -> ChunkLoadRetryConfig {
    ChunkLoadRetryConfig::default().with_storage_key(key)
}

async fn fail_once(controller: &RetryController) -> RetryError<LoadError> {
    controller
        .retry(
            || async { Err::<(), _>(LoadError::chunk("Loading chunk 12 failed")) },
            RetryOptions::manual(),
        )
        .await
        .unwrap_err()
}

#[test]
fn new_controller_observes_seeded_record() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            "chunk:dashboard",
            r#"{"retryCount":2,"lastRetryAt":1710000000000}"#,
        )
        .unwrap();

    let controller = RetryController::new(config("chunk:dashboard"), store).unwrap();
    assert_eq!(controller.retry_count(), 2);
    assert_eq!(controller.phase(), RetryPhase::Retrying(2));
    assert!(controller.can_retry());
    assert_eq!(controller.retry_delay_ms(), 4000);
}

#[test]
fn delays_follow_persisted_count() {
    let store = Arc::new(MemoryStore::new());
    let mut delays = Vec::new();
    for count in [0u32, 1, 2, 3, 4, 5, 9] {
        let raw = RetryState {
            retry_count: count,
            last_retry_at: 0,
        }
        .encode();
        store.set("chunk:delays", &raw).unwrap();
        let controller = RetryController::new(
            ChunkLoadRetryConfig {
                max_retries: 20,
                ..config("chunk:delays")
            },
            store.clone(),
        )
        .unwrap();
        delays.push(controller.retry_delay_ms());
    }
    assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
}

#[test]
fn corrupt_record_reads_as_idle() {
    let store = Arc::new(MemoryStore::new());
    store.set("chunk:corrupt", "{retryCount: nope").unwrap();
    let controller = RetryController::new(config("chunk:corrupt"), store).unwrap();
    assert_eq!(controller.retry_count(), 0);
    assert!(!controller.is_degraded());
}

#[tokio::test]
async fn count_survives_store_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = Arc::new(SledStore::open(dir.path()).unwrap());
        let controller = RetryController::new(config("chunk:app"), store).unwrap();
        assert!(fail_once(&controller).await.is_transient());
        assert!(fail_once(&controller).await.is_transient());
        assert_eq!(controller.retry_count(), 2);
    }

    let store = Arc::new(SledStore::open(dir.path()).unwrap());
    let controller = RetryController::new(config("chunk:app"), store.clone()).unwrap();
    assert_eq!(controller.retry_count(), 2);

    let err = fail_once(&controller).await;
    assert!(err.is_exhausted());
    assert!(!controller.can_retry());

    controller.reset();
    assert_eq!(controller.retry_count(), 0);
    assert_eq!(store.get("chunk:app").unwrap(), None);
}

#[tokio::test]
async fn exhausted_key_stays_exhausted_for_a_rebuilt_controller() {
    let store = Arc::new(MemoryStore::new());
    let first = RetryController::new(config("chunk:route"), store.clone()).unwrap();
    for _ in 0..3 {
        fail_once(&first).await;
    }
    drop(first);

    let second = RetryController::new(config("chunk:route"), store).unwrap();
    let mut invoked = false;
    let err = second
        .retry(
            || {
                invoked = true;
                async { Ok::<_, LoadError>(()) }
            },
            RetryOptions::automatic(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RetryError::Exhausted {
            max_retries: 3,
            source: None
        }
    ));
    assert!(!invoked);
}

#[tokio::test]
async fn controllers_only_touch_their_own_key() {
    let store = Arc::new(MemoryStore::new());
    store.set("unrelated", "keep me").unwrap();

    let a = RetryController::new(config("chunk:a"), store.clone()).unwrap();
    let b = RetryController::new(config("chunk:b"), store.clone()).unwrap();
    fail_once(&a).await;
    fail_once(&a).await;
    fail_once(&b).await;

    assert_eq!(a.retry_count(), 2);
    assert_eq!(b.retry_count(), 1);

    a.retry(|| async { Ok::<_, LoadError>(()) }, RetryOptions::manual())
        .await
        .unwrap();
    assert_eq!(store.get("chunk:a").unwrap(), None);
    assert!(store.get("chunk:b").unwrap().is_some());
    assert_eq!(store.get("unrelated").unwrap().as_deref(), Some("keep me"));
}

#[tokio::test]
async fn later_controller_sees_reset_from_another() {
    let store = Arc::new(MemoryStore::new());
    let ui = RetryController::new(config("chunk:shared"), store.clone()).unwrap();
    fail_once(&ui).await;

    let admin = RetryController::new(config("chunk:shared"), store.clone()).unwrap();
    assert_eq!(admin.retry_count(), 1);
    admin.reset();

    // The next call re-reads the record before acting.
    let err = fail_once(&ui).await;
    assert!(matches!(err, RetryError::Transient { retry_count: 1, .. }));
}
