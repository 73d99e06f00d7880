use parking_lot::Mutex;
use sheetpipe::batch::{failure_count, run_batches, BatchOptions};
use sheetpipe::retry::{ChunkLoadRetryConfig, LoadError, RetryController, RetryOptions};
use sheetpipe::store::{KeyValueStore, MemoryStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn five_items_two_failures() {
    let mut progress = Vec::new();
    let results = run_batches(
        vec!["a.csv", "b.xlsx", "c.csv", "d.ods", "e.csv"],
        |name| async move {
            tokio::time::sleep(Duration::from_millis(name.len() as u64)).await;
            if name.ends_with(".csv") {
                Ok(name.to_uppercase())
            } else {
                Err(format!("unsupported format: {name}"))
            }
        },
        BatchOptions::new()
            .concurrency(2)
            .on_progress(|done, total| progress.push((done, total))),
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(failure_count(&results), 2);
    assert!(!results[1].ok());
    assert!(!results[3].ok());
    assert_eq!(results[4].value().map(String::as_str), Some("E.CSV"));
    assert_eq!(
        results[1].error().unwrap().message,
        "unsupported format: b.xlsx"
    );

    assert_eq!(progress.len(), 5);
    assert!(progress.windows(2).all(|w| w[1].0 == w[0].0 + 1));
    assert_eq!(progress.last(), Some(&(5, 5)));
}

#[tokio::test(start_paused = true)]
async fn results_keep_input_positions_under_racing_completions() {
    let delays: Vec<u64> = vec![50, 5, 40, 10, 30, 1, 20];
    let results = run_batches(
        delays.clone(),
        |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, String>(delay)
        },
        BatchOptions::new().concurrency(3),
    )
    .await
    .unwrap();

    let returned: Vec<u64> = results.iter().map(|r| *r.value().unwrap()).collect();
    assert_eq!(returned, delays);
    assert!(results.iter().enumerate().all(|(i, r)| r.index() == i));
}

/// Each item goes through its own retry controller; the executor stays unaware.
#[tokio::test(start_paused = true)]
async fn per_item_retry_composes_with_executor() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let attempts = Mutex::new(HashMap::<u32, u32>::new());

    let results = run_batches(
        vec![1u32, 2, 3, 4],
        |id| {
            let store = Arc::clone(&store);
            let attempts = &attempts;
            async move {
                let controller = RetryController::new(
                    ChunkLoadRetryConfig::default().with_storage_key(format!("sheet:{id}")),
                    store,
                )
                .map_err(|e| e.to_string())?;
                controller
                    .retry(
                        || {
                            let attempt = {
                                let mut map = attempts.lock();
                                let n = map.entry(id).or_insert(0);
                                *n += 1;
                                *n
                            };
                            async move {
                                match (id, attempt) {
                                    (2, 1) => Err(LoadError::chunk("Loading chunk 2 failed")),
                                    (4, _) => Err(LoadError::new("TypeError", "bad cell")),
                                    _ => Ok(id * 10),
                                }
                            }
                        },
                        RetryOptions::automatic(),
                    )
                    .await
                    .map_err(|e| e.to_string())
            }
        },
        BatchOptions::new().concurrency(2),
    )
    .await
    .unwrap();

    assert_eq!(results[0].value(), Some(&10));
    assert_eq!(results[1].value(), Some(&20));
    assert_eq!(results[2].value(), Some(&30));
    assert!(!results[3].ok());
    assert_eq!(attempts.lock()[&2], 2);
    assert_eq!(attempts.lock()[&4], 1);
    assert_eq!(store.get("sheet:2").unwrap(), None);
}
