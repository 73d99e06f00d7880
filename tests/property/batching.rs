//! Property-based tests for batch execution

use proptest::prelude::*;
use sheetpipe::batch::{failure_count, run_batches, BatchOptions};
use std::sync::atomic::{AtomicUsize, Ordering};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn results_mirror_input_and_failures_stay_isolated(
        pattern in proptest::collection::vec(any::<bool>(), 0..40),
        concurrency in 1usize..8,
    ) {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let mut progress = Vec::new();

        let results = runtime().block_on(run_batches(
            pattern.clone(),
            |fails| {
                let in_flight = &in_flight;
                let peak = &peak;
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    if fails { Err("failed") } else { Ok(()) }
                }
            },
            BatchOptions::new()
                .concurrency(concurrency)
                .on_progress(|done, total| progress.push((done, total))),
        ))
        .unwrap();

        prop_assert_eq!(results.len(), pattern.len());
        prop_assert!(peak.load(Ordering::SeqCst) <= concurrency);
        for (i, (result, fails)) in results.iter().zip(&pattern).enumerate() {
            prop_assert_eq!(result.index(), i);
            prop_assert_eq!(result.ok(), !*fails);
        }
        prop_assert_eq!(failure_count(&results), pattern.iter().filter(|f| **f).count());

        let expected: Vec<(usize, usize)> =
            (1..=pattern.len()).map(|done| (done, pattern.len())).collect();
        prop_assert_eq!(progress, expected);
    }
}
