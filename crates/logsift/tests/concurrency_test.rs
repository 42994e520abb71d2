//! Concurrent readers over one shared store.

use logsift::{AggregationKind, LogStore, SearchEngine, SearchRequest};

const TERRAFORM: &str = include_str!("fixtures/terraform.ndjson");

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_agree() {
    let engine = SearchEngine::new(LogStore::from_ndjson_str(TERRAFORM).into_shared());
    let request = SearchRequest::new("resource_name:web_server").with_limit(2);
    let expected = engine.search(&request).expect("search");

    let searches: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            let request = request.clone();
            tokio::spawn(async move { engine.search(&request).expect("search") })
        })
        .collect();

    let aggregations: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .aggregate(&SearchRequest::default(), AggregationKind::Level, None)
                    .expect("aggregate")
                    .len()
            })
        })
        .collect();

    for handle in searches {
        assert_eq!(handle.await.expect("task completes"), expected);
    }
    for handle in aggregations {
        assert_eq!(handle.await.expect("task completes"), 4);
    }
}
