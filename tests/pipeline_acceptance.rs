//! End-to-end pipeline behavior against in-memory and tempdir backends.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;
use tempfile::TempDir;

use shelfstream::analytics::{
    AnalyticsEventWriter, DailySummaryAggregator, FilesystemObjectStore, ObjectStore,
};
use shelfstream::change::{ChangeBatch, ChangeRecord};
use shelfstream::domain::DailySummary;
use shelfstream::pipeline::Dispatcher;
use shelfstream::search::{MockSearchBackend, SearchProjector};

struct Pipeline {
    dispatcher: Dispatcher,
    backend: Arc<MockSearchBackend>,
    store: Arc<FilesystemObjectStore>,
    _temp: TempDir,
}

async fn pipeline() -> Pipeline {
    let backend = Arc::new(MockSearchBackend::new());
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FilesystemObjectStore::new(temp.path()).await.unwrap());
    let shared: Arc<dyn ObjectStore> = store.clone();

    let dispatcher = Dispatcher::new(
        SearchProjector::new(backend.clone(), "spanish"),
        AnalyticsEventWriter::new(shared.clone()),
        DailySummaryAggregator::new(shared),
    );

    Pipeline {
        dispatcher,
        backend,
        store,
        _temp: temp,
    }
}

fn record(value: serde_json::Value) -> ChangeRecord {
    serde_json::from_value(value).unwrap()
}

fn book_insert(book_id: &str, title: &str) -> ChangeRecord {
    record(json!({
        "eventName": "INSERT",
        "entityKind": "BOOK",
        "after": {
            "book_id": {"S": book_id},
            "tenant_id": {"S": "t1"},
            "title": {"S": title},
            "author": {"S": "Julio Cortázar"},
            "category": {"S": "fiction"},
            "price": {"N": "21.50"},
            "stock_quantity": {"N": "4"},
        }
    }))
}

fn purchase_insert(purchase_id: &str, amount: &str, quantity: u32) -> ChangeRecord {
    record(json!({
        "eventName": "INSERT",
        "entityKind": "PURCHASE",
        "after": {
            "purchase_id": {"S": purchase_id},
            "tenant_id": {"S": "t1"},
            "user_id": {"S": "u-1"},
            "total_amount": {"N": amount},
            "status": {"S": "completed"},
            "payment_method": {"S": "card"},
            "created_at": {"S": "2024-03-15T10:00:00Z"},
            "items": {"L": [{"M": {
                "book_id": {"S": "b-1"},
                "quantity": {"N": quantity.to_string()},
                "unit_price": {"N": amount},
                "subtotal": {"N": amount},
                "title": {"S": "Rayuela"},
                "author": {"S": "Julio Cortázar"},
            }}]},
        }
    }))
}

const SUMMARY_KEY: &str = "t1/daily_summary/year=2024/month=03/day=15/summary.json";

async fn read_summary(store: &FilesystemObjectStore) -> DailySummary {
    let stored = store.get(SUMMARY_KEY).await.unwrap().unwrap();
    serde_json::from_slice(&stored.bytes).unwrap()
}

#[tokio::test]
async fn reindexing_the_same_book_twice_stores_one_identical_document() {
    let p = pipeline().await;
    let batch = vec![book_insert("b-1", "Rayuela"), book_insert("b-1", "Rayuela")];

    let report = p.dispatcher.dispatch(&batch).await;

    assert_eq!(report.records_failed, 0);
    assert_eq!(p.backend.document_count("books_t1").await, 1);

    let doc = p.backend.document("books_t1", "b-1").await.unwrap();
    assert_eq!(doc["title"], "Rayuela");
    assert_eq!(doc["suggest"]["input"][1], "Julio Cortázar");
}

#[tokio::test]
async fn modify_replaces_the_indexed_document_wholesale() {
    let p = pipeline().await;

    p.dispatcher.dispatch(&[book_insert("b-1", "Rayuela")]).await;
    let modify = record(json!({
        "eventName": "MODIFY",
        "entityKind": "BOOK",
        "before": {"book_id": {"S": "b-1"}, "tenant_id": {"S": "t1"}},
        "after": {
            "book_id": {"S": "b-1"},
            "tenant_id": {"S": "t1"},
            "title": {"S": "Rayuela (2a ed.)"},
        }
    }));
    let report = p.dispatcher.dispatch(&[modify]).await;

    assert_eq!(report.records_failed, 0);
    let doc = p.backend.document("books_t1", "b-1").await.unwrap();
    assert_eq!(doc["title"], "Rayuela (2a ed.)");
    // Fields absent from the new image fall back to decode defaults
    assert_eq!(doc["stock_quantity"], 0);
}

#[tokio::test]
async fn remove_of_a_never_inserted_book_is_a_clean_no_op() {
    let p = pipeline().await;

    let remove = record(json!({
        "eventName": "REMOVE",
        "entityKind": "BOOK",
        "before": {"book_id": {"S": "ghost"}, "tenant_id": {"S": "t1"}},
    }));
    let report = p.dispatcher.dispatch(&[remove]).await;

    assert_eq!(report.records_failed, 0);
    assert!(p.backend.created_indices().await.is_empty());
}

#[tokio::test]
async fn purchase_insert_writes_partitioned_event_record() {
    let p = pipeline().await;

    let report = p
        .dispatcher
        .dispatch(&[purchase_insert("p-1", "10.00", 2)])
        .await;

    assert_eq!(report.records_failed, 0);
    let stored = p
        .store
        .get("t1/purchases/year=2024/month=03/day=15/p-1.json")
        .await
        .unwrap()
        .unwrap();
    let event: serde_json::Value = serde_json::from_slice(&stored.bytes).unwrap();
    assert_eq!(event["purchase_id"], "p-1");
    assert_eq!(event["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn sequential_purchases_accumulate_in_the_daily_summary() {
    let p = pipeline().await;

    let report = p
        .dispatcher
        .dispatch(&[
            purchase_insert("p-1", "10.00", 2),
            purchase_insert("p-2", "25.50", 3),
        ])
        .await;

    assert_eq!(report.records_failed, 0);
    let summary = read_summary(&p.store).await;
    assert_eq!(summary.total_purchases, 2);
    assert_eq!(summary.total_revenue, dec!(35.50));
    assert_eq!(summary.total_items_sold, 5);
    assert_eq!(summary.payment_methods.get("card"), Some(&2));
}

#[tokio::test]
async fn purchase_modify_refreshes_the_event_without_recounting() {
    let p = pipeline().await;

    p.dispatcher
        .dispatch(&[purchase_insert("p-1", "10.00", 2)])
        .await;

    let modify = record(json!({
        "eventName": "MODIFY",
        "entityKind": "PURCHASE",
        "after": {
            "purchase_id": {"S": "p-1"},
            "tenant_id": {"S": "t1"},
            "total_amount": {"N": "10.00"},
            "status": {"S": "shipped"},
            "payment_method": {"S": "card"},
            "created_at": {"S": "2024-03-15T10:00:00Z"},
        }
    }));
    let report = p.dispatcher.dispatch(&[modify]).await;
    assert_eq!(report.records_failed, 0);

    let stored = p
        .store
        .get("t1/purchases/year=2024/month=03/day=15/p-1.json")
        .await
        .unwrap()
        .unwrap();
    let event: serde_json::Value = serde_json::from_slice(&stored.bytes).unwrap();
    assert_eq!(event["status"], "shipped");

    // The rollup still counts the purchase once
    let summary = read_summary(&p.store).await;
    assert_eq!(summary.total_purchases, 1);
}

#[tokio::test]
async fn concurrent_batches_do_not_lose_summary_updates() {
    let Pipeline {
        dispatcher,
        backend: _,
        store,
        _temp,
    } = pipeline().await;
    let dispatcher = Arc::new(dispatcher);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..6 {
        let dispatcher = dispatcher.clone();
        tasks.spawn(async move {
            dispatcher
                .dispatch(&[purchase_insert(&format!("p-{i}"), "2.50", 1)])
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap().records_failed, 0);
    }

    let summary = read_summary(&store).await;
    assert_eq!(summary.total_purchases, 6);
    assert_eq!(summary.total_revenue, dec!(15.00));
    assert_eq!(summary.total_items_sold, 6);
}

#[tokio::test]
async fn a_poisoned_record_is_skipped_and_the_rest_of_the_batch_applies() {
    let p = pipeline().await;

    let malformed = record(json!({
        "eventName": "INSERT",
        "entityKind": "BOOK",
        "after": {"title": {"S": "no identity"}},
    }));
    let report = p
        .dispatcher
        .dispatch(&[malformed, book_insert("b-1", "Ficciones")])
        .await;

    assert_eq!(report.records_seen, 2);
    assert_eq!(report.records_failed, 1);
    assert!(p.backend.document("books_t1", "b-1").await.is_some());
}

#[tokio::test]
async fn purchase_remove_leaves_analytics_untouched() {
    let p = pipeline().await;

    p.dispatcher
        .dispatch(&[purchase_insert("p-1", "10.00", 2)])
        .await;

    let remove = record(json!({
        "eventName": "REMOVE",
        "entityKind": "PURCHASE",
        "before": {"purchase_id": {"S": "p-1"}, "tenant_id": {"S": "t1"}},
    }));
    let report = p.dispatcher.dispatch(&[remove]).await;
    assert_eq!(report.records_failed, 0);

    // Event record and rollup both survive
    assert!(p
        .store
        .get("t1/purchases/year=2024/month=03/day=15/p-1.json")
        .await
        .unwrap()
        .is_some());
    assert_eq!(read_summary(&p.store).await.total_purchases, 1);
}

#[tokio::test]
async fn a_full_mixed_batch_parses_and_projects() {
    let p = pipeline().await;

    let batch: ChangeBatch = serde_json::from_value(json!({
        "Records": [
            {
                "eventName": "INSERT",
                "entityKind": "BOOK",
                "after": {
                    "book_id": {"S": "b-1"},
                    "tenant_id": {"S": "t1"},
                    "title": {"S": "Rayuela"},
                },
            },
            {
                "eventName": "INSERT",
                "entityKind": "PURCHASE",
                "after": {
                    "purchase_id": {"S": "p-1"},
                    "tenant_id": {"S": "t1"},
                    "total_amount": {"N": "5.00"},
                    "created_at": {"S": "2024-03-15T12:30:00Z"},
                },
            },
            {
                "eventName": "REMOVE",
                "entityKind": "BOOK",
                "before": {"book_id": {"S": "b-1"}, "tenant_id": {"S": "t1"}},
            },
        ]
    }))
    .unwrap();

    let report = p.dispatcher.dispatch(&batch.records).await;
    assert_eq!(report.records_seen, 3);
    assert_eq!(report.records_failed, 0);

    // The book was indexed, then removed by the later record
    assert!(p.backend.document("books_t1", "b-1").await.is_none());
    assert_eq!(read_summary(&p.store).await.total_purchases, 1);

    let result = report.into_result();
    assert_eq!(result.records_processed, 3);
}
