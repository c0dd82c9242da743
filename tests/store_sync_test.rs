use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use vess_field::domain::model::EvaluationPatch;
use vess_field::{EvaluationStore, RestGateway, StaticTokenSession, StoreOptions, VessError};

fn record(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Avaliação {}", id),
        "evaluator": "Ana",
        "date": "15/03/2024",
        "startTime": "08:30",
        "averageScore": 2.5,
        "samples": []
    })
}

fn store(server: &MockServer) -> Result<EvaluationStore<RestGateway>> {
    let gateway =
        RestGateway::new(&server.base_url(), Arc::new(StaticTokenSession::new("tok-123")))?;
    Ok(EvaluationStore::new(
        gateway,
        StoreOptions {
            initial_page: 1,
            limit: 2,
        },
    ))
}

#[tokio::test]
async fn test_deleting_last_record_of_page_two_shifts_to_page_one() -> Result<()> {
    let server = MockServer::start_async().await;
    let page_two = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/evaluations")
                .query_param("page", "2")
                .query_param("limit", "2")
                .header("authorization", "Bearer tok-123");
            then.status(200).json_body(json!({
                "success": true,
                "data": {
                    "evaluations": [record("e3")],
                    "pagination": {"currentPage": 2, "totalPages": 2, "totalItems": 3}
                }
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/evaluations/e3");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;
    let page_one = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/evaluations")
                .query_param("page", "1")
                .query_param("limit", "2");
            then.status(200).json_body(json!({
                "success": true,
                "data": [record("e1"), record("e2")],
                "pagination": {"currentPage": 1, "totalPages": 1, "totalItems": 2}
            }));
        })
        .await;

    let mut store = store(&server)?;
    store.load_page(2).await?;
    assert_eq!(store.evaluations().len(), 1);

    store.delete("e3").await?;

    page_two.assert_async().await;
    delete.assert_async().await;
    page_one.assert_async().await;
    let pagination = store.pagination().expect("page one loaded");
    assert_eq!(pagination.current_page, 1);
    assert!(!pagination.has_previous_page);
    let ids: Vec<&str> = store.evaluations().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["e1", "e2"]);
    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_invalidates_cached_page() -> Result<()> {
    let server = MockServer::start_async().await;
    let mut healthy = server
        .mock_async(|when, then| {
            when.method(GET).path("/evaluations");
            then.status(200).json_body(json!({
                "success": true,
                "data": [record("e1")],
                "pagination": {"currentPage": 1, "totalPages": 1, "totalItems": 1}
            }));
        })
        .await;

    let mut store = store(&server)?;
    store.load_page(1).await?;
    assert_eq!(store.evaluations().len(), 1);

    healthy.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/evaluations");
            then.status(500).body("Erro interno");
        })
        .await;

    let err = store.refresh().await.unwrap_err();

    assert!(matches!(err, VessError::SyncError { .. }));
    assert_eq!(store.error(), Some("Remote error (500): Erro interno"));
    assert!(store.evaluations().is_empty());
    assert!(store.pagination().is_none());
    assert!(!store.is_loading());
    Ok(())
}

#[tokio::test]
async fn test_update_replaces_cached_record() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/evaluations");
            then.status(200).json_body(json!({
                "success": true,
                "data": [record("e1"), record("e2")],
                "pagination": {"currentPage": 1, "totalPages": 1, "totalItems": 2}
            }));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/evaluations/e2")
                .json_body(json!({"name": "Talhão revisado"}));
            then.status(200).json_body(json!({
                "success": true,
                "data": {"id": "e2", "name": "Talhão revisado", "evaluator": "Ana",
                         "date": "15/03/2024", "startTime": "08:30", "averageScore": 2.5,
                         "samples": []}
            }));
        })
        .await;

    let mut store = store(&server)?;
    store.load_page(1).await?;
    store
        .update(
            "e2",
            EvaluationPatch {
                name: Some("Talhão revisado".to_string()),
                ..Default::default()
            },
        )
        .await?;

    update.assert_async().await;
    assert_eq!(store.evaluations()[0].name, "Avaliação e1");
    assert_eq!(store.evaluations()[1].name, "Talhão revisado");
    Ok(())
}
