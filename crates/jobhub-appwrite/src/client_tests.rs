//! Tests for the Appwrite client against a mock server.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobhub_models::ProfileUpdate;

use crate::client::{AppwriteClient, AppwriteConfig, CollectionIds};
use crate::error::AppwriteError;
use crate::profile_repo::ProfileRepository;
use crate::query::Query;
use crate::retry::RetryConfig;
use crate::search_usage_repo::SearchUsageRepository;

// =============================================================================
// Test Helpers
// =============================================================================

const DOCS_PATH: &str = "/v1/databases/main/collections/jobs/documents";

fn test_config(endpoint: &str) -> AppwriteConfig {
    AppwriteConfig {
        endpoint: format!("{}/v1", endpoint),
        project_id: "test-project".to_string(),
        api_key: "test-key".to_string(),
        database_id: "main".to_string(),
        collections: CollectionIds::default(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig::default(),
    }
}

async fn client(server: &MockServer) -> AppwriteClient {
    AppwriteClient::new(test_config(&server.uri())).unwrap()
}

fn doc(id: &str, extra: Value) -> Value {
    let mut base = json!({
        "$id": id,
        "$collectionId": "jobs",
        "$databaseId": "main",
        "$createdAt": "2025-03-01T10:00:00.000+00:00",
        "$updatedAt": "2025-03-01T10:00:00.000+00:00",
        "$permissions": []
    });
    if let (Some(map), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            map.insert(k.clone(), v.clone());
        }
    }
    base
}

fn ids(range: std::ops::Range<usize>) -> Vec<Value> {
    range.map(|i| doc(&format!("doc-{}", i), json!({}))).collect()
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status() {
    assert!(matches!(
        AppwriteError::from_http_status(401, "no key"),
        AppwriteError::Unauthorized(_)
    ));
    assert!(matches!(
        AppwriteError::from_http_status(409, "conflict"),
        AppwriteError::AlreadyExists(_)
    ));
    assert!(matches!(
        AppwriteError::from_http_status(400, "bad query"),
        AppwriteError::RequestFailed(_)
    ));

    let err = AppwriteError::from_http_status(503, "unavailable");
    assert!(matches!(err, AppwriteError::ServerError(503, _)));
    assert!(err.is_retryable());
    assert!(err.is_unavailable());
}

#[test]
fn test_error_retry_after_ms() {
    assert_eq!(AppwriteError::RateLimited(2000).retry_after_ms(), Some(2000));
    assert_eq!(AppwriteError::not_found("x").retry_after_ms(), None);
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_list_documents_sends_project_headers_and_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .and(header("X-Appwrite-Project", "test-project"))
        .and(header("X-Appwrite-Key", "test-key"))
        .and(query_param("queries[]", Query::limit(2).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [doc("a1", json!({"title": "Rust Engineer"}))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = client(&server)
        .await
        .list_documents::<Value>("jobs", &[Query::limit(2)])
        .await
        .unwrap();

    assert_eq!(list.total, 1);
    assert_eq!(list.documents[0].id, "a1");
    assert_eq!(list.documents[0].data["title"], "Rust Engineer");
}

#[tokio::test]
async fn test_get_document_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/missing", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Document with the requested ID could not be found.",
            "code": 404,
            "type": "document_not_found"
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .await
        .get_document::<Value>("jobs", "missing")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_error_body_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key",
            "code": 401,
            "type": "user_unauthorized"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .list_documents::<Value>("jobs", &[])
        .await
        .unwrap_err();

    match err {
        AppwriteError::Unauthorized(msg) => {
            assert!(msg.contains("Invalid API key"));
            assert!(msg.contains("user_unauthorized"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_attempted_once_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .list_documents::<Value>("jobs", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppwriteError::ServerError(503, _)));
}

#[tokio::test]
async fn test_create_conflict_maps_to_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DOCS_PATH))
        .and(body_partial_json(json!({"documentId": "user-1"})))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Document with the requested ID already exists.",
            "code": 409,
            "type": "document_already_exists"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .create_document("jobs", Some("user-1"), &json!({"title": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppwriteError::AlreadyExists(_)));
}

// =============================================================================
// Counting Tests
// =============================================================================

#[tokio::test]
async fn test_count_below_cap_uses_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .and(query_param("queries[]", Query::limit(1).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1234,
            "documents": ids(0..1)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let count = client(&server).await.count_documents("jobs", &[]).await.unwrap();
    assert_eq!(count, 1234);
}

#[tokio::test]
async fn test_count_at_cap_pages_for_exact_total() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .and(query_param("queries[]", Query::limit(1).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 5000,
            "documents": ids(0..1)
        })))
        .mount(&server)
        .await;

    // Registered before the first-page mock so the cursor request matches it
    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .and(query_param("queries[]", Query::cursor_after("doc-99").to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 5000,
            "documents": ids(100..130)
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .and(query_param("queries[]", Query::limit(100).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 5000,
            "documents": ids(0..100)
        })))
        .mount(&server)
        .await;

    let count = client(&server).await.count_documents("jobs", &[]).await.unwrap();
    assert_eq!(count, 130);
}

// =============================================================================
// Repository Tests
// =============================================================================

#[tokio::test]
async fn test_usage_increment_creates_missing_record() {
    let server = MockServer::start().await;
    let usage_path = "/v1/databases/main/collections/search_usage/documents";

    Mock::given(method("GET"))
        .and(path(usage_path))
        .and(query_param("queries[]", Query::equal("userId", "user-1").to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 0,
            "documents": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(usage_path))
        .and(body_partial_json(json!({
            "documentId": "unique()",
            "data": {"userId": "user-1", "date": "2025-06-01", "searchesUsed": 1}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(doc(
            "u1",
            json!({"userId": "user-1", "date": "2025-06-01", "searchesUsed": 1}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let repo = SearchUsageRepository::new(client(&server).await);
    let record = repo.increment("user-1", "2025-06-01").await.unwrap();
    assert_eq!(record.searches_used, 1);
}

#[tokio::test]
async fn test_usage_increment_updates_existing_record() {
    let server = MockServer::start().await;
    let usage_path = "/v1/databases/main/collections/search_usage/documents";

    Mock::given(method("GET"))
        .and(path(usage_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [doc("u1", json!({"userId": "user-1", "date": "2025-06-01", "searchesUsed": 3}))]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/u1", usage_path)))
        .and(body_partial_json(json!({"data": {"searchesUsed": 4}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc(
            "u1",
            json!({"userId": "user-1", "date": "2025-06-01", "searchesUsed": 4}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let repo = SearchUsageRepository::new(client(&server).await);
    let record = repo.increment("user-1", "2025-06-01").await.unwrap();
    assert_eq!(record.searches_used, 4);
}

const PROFILES_PATH: &str = "/v1/databases/main/collections/profiles/documents";

fn profile_doc(name: &str) -> Value {
    doc(
        "user-1",
        json!({"userId": "user-1", "name": name, "userType": "job_seeker", "isPremium": true}),
    )
}

fn rename(name: &str) -> ProfileUpdate {
    ProfileUpdate {
        user_id: "user-1".to_string(),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_profile_upsert_updates_existing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PROFILES_PATH))
        .and(query_param("queries[]", Query::equal("userId", "user-1").to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [profile_doc("Rahim")]
        })))
        .mount(&server)
        .await;

    // Premium flag from the stored document survives the merge
    Mock::given(method("PATCH"))
        .and(path(format!("{}/user-1", PROFILES_PATH)))
        .and(body_partial_json(json!({"data": {"name": "Karim", "isPremium": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_doc("Karim")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PROFILES_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let repo = ProfileRepository::new(client(&server).await);
    let profile = repo.upsert(rename("Karim")).await.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Karim"));
    assert!(profile.is_premium);
}

#[tokio::test]
async fn test_profile_upsert_creates_with_user_id_as_document_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PROFILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 0,
            "documents": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PROFILES_PATH))
        .and(body_partial_json(json!({
            "documentId": "user-1",
            "data": {"userId": "user-1", "name": "Rahim", "isPremium": false}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(doc(
            "user-1",
            json!({"userId": "user-1", "name": "Rahim", "userType": "job_seeker"}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let repo = ProfileRepository::new(client(&server).await);
    let profile = repo.upsert(rename("Rahim")).await.unwrap();
    assert_eq!(profile.user_id, "user-1");
    assert_eq!(profile.name.as_deref(), Some("Rahim"));
    assert!(!profile.is_premium);
}

#[tokio::test]
async fn test_profile_upsert_merges_after_create_conflict() {
    let server = MockServer::start().await;

    // First lookup misses, the lookup after the conflict sees the other writer
    Mock::given(method("GET"))
        .and(path(PROFILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 0,
            "documents": []
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PROFILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [profile_doc("Rahim")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PROFILES_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Document with the requested ID already exists.",
            "code": 409,
            "type": "document_already_exists"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/user-1", PROFILES_PATH)))
        .and(body_partial_json(json!({"data": {"name": "Karim", "isPremium": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_doc("Karim")))
        .expect(1)
        .mount(&server)
        .await;

    let repo = ProfileRepository::new(client(&server).await);
    let profile = repo.upsert(rename("Karim")).await.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Karim"));
    assert!(profile.is_premium);
}
