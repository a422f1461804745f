//! Tests for the tracker module

use super::*;
use crate::error::Error;
use crate::pagination::ItemSource;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn stories(count: usize) -> Vec<Value> {
    (1..=count).map(|id| json!({"id": id})).collect()
}

fn page(items: &[Value], offset: usize, total: usize) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header(OFFSET_HEADER, offset.to_string())
        .insert_header(RETURNED_HEADER, items.len().to_string())
        .insert_header(TOTAL_HEADER, total.to_string())
        .set_body_json(items)
}

/// Serve `items` under `resource` in upstream pages of `page_size`
async fn mount_paged(server: &MockServer, resource: &str, items: &[Value], page_size: usize) {
    let total = items.len();
    let mut offset = 0;

    loop {
        let end = (offset + page_size).min(total);
        let mock = Mock::given(method("GET")).and(path(resource));
        let mock = if offset == 0 {
            mock.and(query_param_is_missing("offset"))
        } else {
            mock.and(query_param("offset", offset.to_string()))
        };
        mock.respond_with(page(&items[offset..end], offset, total))
            .mount(server)
            .await;

        offset = end;
        if offset >= total {
            break;
        }
    }
}

fn client_for(server: &MockServer) -> TrackerClient {
    TrackerClient::new(TrackerClientConfig::new("secret-token").base_url(server.uri())).unwrap()
}

async fn drain(list: &mut TrackerList) -> Vec<Value> {
    let mut items = Vec::new();
    while let Some(item) = list.next_item().await.unwrap() {
        items.push(item);
    }
    items
}

// ============================================================================
// PaginationMeta Tests
// ============================================================================

#[test]
fn test_meta_from_headers() {
    let mut headers = HeaderMap::new();
    headers.insert(OFFSET_HEADER, HeaderValue::from_static("20"));
    headers.insert(RETURNED_HEADER, HeaderValue::from_static("10"));
    headers.insert(TOTAL_HEADER, HeaderValue::from_static("35"));

    let meta = PaginationMeta::from_headers(&headers).unwrap();
    assert_eq!(
        meta,
        PaginationMeta {
            offset: 20,
            returned: 10,
            total: 35
        }
    );
    assert_eq!(meta.next_offset(), Some(30));
}

#[test]
fn test_meta_missing_headers_is_single_page() {
    let meta = PaginationMeta::from_headers(&HeaderMap::new()).unwrap();
    assert_eq!(meta, PaginationMeta::default());
    assert_eq!(meta.next_offset(), None);
}

#[test]
fn test_meta_malformed_header() {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_HEADER, HeaderValue::from_static("lots"));

    let err = PaginationMeta::from_headers(&headers).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_meta_last_page() {
    let meta = PaginationMeta {
        offset: 20,
        returned: 5,
        total: 25,
    };
    assert_eq!(meta.next_offset(), None);
}

#[test]
fn test_meta_empty_page_ends_list() {
    let meta = PaginationMeta {
        offset: 10,
        returned: 0,
        total: 25,
    };
    assert_eq!(meta.next_offset(), None);
}

#[test]
fn test_meta_overflowing_offset_ends_list() {
    let meta = PaginationMeta {
        offset: u64::MAX,
        returned: 1,
        total: u64::MAX,
    };
    assert_eq!(meta.next_offset(), None);
}

// ============================================================================
// Client Tests
// ============================================================================

#[test]
fn test_client_config_defaults() {
    let config = TrackerClientConfig::new("abc");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.token, "abc");
    assert!(config.rate_limit.is_none());
}

#[test]
fn test_resolve_against_root_without_trailing_slash() {
    let client = TrackerClient::new(
        TrackerClientConfig::new("t").base_url("https://tracker.example.com/services/v5"),
    )
    .unwrap();

    let url = client.resolve("projects/7/stories").unwrap();
    assert_eq!(
        url.as_str(),
        "https://tracker.example.com/services/v5/projects/7/stories"
    );
}

#[tokio::test]
async fn test_requests_carry_token_and_json_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(header(TOKEN_HEADER, "secret-token"))
        .and(header("content-type", "application/json"))
        .respond_with(page(&stories(2), 0, 2))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = client_for(&server).projects().unwrap();
    assert_eq!(drain(&mut list).await, stories(2));
}

#[tokio::test]
async fn test_create_chore() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/99/stories"))
        .and(header(TOKEN_HEADER, "secret-token"))
        .and(body_json(json!({
            "name": "Fix the printer",
            "description": "requested by ann@example.com",
            "story_type": "chore"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 555, "story_type": "chore"})))
        .expect(1)
        .mount(&server)
        .await;

    let project = TrackerProject::new(client_for(&server), 99);
    let story = project
        .create_chore("Fix the printer", "requested by ann@example.com")
        .await
        .unwrap();

    assert_eq!(story["id"], 555);
}

#[tokio::test]
async fn test_create_chore_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/99/stories"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_chore(99, "name", "description")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 403, ref body } if body == "forbidden"));
    assert!(err.is_upstream());
}

// ============================================================================
// TrackerList Tests
// ============================================================================

#[tokio::test]
async fn test_list_crosses_upstream_pages_in_order() {
    let server = MockServer::start().await;
    mount_paged(&server, "/projects/1/stories", &stories(25), 10).await;

    let mut list = client_for(&server).stories(1).unwrap();
    let items = drain(&mut list).await;

    assert_eq!(items, stories(25));
    assert_eq!(list.pages_fetched(), 3);
    assert!(list.is_finished());
}

#[tokio::test]
async fn test_list_fetches_lazily() {
    let server = MockServer::start().await;
    mount_paged(&server, "/projects/1/stories", &stories(25), 10).await;

    let mut list = client_for(&server).stories(1).unwrap();
    for expected in 1..=10 {
        let item = list.next_item().await.unwrap().unwrap();
        assert_eq!(item["id"], expected);
    }

    assert_eq!(list.pages_fetched(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    list.next_item().await.unwrap();
    assert_eq!(list.pages_fetched(), 2);
}

#[tokio::test]
async fn test_list_empty() {
    let server = MockServer::start().await;
    mount_paged(&server, "/projects", &[], 10).await;

    let mut list = client_for(&server).projects().unwrap();
    assert_eq!(list.next_item().await.unwrap(), None);
    assert!(list.is_finished());
}

#[tokio::test]
async fn test_list_without_metadata_is_one_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories(3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = client_for(&server).projects().unwrap();
    assert_eq!(drain(&mut list).await, stories(3));
}

#[tokio::test]
async fn test_offset_replaces_resource_query() {
    let server = MockServer::start().await;
    let items = stories(4);

    Mock::given(method("GET"))
        .and(path("/projects/1/stories"))
        .and(query_param("with_state", "started"))
        .respond_with(page(&items[..2], 0, 4))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/1/stories"))
        .and(query_param("offset", "2"))
        .respond_with(page(&items[2..], 2, 4))
        .mount(&server)
        .await;

    let mut list = client_for(&server)
        .list("projects/1/stories?with_state=started")
        .unwrap();
    assert_eq!(drain(&mut list).await, items);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].url.query(), Some("offset=2"));
}

#[tokio::test]
async fn test_list_upstream_failure_aborts() {
    let server = MockServer::start().await;
    let items = stories(20);

    Mock::given(method("GET"))
        .and(path("/projects/1/stories"))
        .and(query_param_is_missing("offset"))
        .respond_with(page(&items[..10], 0, 20))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/1/stories"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = client_for(&server).stories(1).unwrap();
    for _ in 0..10 {
        assert!(list.next_item().await.unwrap().is_some());
    }

    let err = list.next_item().await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));

    // not retried: the list is over
    assert_eq!(list.next_item().await.unwrap(), None);
}

#[tokio::test]
async fn test_list_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
        .mount(&server)
        .await;

    let mut list = client_for(&server).projects().unwrap();
    assert!(list.next_item().await.is_err());
}

#[tokio::test]
async fn test_rate_limited_client_still_lists() {
    let server = MockServer::start().await;
    mount_paged(&server, "/projects", &stories(6), 2).await;

    let client = TrackerClient::new(
        TrackerClientConfig::new("secret-token")
            .base_url(server.uri())
            .rate_limit(RateLimiterConfig::new(100, 10)),
    )
    .unwrap();

    let mut list = client.projects().unwrap();
    assert_eq!(drain(&mut list).await, stories(6));
}
