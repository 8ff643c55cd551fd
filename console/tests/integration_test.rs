//! Integration tests for the desk console
//!
//! These tests run the real clients, coordinator and commands against a
//! wiremock server standing in for the three resource APIs:
//! - Ranking endpoints and server ordering
//! - Usage increments followed by targeted refreshes
//! - Write-then-refresh commands
//! - Bootstrap configuration loading and fail-fast behaviour

use deskconsole::app::AppState;
use deskconsole::commands::{self, CopyTarget};
use deskconsole::config::{AppConfig, ConfigSource};
use deskconsole::error::AppError;
use deskconsole::models::{CreateNote, Domain, Facet, ListFilter, Note, Resource, SearchField};
use deskconsole::services::classifier::SecretField;
use deskconsole::services::{
    ConfigHandle, ConfigService, NotesClient, RankingCount, RankingSource, RefreshCoordinator,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bootstrap document pointing every domain at the mock server
fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        app_name: "Desk".to_string(),
        credentials_api_base_url: server.uri(),
        weblinks_api_base_url: server.uri(),
        notes_api_base_url: format!("{}/", server.uri()),
        managements_api_base_url: None,
        reports_api_base_url: None,
    }
}

fn state_for(server: &MockServer) -> AppState {
    AppState::new(
        reqwest::Client::new(),
        ConfigHandle::fixed(config_for(server)),
        RankingCount::default(),
    )
}

fn note_json(id: i64, usage_count: u32, last_used: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": format!("note {}", id),
        "area": "Ops",
        "category": "Linux",
        "subCategory": "",
        "type": "command",
        "freeText": format!("echo {}", id),
        "usageCount": usage_count,
        "isFavorite": false,
        "lastUsed": last_used,
        "createdAt": "2024-01-01T00:00:00",
        "updatedAt": "2024-01-01T00:00:00"
    })
}

fn link_json(id: i64, is_favorite: bool) -> Value {
    json!({
        "id": id,
        "url": "https://ci.example.com",
        "title": "CI",
        "area": "Dev",
        "category": "Tools",
        "subCategory": "",
        "usageCount": 1,
        "isFavorite": is_favorite,
        "lastUsed": null,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

/// Mount most-used, recent and favorites for a collection
async fn mount_rankings(server: &MockServer, collection: &str, most_used: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/most-used", collection)))
        .respond_with(ResponseTemplate::new(200).set_body_json(most_used))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/recent", collection)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/favorites", collection)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_most_used_keeps_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/most-used"))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            note_json(2, 9, Some("2024-05-01T10:00:00")),
            note_json(1, 5, Some("2024-05-02T10:00:00")),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = NotesClient::new(reqwest::Client::new(), ConfigHandle::fixed(config_for(&server)));
    let notes = client.most_used(RankingCount::new(2).unwrap()).await.unwrap();

    let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_increment_and_refresh_publishes_new_ranking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notes/1/increment-usage"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_rankings(
        &server,
        "api/notes",
        json!([
            note_json(1, 10, Some("2024-05-03T10:00:00")),
            note_json(2, 9, Some("2024-05-01T10:00:00")),
        ]),
    )
    .await;

    let state = state_for(&server);
    let outcome = state
        .coordinator
        .increment_and_refresh(Domain::Notes, 1)
        .await
        .unwrap();
    assert!(outcome.is_complete());

    let snapshot = state.coordinator.snapshot(Domain::Notes).unwrap();
    assert_eq!(snapshot.most_used.ids(), vec![1, 2]);
    assert!(snapshot.most_used.is_well_ordered());
    assert!(!state.coordinator.snapshot(Domain::Links).unwrap().is_loaded());
}

#[tokio::test]
async fn test_increment_failure_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/weblinks/7/increment-usage"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/weblinks/most-used"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let state = state_for(&server);
    let before = state.coordinator.snapshot(Domain::Links).unwrap();

    let err = state
        .coordinator
        .increment_and_refresh(Domain::Links, 7)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("database unavailable"));

    assert_eq!(state.coordinator.snapshot(Domain::Links).unwrap(), before);
}

#[tokio::test]
async fn test_view_then_copy_increments_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json(3, 0, None)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/notes/3/increment-usage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_rankings(&server, "api/notes", json!([note_json(3, 1, None)])).await;

    let state = state_for(&server);

    let shown = commands::show(&state, Domain::Notes, 3).await.unwrap();
    assert_eq!(shown.display_name, "note 3");

    let copied = commands::copy_value(
        &state,
        Domain::Notes,
        3,
        SecretField::FullRecord,
        CopyTarget::Stdout,
    )
    .await
        .unwrap();
    assert_eq!(copied.text, "echo 3");
    assert!(copied.counted);
}

#[tokio::test]
async fn test_copy_without_text_is_not_counted() {
    let server = MockServer::start().await;
    let mut empty = note_json(5, 0, None);
    empty["freeText"] = Value::Null;
    Mock::given(method("GET"))
        .and(path("/api/notes/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/notes/5/increment-usage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = state_for(&server);

    let result = commands::copy_value(
        &state,
        Domain::Notes,
        5,
        SecretField::FullRecord,
        CopyTarget::Clipboard,
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_copy_link_is_rejected() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let result = commands::copy_value(
        &state,
        Domain::Links,
        1,
        SecretField::Password,
        CopyTarget::Clipboard,
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_toggle_favorite_updates_then_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weblinks/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_json(4, false)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/weblinks/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_json(4, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/weblinks/4/increment-usage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_rankings(&server, "api/weblinks", json!([link_json(4, true)])).await;

    let state = state_for(&server);
    let is_favorite = commands::favorite(&state, Domain::Links, 4).await.unwrap();
    assert!(is_favorite);

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["isFavorite"], true);

    assert!(state.coordinator.snapshot(Domain::Links).unwrap().is_loaded());
}

#[tokio::test]
async fn test_duplicate_creates_copy_without_counting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json(8, 4, None)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(note_json(9, 0, None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/notes/8/increment-usage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_rankings(&server, "api/notes", json!([])).await;

    let state = state_for(&server);
    let copy = commands::duplicate(&state, Domain::Notes, 8).await.unwrap();
    assert_eq!(copy.id, 9);

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/api/notes")
        .unwrap();
    let body: Value = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(body["name"], "note 8 (copy)");
    assert_eq!(body["isFavorite"], false);
}

#[tokio::test]
async fn test_list_accepts_page_and_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weblinks"))
        .and(query_param("pageIndex", "1"))
        .and(query_param("searchTerm", "ci"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [link_json(1, false), link_json(2, true)],
            "totalCount": 12,
            "pageIndex": 1,
            "pageSize": 2,
            "totalPages": 6,
            "hasPreviousPage": false,
            "hasNextPage": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([note_json(1, 0, None)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = state_for(&server);

    let filter = commands::page_filter(Some("CI"), 1, 2);
    let links = commands::list(&state, Domain::Links, &filter).await.unwrap();
    assert_eq!(links.items.len(), 2);
    assert_eq!(links.total_pages, 6);
    assert!(links.has_next_page);

    let notes = commands::list(&state, Domain::Notes, &ListFilter::default())
        .await
        .unwrap();
    assert_eq!(notes.items.len(), 1);
    assert_eq!(notes.total_pages, 1);
}

#[tokio::test]
async fn test_search_and_facet_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/search/content"))
        .and(query_param("searchTerm", "nginx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([note_json(5, 2, None)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notes/by-type/command"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([note_json(6, 0, None)])))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server);

    let found = commands::search(&state, Domain::Notes, SearchField::Content, " nginx ")
        .await
        .unwrap();
    assert_eq!(found[0].id, 5);

    let typed = commands::by_facet(&state, Domain::Notes, Facet::Type, "command")
        .await
        .unwrap();
    assert_eq!(typed[0].id, 6);
}

#[tokio::test]
async fn test_remote_failure_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Note not found"))
        .mount(&server)
        .await;

    let client = NotesClient::new(reqwest::Client::new(), ConfigHandle::fixed(config_for(&server)));
    let err = client.get(99).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Remote failure (404): Note not found");
}

#[tokio::test]
async fn test_update_with_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/notes/2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = NotesClient::new(reqwest::Client::new(), ConfigHandle::fixed(config_for(&server)));
    let note: Note = serde_json::from_value(note_json(2, 0, None)).unwrap();

    let updated = client.update(2, &note.with_favorite(true)).await.unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn test_create_validates_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = NotesClient::new(reqwest::Client::new(), ConfigHandle::fixed(config_for(&server)));
    let invalid = CreateNote {
        name: String::new(),
        description: None,
        area: String::new(),
        category: String::new(),
        sub_category: String::new(),
        note_type: "command".to_string(),
        free_text: None,
        is_favorite: None,
    };

    let result = client.create(&invalid).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_requests_fail_fast_without_configuration() {
    let temp = TempDir::new().unwrap();
    let service = ConfigService::new(
        ConfigSource::File(temp.path().join("missing.json")),
        reqwest::Client::new(),
    );
    assert!(service.load().await.is_err());

    let client = NotesClient::new(reqwest::Client::new(), service.handle());
    let result = client.get(1).await;
    assert!(matches!(result, Err(AppError::ConfigUnavailable(_))));

    let source: Arc<dyn RankingSource> = Arc::new(client);
    let coordinator = RefreshCoordinator::new(vec![source], RankingCount::default());
    let outcome = coordinator.refresh_one(Domain::Notes).await.unwrap();
    assert!(outcome.all_failed());
}

#[tokio::test]
async fn test_bootstrap_from_url_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config.development.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appName": "Desk",
            "credentialsApiBaseUrl": "https://vault.example",
            "weblinksApiBaseUrl": "https://links.example",
            "notesApiBaseUrl": "https://notes.example",
            "reportsApiBaseUrl": "https://reports.example"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("config.cache.json");
    let location = format!("{}/config.development.json", server.uri());

    let service = ConfigService::new(ConfigSource::parse(&location), reqwest::Client::new())
        .with_cache(cache.clone());
    let config = service.load().await.unwrap();
    assert_eq!(config.reports_api_base_url.as_deref(), Some("https://reports.example"));

    let offline = ConfigService::new(
        ConfigSource::parse("http://127.0.0.1:9/config.json"),
        reqwest::Client::new(),
    )
    .with_cache(cache);
    let cached = offline.load().await.unwrap();
    assert_eq!(cached.notes_api_base_url, "https://notes.example");
}

#[tokio::test]
async fn test_summary_and_recently_updated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mostUsed": [note_json(2, 9, None)],
            "favorites": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notes/recently-updated"))
        .and(query_param("count", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([note_json(4, 0, None)])))
        .mount(&server)
        .await;

    let client = NotesClient::new(reqwest::Client::new(), ConfigHandle::fixed(config_for(&server)));

    let summary = client.summary().await.unwrap();
    assert_eq!(summary.most_used.unwrap()[0].id, 2);
    assert_eq!(summary.favorites.map(|f| f.len()), Some(0));
    assert!(summary.recently_used.is_none());

    let updated = client.recently_updated(RankingCount::default()).await.unwrap();
    assert_eq!(updated[0].id, 4);
}
