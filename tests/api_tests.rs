//! Integration tests for the REST endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` against
//! an in-memory backend, without starting a TCP server.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use murder_tracker::api::build_router;
use murder_tracker::app_state::AppState;
use murder_tracker::domain::{
    EventBus, GameId, GameRound, LocationDirectory, NewLocation, Player, PlayerId,
};
use murder_tracker::persistence::InMemoryStore;
use murder_tracker::service::{KillWindow, MurderService};

/// Game 1 with Alice (1), Bob (2, code `ABC`) and Carol (3), plus the
/// locations Quad (1), Library (2) and Bridge (3).
async fn make_app() -> Router {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_game(GameRound {
            id: GameId::new(1),
            year: 2017,
            number: 1,
        })
        .await;
    for (id, name, code) in [(1, "Alice", "AAA"), (2, "Bob", "ABC"), (3, "Carol", "CCC")] {
        store
            .insert_player(Player {
                id: PlayerId::new(id),
                game: GameId::new(1),
                name: name.to_string(),
                code: code.to_string(),
                disabled: false,
            })
            .await
            .unwrap();
    }
    for name in ["Quad", "Library", "Bridge"] {
        LocationDirectory::add(
            store.as_ref(),
            NewLocation {
                name: name.to_string(),
                lat: Some(51.0),
                lng: Some(-1.0),
            },
        )
        .await
        .unwrap();
    }

    let service = MurderService::from_backend(
        store,
        Arc::new(EventBus::new(64)),
        KillWindow::default(),
    );
    build_router().with_state(AppState::new(service))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post_json(app: &Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn kill(murderer: i64, code: &str) -> Value {
    json!({
        "murderer": murderer,
        "kill_code": code,
        "datetime": "2017-01-05",
        "location": "3",
    })
}

#[tokio::test]
async fn health_returns_200() {
    let app = make_app().await;
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn logged_kill_appears_in_listing_with_names() {
    let app = make_app().await;

    let (status, body) = post_json(&app, "/api/v1/games/1/kills", &kill(1, "ABC")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["murder"]["murderer"], 1);
    assert_eq!(body["murder"]["victim"], 2);
    assert_eq!(body["murder"]["location"], 3);
    assert_eq!(body["redirect"], "/api/v1/games/1/murders");

    let (status, list) = get_json(&app, "/api/v1/games/1/murders").await;
    assert_eq!(status, StatusCode::OK);
    let rows = list.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["murderer_name"], "Alice");
    assert_eq!(rows[0]["victim_name"], "Bob");
    assert_eq!(rows[0]["location_name"], "Bridge");
    assert_eq!(rows[0]["lat"], 51.0);
}

#[tokio::test]
async fn rejected_kill_returns_form_and_stores_nothing() {
    let app = make_app().await;

    let (status, body) = post_json(&app, "/api/v1/games/1/kills", &kill(1, "ZZZ")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["rejection"], "invalid_kill_code");
    assert_eq!(body["form"]["error_message"], "Invalid kill code!");
    assert_eq!(body["form"]["kill_code"], Value::Null);
    assert_eq!(body["form"]["players"].as_array().unwrap().len(), 3);
    assert_eq!(body["form"]["locations"].as_array().unwrap().len(), 3);

    let (status, body) = post_json(&app, "/api/v1/games/1/kills", &kill(2, "ABC")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["rejection"], "self_kill");
    assert_eq!(body["form"]["kill_code"], "ABC");

    let (_, list) = get_json(&app, "/api/v1/murders?game=1").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn kill_at_unknown_location_is_unknown_reference() {
    let app = make_app().await;
    let mut body = kill(1, "ABC");
    body["location"] = json!("99");

    let (status, body) = post_json(&app, "/api/v1/games/1/kills", &body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["rejection"], "unknown_reference");
    assert_eq!(body["form"]["error_message"], "Unknown killer or location!");
    assert_eq!(body["form"]["kill_code"], "ABC");

    let (_, list) = get_json(&app, "/api/v1/murders?game=1").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn second_kill_of_same_victim_is_already_dead() {
    let app = make_app().await;
    let (status, _) = post_json(&app, "/api/v1/games/1/kills", &kill(1, "ABC")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(&app, "/api/v1/games/1/kills", &kill(3, "ABC")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["rejection"], "already_dead");
    // Only Alice and Carol are still offered.
    assert_eq!(body["form"]["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn murder_filters_narrow_the_listing() {
    let app = make_app().await;
    let admin = |murderer: i64, victim: i64| {
        json!({
            "murderer": murderer,
            "victim": victim,
            "datetime": "2017-01-10T12:00",
        })
    };
    let (status, _) = post_json(&app, "/api/v1/games/1/murders", &admin(1, 2)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post_json(&app, "/api/v1/games/1/murders", &admin(3, 1)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, all) = get_json(&app, "/api/v1/murders").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, carol) = get_json(&app, "/api/v1/murders?game=1&murderer=3").await;
    let carol = carol.as_array().unwrap();
    assert_eq!(carol.len(), 1);
    assert_eq!(carol[0]["victim_name"], "Alice");
    assert_eq!(carol[0]["location"], Value::Null);
    let (_, none) = get_json(&app, "/api/v1/games/1/murders?murderer=2").await;
    assert!(none.as_array().unwrap().is_empty());

    let (_, first) = get_json(&app, "/api/v1/games/1/first-kill").await;
    assert_eq!(first["murderer"], 1);
}

#[tokio::test]
async fn duplicate_admin_entry_conflicts() {
    let app = make_app().await;
    let entry = json!({"murderer": 1, "victim": 2, "datetime": "2017-01-10"});
    let (status, _) = post_json(&app, "/api/v1/games/1/murders", &entry).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(&app, "/api/v1/games/1/murders", &entry).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 2010);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = make_app().await;
    let (_, body) = post_json(&app, "/api/v1/games/1/kills", &kill(1, "ABC")).await;
    let id = body["murder"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/games/1/murders/{id}");

    let (status, _) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn stats_report_most_wanted_and_counts() {
    let app = make_app().await;
    let (status, _) = post_json(&app, "/api/v1/games/1/kills", &kill(1, "ABC")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = get_json(&app, "/api/v1/games/1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["most_wanted"]["player"]["name"], "Alice");
    assert_eq!(page["most_wanted"]["murders"], 1);
    assert_eq!(page["players"].as_array().unwrap().len(), 3);
    // Kill codes never leave the service.
    assert!(page["players"][0].get("code").is_none());

    let request = Request::builder()
        .uri("/api/v1/stats/simple")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "2\n1\n");
}

#[tokio::test]
async fn kill_redirect_targets_latest_game() {
    let app = make_app().await;
    let request = Request::builder()
        .uri("/api/v1/kill/ABC")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/api/v1/games/1/kills?kill_code=ABC"
    );

    let (status, form) = get_json(&app, "/api/v1/games/1/kills?kill_code=ABC").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(form["kill_code"], "ABC");
}

#[tokio::test]
async fn kill_redirect_without_game_is_not_found() {
    let service = MurderService::from_backend(
        Arc::new(InMemoryStore::new()),
        Arc::new(EventBus::new(1)),
        KillWindow::default(),
    );
    let app = build_router().with_state(AppState::new(service));
    let (status, body) = get_json(&app, "/api/v1/kill").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2003);
}
