//! API integration tests
//!
//! Drive the full router in-process against the in-memory repository.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use booklib_server::{
    api, config::AppConfig, repository::Repository, services::tokens::TokenService, AppState,
};

fn app() -> Router {
    api::router(AppState::new(AppConfig::default(), Repository::in_memory()))
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn register(app: &Router, username: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn create_author(app: &Router, token: &str, first_name: &str, birth_date: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/authors",
        Some(token),
        Some(json!({ "first_name": first_name, "last_name": "Nowak", "birth_date": birth_date })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

async fn create_book(app: &Router, token: &str, author_id: i64, isbn: i64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/api/v1/authors/{}/books", author_id),
        Some(token),
        Some(json!({ "title": "Lalka", "isbn": isbn, "number_of_pages": 680 })),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_duplicate() {
    let app = app();
    let payload = json!({ "username": "db1011", "email": "w11@op.pl", "password": "123456" });

    let (status, body) = send(&app, Method::POST, "/api/v1/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(!body["token"].as_str().unwrap().is_empty());

    let (status, body) = send(&app, Method::POST, "/api/v1/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body.get("token").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": "other", "email": "w11@op.pl", "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_object().unwrap();
    assert!(message.contains_key("username"));
    assert!(message.contains_key("email"));
    assert!(message.contains_key("password"));
}

#[tokio::test]
async fn test_body_must_be_json() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("username=db1011"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_login_token_resolves_to_same_account() {
    let app = app();
    register(&app, "db1011", "w11@op.pl").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "db1011", "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "db1011");
    assert_eq!(body["data"]["email"], "w11@op.pl");
    assert!(body["data"].get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "db1011", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_endpoints_reject_missing_and_expired_tokens() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    let (_, me) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    let account_id = me["data"]["id"].as_i64().unwrap() as i32;

    let author = json!({ "first_name": "Adam", "last_name": "Mickiewicz", "birth_date": "24-12-1798" });

    let (status, body) = send(&app, Method::POST, "/api/v1/authors", None, Some(author.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing token. Please login or register");

    let expired = TokenService::new(&AppConfig::default().auth)
        .issue_at(account_id, Utc::now() - Duration::minutes(31))
        .unwrap();
    for (method, uri, body) in [
        (Method::GET, "/api/v1/auth/me", None),
        (Method::POST, "/api/v1/authors", Some(author.clone())),
        (Method::DELETE, "/api/v1/authors/1", None),
    ] {
        let (status, body) = send(&app, method, uri, Some(&expired), body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Expired token. Please login to get new token");
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token. Please login or register");
}

#[tokio::test]
async fn test_update_password_and_data() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    register(&app, "taken", "taken@op.pl").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/auth/update/password",
        Some(&token),
        Some(json!({ "current_password": "000000", "new_password": "abcdef" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Wrong current password");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/auth/update/password",
        Some(&token),
        Some(json!({ "current_password": "123456", "new_password": "abcdef" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "db1011", "password": "abcdef" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/auth/update/data",
        Some(&token),
        Some(json!({ "username": "taken", "email": "w11@op.pl" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/auth/update/data",
        Some(&token),
        Some(json!({ "username": "db1011", "email": "new@op.pl" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "new@op.pl");
}

#[tokio::test]
async fn test_author_crud() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    let id = create_author(&app, &token, "Adam", "24-12-1798").await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/authors/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["birth_date"], "24-12-1798");
    assert_eq!(body["data"]["books"], json!([]));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/authors/{}", id),
        Some(&token),
        Some(json!({ "first_name": "Juliusz", "last_name": "Slowacki", "birth_date": "04-09-1809" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Juliusz");

    let tomorrow = (Utc::now() + Duration::days(2)).format("%d-%m-%Y").to_string();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/authors",
        Some(&token),
        Some(json!({ "first_name": "Future", "last_name": "Writer", "birth_date": tomorrow })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]["birth_date"].is_array());

    let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/authors/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], format!("Author with id {} has been deleted", id));

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/authors/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_isbn_commits_nothing() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    let author_id = create_author(&app, &token, "Boleslaw", "20-08-1847").await;

    let (status, body) = create_book(&app, &token, author_id, 978837327189).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"]["isbn"], json!(["ISBN must contain 13 digits"]));

    let (_, body) = send(&app, Method::GET, "/api/v1/books", None, None).await;
    assert_eq!(body["pagination"]["total_records"], 0);
}

#[tokio::test]
async fn test_book_lifecycle_and_cascade() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    let author_id = create_author(&app, &token, "Boleslaw", "20-08-1847").await;

    let (status, body) = create_book(&app, &token, author_id, 9788373271890).await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["author"]["id"], author_id);
    assert!(body["data"]["author"].get("birth_date").is_none());

    let (status, _) = create_book(&app, &token, author_id, 9788373271890).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = create_book(&app, &token, author_id + 100, 9788373271891).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = create_book(&app, &token, author_id, 9788373271891).await;
    let second = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/books/{}", second),
        Some(&token),
        Some(json!({ "title": "Faraon", "isbn": 9788373271890_i64, "number_of_pages": 700 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/authors/{}/books", author_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number_of_records"], 2);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/authors/{}", author_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    for id in [first, second] {
        let (status, _) = send(&app, Method::GET, &format!("/api/v1/books/{}", id), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_filters_and_deterministic_pagination() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    for (name, birth_date) in [
        ("Adam", "24-12-1798"),
        ("Juliusz", "04-09-1809"),
        ("Cyprian", "24-09-1821"),
        ("Eliza", "06-11-1841"),
        ("Henryk", "05-05-1846"),
        ("Boleslaw", "20-08-1847"),
        ("Maria", "07-11-1867"),
    ] {
        create_author(&app, &token, name, birth_date).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/authors?birth_date__gt=05-05-1846", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Boleslaw", "Maria"]);

    let uri = "/api/v1/authors?last_name=Nowak&per_page=3&page=2";
    let (_, first) = send(&app, Method::GET, uri, None, None).await;
    let (_, again) = send(&app, Method::GET, uri, None, None).await;
    assert_eq!(first, again);
    assert_eq!(first["number_of_records"], 3);
    assert_eq!(first["pagination"]["total_records"], 7);
    assert_eq!(first["pagination"]["total_pages"], 3);
    assert_eq!(
        first["pagination"]["next_page"],
        "/api/v1/authors?last_name=Nowak&page=3&per_page=3"
    );
    assert_eq!(
        first["pagination"]["previous_page"],
        "/api/v1/authors?last_name=Nowak&page=1&per_page=3"
    );

    let (_, last) = send(&app, Method::GET, "/api/v1/authors?per_page=3&page=3", None, None).await;
    assert!(last["pagination"].get("next_page").is_none());

    let (_, ordered) = send(
        &app,
        Method::GET,
        "/api/v1/authors?order_by=-birth_date&fields=first_name&per_page=2",
        None,
        None,
    )
    .await;
    assert_eq!(ordered["data"], json!([{ "first_name": "Maria" }, { "first_name": "Boleslaw" }]));

    let (status, body) = send(&app, Method::GET, "/api/v1/authors?nickname=Adam", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/api/v1/authors?first_name__gt=A", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_isbn_filter_matches_exactly() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;
    let author_id = create_author(&app, &token, "Boleslaw", "20-08-1847").await;
    for isbn in [9788373271890_i64, 9788373271891, 9788373271892] {
        create_book(&app, &token, author_id, isbn).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/books?isbn=9788373271891", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["isbn"], 9788373271891_i64);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/shelves", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

async fn send_raw(app: &Router, uri: &str, token: Option<&str>, content_type: &str, body: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_malformed_json_reported_under_json_key() {
    let app = app();
    let (status, body) = send_raw(&app, "/api/v1/auth/register", None, "application/json", "{\"username\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"]["json"].is_array(), "{}", body);
}

#[tokio::test]
async fn test_protected_write_must_be_json() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;

    let (status, body) = send_raw(
        &app,
        "/api/v1/authors",
        Some(&token),
        "text/plain",
        "first_name=Boleslaw",
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, Method::GET, "/api/v1/authors", None, None).await;
    assert_eq!(body["number_of_records"], 0);
}

#[tokio::test]
async fn test_non_integer_ids_answer_json_not_found() {
    let app = app();
    let token = register(&app, "db1011", "w11@op.pl").await;

    for uri in [
        "/api/v1/authors/abc",
        "/api/v1/authors/abc/books",
        "/api/v1/books/99999999999",
        "/api/v1/books/-",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["success"], false, "{}", uri);
        assert!(body["message"].is_string(), "{}", uri);
    }

    let (status, body) = send(&app, Method::DELETE, "/api/v1/authors/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/books/99999999999",
        Some(&token),
        Some(json!({ "title": "Lalka", "isbn": 9788373271890_i64, "number_of_pages": 680 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
