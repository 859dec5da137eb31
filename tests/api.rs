use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_kernel::settings::{DatabaseSettings, Settings};
use tower::ServiceExt;

fn in_memory() -> Settings {
    Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register_and_login(app: &Router, email: &str, phone: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({
            "title": "Mr",
            "name": "Reader",
            "phone": phone,
            "email": email,
            "password": "password1",
            "address": { "city": "Pune" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["data"].get("passwordHash").is_none());

    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": email, "password": "password1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["userId"].as_str().unwrap().to_string();
    (token, user_id)
}

fn book(title: &str, isbn: &str) -> Value {
    json!({
        "title": title,
        "excerpt": "An excerpt",
        "ISBN": isbn,
        "category": "Fiction",
        "subcategory": ["Drama"],
        "releasedAt": "2020-01-01"
    })
}

async fn book_reviews(app: &Router, book_id: &str) -> u64 {
    let (status, body) = send(app, Method::GET, &format!("/api/books/{}", book_id), None, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["reviews"].as_u64().unwrap()
}

#[tokio::test]
async fn test_review_lifecycle_keeps_counter_in_step() {
    let app = shelf_app::build_app(in_memory()).await.unwrap();
    let (token, user_id) = register_and_login(&app, "a@x.com", "+911234567890").await;

    let (status, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book("T1", "ISBN1"))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["reviews"], 0);
    assert_eq!(body["data"]["userId"], user_id.as_str());
    let book_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&token),
        Some(json!({ "bookId": book_id, "rating": 4, "review": "Solid" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["reviewedBy"], user_id.as_str());
    let review_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(book_reviews(&app, &book_id).await, 1);

    let (status, body) = send(&app, Method::GET, &format!("/api/books/{}", book_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reviewsData"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/reviews/{}", review_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], true);
    assert!(body.get("data").is_none());
    assert_eq!(book_reviews(&app, &book_id).await, 0);

    let (status, body) = send(&app, Method::GET, &format!("/api/reviews/{}", book_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_book_errors() {
    let app = shelf_app::build_app(in_memory()).await.unwrap();
    let (token, _) = register_and_login(&app, "a@x.com", "+911234567890").await;

    let (status, _) = send(&app, Method::POST, "/api/books", None, Some(book("T1", "ISBN1"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book("T1", "ISBN1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let book_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book("T2", "ISBN1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, body) = send(&app, Method::GET, "/api/books/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid bookId.");

    let uri = format!("/api/books/{}", book_id);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isDeleted"], true);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_only_the_author_may_change_a_review() {
    let app = shelf_app::build_app(in_memory()).await.unwrap();
    let (author, _) = register_and_login(&app, "a@x.com", "+911234567890").await;
    let (stranger, _) = register_and_login(&app, "b@x.com", "+919876543210").await;

    let (_, body) = send(&app, Method::POST, "/api/books", Some(&author), Some(book("T1", "ISBN1"))).await;
    let book_id = body["data"]["id"].as_str().unwrap().to_string();
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&author),
        Some(json!({ "bookId": book_id, "rating": 5 })),
    )
    .await;
    let review_uri = format!("/api/reviews/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::PUT, &review_uri, Some(&stranger), Some(json!({ "rating": 1 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &review_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(book_reviews(&app, &book_id).await, 1);

    let (status, body) = send(&app, Method::PUT, &review_uri, Some(&author), Some(json!({ "rating": 2 }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["rating"], 2);

    let (status, _) = send(&app, Method::PUT, &review_uri, Some(&author), Some(json!({ "rating": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guest_reviews_follow_configuration() {
    let app = shelf_app::build_app(in_memory()).await.unwrap();
    let (token, _) = register_and_login(&app, "a@x.com", "+911234567890").await;
    let (_, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book("T1", "ISBN1"))).await;
    let book_id = body["data"]["id"].as_str().unwrap().to_string();
    let review = json!({ "bookId": book_id, "rating": 3 });

    let (status, _) = send(&app, Method::POST, "/api/reviews", None, Some(review.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut settings = in_memory();
    settings.reviews.allow_guest = true;
    let guest_app = shelf_app::build_app(settings).await.unwrap();
    let (token, _) = register_and_login(&guest_app, "a@x.com", "+911234567890").await;
    let (_, body) = send(&guest_app, Method::POST, "/api/books", Some(&token), Some(book("T1", "ISBN1"))).await;
    let book_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &guest_app,
        Method::POST,
        "/api/reviews",
        None,
        Some(json!({ "bookId": book_id, "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["reviewedBy"], "Guest");

    let (status, _) = send(
        &guest_app,
        Method::POST,
        "/api/reviews",
        Some("not-a-token"),
        Some(json!({ "bookId": book_id, "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_body_errors() {
    let app = shelf_app::build_app(in_memory()).await.unwrap();
    register_and_login(&app, "a@x.com", "+911234567890").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({
            "title": "Mrs",
            "name": "Other",
            "phone": "+911234567890",
            "email": "c@x.com",
            "password": "password1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "phone");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = shelf_app::build_app(in_memory()).await.unwrap();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = send(&app, Method::GET, "/docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/api/users/register", "/api/books", "/api/books/{id}", "/api/reviews/{id}"] {
        assert!(spec["paths"][path].is_object(), "missing {path}");
    }
}

#[tokio::test]
async fn test_reconcile_agrees_with_http_writes() {
    let state = shelf_app::AppState::connect(in_memory()).await.unwrap();
    let app = shelf_app::router(&state).unwrap();
    let (token, _) = register_and_login(&app, "a@x.com", "+911234567890").await;

    let (_, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book("T1", "ISBN1"))).await;
    let book_id = body["data"]["id"].as_str().unwrap().to_string();
    for rating in [1, 3, 5] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/reviews",
            Some(&token),
            Some(json!({ "bookId": book_id, "rating": rating })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (before, after) = state
        .coordinator
        .reconcile(&state.store, book_id.parse().unwrap())
        .await
        .unwrap();
    assert_eq!((before, after), (3, 3));
    assert_eq!(state.coordinator.skipped_syncs(), 0);
}

#[tokio::test]
async fn test_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.database.url = format!("sqlite://{}", dir.path().join("shelf.db").display());

    let state = shelf_app::AppState::connect(settings.clone()).await.unwrap();
    let app = shelf_app::router(&state).unwrap();
    let (token, user_id) = register_and_login(&app, "a@x.com", "+911234567890").await;
    let (_, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book("T1", "ISBN1"))).await;
    let book_id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&token),
        Some(json!({ "bookId": book_id, "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    state.store.close().await;
    drop(app);

    let state = shelf_app::AppState::connect(settings).await.unwrap();
    let app = shelf_app::router(&state).unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "password1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["userId"], user_id.as_str());

    assert_eq!(book_reviews(&app, &book_id).await, 1);

    // Uniqueness holds across restarts too, whatever the phone's format.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({
            "title": "Mr",
            "name": "Other",
            "phone": "1234567890",
            "email": "b@x.com",
            "password": "password1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["status"], false);
    state.store.close().await;
}
