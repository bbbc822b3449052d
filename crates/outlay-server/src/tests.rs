//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use outlay_core::db::Database;

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        jwt_secret: "test-secret".to_string(),
        ..Default::default()
    };
    create_router(db, config)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Register a user through the API and return their Bearer token
async fn register_user(app: &Router, email: &str) -> String {
    let body = serde_json::json!({
        "name": "Test User",
        "email": email,
        "password": "correct horse battery staple"
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

/// Authenticated JSON request
async fn authed(
    app: &Router,
    token: &str,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json");
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn create_category(app: &Router, token: &str, name: &str) -> i64 {
    let response = authed(
        app,
        token,
        "POST",
        "/api/categories",
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    get_body_json(response).await["id"].as_i64().unwrap()
}

async fn create_expense(
    app: &Router,
    token: &str,
    category_id: i64,
    description: &str,
    amount: &str,
    date: &str,
) -> i64 {
    let response = authed(
        app,
        token,
        "POST",
        "/api/expenses",
        Some(serde_json::json!({
            "description": description,
            "amount": amount,
            "category_id": category_id,
            "expense_date": date
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    get_body_json(response).await["id"].as_i64().unwrap()
}

// ========== Auth ==========

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/expenses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/expenses")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let app = setup_test_app();
    let _ = register_user(&app, "maria@example.com").await;

    // Login with the same credentials
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "maria@example.com",
                        "password": "correct horse battery staple"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let token = json["token"].as_str().unwrap().to_string();
    // Hash never leaves the server
    assert!(json["user"].get("password_hash").is_none());

    let response = authed(&app, &token, "GET", "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = get_body_json(response).await;
    assert_eq!(me["email"], "maria@example.com");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = setup_test_app();
    let _ = register_user(&app, "maria@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "maria@example.com",
                        "password": "wrong"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = setup_test_app();
    let _ = register_user(&app, "maria@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Another",
                        "email": "maria@example.com",
                        "password": "a different password"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Categories ==========

#[tokio::test]
async fn test_category_crud_and_conflicts() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;

    let id = create_category(&app, &token, "Food").await;

    // Duplicate name
    let response = authed(
        &app,
        &token,
        "POST",
        "/api/categories",
        Some(serde_json::json!({ "name": "Food" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Listing is name-ordered
    create_category(&app, &token, "Transport").await;
    let response = authed(&app, &token, "GET", "/api/categories", None).await;
    let json = get_body_json(response).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Food", "Transport"]);

    // Delete is blocked while an expense references the category
    create_expense(&app, &token, id, "lunch", "12.50", "2024-03-10").await;
    let response = authed(
        &app,
        &token,
        "DELETE",
        &format!("/api/categories/{}", id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Expenses ==========

#[tokio::test]
async fn test_expense_crud() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;
    let cat = create_category(&app, &token, "Food").await;

    let id = create_expense(&app, &token, cat, "lunch", "12.50", "2024-03-10").await;

    let response = authed(&app, &token, "GET", &format!("/api/expenses/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["description"], "lunch");
    assert_eq!(json["amount"], "12.50");
    assert_eq!(json["category_name"], "Food");

    // Partial update: only the amount changes
    let response = authed(
        &app,
        &token,
        "PUT",
        &format!("/api/expenses/{}", id),
        Some(serde_json::json!({ "amount": "15.00" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], "15.00");
    assert_eq!(json["description"], "lunch");

    let response = authed(
        &app,
        &token,
        "DELETE",
        &format!("/api/expenses/{}", id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = authed(&app, &token, "GET", &format!("/api/expenses/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_amount_is_bad_request() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;
    let cat = create_category(&app, &token, "Food").await;

    let response = authed(
        &app,
        &token,
        "POST",
        "/api/expenses",
        Some(serde_json::json!({
            "description": "moon rocket",
            "amount": "1000000000000000000000000000",
            "category_id": cat
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_page_index_is_just_empty() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;
    let cat = create_category(&app, &token, "Food").await;
    create_expense(&app, &token, cat, "lunch", "12.50", "2024-03-10").await;

    let response = authed(
        &app,
        &token,
        "GET",
        &format!("/api/expenses?page={}", i64::MAX),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 1);
    assert!(json["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_expense_with_unknown_category_is_not_found() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;

    let response = authed(
        &app,
        &token,
        "POST",
        "/api/expenses",
        Some(serde_json::json!({
            "description": "ghost",
            "amount": "10.00",
            "category_id": 999
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_owners_expense_is_not_found() {
    let app = setup_test_app();
    let alice = register_user(&app, "alice@example.com").await;
    let bob = register_user(&app, "bob@example.com").await;
    let cat = create_category(&app, &alice, "Food").await;
    let id = create_expense(&app, &alice, cat, "lunch", "20.00", "2024-03-10").await;

    // Bob sees 404, not 403
    let response = authed(&app, &bob, "GET", &format!("/api/expenses/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = authed(
        &app,
        &bob,
        "DELETE",
        &format!("/api/expenses/{}", id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // And Bob's listing is empty
    let response = authed(&app, &bob, "GET", "/api/expenses", None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_expense_filters() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;
    let cat = create_category(&app, &token, "Food").await;
    create_expense(&app, &token, cat, "Supermarket run", "50.00", "2024-03-01").await;
    create_expense(&app, &token, cat, "cinema", "15.00", "2024-03-02").await;

    let response = authed(
        &app,
        &token,
        "GET",
        "/api/expenses?description=MARKET",
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["description"], "Supermarket run");

    let response = authed(
        &app,
        &token,
        "GET",
        "/api/expenses?amount_min=20.00&amount_max=60.00",
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["amount"], "50.00");

    let response = authed(
        &app,
        &token,
        "GET",
        "/api/expenses?sort=amount&order=asc",
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["items"][0]["amount"], "15.00");

    let response = authed(&app, &token, "GET", "/api/expenses?sort=nonsense", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_period_summaries_default_to_zero() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;

    let response = authed(
        &app,
        &token,
        "GET",
        "/api/expenses/summary/total?from=2024-03-01&to=2024-03-31",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total"], "0.00");

    let response = authed(
        &app,
        &token,
        "GET",
        "/api/expenses/summary/count?from=2024-03-01&to=2024-03-31",
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 0);
}

// ========== Dashboard ==========

#[tokio::test]
async fn test_dashboard_endpoint() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;
    let food = create_category(&app, &token, "Food").await;
    let transport = create_category(&app, &token, "Transport").await;

    create_expense(&app, &token, food, "feb groceries", "100.00", "2024-02-15").await;
    create_expense(&app, &token, food, "groceries", "90.00", "2024-03-05").await;
    create_expense(&app, &token, food, "restaurant", "30.00", "2024-03-12").await;
    create_expense(&app, &token, transport, "fuel", "30.00", "2024-03-20").await;

    let response = authed(&app, &token, "GET", "/api/dashboard?month=2024-03", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;

    assert_eq!(json["current_total"], "150.00");
    assert_eq!(json["prior_total"], "100.00");
    assert_eq!(json["percent_variance"], "50.00");
    assert_eq!(json["count"], 3);
    assert_eq!(json["average_ticket"], "50.00");

    let breakdown = json["by_category"].as_array().unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0]["name"], "Food");
    assert_eq!(breakdown[0]["percent"], "80.00");

    assert_eq!(json["top_expenses"].as_array().unwrap().len(), 3);
    assert_eq!(json["top_expenses"][0]["amount"], "90.00");

    let days = json["daily_totals"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2024-03-05");
}

#[tokio::test]
async fn test_dashboard_rejects_bad_month() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;

    let response = authed(&app, &token, "GET", "/api/dashboard?month=2024-13", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Reports ==========

#[tokio::test]
async fn test_csv_report() {
    let app = setup_test_app();
    let token = register_user(&app, "u@example.com").await;
    let cat = create_category(&app, &token, "Food").await;
    create_expense(&app, &token, cat, "lunch", "12.50", "2024-03-10").await;

    let response = authed(&app, &token, "GET", "/api/reports/expenses.csv", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    let body = get_body_text(response).await;
    assert!(body.starts_with("date,description,category,amount,note"));
    assert!(body.contains("2024-03-10,lunch,Food,12.50,"));
}
