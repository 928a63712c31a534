//! API integration tests
//!
//! Run against a live server (database, Redis and a configured admin
//! account) with: cargo test --test api_tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api";

/// Admin credentials; the admin email must match `auth.admin_email`
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

/// Short unique alphanumeric suffix for usernames and emails
fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn register(client: &Client, username: &str, email: &str) -> reqwest::Response {
    client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "name": "Test Reader",
            "username": username,
            "email": email,
            "password": "secret123"
        }))
        .send()
        .await
        .expect("Failed to send register request")
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register and log in a fresh user, returning (user id, token)
async fn fresh_user(client: &Client) -> (String, String) {
    let name = format!("reader{}", unique());
    let response = register(client, &name, &format!("{}@example.com", name)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let id = body["user"].as_str().unwrap().to_string();
    (id, login(client, &name, "secret123").await)
}

async fn moderator_token(client: &Client) -> String {
    login(client, ADMIN_USERNAME, ADMIN_PASSWORD).await
}

/// Make sure a book with `isbn` exists and return its id
async fn ensure_book(client: &Client, token: &str, isbn: &str) -> String {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "title": "On Growth", "author": "D. Thompson", "ISBN": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    if response.status() == StatusCode::OK {
        let body: Value = response.json().await.unwrap();
        return body["book"].as_str().unwrap().to_string();
    }

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = client
        .post(format!("{}/books/search", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "search": isbn }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    body["books"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_unknown_route_is_404() {
    let client = Client::new();

    let response = client
        .get(format!("{}/nowhere", BASE_URL))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "route not found");
}

#[tokio::test]
#[ignore]
async fn test_register_then_duplicate_username() {
    let client = Client::new();
    let name = format!("alice{}", unique());

    let response = register(&client, &name, &format!("{}@example.com", name)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["user"].is_string());

    let response = register(&client, &name, &format!("other{}@example.com", name)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_register_validation_reports_first_failure() {
    let client = Client::new();

    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({ "name": "Al", "username": "x", "email": "nope", "password": "a b" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "'name' has a length in range[4,30]");
}

#[tokio::test]
#[ignore]
async fn test_login_errors() {
    let client = Client::new();

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": format!("ghost{}", unique()), "password": "whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let name = format!("bob{}", unique());
    register(&client, &name, &format!("{}@example.com", name)).await;

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": name, "password": "wrongpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_logout_invalidates_token() {
    let client = Client::new();
    let (_, token) = fresh_user(&client).await;

    let response = client
        .post(format!("{}/logout", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_username_cannot_change() {
    let client = Client::new();
    let (id, token) = fresh_user(&client).await;

    let response = client
        .patch(format!("{}/users/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "username": "new" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .patch(format!("{}/users/{}", BASE_URL, id))
        .json(&json!({ "username": "new" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_conflicts() {
    let client = Client::new();
    let token = moderator_token(&client).await;

    ensure_book(&client, &token, "0306406152").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "title": "Copy", "author": "Someone", "ISBN": "0306406152" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same ISBN written with separators
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "title": "Copy", "author": "Someone", "ISBN": "0-306-40615-2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_malformed_json_body_gets_message() {
    let client = Client::new();

    let response = client
        .post(format!("{}/login", BASE_URL))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_booking_lifecycle() {
    let client = Client::new();
    let moderator = moderator_token(&client).await;
    let (_, user) = fresh_user(&client).await;
    let book = ensure_book(&client, &moderator, "0306406152").await;

    // A status in the body is ignored on creation
    let response = client
        .post(format!("{}/books/{}/bookings", BASE_URL, book))
        .bearer_auth(&user)
        .json(&json!({ "quantity": 2, "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let booking = body["booking"].as_str().unwrap().to_string();

    let response = client
        .get(format!("{}/books/{}/bookings/me", BASE_URL, book))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let mine = body["bookings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == booking.as_str())
        .cloned()
        .unwrap();
    assert_eq!(mine["status"], "pending");

    // Owners cannot approve their own booking
    let response = client
        .patch(format!("{}/books/bookings/{}", BASE_URL, booking))
        .bearer_auth(&user)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Quantity and status together are refused
    let response = client
        .patch(format!("{}/books/bookings/{}", BASE_URL, booking))
        .bearer_auth(&moderator)
        .json(&json!({ "status": "approved", "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .patch(format!("{}/books/bookings/{}", BASE_URL, booking))
        .bearer_auth(&moderator)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Approved is terminal, for the owner and for moderators
    let response = client
        .patch(format!("{}/books/bookings/{}", BASE_URL, booking))
        .bearer_auth(&user)
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .patch(format!("{}/books/bookings/{}", BASE_URL, booking))
        .bearer_auth(&moderator)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/books/{}/bookings/me", BASE_URL, book))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let mine = body["bookings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == booking.as_str())
        .cloned()
        .unwrap();
    assert_eq!(mine["status"], "approved");
    assert_eq!(mine["quantity"], 2);
}

#[tokio::test]
#[ignore]
async fn test_rating_twice_keeps_one_row() {
    let client = Client::new();
    let moderator = moderator_token(&client).await;
    let (_, user) = fresh_user(&client).await;
    let book = ensure_book(&client, &moderator, "0306406152").await;

    let mut ids = Vec::new();
    for rating in [5, 2] {
        let response = client
            .put(format!("{}/books/{}/ratings", BASE_URL, book))
            .bearer_auth(&user)
            .json(&json!({ "rating": rating, "review": "ok" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        ids.push(body["rating"].as_str().unwrap().to_string());
    }
    assert_eq!(ids[0], ids[1]);

    let response = client
        .get(format!("{}/books/{}/ratings/me", BASE_URL, book))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["rating"]["rating"], 2);
}

#[tokio::test]
#[ignore]
async fn test_report_requires_admin() {
    let client = Client::new();
    let (_, user) = fresh_user(&client).await;

    let response = client
        .get(format!("{}/books/report?startDate=2024-01-01&endDate=2024-12-31", BASE_URL))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = moderator_token(&client).await;
    let response = client
        .get(format!("{}/books/report?startDate=2024-12-31&endDate=2024-01-01", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
