mod common;

use axum::http::{StatusCode, header};
use camp_portal::{
    SESSION_COOKIE,
    auth::{hash_password, verify_password},
    repository::Repository,
};
use common::{PASSWORD, TestApp, location};

// --- Password Strategy ---

#[test]
fn test_password_hash_round_trip() {
    let hash = hash_password("hunter22-but-longer").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_password("hunter22-but-longer", &hash));
    assert!(!verify_password("hunter23-but-longer", &hash));
    // Same password, fresh salt.
    assert_ne!(hash, hash_password("hunter22-but-longer").unwrap());
}

#[test]
fn test_verify_password_with_malformed_hash() {
    assert!(!verify_password("anything", "not-a-phc-string"));
}

// --- Registration ---

#[tokio::test]
async fn test_register_logs_in_and_sets_cookie() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client
        .post_form("/register", &format!("username=alice&password={}", PASSWORD))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/campgrounds");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let user = app.repo.find_user_by_username("alice").await.unwrap().unwrap();
    assert_ne!(user.password_hash, PASSWORD);
    assert!(verify_password(PASSWORD, &user.password_hash));

    let (status, html) = client.page("/campgrounds/new").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Signed in as alice"));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new();
    app.logged_in("alice").await;

    let mut other = app.client();
    let response = other
        .post_form("/register", &format!("username=alice&password={}", PASSWORD))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");
    let (_, html) = other.page("/register").await;
    assert!(html.contains("A user with the given username is already registered"));
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    let response = app
        .client()
        .post_form("/register", "username=alice&password=short")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.repo.find_user_by_username("alice").await.unwrap().is_none());
}

// --- Login / Logout ---

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new();
    app.logged_in("alice").await;

    let mut client = app.client();
    let response = client
        .post_form("/login", "username=alice&password=wrong-password")
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let (_, html) = client.page("/login").await;
    assert!(html.contains("Password or username is incorrect"));

    // Unknown users get the same answer.
    let response = client
        .post_form("/login", &format!("username=nobody&password={}", PASSWORD))
        .await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_returns_to_requested_page() {
    let app = TestApp::new();
    app.logged_in("alice").await;

    let mut client = app.client();
    let response = client.get("/campgrounds/new").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = client
        .post_form("/login", &format!("username=alice&password={}", PASSWORD))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/campgrounds/new");

    let (status, html) = client.page("/campgrounds/new").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Welcome back!"));
}

#[tokio::test]
async fn test_login_without_pending_page_goes_to_listing() {
    let app = TestApp::new();
    app.logged_in("alice").await;

    let mut client = app.client();
    let response = client
        .post_form("/login", &format!("username=alice&password={}", PASSWORD))
        .await;
    assert_eq!(location(&response), "/campgrounds");
}

#[tokio::test]
async fn test_login_cycles_session_id() {
    let app = TestApp::new();
    app.logged_in("alice").await;

    let mut client = app.client();
    client.get("/campgrounds/new").await;
    let anonymous_cookie = client.cookie.clone().expect("guard stored return_to");

    client
        .post_form("/login", &format!("username=alice&password={}", PASSWORD))
        .await;
    assert_ne!(client.cookie, Some(anonymous_cookie));
}

#[tokio::test]
async fn test_logout_clears_identity() {
    let app = TestApp::new();
    let mut alice = app.logged_in("alice").await;

    let response = alice.get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/campgrounds");

    let (_, html) = alice.page("/campgrounds").await;
    assert!(html.contains("Goodbye!"));
    assert!(!html.contains("Signed in as alice"));

    let response = alice.get("/campgrounds/new").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_anonymous_pages_render() {
    let app = TestApp::new();
    let mut visitor = app.client();
    for path in ["/", "/login", "/register", "/campgrounds"] {
        let (status, html) = visitor.page(path).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert!(html.contains("href=\"/login\""), "{}", path);
    }
}
