use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn register_and_login() {
    let app = TestApp::spawn().await;

    let user = app
        .register_user("alice@example.org", "alice", "Alice", "sup3r-secret-pw")
        .await;
    assert!(!user.access_token.is_empty());

    let logged_in = app.login_user("alice@example.org", "sup3r-secret-pw").await;
    assert_eq!(logged_in.id, user.id);
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = TestApp::spawn().await;
    app.register_user("bob@example.org", "bob", "Bob", "sup3r-secret-pw")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "bob@example.org",
            "password": "wrong-password",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_user("carol@example.org", "carol", "Carol", "sup3r-secret-pw")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "carol@example.org",
            "username": "carol2",
            "display_name": "Carol Again",
            "password": "sup3r-secret-pw",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn me_returns_profile() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("dave@example.org", "dave", "Dave", "sup3r-secret-pw")
        .await;

    let resp = app
        .auth_get("/api/auth/me", &user.access_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["email"], "dave@example.org");
    assert_eq!(json["username"], "dave");
    assert_eq!(json["is_staff"], false);
}

#[tokio::test]
async fn refresh_issues_new_tokens() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("erin@example.org", "erin", "Erin", "sup3r-secret-pw")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert!(json["access_token"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/project"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "frank@example.org",
            "username": "frank",
            "display_name": "Frank",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}
