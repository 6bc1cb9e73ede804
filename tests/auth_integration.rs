use std::net::TcpListener;
use std::sync::Arc;

use authflow::auth::{
    hash_password_with_cost, AuthService, CredentialRecord, InMemoryCredentialStore, TokenCodec,
};
use authflow::configuration::{ApplicationSettings, SecretKey, TokenSettings};
use authflow::startup::run;
use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use serde_json::Value;

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryCredentialStore>,
    pub token_settings: TokenSettings,
}

fn test_token_settings() -> TokenSettings {
    TokenSettings {
        secret_key: SecretKey::new("integration-test-secret-0123456789abcdef"),
        algorithm: Algorithm::HS256,
        access_token_ttl: Duration::minutes(60),
    }
}

fn alice() -> CredentialRecord {
    CredentialRecord::new("alice", hash_password_with_cost("wonderland", 4).unwrap())
        .with_full_name("Alice Liddell")
        .with_email("alice@example.com")
}

fn bob() -> CredentialRecord {
    CredentialRecord::new("bob", hash_password_with_cost("builder", 4).unwrap()).with_disabled(true)
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryCredentialStore::new(vec![alice(), bob()]));
    let token_settings = test_token_settings();
    let auth_service = AuthService::new(store.clone(), &token_settings);
    let application = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        project_name: "Test API".to_string(),
    };

    let server = run(listener, auth_service, application).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        token_settings,
    }
}

fn login_body(username: &str, password: &str) -> String {
    format!(
        "username={}&password={}",
        urlencoding::encode(username),
        urlencoding::encode(password)
    )
}

async fn post_login(app: &TestApp, username: &str, password: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(&format!("{}/token", &app.address))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(login_body(username, password))
        .send()
        .await
        .expect("Failed to execute request.")
}

async fn login_token(app: &TestApp, username: &str, password: &str) -> String {
    let response = post_login(app, username, password).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["access_token"].as_str().expect("access_token").to_string()
}

async fn get_me(app: &TestApp, authorization: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(&format!("{}/users/me", &app.address));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    request.send().await.expect("Failed to execute request.")
}

fn assert_bearer_challenge(response: &reqwest::Response) {
    assert_eq!(
        response
            .headers()
            .get("www-authenticate")
            .and_then(|h| h.to_str().ok()),
        Some("Bearer")
    );
}

// --- Token issuance ---

#[tokio::test]
async fn login_returns_bearer_token_for_valid_credentials() {
    let app = spawn_app();

    let response = post_login(&app, "alice", "wonderland").await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().expect("access_token");
    assert_eq!(token.split('.').count(), 3);

    let claims = TokenCodec::new(&app.token_settings).decode(token).expect("valid token");
    assert_eq!(claims.sub, "alice");
}

#[tokio::test]
async fn login_returns_401_for_wrong_password_and_unknown_user_alike() {
    let app = spawn_app();

    let wrong_password = post_login(&app, "alice", "wrong").await;
    let unknown_user = post_login(&app, "mallory", "wonderland").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());
    assert_bearer_challenge(&wrong_password);
    assert_bearer_challenge(&unknown_user);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
    assert_eq!(a["message"], "Incorrect username or password");
}

#[tokio::test]
async fn login_is_case_sensitive_on_username() {
    let app = spawn_app();

    let response = post_login(&app, "Alice", "wonderland").await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_returns_400_when_fields_are_missing() {
    let app = spawn_app();
    let test_cases = vec![
        ("username=alice", "missing the password"),
        ("password=wonderland", "missing the username"),
        ("", "missing both"),
    ];

    for (body, reason) in test_cases {
        let response = reqwest::Client::new()
            .post(&format!("{}/token", &app.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when {}.",
            reason
        );
    }
}

#[tokio::test]
async fn disabled_user_can_still_log_in() {
    let app = spawn_app();

    let response = post_login(&app, "bob", "builder").await;
    assert_eq!(200, response.status().as_u16());
}

// --- Protected resource ---

#[tokio::test]
async fn users_me_returns_profile_for_valid_token() {
    let app = spawn_app();
    let token = login_token(&app, "alice", "wonderland").await;

    let response = get_me(&app, Some(&format!("Bearer {}", token))).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["full_name"], "Alice Liddell");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["disabled"], false);
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn users_me_returns_401_without_token() {
    let app = spawn_app();

    let missing = get_me(&app, None).await;
    assert_eq!(401, missing.status().as_u16());
    assert_bearer_challenge(&missing);

    let wrong_scheme = get_me(&app, Some("Basic YWxpY2U6d29uZGVybGFuZA==")).await;
    assert_eq!(401, wrong_scheme.status().as_u16());
}

#[tokio::test]
async fn users_me_returns_401_for_invalid_tokens() {
    let app = spawn_app();
    let token = login_token(&app, "alice", "wonderland").await;

    let foreign = TokenCodec::new(&TokenSettings {
        secret_key: SecretKey::new("some-other-secret"),
        ..test_token_settings()
    })
    .encode("alice", Duration::minutes(5))
    .unwrap();

    let expired = TokenCodec::new(&app.token_settings)
        .encode_at("alice", Duration::minutes(15), Utc::now() - Duration::minutes(20))
        .unwrap();

    let unknown_subject = TokenCodec::new(&app.token_settings)
        .encode("mallory", Duration::minutes(5))
        .unwrap();

    let tampered = format!("{}X", token);

    for (candidate, reason) in [
        ("garbage".to_string(), "malformed"),
        (foreign, "signed with another key"),
        (expired, "expired"),
        (unknown_subject, "unknown subject"),
        (tampered, "tampered"),
    ] {
        let response = get_me(&app, Some(&format!("Bearer {}", candidate))).await;
        assert_eq!(401, response.status().as_u16(), "token was {}", reason);
        assert_bearer_challenge(&response);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Could not validate credentials");
    }
}

#[tokio::test]
async fn users_me_returns_400_for_inactive_user() {
    let app = spawn_app();
    let token = login_token(&app, "bob", "builder").await;

    let response = get_me(&app, Some(&format!("Bearer {}", token))).await;
    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Inactive user");
}

#[tokio::test]
async fn token_stops_working_once_account_is_disabled() {
    let app = spawn_app();
    let token = login_token(&app, "alice", "wonderland").await;
    let header = format!("Bearer {}", token);

    assert_eq!(200, get_me(&app, Some(&header)).await.status().as_u16());

    app.store.upsert(alice().with_disabled(true));

    assert_eq!(400, get_me(&app, Some(&header)).await.status().as_u16());
}
