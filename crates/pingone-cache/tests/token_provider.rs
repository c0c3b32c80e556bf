//! Integration tests for TokenProvider: reuse, expiry margin, scoping and
//! the absence of request coalescing.

use std::sync::Arc;
use std::time::Duration;

use pingone_cache::{
    ClientCredentials, ManualClock, ResourceCache, Settings, TokenAcquirer, TokenProvider,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const T0: i64 = 1_700_000_000_000;

async fn mount_token(server: &MockServer, env: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{env}/as/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": format!("token-for-{env}"),
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn provider(server: &MockServer, clock: Arc<ManualClock>) -> TokenProvider {
    let acquirer = TokenAcquirer::new(Duration::from_secs(5))
        .unwrap()
        .with_auth_base_url(server.uri())
        .with_clock(clock.clone());
    let cache = ResourceCache::in_memory(Duration::from_secs(24 * 3600)).with_clock(clock);
    TokenProvider::new(acquirer, cache)
}

#[tokio::test]
async fn test_cached_token_is_reused() {
    let server = MockServer::start().await;
    mount_token(&server, "env1", 1).await;

    let clock = Arc::new(ManualClock::new(T0));
    let tokens = provider(&server, clock.clone());
    let creds = ClientCredentials::new("env1", "cid1", "secret");

    let first = tokens.token(&creds).await.unwrap();
    clock.advance(Duration::from_secs(600));
    let second = tokens.token(&creds).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_token_within_margin_is_reacquired() {
    let server = MockServer::start().await;
    mount_token(&server, "env1", 2).await;

    let clock = Arc::new(ManualClock::new(T0));
    let tokens = provider(&server, clock.clone());
    let creds = ClientCredentials::new("env1", "cid1", "secret");

    let first = tokens.token(&creds).await.unwrap();
    clock.advance(Duration::from_secs(3600 - 60));
    let second = tokens.token(&creds).await.unwrap();

    assert_eq!(second.issued_at_ms, first.issued_at_ms + 3_540_000);
}

#[tokio::test]
async fn test_scopes_do_not_share_tokens() {
    let server = MockServer::start().await;
    mount_token(&server, "env1", 1).await;
    mount_token(&server, "env2", 1).await;

    let tokens = provider(&server, Arc::new(ManualClock::new(T0)));

    let a = tokens
        .token(&ClientCredentials::new("env1", "cid1", "secret"))
        .await
        .unwrap();
    let b = tokens
        .token(&ClientCredentials::new("env2", "cid1", "secret"))
        .await
        .unwrap();

    assert_eq!(a.access_token, "token-for-env1");
    assert_eq!(b.access_token, "token-for-env2");
}

#[tokio::test]
async fn test_concurrent_misses_are_not_coalesced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/env1/as/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "tok",
                    "token_type": "Bearer",
                    "expires_in": 3600
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let tokens = provider(&server, Arc::new(ManualClock::new(T0)));
    let creds = ClientCredentials::new("env1", "cid1", "secret");

    let (a, b) = tokio::join!(tokens.token(&creds), tokens.token(&creds));
    assert!(a.is_ok());
    assert!(b.is_ok());
}

#[tokio::test]
async fn test_failed_acquire_leaves_cache_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .expect(2)
        .mount(&server)
        .await;

    let tokens = provider(&server, Arc::new(ManualClock::new(T0)));
    let creds = ClientCredentials::new("env1", "cid1", "wrong");

    assert!(tokens.token(&creds).await.is_err());
    assert!(tokens.token(&creds).await.is_err());
}

fn file_backed_settings(server: &MockServer, dir: &TempDir) -> Settings {
    let mut settings = Settings::default()
        .with_environment_id("env1")
        .with_client_id("cid1")
        .with_client_secret("s3cr3t-value");
    settings.token_cache_path = Some(dir.path().join("tokens.json"));
    settings.auth_base_url = Some(server.uri());
    settings
}

#[tokio::test]
async fn test_token_file_is_shared_across_providers() {
    let server = MockServer::start().await;
    mount_token(&server, "env1", 1).await;
    let dir = TempDir::new().unwrap();
    let settings = file_backed_settings(&server, &dir);
    let creds = settings.credentials().unwrap();

    let first = settings.token_provider().unwrap().token(&creds).await.unwrap();
    let second = settings.token_provider().unwrap().token(&creds).await.unwrap();
    assert_eq!(first, second);

    let raw = std::fs::read_to_string(dir.path().join("tokens.json")).unwrap();
    assert!(raw.contains("token-for-env1"));
    assert!(raw.contains("env1|cid1|NA"));
    assert!(!raw.contains("s3cr3t-value"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_token_file_concurrent_misses_both_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/env1/as/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "tok",
                    "token_type": "Bearer",
                    "expires_in": 3600
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let settings = file_backed_settings(&server, &dir);
    let creds = settings.credentials().unwrap();
    let tokens = settings.token_provider().unwrap();

    let (a, b) = tokio::join!(tokens.token(&creds), tokens.token(&creds));
    assert_eq!(a.unwrap().access_token, "tok");
    assert_eq!(b.unwrap().access_token, "tok");

    let raw = std::fs::read_to_string(dir.path().join("tokens.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["env1|cid1|NA"]["value"]["access_token"], "tok");
}
