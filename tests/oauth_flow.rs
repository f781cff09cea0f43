// Tests for the OAuth token flows and automatic renewal.

use chrono::{Duration as ChronoDuration, Utc};
use envato::{Client, ClientEvent, ClientOptions, Error, OAuth};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_oauth(server: &MockServer) -> OAuth {
    OAuth {
        client_id: "app-id".to_string(),
        client_secret: "app-secret".to_string(),
        redirect_uri: "https://example.com/callback".to_string(),
        user_agent: None,
        token_url: Some(format!("{}/token", server.uri())),
    }
}

#[tokio::test]
async fn exchange_code_builds_a_configured_client() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=single-use-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let oauth = test_oauth(&server);
    let client = oauth.exchange_code("single-use-code").await.unwrap();

    assert_eq!(client.token(), "access-1");
    assert_eq!(client.refresh_token().as_deref(), Some("refresh-1"));
    assert!(!client.is_expired());
    assert!(client.ttl().unwrap() > ChronoDuration::minutes(59));
}

#[tokio::test]
async fn invalid_grant_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let oauth = test_oauth(&server);
    let error = match oauth.exchange_code("stale-code").await {
        Err(error) => error,
        Ok(_) => panic!("expected the stale code to be rejected"),
    };

    match error {
        Error::OAuth(message) => assert!(message.contains("invalid or expired")),
        other => panic!("expected OAuth error, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_is_renewed_before_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "access-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .and(wiremock::matchers::header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": 7, "scopes": ["default"], "ttl": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(ClientOptions {
        token: "access-1".to_string(),
        refresh_token: Some("refresh-1".to_string()),
        expiration: Some(Utc::now() - ChronoDuration::seconds(10)),
        oauth: Some(test_oauth(&server)),
        base_url: Some(server.uri()),
        ..ClientOptions::default()
    })
    .unwrap();

    let mut events = client.subscribe();
    let identity = client.identity().await.unwrap();

    assert_eq!(identity.user_id, 7);
    assert_eq!(client.token(), "access-2");
    assert!(!client.is_expired());

    match events.recv().await.unwrap() {
        ClientEvent::TokenRenewed(renewed) => assert_eq!(renewed.access_token, "access-2"),
        other => panic!("expected TokenRenewed, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_without_oauth_is_sent_as_is() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let client = Client::new(ClientOptions {
        token: "stale".to_string(),
        expiration: Some(Utc::now() - ChronoDuration::seconds(10)),
        base_url: Some(server.uri()),
        ..ClientOptions::default()
    })
    .unwrap();

    let error = client.identity().await.unwrap_err();
    assert!(matches!(
        error,
        Error::Http(envato::HttpError::Unauthorized(_))
    ));
}

#[test]
fn redirect_url_includes_app_credentials() {
    let oauth = OAuth::new("app-id", "app-secret", "https://example.com/callback");
    let redirect = oauth.redirect_url();
    assert!(redirect.contains("client_id=app-id"));
    assert!(!redirect.contains("app-secret"), "secret must not leak into the redirect URL");
}
