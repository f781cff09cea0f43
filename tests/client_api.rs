// End-to-end tests for the client facade against a mock API server.

use std::time::{Duration, Instant};

use envato::{Client, ClientEvent, ClientOptions, DownloadLinkOptions, Error, HttpError};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> Client {
    Client::new(ClientOptions {
        token: "test-token".to_string(),
        base_url: Some(server.uri()),
        ..ClientOptions::default()
    })
    .expect("failed to build client")
}

#[tokio::test]
async fn sends_bearer_token_and_decodes_identity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": 276_579,
            "scopes": ["default", "purchase:download"],
            "ttl": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let identity = client.identity().await.unwrap();

    assert_eq!(identity.user_id, 276_579);
    assert_eq!(identity.scopes.len(), 2);
    assert_eq!(identity.ttl, 300);
}

#[tokio::test]
async fn not_found_lookups_resolve_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/market/catalog/item"))
        .and(query_param("id", "999"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": 404, "description": "No item found"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let item = client.catalog().item(999).await.unwrap();
    assert!(item.is_none());
}

#[tokio::test]
async fn error_bodies_are_decoded_into_typed_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/market/catalog/collection"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Bad Request",
            "description": "The id parameter is required",
            "code": "missing_parameter"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let error = client.catalog().collection(1, None).await.unwrap_err();

    match error {
        Error::Http(HttpError::BadRequest(response)) => {
            assert_eq!(
                response.description.as_deref(),
                Some("The id parameter is required")
            );
            assert_eq!(response.code.as_deref(), Some("missing_parameter"));
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_absorbed_and_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "1")
                .set_body_json(serde_json::json!({"error": "Too Many Requests"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": 1, "scopes": [], "ttl": 60
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut events = client.subscribe();

    let started = Instant::now();
    let identity = client.identity().await.unwrap();

    assert_eq!(identity.user_id, 1);
    assert!(
        started.elapsed() >= Duration::from_secs(1),
        "the deferral window was not honored"
    );

    match events.recv().await.unwrap() {
        ClientEvent::RateLimited(duration) => assert_eq!(duration, Duration::from_secs(1)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(matches!(events.recv().await.unwrap(), ClientEvent::Resumed));
}

#[tokio::test]
async fn rate_limit_surfaces_as_error_when_handling_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_json(serde_json::json!({"error": "Too Many Requests"})),
        )
        .mount(&server)
        .await;

    let client = Client::new(ClientOptions {
        token: "test-token".to_string(),
        base_url: Some(server.uri()),
        handle_rate_limits: false,
        ..ClientOptions::default()
    })
    .unwrap();

    let error = client.identity().await.unwrap_err();
    assert!(matches!(
        error,
        Error::Http(HttpError::TooManyRequests(_))
    ));
}

#[tokio::test]
async fn post_sends_form_encoded_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/market/demo"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("purchase_code=abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response: serde_json::Value = client
        .post(
            "/v3/market/demo",
            Some(vec![("purchase_code".to_string(), "abc-123".to_string())]),
        )
        .await
        .unwrap();

    assert_eq!(response["ok"], serde_json::json!(true));
}

#[tokio::test]
async fn envelope_responses_are_unwrapped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/market/total-users.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total-users": {"total_users": "8104480"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/market/user:collis.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": {
                "username": "collis",
                "country": "Australia",
                "sales": "100",
                "location": "Melbourne",
                "image": "https://example.com/avatar.png"
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);

    assert_eq!(client.stats().total_users().await.unwrap(), 8_104_480);

    let details = client.user().account_details("collis").await.unwrap();
    assert_eq!(details.username, "collis");
    assert_eq!(details.country, "Australia");
}

#[tokio::test]
async fn app_creator_purchases_are_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/market/buyer/purchases"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "buyer": {"id": 276_579, "username": "collis"},
            "author": {"id": 111, "username": "themepunch"},
            "purchases": [{
                "amount": "19.95",
                "sold_at": "2020-03-02T03:22:46+10:00",
                "license": "Regular License",
                "code": "abc-123"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let page = client
        .private()
        .purchases_from_app_creator(Some(2))
        .await
        .unwrap();

    assert_eq!(page.buyer.username, "collis");
    assert_eq!(page.author.id, 111);
    assert_eq!(page.purchases.len(), 1);
    assert_eq!(page.purchases[0].code.as_deref(), Some("abc-123"));
}

#[tokio::test]
async fn download_link_sends_selector_and_flags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/market/buyer/download"))
        .and(query_param("purchase_code", "abc-123"))
        .and(query_param("shorten_url", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "download_url": "https://marketplace.example/short/xyz"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let link = client
        .private()
        .download_link(&DownloadLinkOptions {
            purchase_code: Some("abc-123".to_string()),
            shorten_url: Some(true),
            ..DownloadLinkOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(link, "https://marketplace.example/short/xyz");
}

#[tokio::test]
async fn transport_failures_reject_the_request() {
    // Point the client at a closed port.
    let client = Client::new(ClientOptions {
        token: "test-token".to_string(),
        base_url: Some("http://127.0.0.1:1".to_string()),
        timeout: Some(Duration::from_secs(2)),
        ..ClientOptions::default()
    })
    .unwrap();

    let error = client.identity().await.unwrap_err();
    assert!(matches!(error, Error::Transport(_)));

    // The queue slot must be free again; a follow-up request fails the same
    // way instead of hanging.
    let error = client.identity().await.unwrap_err();
    assert!(matches!(error, Error::Transport(_)));
}

#[tokio::test]
async fn concurrency_cap_holds_under_load() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(100))
                .set_body_json(serde_json::json!({"userId": 1, "scopes": [], "ttl": 60})),
        )
        .mount(&server)
        .await;

    let client = Client::new(ClientOptions {
        token: "test-token".to_string(),
        base_url: Some(server.uri()),
        concurrency: 2,
        ..ClientOptions::default()
    })
    .unwrap();

    let started = Instant::now();
    let requests: Vec<_> = (0..6)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.identity().await })
        })
        .collect();

    for request in requests {
        request.await.unwrap().unwrap();
    }

    // Six 100ms responses through two slots need at least three rounds.
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "requests were not throttled to the concurrency limit"
    );
}
