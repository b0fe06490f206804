use mcp_oauth::AuthorizationCallback;
use mcp_oauth::OAuth2FlowManager;
use mcp_oauth::OAuthState;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Spec §8 scenario 5, minus the transport-level 401 bootstrap (that lives
/// in `mcp-transport`'s client tests): discovery through token exchange
/// against a mocked authorization server.
#[tokio::test]
async fn full_flow_from_discovery_to_token_exchange() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-protected-resource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resource": server.uri(),
            "authorization_servers": [server.uri()],
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": server.uri(),
            "authorization_endpoint": format!("{}/authorize", server.uri()),
            "token_endpoint": format!("{}/token", server.uri()),
            "registration_endpoint": format!("{}/register", server.uri()),
            "code_challenge_methods_supported": ["S256"],
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "client_id": "dynamic-client-1",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-xyz",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-xyz",
        })))
        .mount(&server)
        .await;

    let manager = OAuth2FlowManager::new(
        reqwest::Client::new(),
        "mcp-test-client",
        "http://localhost:8765/callback".to_string(),
    )?;

    let (pending_state, auth_url) = manager.start_authorization_flow(&server.uri(), None).await?;
    assert!(auth_url.contains("code_challenge_method=S256"));
    assert!(auth_url.starts_with(&format!("{}/authorize?", server.uri())));

    let state_token = match &pending_state {
        OAuthState::AuthorizationPending { state_token, .. } => state_token.clone(),
        other => panic!("expected AuthorizationPending, got {}", other.label()),
    };

    let callback = AuthorizationCallback {
        code: Some("auth-code-123".to_string()),
        state: Some(state_token),
        error: None,
        error_description: None,
    };

    let authorized = manager
        .handle_authorization_callback(pending_state, callback, None)
        .await?;

    match authorized {
        OAuthState::Authorized { tokens, .. } => {
            assert_eq!(tokens.access_token.as_deref(), Some("access-xyz"));
            assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-xyz"));
        }
        other => panic!("expected Authorized, got {}", other.label()),
    }

    Ok(())
}

#[tokio::test]
async fn mismatched_state_is_rejected_before_touching_token_endpoint() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-protected-resource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "authorization_servers": [server.uri()],
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": server.uri(),
            "authorization_endpoint": format!("{}/authorize", server.uri()),
            "token_endpoint": format!("{}/token", server.uri()),
            "registration_endpoint": format!("{}/register", server.uri()),
            "code_challenge_methods_supported": ["S256"],
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "client_id": "dynamic-client-1",
        })))
        .mount(&server)
        .await;

    // No /token mock: if the flow manager reaches the token endpoint despite
    // the bad state, wiremock will 404 it and the test still fails below.

    let manager = OAuth2FlowManager::new(
        reqwest::Client::new(),
        "mcp-test-client",
        "http://localhost:8765/callback".to_string(),
    )?;

    let (pending_state, _url) = manager.start_authorization_flow(&server.uri(), None).await?;

    let callback = AuthorizationCallback {
        code: Some("auth-code-123".to_string()),
        state: Some("not-the-right-state".to_string()),
        error: None,
        error_description: None,
    };

    let result = manager
        .handle_authorization_callback(pending_state, callback, None)
        .await;
    assert!(result.is_err());
    Ok(())
}
