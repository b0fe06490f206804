use mcp_protocol::error::OAuthError;
use serde::Deserialize;

/// Mutable token state for one server connection (spec §3). Shared with the
/// HTTP transport for `Authorization` header injection — per spec §9's
/// design note, this is the "single-owner with message-passing update"
/// shape: callers read a cloned snapshot, and updates go through
/// [`TokenState::apply_token_response`] rather than a mutex held across I/O.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<std::time::SystemTime>,
    pub scope: Option<String>,
}

impl TokenState {
    /// `true` once the token has gone stale enough to refresh: within
    /// `buffer` of `expires_at`, or already expired.
    pub fn needs_refresh(&self, now: std::time::SystemTime, buffer: std::time::Duration) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => match expires_at.checked_sub(buffer) {
                Some(refresh_at) => now >= refresh_at,
                None => true,
            },
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn apply_token_response(&mut self, response: TokenResponse, now: std::time::SystemTime) {
        self.access_token = Some(response.access_token);
        self.token_type = response.token_type;
        self.scope = response.scope;
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expires_at = response
            .expires_in
            .map(|secs| now + std::time::Duration::from_secs(secs));
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Parameters for the authorization-code exchange (RFC 6749 §4.1.3, with
/// the RFC 7636 `code_verifier` and RFC 8707 `resource` extensions).
pub struct TokenExchangeRequest<'a> {
    pub token_endpoint: &'a str,
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub client_id: &'a str,
    pub code_verifier: &'a str,
    pub resource: Option<&'a str>,
    pub scope: Option<&'a str>,
}

/// `AuthorizationPending -> Authorized` (spec §4.6).
pub async fn exchange_code(
    client: &reqwest::Client,
    req: TokenExchangeRequest<'_>,
) -> Result<TokenResponse, OAuthError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", req.code),
        ("redirect_uri", req.redirect_uri),
        ("client_id", req.client_id),
        ("code_verifier", req.code_verifier),
    ];
    if let Some(resource) = req.resource {
        form.push(("resource", resource));
    }
    if let Some(scope) = req.scope {
        form.push(("scope", scope));
    }
    post_token_form(client, req.token_endpoint, &form, OAuthError::TokenExchange).await
}

pub struct RefreshRequest<'a> {
    pub token_endpoint: &'a str,
    pub refresh_token: &'a str,
    pub client_id: &'a str,
    pub resource: Option<&'a str>,
    pub scope: Option<&'a str>,
}

/// `Authorized -> Refreshing -> Authorized` (spec §4.6). Callers should
/// transition back to `Uninitiated` on `Err` so the next send triggers full
/// rediscovery/re-authorization, per the same section.
pub async fn refresh(
    client: &reqwest::Client,
    req: RefreshRequest<'_>,
) -> Result<TokenResponse, OAuthError> {
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", req.refresh_token),
        ("client_id", req.client_id),
    ];
    if let Some(resource) = req.resource {
        form.push(("resource", resource));
    }
    if let Some(scope) = req.scope {
        form.push(("scope", scope));
    }
    post_token_form(client, req.token_endpoint, &form, OAuthError::TokenRefresh).await
}

async fn post_token_form(
    client: &reqwest::Client,
    token_endpoint: &str,
    form: &[(&str, &str)],
    err: impl Fn(String) -> OAuthError,
) -> Result<TokenResponse, OAuthError> {
    let response = client
        .post(token_endpoint)
        .form(form)
        .send()
        .await
        .map_err(|e| err(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(err(format!("token endpoint returned {status}: {body}")));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| err(format!("malformed token response: {e}")))
}
