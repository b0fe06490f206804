use mcp_protocol::error::OAuthError;
use serde::Deserialize;
use serde::Serialize;

/// OAuth 2.0 Client Metadata for dynamic registration (RFC 7591). The
/// `token_endpoint_auth_method` is fixed to `"none"`: this coordinator is
/// always a public client (spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub token_endpoint_auth_method: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
}

impl ClientMetadata {
    pub fn public_client(client_name: impl Into<String>, redirect_uris: Vec<String>) -> Self {
        ClientMetadata {
            client_name: client_name.into(),
            redirect_uris,
            scope: None,
            token_endpoint_auth_method: "none".to_string(),
            grant_types: vec!["authorization_code".to_string()],
            response_types: vec!["code".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub registration_access_token: Option<String>,
    #[serde(default)]
    pub registration_client_uri: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientRegistration {
    pub metadata: ClientMetadata,
    pub credentials: ClientCredentials,
    pub registration_endpoint: String,
}

/// `Discovered -> Registered` (spec §4.6): POST client metadata to the AS's
/// `registration_endpoint`. A `201` carries the new credentials; any `4xx`
/// is surfaced as a typed [`OAuthError::Registration`].
pub async fn register(
    client: &reqwest::Client,
    registration_endpoint: &str,
    metadata: ClientMetadata,
) -> Result<ClientRegistration, OAuthError> {
    let response = client
        .post(registration_endpoint)
        .json(&metadata)
        .send()
        .await
        .map_err(|e| OAuthError::Registration(e.to_string()))?;

    if response.status() != reqwest::StatusCode::CREATED {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(OAuthError::Registration(format!(
            "registration endpoint returned {status}: {body}"
        )));
    }

    let credentials: ClientCredentials = response
        .json()
        .await
        .map_err(|e| OAuthError::Registration(format!("malformed registration response: {e}")))?;

    Ok(ClientRegistration {
        metadata,
        credentials,
        registration_endpoint: registration_endpoint.to_string(),
    })
}
