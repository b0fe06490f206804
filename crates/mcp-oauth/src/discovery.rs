use serde::Deserialize;
use serde::Serialize;

use mcp_protocol::error::OAuthError;

/// OAuth 2.0 Protected Resource Metadata (RFC 9728), served at
/// `/.well-known/oauth-protected-resource` on the MCP server's resource URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    #[serde(default)]
    pub resource: Option<String>,
    pub authorization_servers: Vec<String>,
    #[serde(default)]
    pub bearer_methods_supported: Option<Vec<String>>,
}

/// OAuth 2.0 Authorization Server Metadata (RFC 8414), served at
/// `/.well-known/oauth-authorization-server` on the discovered AS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub registration_endpoint: Option<String>,
    #[serde(default = "default_code_challenge_methods")]
    pub code_challenge_methods_supported: Vec<String>,
}

fn default_code_challenge_methods() -> Vec<String> {
    vec!["S256".to_string()]
}

#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub server_url: String,
    pub protected_resource_metadata: ProtectedResourceMetadata,
    pub authorization_server_metadata: AuthorizationServerMetadata,
    pub auth_server_url: String,
}

impl DiscoveryResult {
    /// The resource URL to send as the RFC 8707 `resource` parameter:
    /// `server_url` canonicalized per RFC 3986 §6 (spec §4.6).
    pub fn resource_url(&self) -> String {
        canonicalize_resource_url(&self.server_url)
    }
}

/// Lowercase scheme + host, strip a bare trailing slash, preserve path case
/// otherwise. Idempotent: re-canonicalizing an already-canonical URL is a
/// no-op (spec §8 "Canonical resource URL: idempotent under repeated
/// canonicalization").
pub fn canonicalize_resource_url(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return url.to_string();
    };
    let scheme = parsed.scheme().to_ascii_lowercase();
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let port_suffix = match parsed.port() {
        Some(p) => format!(":{p}"),
        None => String::new(),
    };
    let path = parsed.path();
    let path = if path == "/" { "" } else { path.trim_end_matches('/') };
    format!("{scheme}://{host}{port_suffix}{path}")
}

fn well_known_protected_resource(server_url: &str) -> Result<url::Url, OAuthError> {
    let base = url::Url::parse(server_url)
        .map_err(|e| OAuthError::Discovery(format!("invalid server url {server_url}: {e}")))?;
    base.join(".well-known/oauth-protected-resource")
        .map_err(|e| OAuthError::Discovery(e.to_string()))
}

fn well_known_authorization_server(auth_server_url: &str) -> Result<url::Url, OAuthError> {
    let base = url::Url::parse(auth_server_url)
        .map_err(|e| OAuthError::Discovery(format!("invalid AS url {auth_server_url}: {e}")))?;
    base.join(".well-known/oauth-authorization-server")
        .map_err(|e| OAuthError::Discovery(e.to_string()))
}

/// `Uninitiated -> Discovered` (spec §4.6): fetch Protected Resource
/// Metadata, then Authorization Server Metadata for its first advertised
/// authorization server.
pub async fn discover(
    client: &reqwest::Client,
    server_url: &str,
) -> Result<DiscoveryResult, OAuthError> {
    let prm_url = well_known_protected_resource(server_url)?;
    let prm: ProtectedResourceMetadata = client
        .get(prm_url)
        .send()
        .await
        .map_err(|e| OAuthError::Discovery(format!("protected resource metadata fetch: {e}")))?
        .error_for_status()
        .map_err(|e| OAuthError::Discovery(format!("protected resource metadata status: {e}")))?
        .json()
        .await
        .map_err(|e| OAuthError::Discovery(format!("protected resource metadata body: {e}")))?;

    let auth_server_url = prm
        .authorization_servers
        .first()
        .ok_or_else(|| OAuthError::Discovery("no authorization_servers advertised".to_string()))?
        .clone();

    let asm_url = well_known_authorization_server(&auth_server_url)?;
    let asm: AuthorizationServerMetadata = client
        .get(asm_url)
        .send()
        .await
        .map_err(|e| OAuthError::Discovery(format!("authorization server metadata fetch: {e}")))?
        .error_for_status()
        .map_err(|e| OAuthError::Discovery(format!("authorization server metadata status: {e}")))?
        .json()
        .await
        .map_err(|e| OAuthError::Discovery(format!("authorization server metadata body: {e}")))?;

    if !asm
        .code_challenge_methods_supported
        .iter()
        .any(|m| m == "S256")
    {
        return Err(OAuthError::Discovery(
            "authorization server does not advertise S256 PKCE support".to_string(),
        ));
    }

    Ok(DiscoveryResult {
        server_url: server_url.to_string(),
        protected_resource_metadata: prm,
        authorization_server_metadata: asm,
        auth_server_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_lowercases_scheme_and_host_and_strips_trailing_slash() {
        assert_eq!(
            canonicalize_resource_url("HTTPS://Example.COM/Mcp/"),
            "https://example.com/Mcp"
        );
    }

    #[test]
    fn canonicalization_preserves_path_case() {
        assert_eq!(
            canonicalize_resource_url("https://example.com/MyServer"),
            "https://example.com/MyServer"
        );
    }

    #[test]
    fn canonicalization_of_bare_root_has_no_path() {
        assert_eq!(canonicalize_resource_url("https://example.com/"), "https://example.com");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = canonicalize_resource_url("HTTPS://Example.COM/Mcp/");
        let twice = canonicalize_resource_url(&once);
        assert_eq!(once, twice);
    }
}
