use mcp_protocol::error::OAuthError;

/// Redirect URIs must be HTTPS, or use a `localhost` host on any scheme
/// (spec §4.6, final paragraph). Rejected at configuration time, before any
/// authorization URL is ever built.
pub fn validate_redirect_uri(redirect_uri: &str) -> Result<(), OAuthError> {
    let parsed = url::Url::parse(redirect_uri)
        .map_err(|e| OAuthError::Authorization(format!("invalid redirect_uri: {e}")))?;

    let is_localhost = matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1") | Some("::1"));
    if parsed.scheme() == "https" || is_localhost {
        Ok(())
    } else {
        Err(OAuthError::Authorization(format!(
            "redirect_uri must be HTTPS or localhost, got {redirect_uri}"
        )))
    }
}
