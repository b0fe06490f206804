use std::time::SystemTime;

use mcp_protocol::error::OAuthError;

use crate::discovery;
use crate::discovery::DiscoveryResult;
use crate::pkce;
use crate::pkce::PkceParameters;
use crate::redirect;
use crate::registration;
use crate::registration::ClientMetadata;
use crate::registration::ClientRegistration;
use crate::token;
use crate::token::RefreshRequest;
use crate::token::TokenExchangeRequest;
use crate::token::TokenState;

/// `Uninitiated -> Discovered -> Registered -> AuthorizationPending ->
/// Authorized <-> Refreshing` (spec §4.6). Carries only the data that
/// distinguishes one state from the next; `OAuth2FlowManager` holds the
/// state plus whatever was accumulated to reach it.
#[derive(Debug, Clone)]
pub enum OAuthState {
    Uninitiated,
    Discovered(DiscoveryResult),
    Registered {
        discovery: DiscoveryResult,
        registration: ClientRegistration,
    },
    AuthorizationPending {
        discovery: DiscoveryResult,
        registration: ClientRegistration,
        pkce: PkceParameters,
        state_token: String,
    },
    Authorized {
        discovery: DiscoveryResult,
        registration: ClientRegistration,
        tokens: TokenState,
    },
    Refreshing {
        discovery: DiscoveryResult,
        registration: ClientRegistration,
    },
}

impl OAuthState {
    pub fn label(&self) -> &'static str {
        match self {
            OAuthState::Uninitiated => "uninitiated",
            OAuthState::Discovered(_) => "discovered",
            OAuthState::Registered { .. } => "registered",
            OAuthState::AuthorizationPending { .. } => "authorization_pending",
            OAuthState::Authorized { .. } => "authorized",
            OAuthState::Refreshing { .. } => "refreshing",
        }
    }
}

/// Authorization URL parameters (spec §4.6's "recognized parameter set").
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorization_endpoint: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: &'static str,
    pub state: String,
    pub resource: Option<String>,
    pub scope: Option<String>,
}

impl AuthorizationRequest {
    pub fn build_url(&self) -> String {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        pairs
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("code_challenge", &self.code_challenge)
            .append_pair("code_challenge_method", self.code_challenge_method)
            .append_pair("state", &self.state);
        if let Some(resource) = &self.resource {
            pairs.append_pair("resource", resource);
        }
        if let Some(scope) = &self.scope {
            pairs.append_pair("scope", scope);
        }
        format!("{}?{}", self.authorization_endpoint, pairs.finish())
    }
}

/// The decoded redirect-URI callback (spec §4.6 "On callback").
#[derive(Debug, Clone, Default)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthorizationCallback {
    pub fn from_query_pairs(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let mut callback = AuthorizationCallback::default();
        for (key, value) in pairs {
            match key.as_str() {
                "code" => callback.code = Some(value),
                "state" => callback.state = Some(value),
                "error" => callback.error = Some(value),
                "error_description" => callback.error_description = Some(value),
                _ => {}
            }
        }
        callback
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.code.is_some()
    }
}

/// Orchestrates the state machine end to end, mirroring
/// `OAuth2FlowManager` from the source's `auth/client/services/flow.py`.
pub struct OAuth2FlowManager {
    pub http: reqwest::Client,
    pub client_name: String,
    pub redirect_uri: String,
}

impl OAuth2FlowManager {
    pub fn new(http: reqwest::Client, client_name: impl Into<String>, redirect_uri: String) -> Result<Self, OAuthError> {
        redirect::validate_redirect_uri(&redirect_uri)?;
        Ok(OAuth2FlowManager {
            http,
            client_name: client_name.into(),
            redirect_uri,
        })
    }

    /// Drives `Uninitiated -> ... -> AuthorizationPending`, returning the
    /// URL the caller should send the resource owner to, plus the state to
    /// hold until [`OAuth2FlowManager::handle_authorization_callback`].
    pub async fn start_authorization_flow(
        &self,
        server_url: &str,
        scope: Option<String>,
    ) -> Result<(OAuthState, String), OAuthError> {
        let discovery = discovery::discover(&self.http, server_url).await?;

        let registration = match &discovery.authorization_server_metadata.registration_endpoint {
            Some(endpoint) => {
                let metadata = ClientMetadata::public_client(
                    self.client_name.clone(),
                    vec![self.redirect_uri.clone()],
                );
                registration::register(&self.http, endpoint, metadata).await?
            }
            None => {
                return Err(OAuthError::Registration(
                    "authorization server has no registration_endpoint and no cached credentials were supplied".to_string(),
                ))
            }
        };

        let pkce = pkce::generate();
        let state_token = pkce::generate_state_token();

        let auth_request = AuthorizationRequest {
            authorization_endpoint: discovery.authorization_server_metadata.authorization_endpoint.clone(),
            client_id: registration.credentials.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            code_challenge: pkce.challenge.clone(),
            code_challenge_method: pkce.method,
            state: state_token.clone(),
            resource: Some(discovery.resource_url()),
            scope,
        };

        let url = auth_request.build_url();
        let state = OAuthState::AuthorizationPending {
            discovery,
            registration,
            pkce,
            state_token,
        };
        Ok((state, url))
    }

    /// Drives `AuthorizationPending -> Authorized`. Validates the CSRF state
    /// in constant time before touching the token endpoint.
    pub async fn handle_authorization_callback(
        &self,
        state: OAuthState,
        callback: AuthorizationCallback,
        scope: Option<String>,
    ) -> Result<OAuthState, OAuthError> {
        let OAuthState::AuthorizationPending {
            discovery,
            registration,
            pkce,
            state_token,
        } = state
        else {
            return Err(OAuthError::AuthorizationCallback(
                "callback received while not awaiting one".to_string(),
            ));
        };

        if let Some(error) = &callback.error {
            return Err(OAuthError::AuthorizationCallback(format!(
                "authorization server returned an error: {error}{}",
                callback
                    .error_description
                    .as_ref()
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default()
            )));
        }

        let Some(returned_state) = &callback.state else {
            return Err(OAuthError::AuthorizationCallback(
                "callback is missing state".to_string(),
            ));
        };
        if !pkce::constant_time_eq(returned_state, &state_token) {
            return Err(OAuthError::StateValidation);
        }

        let Some(code) = &callback.code else {
            return Err(OAuthError::AuthorizationCallback(
                "callback has neither code nor error".to_string(),
            ));
        };

        let resource = discovery.resource_url();
        let token_response = token::exchange_code(
            &self.http,
            TokenExchangeRequest {
                token_endpoint: &discovery.authorization_server_metadata.token_endpoint,
                code,
                redirect_uri: &self.redirect_uri,
                client_id: &registration.credentials.client_id,
                code_verifier: &pkce.verifier,
                resource: Some(&resource),
                scope: scope.as_deref(),
            },
        )
        .await?;

        let mut tokens = TokenState::default();
        tokens.apply_token_response(token_response, SystemTime::now());

        Ok(OAuthState::Authorized {
            discovery,
            registration,
            tokens,
        })
    }

    /// `Authorized -> Refreshing -> Authorized`. On failure the caller
    /// should fall back to `OAuthState::Uninitiated` (spec §4.6).
    pub async fn refresh(&self, state: OAuthState, scope: Option<String>) -> Result<OAuthState, OAuthError> {
        let OAuthState::Authorized {
            discovery,
            registration,
            mut tokens,
        } = state
        else {
            return Err(OAuthError::TokenRefresh(
                "refresh requested while not authorized".to_string(),
            ));
        };

        let Some(refresh_token) = tokens.refresh_token.clone() else {
            return Err(OAuthError::TokenRefresh("no refresh token available".to_string()));
        };

        let resource = discovery.resource_url();
        let response = token::refresh(
            &self.http,
            RefreshRequest {
                token_endpoint: &discovery.authorization_server_metadata.token_endpoint,
                refresh_token: &refresh_token,
                client_id: &registration.credentials.client_id,
                resource: Some(&resource),
                scope: scope.as_deref(),
            },
        )
        .await?;

        tokens.apply_token_response(response, SystemTime::now());

        Ok(OAuthState::Authorized {
            discovery,
            registration,
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_carries_the_recognized_parameter_set() {
        let req = AuthorizationRequest {
            authorization_endpoint: "https://as.example/authorize".to_string(),
            client_id: "client-1".to_string(),
            redirect_uri: "https://client.example/callback".to_string(),
            code_challenge: "challenge".to_string(),
            code_challenge_method: "S256",
            state: "state-token".to_string(),
            resource: Some("https://rs.example/mcp".to_string()),
            scope: Some("mcp:tools".to_string()),
        };
        let url = req.build_url();
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("resource=https%3A%2F%2Frs.example%2Fmcp"));
        assert!(url.contains("scope=mcp%3Atools"));
    }

    #[test]
    fn callback_distinguishes_success_from_as_error() {
        let success = AuthorizationCallback::from_query_pairs(
            vec![
                ("code".to_string(), "abc".to_string()),
                ("state".to_string(), "xyz".to_string()),
            ]
            .into_iter(),
        );
        assert!(success.is_success());

        let denied = AuthorizationCallback::from_query_pairs(
            vec![("error".to_string(), "access_denied".to_string())].into_iter(),
        );
        assert!(!denied.is_success());
    }
}
