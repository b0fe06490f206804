//! OAuth 2.1 authorization client gating the streamable HTTP transport:
//! PKCE, RFC 9728/8414 discovery, RFC 7591 dynamic client registration, and
//! token exchange/refresh, composed into the state machine from spec §4.6.

pub mod discovery;
pub mod flow;
pub mod pkce;
pub mod redirect;
pub mod registration;
pub mod token;

pub use discovery::canonicalize_resource_url;
pub use discovery::discover;
pub use discovery::AuthorizationServerMetadata;
pub use discovery::DiscoveryResult;
pub use discovery::ProtectedResourceMetadata;
pub use flow::AuthorizationCallback;
pub use flow::AuthorizationRequest;
pub use flow::OAuth2FlowManager;
pub use flow::OAuthState;
pub use pkce::constant_time_eq;
pub use pkce::generate as generate_pkce;
pub use pkce::generate_state_token;
pub use pkce::PkceParameters;
pub use redirect::validate_redirect_uri;
pub use registration::register;
pub use registration::ClientCredentials;
pub use registration::ClientMetadata;
pub use registration::ClientRegistration;
pub use token::exchange_code;
pub use token::refresh;
pub use token::RefreshRequest;
pub use token::TokenExchangeRequest;
pub use token::TokenResponse;
pub use token::TokenState;
