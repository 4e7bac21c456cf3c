mod oauth_code_challenge_method;
mod oauth_error_code;
mod oauth_grant_type;
mod oauth_introspection_response;
mod oauth_scope;
mod oauth_token_response;
mod oauth_token_type;

pub use oauth_code_challenge_method::*;
pub use oauth_error_code::*;
pub use oauth_grant_type::*;
pub use oauth_introspection_response::*;
pub use oauth_scope::*;
pub use oauth_token_response::*;
pub use oauth_token_type::*;

pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

pub const PROTOCOL_TYPE_OIDC: &str = "oidc";

pub const SCOPE_OFFLINE_ACCESS: &str = "offline_access";
pub const SCOPE_OPENID: &str = "openid";
