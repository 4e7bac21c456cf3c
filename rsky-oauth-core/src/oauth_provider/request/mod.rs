pub mod authorization_code;
pub mod pkce;
pub mod request_parameters;
