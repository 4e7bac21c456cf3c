pub mod oauth_provider;
pub mod oauth_types;
