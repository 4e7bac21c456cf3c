pub mod account;
pub mod client;
pub mod clock;
pub mod config;
pub mod consent;
pub mod constants;
pub mod device;
pub mod errors;
pub mod grant;
pub mod handle;
pub mod oauth_provider;
pub mod replay;
pub mod request;
pub mod resource;
pub mod response;
pub mod scope;
pub mod token;
pub mod validation;
