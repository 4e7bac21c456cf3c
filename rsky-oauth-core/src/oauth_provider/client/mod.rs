pub mod client;
pub mod client_secret_validator;
pub mod client_store;
pub mod secret;
pub mod secret_parser;
pub mod secret_validator;
