pub mod refresh_token;
pub mod refresh_token_service;
pub mod signer;
pub mod token;
pub mod token_service;
pub mod token_validator;
