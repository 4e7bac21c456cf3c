pub mod authorization_code_store;
pub mod default_grant_store;
pub mod persisted_grant;
pub mod persisted_grant_service;
pub mod persisted_grant_store;
pub mod persisted_grant_store_memory;
pub mod reference_token_store;
pub mod refresh_token_store;
pub mod user_consent_store;
