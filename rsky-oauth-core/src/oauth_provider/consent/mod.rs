pub mod consent;
pub mod consent_service;
