pub mod profile_service;
pub mod subject;
