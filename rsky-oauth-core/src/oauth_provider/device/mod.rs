pub mod device_authorization_service;
pub mod device_code;
pub mod device_code_validator;
pub mod device_flow_store;
pub mod device_flow_throttling;
