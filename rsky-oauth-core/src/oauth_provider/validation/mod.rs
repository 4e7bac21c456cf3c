pub mod extension_grant_validator;
pub mod grant_validation_result;
pub mod resource_owner_validator;
pub mod token_request_validator;
pub mod validated_request;
