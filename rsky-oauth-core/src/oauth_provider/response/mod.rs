pub mod introspection_response_generator;
pub mod revocation_response_generator;
pub mod token_response_generator;
pub mod user_info_response_generator;
