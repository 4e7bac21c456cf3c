pub mod resource_store;
pub mod resource_validator;
pub mod resources;
