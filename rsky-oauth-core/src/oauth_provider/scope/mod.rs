pub mod parsed_scope_value;
pub mod scope_parser;
