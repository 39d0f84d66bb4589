pub mod format;
pub mod validate;

pub use format::{format_millis, format_number, format_optional_number};
pub use validate::{
    REDACTED_PASSWORD, database_from_uri, redact_uri_password, validate_mongodb_uri,
    validate_operation_id,
};
