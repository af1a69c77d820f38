pub mod schema;
pub mod types;
pub mod validate;

pub use schema::{FieldType, Schema, SchemaViolation, csr_schema};
pub use types::{CsrDescriptor, KeySpec, NameEntry};
pub use validate::{ValidationError, load_document, validate};
