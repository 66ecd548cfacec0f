pub mod entity;
pub mod error;
pub mod projection;
pub mod registry;
pub mod validation;

pub use entity::{
    EntityKind, EntityMappingDefinition, FieldSpec, FieldType, UnknownEntityKind, definition,
    definitions,
};
pub use error::{ErrorCategory, PortalError, Result};
pub use projection::{FieldMap, ProjectedRecord, ProjectedValue, project, project_entity, resolve_path};
pub use registry::{MappingValidationError, TenantFieldMapping, validate_mapping};
pub use validation::is_valid_email;
