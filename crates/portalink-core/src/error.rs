use thiserror::Error;

/// Core error types for portal EHR integration operations
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("No API connection configured for tenant: {0}")]
    MissingConnection(String),

    #[error("No field mapping configured for tenant {org_code} and entity {kind}")]
    MissingMapping { org_code: String, kind: String },

    #[error("Unsupported auth scheme: {0}")]
    UnsupportedAuthScheme(String),

    #[error("Endpoint template has unresolved placeholder: {placeholder} in {template}")]
    EndpointTemplate {
        template: String,
        placeholder: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vendor API returned status {0}")]
    VendorStatus(u16),

    #[error("Vendor API unavailable: {0}")]
    VendorUnavailable(String),

    #[error("Vendor response is not a JSON object or array")]
    MalformedDocument,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Identity verification failed")]
    IdentityMismatch,

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Tenant could not be resolved from the calling context")]
    TenantNotResolved,

    #[error("Mapping validation failed: {0}")]
    Validation(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl PortalError {
    /// Create a new MissingConnection error
    pub fn missing_connection(org_code: impl Into<String>) -> Self {
        Self::MissingConnection(org_code.into())
    }

    /// Create a new MissingMapping error
    pub fn missing_mapping(org_code: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::MissingMapping {
            org_code: org_code.into(),
            kind: kind.into(),
        }
    }

    /// Create a new UnsupportedAuthScheme error
    pub fn unsupported_auth_scheme(scheme: impl Into<String>) -> Self {
        Self::UnsupportedAuthScheme(scheme.into())
    }

    /// Create a new EndpointTemplate error
    pub fn endpoint_template(template: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::EndpointTemplate {
            template: template.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new Credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Create a new VendorUnavailable error
    pub fn vendor_unavailable(message: impl Into<String>) -> Self {
        Self::VendorUnavailable(message.into())
    }

    /// Check if this error must only be surfaced to administrators,
    /// never to end patients
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Self::MissingConnection(_)
                | Self::MissingMapping { .. }
                | Self::UnsupportedAuthScheme(_)
                | Self::EndpointTemplate { .. }
                | Self::Configuration(_)
                | Self::Validation(_)
        )
    }

    /// Check if a retry of the same request could reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VendorUnavailable(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingConnection(_)
            | Self::MissingMapping { .. }
            | Self::UnsupportedAuthScheme(_)
            | Self::EndpointTemplate { .. }
            | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::VendorStatus(_) | Self::VendorUnavailable(_) | Self::MalformedDocument => {
                ErrorCategory::Vendor
            }
            Self::RecordNotFound | Self::IdentityMismatch => ErrorCategory::Identity,
            Self::Credential(_) => ErrorCategory::Credential,
            Self::TenantNotResolved => ErrorCategory::Tenant,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::JsonError(_) | Self::UrlError(_) => ErrorCategory::System,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Vendor,
    Identity,
    Credential,
    Tenant,
    Validation,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Vendor => write!(f, "vendor"),
            Self::Identity => write!(f, "identity"),
            Self::Credential => write!(f, "credential"),
            Self::Tenant => write!(f, "tenant"),
            Self::Validation => write!(f, "validation"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;
