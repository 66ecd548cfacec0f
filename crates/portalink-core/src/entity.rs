//! Entity mapping definitions.
//!
//! The canonical schema each tenant maps its EHR vendor onto: one
//! [`EntityMappingDefinition`] per entity kind, shipped as static
//! configuration data. Only the concrete vendor-path values are
//! tenant-editable; the field lists themselves are not.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Logical type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Object,
    Array,
}

/// A single canonical field in an entity mapping definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical field name (e.g. `ehrPatientId`, `email`).
    pub name: String,
    /// Human-readable label for administrative screens.
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Help text shown next to the field on the mapping form.
    pub description: String,
}

impl FieldSpec {
    fn new(
        name: &str,
        label: &str,
        field_type: FieldType,
        required: bool,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            required,
            description: description.to_string(),
        }
    }
}

/// The entity kinds a tenant can map.
///
/// Portal users come from the identity provider, not the EHR, so they have
/// no mapping definition here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Patient,
    Appointment,
    Invoice,
}

impl EntityKind {
    /// All entity kinds with a shipped mapping definition.
    pub const ALL: [EntityKind; 3] = [Self::Patient, Self::Appointment, Self::Invoice];

    /// Stable string key used in storage rows and lookups.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Appointment => "appointment",
            Self::Invoice => "invoice",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Self::Patient),
            "appointment" => Ok(Self::Appointment),
            "invoice" => Ok(Self::Invoice),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized entity kind string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

/// Static, per-entity-kind schema: the ordered canonical field list and the
/// default vendor endpoint template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMappingDefinition {
    pub kind: EntityKind,
    pub name: String,
    pub description: String,
    /// Default endpoint template with a single `{placeholder}` token.
    /// Tenants may override it per mapping.
    pub endpoint: String,
    pub fields: Vec<FieldSpec>,
}

impl EntityMappingDefinition {
    /// Look up a field spec by canonical name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical names of all required fields, in definition order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }
}

static PATIENT_DEFINITION: LazyLock<EntityMappingDefinition> = LazyLock::new(|| {
    EntityMappingDefinition {
        kind: EntityKind::Patient,
        name: "Patient Mapping".to_string(),
        description: "Map EHR patients to portal users".to_string(),
        endpoint: "/patients/{email}".to_string(),
        fields: vec![
            FieldSpec::new(
                "ehrPatientId",
                "EHR Patient ID",
                FieldType::String,
                true,
                "Unique identifier for the patient in the EHR system",
            ),
            FieldSpec::new(
                "email",
                "Email",
                FieldType::String,
                true,
                "Email address for portal access and notifications",
            ),
            FieldSpec::new(
                "firstName",
                "First Name",
                FieldType::String,
                true,
                "Patient's first name",
            ),
            FieldSpec::new(
                "lastName",
                "Last Name",
                FieldType::String,
                true,
                "Patient's last name",
            ),
            FieldSpec::new(
                "dateOfBirth",
                "Date of Birth",
                FieldType::Date,
                true,
                "Patient's date of birth (YYYY-MM-DD)",
            ),
            FieldSpec::new(
                "phone",
                "Phone",
                FieldType::String,
                false,
                "Contact phone number",
            ),
        ],
    }
});

static APPOINTMENT_DEFINITION: LazyLock<EntityMappingDefinition> = LazyLock::new(|| {
    EntityMappingDefinition {
        kind: EntityKind::Appointment,
        name: "Appointment Mapping".to_string(),
        description: "Map EHR appointments to portal appointments".to_string(),
        endpoint: "/appointments/{id}".to_string(),
        fields: vec![
            FieldSpec::new(
                "ehrAppointmentId",
                "EHR Appointment ID",
                FieldType::String,
                true,
                "Unique identifier for the appointment in the EHR system",
            ),
            FieldSpec::new(
                "patientId",
                "Patient ID",
                FieldType::String,
                true,
                "Reference to the patient this appointment is for",
            ),
            FieldSpec::new(
                "providerId",
                "Provider ID",
                FieldType::String,
                true,
                "Reference to the healthcare provider",
            ),
            FieldSpec::new(
                "date",
                "Date",
                FieldType::Date,
                true,
                "Date of the appointment (YYYY-MM-DD)",
            ),
            FieldSpec::new(
                "startTime",
                "Start Time",
                FieldType::String,
                true,
                "Start time of the appointment (HH:MM)",
            ),
            FieldSpec::new(
                "endTime",
                "End Time",
                FieldType::String,
                true,
                "End time of the appointment (HH:MM)",
            ),
            FieldSpec::new(
                "status",
                "Status",
                FieldType::String,
                true,
                "Status of the appointment (scheduled, completed, cancelled, etc.)",
            ),
            FieldSpec::new(
                "type",
                "Type",
                FieldType::String,
                true,
                "Type of appointment (follow-up, new patient, etc.)",
            ),
            FieldSpec::new(
                "location",
                "Location",
                FieldType::String,
                false,
                "Physical location of the appointment",
            ),
            FieldSpec::new(
                "notes",
                "Notes",
                FieldType::String,
                false,
                "Additional notes about the appointment",
            ),
        ],
    }
});

static INVOICE_DEFINITION: LazyLock<EntityMappingDefinition> = LazyLock::new(|| {
    EntityMappingDefinition {
        kind: EntityKind::Invoice,
        name: "Invoice Mapping".to_string(),
        description: "Map EHR invoices to portal invoices".to_string(),
        endpoint: "/invoices/{id}".to_string(),
        fields: vec![
            FieldSpec::new(
                "ehrInvoiceId",
                "EHR Invoice ID",
                FieldType::String,
                true,
                "Unique identifier for the invoice in the EHR system",
            ),
            FieldSpec::new(
                "patientId",
                "Patient ID",
                FieldType::String,
                true,
                "Reference to the patient this invoice is for",
            ),
            FieldSpec::new(
                "date",
                "Date",
                FieldType::Date,
                true,
                "Date the invoice was issued (YYYY-MM-DD)",
            ),
            FieldSpec::new(
                "dueDate",
                "Due Date",
                FieldType::Date,
                true,
                "Date the invoice is due (YYYY-MM-DD)",
            ),
            FieldSpec::new(
                "amount",
                "Amount",
                FieldType::Number,
                true,
                "Total amount due",
            ),
            FieldSpec::new(
                "status",
                "Status",
                FieldType::String,
                true,
                "Status of the invoice (pending, paid, overdue, etc.)",
            ),
            FieldSpec::new(
                "items",
                "Line Items",
                FieldType::Array,
                false,
                "Detailed line items for the invoice",
            ),
        ],
    }
});

/// Get the shipped mapping definition for an entity kind.
pub fn definition(kind: EntityKind) -> &'static EntityMappingDefinition {
    match kind {
        EntityKind::Patient => &PATIENT_DEFINITION,
        EntityKind::Appointment => &APPOINTMENT_DEFINITION,
        EntityKind::Invoice => &INVOICE_DEFINITION,
    }
}

/// All shipped mapping definitions, in a stable order.
pub fn definitions() -> impl Iterator<Item = &'static EntityMappingDefinition> {
    EntityKind::ALL.iter().map(|kind| definition(*kind))
}
