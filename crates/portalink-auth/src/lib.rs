//! Patient authentication for the Portalink EHR integration layer.
//!
//! This crate provides:
//! - [`identity`] - Verification that a projected vendor record belongs to
//!   the identity it was queried by
//! - [`lookup`] - The patient directory composing configuration, request
//!   building, the vendor call, and projection
//! - [`login`] - The two-step, anti-enumeration patient login flow
//! - [`resend`] - Per-email throttling of repeat code requests
//!
//! The flow collapses all internal failure causes into uniform external
//! outcomes; the distinct causes are visible only in logs and to the
//! administrative configuration-test surface in `portalink-ehr`.

pub mod identity;
pub mod login;
pub mod lookup;
pub mod resend;

pub use identity::{
    IdentityError, PATIENT_EMAIL_FIELD, PATIENT_ID_FIELD, PatientIdentity, verify_identity,
};
pub use login::{
    CODE_SENT_MESSAGE, CodeRequestOutcome, CodeVerifyOutcome, FieldErrors, LoginFlow, LoginState,
    PatientHandle, REFERENCE_VERIFICATION_CODE, VERIFICATION_FAILED_MESSAGE,
};
pub use lookup::PatientDirectory;
pub use resend::ResendGuard;
