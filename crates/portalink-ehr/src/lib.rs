//! Vendor EHR proxy layer for Portalink.
//!
//! This crate provides:
//! - [`request`] - Pure construction of outbound vendor requests
//!   (placeholder substitution, auth headers)
//! - [`client`] - The HTTP client that performs the single vendor GET and
//!   classifies failures
//! - [`records`] - The tenant-scoped fetch-and-project pipeline shared by
//!   every entity kind
//! - [`probe`] - The administrative configuration-test and mapping-preview
//!   surface
//!
//! The request builder and the projection engine (in `portalink-core`) are
//! deliberately independent leaves; this crate wires the builder to the
//! network and hands projections to callers.

pub mod client;
pub mod probe;
pub mod records;
pub mod request;

pub use client::{VendorClient, VendorClientConfig, VendorError};
pub use probe::{EndpointTestReport, preview_mapping, test_endpoint};
pub use records::RecordService;
pub use request::{BuiltRequest, build_request, single_placeholder};
