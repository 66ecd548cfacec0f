//! End-to-end login flow tests against a mock vendor EHR.
//!
//! Drives the full pipeline: tenant configuration (encrypted credential,
//! bearer auth, patient mapping), request building with URL-encoded
//! placeholder substitution, the vendor HTTP call, projection, identity
//! verification, and the two-step login on top.

use std::sync::Arc;
use std::time::Duration;

use portalink_auth::{
    CODE_SENT_MESSAGE, LoginFlow, LoginState, PatientDirectory, REFERENCE_VERIFICATION_CODE,
};
use portalink_config::{
    ConnectionStorage, CredentialCipher, MappingStorage, MemoryPortalStore, OrgCode,
    TenantApiConnection,
};
use portalink_core::{EntityKind, FieldMap, TenantFieldMapping};
use portalink_ehr::{VendorClient, VendorClientConfig};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configure tenant `org_abc` against the given vendor server.
async fn configure_tenant(server_uri: &str, cipher: &CredentialCipher) -> Arc<MemoryPortalStore> {
    let store = Arc::new(MemoryPortalStore::new());

    ConnectionStorage::upsert(
        store.as_ref(),
        &TenantApiConnection::new(
            "org_abc",
            Url::parse(server_uri).expect("parse vendor url"),
            cipher.encrypt("secret123").expect("encrypt credential"),
            "bearer",
        ),
    )
    .await
    .expect("store connection");

    let field_map: FieldMap = [("email", "contact.email"), ("ehrPatientId", "patient_id")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    MappingStorage::upsert(
        store.as_ref(),
        &TenantFieldMapping::new(
            "org_abc",
            EntityKind::Patient,
            "/patients/{email}",
            field_map,
        ),
    )
    .await
    .expect("store mapping");

    store
}

fn login_flow(store: Arc<MemoryPortalStore>, cipher: CredentialCipher) -> LoginFlow {
    let directory = PatientDirectory::new(
        store.clone(),
        store,
        cipher,
        VendorClient::new(VendorClientConfig::default().with_allow_http(true)),
    );
    LoginFlow::with_resend_cooldown(directory, Duration::ZERO)
}

#[tokio::test]
async fn full_login_round_trip() {
    let server = MockServer::start().await;

    // The vendor must see the URL-encoded email and the bearer header.
    Mock::given(method("GET"))
        .and(path("/patients/jane%40x.com"))
        .and(header("Authorization", "Bearer secret123"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "patient_id": "P1",
            "contact": {"email": "jane@x.com"}
        })))
        .expect(2) // one lookup per step
        .mount(&server)
        .await;

    let cipher = CredentialCipher::new(CredentialCipher::generate_key());
    let store = configure_tenant(&server.uri(), &cipher).await;
    let flow = login_flow(store, cipher);
    let org = OrgCode::new("org_abc");

    // Step 1: request a code.
    let requested = flow.request_code(&org, "jane@x.com").await;
    assert!(requested.success);
    assert_eq!(requested.message, CODE_SENT_MESSAGE);
    assert_eq!(requested.state, LoginState::AwaitingCode);

    let patient = requested.patient.expect("patient handle");
    assert_eq!(patient.id, "P1");
    assert_eq!(patient.email, "jane@x.com");

    // Step 2: verify the code.
    let verified = flow
        .verify_code(&org, "jane@x.com", REFERENCE_VERIFICATION_CODE)
        .await;
    assert!(verified.success);
    assert_eq!(verified.state, LoginState::Authenticated);
    assert!(verified.token.is_some());

    let identity = verified.patient.expect("verified identity");
    assert_eq!(identity.id, "P1");
    assert_eq!(identity.email, "jane@x.com");
}

#[tokio::test]
async fn unknown_email_walks_the_same_path_but_never_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let cipher = CredentialCipher::new(CredentialCipher::generate_key());
    let store = configure_tenant(&server.uri(), &cipher).await;
    let flow = login_flow(store, cipher);
    let org = OrgCode::new("org_abc");

    let requested = flow.request_code(&org, "nosuch@x.com").await;
    assert!(requested.success);
    assert_eq!(requested.message, CODE_SENT_MESSAGE);
    assert_eq!(requested.state, LoginState::AwaitingCode);
    // A handle is still issued so the code screen renders identically.
    assert!(requested.patient.is_some());

    // Even the right code cannot authenticate a nonexistent patient.
    let verified = flow
        .verify_code(&org, "nosuch@x.com", REFERENCE_VERIFICATION_CODE)
        .await;
    assert!(!verified.success);
    assert_eq!(verified.state, LoginState::AwaitingCode);
    assert!(verified.token.is_none());
    assert!(verified.patient.is_none());
}

#[tokio::test]
async fn vendor_record_for_wrong_patient_is_not_trusted() {
    let server = MockServer::start().await;
    // Vendor ignores the query and returns someone else's record.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "patient_id": "P9",
            "contact": {"email": "mallory@x.com"}
        })))
        .mount(&server)
        .await;

    let cipher = CredentialCipher::new(CredentialCipher::generate_key());
    let store = configure_tenant(&server.uri(), &cipher).await;
    let flow = login_flow(store, cipher);
    let org = OrgCode::new("org_abc");

    let verified = flow
        .verify_code(&org, "jane@x.com", REFERENCE_VERIFICATION_CODE)
        .await;
    assert!(!verified.success);
    assert!(verified.patient.is_none());
}
