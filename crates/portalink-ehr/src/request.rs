//! Outbound vendor request construction.
//!
//! A pure function from connection configuration plus an endpoint template
//! to a fully resolved URL and header set. No network call happens here,
//! which is what keeps request construction testable in isolation.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use portalink_config::{AuthScheme, TenantApiConnection};
use portalink_core::{PortalError, Result};

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("Invalid placeholder regex"));

/// A fully resolved vendor request: URL plus headers, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// The name of the first `{placeholder}` token in an endpoint template.
///
/// Shipped endpoint templates carry exactly one placeholder (`{email}` or
/// `{id}`); lookups use this to know which substitution key to bind the
/// query value to.
pub fn single_placeholder(template: &str) -> Option<String> {
    PLACEHOLDER_REGEX
        .captures(template)
        .map(|caps| caps[1].to_string())
}

/// Build a vendor request from a tenant connection and endpoint template.
///
/// `credential` is the decrypted credential; decryption stays with the
/// caller so this function has no dependency on the cipher. Every
/// occurrence of each `{key}` in the template is replaced by the
/// URL-encoded substitution value. A placeholder left unresolved after
/// substitution is a configuration error, not a silently broken URL.
pub fn build_request(
    connection: &TenantApiConnection,
    credential: &str,
    endpoint_template: &str,
    substitutions: &HashMap<String, String>,
) -> Result<BuiltRequest> {
    let mut endpoint = endpoint_template.to_string();
    for (key, value) in substitutions {
        let token = format!("{{{key}}}");
        if endpoint.contains(&token) {
            endpoint = endpoint.replace(&token, &urlencoding::encode(value));
        }
    }

    if let Some(caps) = PLACEHOLDER_REGEX.captures(&endpoint) {
        return Err(PortalError::endpoint_template(
            endpoint_template,
            caps[0].to_string(),
        ));
    }

    let base = connection.base_url.as_str().trim_end_matches('/');
    let url = format!("{base}{endpoint}");

    Ok(BuiltRequest {
        url,
        headers: auth_headers(credential, &connection.auth_scheme)?,
    })
}

/// Header set for the selected auth scheme.
///
/// Always includes `Content-Type: application/json`; the scheme string is
/// parsed here so an unsupported configured value fails as a configuration
/// error at request time.
fn auth_headers(credential: &str, auth_scheme: &str) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    match auth_scheme.parse::<AuthScheme>()? {
        AuthScheme::Bearer => {
            headers.insert("Authorization".to_string(), format!("Bearer {credential}"));
        }
        AuthScheme::XAuthKey => {
            headers.insert("X-Auth-Key".to_string(), credential.to_string());
        }
    }
    Ok(headers)
}
