//! CloudStack request signing
//!
//! CloudStack authenticates each request with an HMAC-SHA1 over the sorted,
//! lower-cased query string, keyed with the account's secret key.

use crate::error::{CloudStackError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::form_urlencoded;

type HmacSha1 = Hmac<Sha1>;

/// Form-encode a single value (`application/x-www-form-urlencoded`)
pub fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Build the query string with parameters sorted by lower-cased key
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by_key(|(k, _)| k.to_lowercase());

    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// The exact bytes the server recomputes the HMAC over
pub fn string_to_sign(query: &str) -> String {
    query.to_lowercase().replace('+', "%20")
}

/// Compute the base64 signature for a canonical query string
pub fn sign(query: &str, secret_key: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())
        .map_err(|e| CloudStackError::Signature(e.to_string()))?;
    mac.update(string_to_sign(query).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Return the canonical query with its `signature` parameter appended
pub fn signed_query(params: &[(String, String)], secret_key: &str) -> Result<String> {
    let query = canonical_query(params);
    let signature = sign(&query, secret_key)?;
    Ok(format!("{}&signature={}", query, encode(&signature)))
}
