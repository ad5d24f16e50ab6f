use std::collections::HashMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::models::PersistedEnvelope;

/// COMPONENT
///
/// The percent-encoding set applied to cookie values and redirect query
/// parameters. Matches JavaScript's `encodeURIComponent` (everything except
/// alphanumerics and `- _ . ! ~ * ' ( )` is escaped), so `/` becomes `%2F`
/// and `{` becomes `%7B`. This set is part of the cookie wire contract:
/// values written here must decode identically on any other reader.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SECONDS_PER_DAY: u64 = 86_400;

/// CookieFlags
///
/// The non-persisted, protocol-level attributes attached to an emitted cookie.
/// `secure` tracks the deployment (HTTPS in production); `http_only` is set
/// only for server-issued token cookies, never for the client-readable
/// auth-state cookie.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CookieFlags {
    pub http_only: bool,
    pub secure: bool,
}

impl CookieFlags {
    /// Flags for the client-readable auth-state cookie.
    pub fn client(secure: bool) -> Self {
        Self {
            http_only: false,
            secure,
        }
    }

    /// Flags for server-issued token cookies, which must never be readable
    /// from client-side script.
    pub fn server(secure: bool) -> Self {
        Self {
            http_only: true,
            secure,
        }
    }
}

/// encode
///
/// Serializes a logical cookie into its Set-Cookie wire representation:
/// percent-encoded value followed by the attribute list
/// `Max-Age=<days*86400>; Path=/; SameSite=Lax` plus `HttpOnly` and `Secure`
/// as directed by `flags`. Deterministic for identical inputs.
///
/// `max_age_days` is expected to be positive; this is the caller's
/// responsibility and is not validated here (a zero value is reserved for
/// `encode_delete`).
pub fn encode(name: &str, value: &str, max_age_days: u64, flags: CookieFlags) -> String {
    let encoded_value = utf8_percent_encode(value, COMPONENT).to_string();
    let mut wire = format!(
        "{}={}; Max-Age={}; Path=/; SameSite=Lax",
        name,
        encoded_value,
        max_age_days * SECONDS_PER_DAY
    );
    if flags.http_only {
        wire.push_str("; HttpOnly");
    }
    if flags.secure {
        wire.push_str("; Secure");
    }
    wire
}

/// encode_delete
///
/// Serializes a deletion instruction for the named cookie: an empty value with
/// `Max-Age=0`, which directs the client to purge it immediately. Attribute
/// flags must match the cookie being deleted so the browser targets the same
/// cookie slot.
pub fn encode_delete(name: &str, flags: CookieFlags) -> String {
    let mut wire = format!("{}=; Max-Age=0; Path=/; SameSite=Lax", name);
    if flags.http_only {
        wire.push_str("; HttpOnly");
    }
    if flags.secure {
        wire.push_str("; Secure");
    }
    wire
}

/// decode
///
/// Parses an incoming `Cookie` request header into a name → value mapping.
///
/// Splits on `;`, trims each segment, and percent-decodes values. Fail-closed
/// by construction: segments without a `=`, and values that are not valid
/// percent-encoded UTF-8, are silently dropped. A malformed header can shrink
/// the mapping but can never surface an error or a forged entry. `None` and
/// empty input yield an empty mapping.
pub fn decode(header: Option<&str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    let Some(header) = header else {
        return cookies;
    };

    for segment in header.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((name, raw_value)) = segment.split_once('=') else {
            continue;
        };
        match percent_decode_str(raw_value).decode_utf8() {
            Ok(value) => {
                cookies.insert(name.trim().to_string(), value.into_owned());
            }
            // Invalid percent-encoding: drop the pair, keep the rest.
            Err(_) => continue,
        }
    }

    cookies
}

/// encode_component
///
/// Percent-encodes a single path or query component with the same escape set
/// as cookie values. Used by the Route Guard when attaching the original path
/// as a `redirect` query parameter.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// encode_envelope
///
/// Serializes the persisted session envelope to its JSON wire form (the value
/// that `encode` then percent-encodes into the auth-state cookie).
pub fn encode_envelope(envelope: &PersistedEnvelope) -> String {
    // The envelope is a closed struct of strings, options and booleans;
    // serialization cannot fail for any reachable value.
    serde_json::to_string(envelope).expect("envelope serialization is infallible")
}

/// decode_envelope
///
/// Deserializes a raw envelope JSON string. Any failure (truncated JSON,
/// wrong types, random bytes) resolves to the default, anonymous envelope
/// rather than an error. An attacker-supplied malformed cookie must never be
/// interpreted as an authenticated session.
pub fn decode_envelope(raw: &str) -> PersistedEnvelope {
    serde_json::from_str(raw).unwrap_or_default()
}
