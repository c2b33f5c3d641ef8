use std::collections::HashMap;
use std::fmt::Write as _;

use md5::{Digest, Md5};
use tracing::debug;

use crate::error::{AuthError, Result};

/// Outer scheme token a `WWW-Authenticate`/`Proxy-Authenticate` challenge
/// may carry; only `Digest` is implemented, the rest are recognized so an
/// unsupported challenge fails with a clear error rather than a parse
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Bearer,
    Digest,
    Ntlm,
    OAuth,
    Negotiate,
}

impl AuthScheme {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "Basic" => Some(Self::Basic),
            "Bearer" => Some(Self::Bearer),
            "Digest" => Some(Self::Digest),
            "NTLM" => Some(Self::Ntlm),
            "OAuth" => Some(Self::OAuth),
            "Negotiate" => Some(Self::Negotiate),
            _ => None,
        }
    }
}

/// A parsed Digest challenge: realm/nonce/qop plus whatever other
/// comma-separated parameters were present, each respecting quoted
/// strings that may themselves contain commas.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
}

impl DigestChallenge {
    pub fn parse(header_value: &str) -> Result<Self> {
        let header_value = header_value.trim();
        let (scheme_token, rest) = header_value.split_once(' ').ok_or(AuthError::MissingScheme)?;
        let scheme = AuthScheme::parse(scheme_token).ok_or_else(|| AuthError::UnsupportedScheme(scheme_token.to_string()))?;
        if scheme != AuthScheme::Digest {
            return Err(AuthError::UnsupportedScheme(scheme_token.to_string()));
        }

        let params = parse_params(rest);
        Ok(Self {
            realm: params.get("realm").cloned().ok_or(AuthError::MissingParam("realm"))?,
            nonce: params.get("nonce").cloned().ok_or(AuthError::MissingParam("nonce"))?,
            qop: params.get("qop").cloned(),
            opaque: params.get("opaque").cloned(),
            algorithm: params.get("algorithm").cloned(),
        })
    }
}

/// Split `key=value, key="quoted, value"` params, respecting commas
/// inside double-quoted values.
fn parse_params(s: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = s.chars().peekable();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut segments = Vec::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    for segment in segments {
        let segment = segment.trim();
        if let Some((key, value)) = segment.split_once('=') {
            let value = value.trim().trim_matches('"');
            params.insert(key.trim().to_string(), value.to_string());
        }
    }
    params
}

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// IMS Digest per spec.md §4.7:
/// `HA1 = MD5(imsi:realm:Ki)`, `HA2 = MD5(method:"sip:"+realm)`,
/// `response = MD5(HA1:nonce:nc:cnonce:"auth":HA2)`.
pub fn compute_response(imsi: &str, ki: &str, challenge: &DigestChallenge, method: &str, nonce_count: u32, cnonce: &str) -> String {
    let ha1 = md5_hex(&format!("{imsi}:{}:{ki}", challenge.realm));
    let ha2 = md5_hex(&format!("{method}:sip:{}", challenge.realm));
    let nc = format!("{nonce_count:08x}");
    md5_hex(&format!("{ha1}:{}:{nc}:{cnonce}:auth:{ha2}", challenge.nonce))
}

/// Build the `Authorization`/`Proxy-Authorization` header value to reissue
/// the original request with.
#[allow(clippy::too_many_arguments)]
pub fn build_authorization_header(
    username: &str,
    challenge: &DigestChallenge,
    uri: &str,
    response: &str,
    nonce_count: u32,
    cnonce: &str,
) -> String {
    let mut out = format!(
        "Digest username=\"{username}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", response=\"{response}\"",
        challenge.realm, challenge.nonce
    );
    if let Some(qop) = &challenge.qop {
        let _ = write!(out, ", qop={qop}, nc={nonce_count:08x}, cnonce=\"{cnonce}\"");
    }
    if let Some(opaque) = &challenge.opaque {
        let _ = write!(out, ", opaque=\"{opaque}\"");
    }
    if let Some(algorithm) = &challenge.algorithm {
        let _ = write!(out, ", algorithm={algorithm}");
    }
    debug!(username, realm = %challenge.realm, "built digest authorization header");
    out
}
