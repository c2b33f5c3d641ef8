use crate::body::Body;
use crate::header::Headers;
use crate::method::Method;
use crate::uri::Uri;

pub const SIP_VERSION: &str = "SIP/2.0";
/// RFC 3261 Via-branch magic cookie.
pub const MAGIC_COOKIE: &str = "z9hG4bK";

/// Start line of a request or a response; `Invalid` carries the raw text
/// for what could not be classified as either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request { method: Method, request_uri: String },
    Response { status_code: u16, reason_phrase: String },
    Invalid(String),
}

/// Side-fields extracted once while parsing, so later code never has to
/// re-derive them from the raw header bag. Per spec.md §3/§4.1.
#[derive(Debug, Clone, Default)]
pub struct SideFields {
    pub call_id: String,
    pub from_tag: Option<String>,
    pub to_tag: Option<String>,
    pub via_branch: Option<String>,
    pub cseq_number: Option<u32>,
    pub cseq_method: Option<Method>,
    pub max_forwards: Option<u8>,
    pub contact_uri: Option<Uri>,
    pub record_route_uris: Vec<Uri>,
}

/// A fully parsed (or still-unparsed/invalid) SIP PDU.
#[derive(Debug, Clone)]
pub struct Message {
    pub start_line: StartLine,
    pub headers: Headers,
    pub body: Body,
    pub side: SideFields,
    /// Cached wire bytes from the last time this message was serialized,
    /// so a retransmit resends byte-for-byte. Populated by
    /// [`crate::writer::serialize`].
    pub cached_bytes: Option<Vec<u8>>,
}

impl Message {
    pub fn is_request(&self) -> bool {
        matches!(self.start_line, StartLine::Request { .. })
    }

    pub fn is_response(&self) -> bool {
        matches!(self.start_line, StartLine::Response { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.start_line, StartLine::Invalid(_))
    }

    pub fn method(&self) -> Option<Method> {
        match &self.start_line {
            StartLine::Request { method, .. } => Some(*method),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.start_line {
            StartLine::Response { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self.status_code(), Some(code) if (100..200).contains(&code))
    }

    pub fn is_final_response(&self) -> bool {
        matches!(self.status_code(), Some(code) if code >= 200)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status_code(), Some(code) if (200..300).contains(&code))
    }

    pub fn request_uri(&self) -> Option<&str> {
        match &self.start_line {
            StartLine::Request { request_uri, .. } => Some(request_uri),
            _ => None,
        }
    }
}
