use crate::header::Headers;

/// Fixed multipart boundary token this client always uses, per
/// spec.md §6.
pub const MULTIPART_BOUNDARY: &str = "unique-boundary-1";

/// The recognized body content types, per the table in spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    Sdp,
    Dtmf,
    DtmfRelay,
    SipFragment,
    SimpleMsgSummary,
    PlainText,
    AppJson,
    MultipartMixed,
    MultipartAlternative,
    MultipartRelated,
    MultipartFormData,
    Isup,
    Qsig,
    PidfXml,
    MscpXml,
    MediaServerControlXml,
    ResourceListXml,
    VndEtsiPstnXml,
    VndOrangeInData,
    AnyXml,
    Unknown,
}

impl BodyType {
    /// Map a `Content-Type` value (ignoring any `;boundary=...` params)
    /// to a [`BodyType`], per the table in spec.md §6. Anything ending in
    /// `+xml` that isn't one of the named XML types falls back to
    /// [`BodyType::AnyXml`]; anything else unknown falls back to
    /// [`BodyType::Unknown`] (the part is still attached with raw bytes).
    pub fn from_content_type(content_type: &str) -> Self {
        let base = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match base.as_str() {
            "application/sdp" => BodyType::Sdp,
            "application/dtmf" => BodyType::Dtmf,
            "application/dtmf-relay" => BodyType::DtmfRelay,
            "message/sipfrag" => BodyType::SipFragment,
            "application/simple-message-summary" => BodyType::SimpleMsgSummary,
            "text/plain" => BodyType::PlainText,
            "application/json" => BodyType::AppJson,
            "multipart/mixed" => BodyType::MultipartMixed,
            "multipart/alternative" => BodyType::MultipartAlternative,
            "multipart/related" => BodyType::MultipartRelated,
            "multipart/form-data" => BodyType::MultipartFormData,
            "application/isup" => BodyType::Isup,
            "application/qsig" => BodyType::Qsig,
            "application/pidf+xml" => BodyType::PidfXml,
            "application/mscp+xml" => BodyType::MscpXml,
            "application/mediaservercontrol+xml" => BodyType::MediaServerControlXml,
            "application/resource-lists+xml" => BodyType::ResourceListXml,
            "application/vnd.etsi.pstn+xml" => BodyType::VndEtsiPstnXml,
            "application/vnd.orange.indata" => BodyType::VndOrangeInData,
            other if other.ends_with("+xml") => BodyType::AnyXml,
            _ => BodyType::Unknown,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            BodyType::Sdp => "application/sdp",
            BodyType::Dtmf => "application/dtmf",
            BodyType::DtmfRelay => "application/dtmf-relay",
            BodyType::SipFragment => "message/sipfrag",
            BodyType::SimpleMsgSummary => "application/simple-message-summary",
            BodyType::PlainText => "text/plain",
            BodyType::AppJson => "application/json",
            BodyType::MultipartMixed => "multipart/mixed",
            BodyType::MultipartAlternative => "multipart/alternative",
            BodyType::MultipartRelated => "multipart/related",
            BodyType::MultipartFormData => "multipart/form-data",
            BodyType::Isup => "application/isup",
            BodyType::Qsig => "application/qsig",
            BodyType::PidfXml => "application/pidf+xml",
            BodyType::MscpXml => "application/mscp+xml",
            BodyType::MediaServerControlXml => "application/mediaservercontrol+xml",
            BodyType::ResourceListXml => "application/resource-lists+xml",
            BodyType::VndEtsiPstnXml => "application/vnd.etsi.pstn+xml",
            BodyType::VndOrangeInData => "application/vnd.orange.indata",
            BodyType::AnyXml => "application/unknown+xml",
            BodyType::Unknown => "application/octet-stream",
        }
    }

    pub const fn is_multipart(self) -> bool {
        matches!(
            self,
            BodyType::MultipartMixed
                | BodyType::MultipartAlternative
                | BodyType::MultipartRelated
                | BodyType::MultipartFormData
        )
    }
}

/// One part of a (possibly multipart) body: its own header block (for a
/// multipart segment, the per-segment `Content-Type` etc.) plus raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPart {
    pub headers: Headers,
    pub bytes: Vec<u8>,
}

impl ContentPart {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { headers: Headers::new(), bytes }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }
}

/// A message body: zero, one, or many `(BodyType, ContentPart)` entries.
/// Flat bodies carry exactly one part; `multipart/*` bodies carry many,
/// segmented on the fixed [`MULTIPART_BOUNDARY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    pub parts: Vec<(BodyType, ContentPart)>,
}

impl Body {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(body_type: BodyType, bytes: Vec<u8>) -> Self {
        Self { parts: vec![(body_type, ContentPart::new(bytes))] }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_multipart(&self) -> bool {
        self.parts.len() > 1
    }

    pub fn first(&self) -> Option<&(BodyType, ContentPart)> {
        self.parts.first()
    }

    pub fn find(&self, body_type: BodyType) -> Option<&ContentPart> {
        self.parts.iter().find(|(t, _)| *t == body_type).map(|(_, p)| p)
    }

    pub fn has_only_known_parts(&self) -> bool {
        self.parts.iter().all(|(t, _)| *t != BodyType::Unknown)
    }
}
