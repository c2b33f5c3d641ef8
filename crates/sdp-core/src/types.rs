use ue_codec_core::AudioCodec;

/// Media direction attribute, `a=sendrecv` et al. Also used, unqualified,
/// as the four-valued lattice [`crate::negotiate::negotiate_direction`]
/// operates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl Direction {
    pub const fn attribute_name(self) -> &'static str {
        match self {
            Direction::SendRecv => "sendrecv",
            Direction::SendOnly => "sendonly",
            Direction::RecvOnly => "recvonly",
            Direction::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sendrecv" => Some(Direction::SendRecv),
            "sendonly" => Some(Direction::SendOnly),
            "recvonly" => Some(Direction::RecvOnly),
            "inactive" => Some(Direction::Inactive),
            _ => None,
        }
    }

    /// True for the directions under which a session is considered "on
    /// hold" per spec.md §4.5 hold detection.
    pub const fn is_holding(self) -> bool {
        matches!(self, Direction::SendOnly | Direction::Inactive)
    }
}

/// `c=IN IP4 <addr>` connection data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
}

impl Connection {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    /// An address is "zeroed" (the RFC 3264 hold convention) when it is
    /// empty or the literal `0.0.0.0`.
    pub fn is_zeroed(&self) -> bool {
        self.address.is_empty() || self.address == "0.0.0.0"
    }
}

/// `o=` origin line; session-id/version are bumped on renegotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub address: String,
}

/// One `m=audio ...` media section plus its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescription {
    pub media_type: String,
    pub port: u16,
    pub protocol: String,
    pub payload_types: Vec<u8>,
    pub connection: Option<Connection>,
    pub direction: Option<Direction>,
    pub ptime: Option<u32>,
    pub rtpmap: Vec<(u8, String, u32)>,
    pub fmtp: Vec<(u8, String)>,
    pub telephone_event_pt: Option<u8>,
}

impl MediaDescription {
    pub fn new_audio(port: u16) -> Self {
        Self {
            media_type: "audio".to_string(),
            port,
            protocol: "RTP/AVP".to_string(),
            payload_types: Vec::new(),
            connection: None,
            direction: None,
            ptime: None,
            rtpmap: Vec::new(),
            fmtp: Vec::new(),
            telephone_event_pt: None,
        }
    }

    /// The codec implied by the first payload type this media line offers,
    /// if it is one we support.
    pub fn first_supported_codec(&self) -> Option<AudioCodec> {
        self.payload_types
            .iter()
            .find_map(|&pt| AudioCodec::from_payload_type(pt))
    }

    pub fn is_rtp_avp(&self) -> bool {
        self.protocol.eq_ignore_ascii_case("RTP/AVP")
    }
}

/// A full `v=/o=/s=/c=/t=/m=...` SDP session description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub origin: Origin,
    pub session_name: String,
    pub connection: Option<Connection>,
    pub direction: Option<Direction>,
    pub media: Vec<MediaDescription>,
}

impl SessionDescription {
    /// Effective connection address: first non-empty media-level `c=`,
    /// else the session-level `c=`. Per spec.md §4.5.
    pub fn effective_connection<'a>(&'a self, media: &'a MediaDescription) -> Option<&'a Connection> {
        media.connection.as_ref().or(self.connection.as_ref())
    }

    /// Effective direction: media-level attribute, then session-level,
    /// then the RFC 4566 default of `sendrecv`.
    pub fn effective_direction(&self, media: &MediaDescription) -> Direction {
        media.direction.or(self.direction).unwrap_or_default()
    }

    /// Effective ptime: media-level attribute, then session-level default
    /// of 20ms (the only value this client accepts).
    pub fn effective_ptime(&self, media: &MediaDescription) -> u32 {
        media.ptime.unwrap_or(20)
    }

    /// True when media `m=audio` sections are present and the first one's
    /// effective direction/connection indicates a held call, per
    /// spec.md §4.5's hold detection rule.
    pub fn is_holding(&self, media: &MediaDescription) -> bool {
        self.effective_direction(media).is_holding()
            || self
                .effective_connection(media)
                .map(Connection::is_zeroed)
                .unwrap_or(true)
    }

    pub fn first_audio_media(&self) -> Option<&MediaDescription> {
        self.media.iter().find(|m| m.media_type == "audio")
    }
}
