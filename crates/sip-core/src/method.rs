use std::fmt;

/// SIP request methods this client originates or accepts.
///
/// `ReInvite` is the Open Question resolution from spec.md §9: the source
/// system registers a re-INVITE under the same wire token as `INVITE`,
/// distinguished only by an existing `To`-tag. We keep that as an
/// internal-only discriminator - [`Method::wire_token`] collapses it back
/// to `"INVITE"` and the parser never produces it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Invite,
    ReInvite,
    Ack,
    Cancel,
    Bye,
    Options,
    Register,
    Prack,
    Update,
    Info,
    Subscribe,
    Notify,
    Message,
    Publish,
    Refer,
}

impl Method {
    /// The token as it appears (or would appear) in a start line.
    pub const fn wire_token(self) -> &'static str {
        match self {
            Method::Invite | Method::ReInvite => "INVITE",
            Method::Ack => "ACK",
            Method::Cancel => "CANCEL",
            Method::Bye => "BYE",
            Method::Options => "OPTIONS",
            Method::Register => "REGISTER",
            Method::Prack => "PRACK",
            Method::Update => "UPDATE",
            Method::Info => "INFO",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Message => "MESSAGE",
            Method::Publish => "PUBLISH",
            Method::Refer => "REFER",
        }
    }

    /// Parse a request-line method token. Always yields `Invite`, never
    /// `ReInvite` - re-INVITE-ness is a property of the dialog state the
    /// message arrives into, not of the token itself.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "INVITE" => Some(Method::Invite),
            "ACK" => Some(Method::Ack),
            "CANCEL" => Some(Method::Cancel),
            "BYE" => Some(Method::Bye),
            "OPTIONS" => Some(Method::Options),
            "REGISTER" => Some(Method::Register),
            "PRACK" => Some(Method::Prack),
            "UPDATE" => Some(Method::Update),
            "INFO" => Some(Method::Info),
            "SUBSCRIBE" => Some(Method::Subscribe),
            "NOTIFY" => Some(Method::Notify),
            "MESSAGE" => Some(Method::Message),
            "PUBLISH" => Some(Method::Publish),
            "REFER" => Some(Method::Refer),
            _ => None,
        }
    }

    /// Methods that are dialog-creating responders in this client: only
    /// `INVITE`. Used by classification in the dialog engine.
    pub const fn is_invite_like(self) -> bool {
        matches!(self, Method::Invite | Method::ReInvite)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_token())
    }
}
