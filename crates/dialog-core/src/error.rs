use thiserror::Error;

pub type Result<T> = std::result::Result<T, DialogError>;

#[derive(Error, Debug)]
pub enum DialogError {
    #[error("request carries a To-tag but no matching dialog exists")]
    UnknownDialog,

    #[error("competing dialog modification in progress")]
    DialogueChanging,

    #[error("no compatible media offered")]
    NoCompatibleMedia,

    #[error("SDP offer rejected: {0}")]
    RejectedOffer(#[from] ue_sdp_core::SdpError),

    #[error("media port pool exhausted")]
    PortPoolExhausted(#[from] ue_rtp_core::RtpError),

    #[error("operation invalid in current state {0:?}")]
    InvalidState(crate::state::SessionState),

    #[error("no INVITE transaction found for this dialog")]
    NoInviteTransaction,

    #[error("could not reparse cached request: {0}")]
    CachedRequestUnparsable(#[from] ue_sip_core::SipError),
}
