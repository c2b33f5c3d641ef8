//! The session/dialog state machine: classification of fresh inbound
//! requests, the inbound and outbound INVITE flows, hold, CANCEL/BYE,
//! and the dialog timer set (no-18x, no-answer, max-call-duration,
//! in-dialog probing, session-drop-delay).

pub mod engine;
pub mod error;
pub mod session;
pub mod state;
pub mod timers;

pub use engine::{
    accept_invite_offer, begin_bye, begin_cancel, begin_dialog_modification, begin_inbound_invite, build_bye_request,
    build_bye_response, build_cancel_for_session, build_cancel_request, build_invite_decline, build_outbound_invite, build_probe,
    build_rejection_response, can_bye, can_cancel, cached_invite_request, classify_inbound, classify_session_mode,
    end_dialog_modification, finalize_bye, finalize_cancel, q850, record_probe_result, request_hold, validate_invite_preconditions,
    accept_inbound_bye, AcceptedOffer, InboundClassification, InviteOutcome, RejectReason,
};
pub use error::{DialogError, Result};
pub use session::{AnswerDecision, Session, SessionMode};
pub use state::SessionState;
pub use timers::{DialogTimer, DialogTimers, SessionTimer, IN_DIALOG_PROBING_SEC, MAX_CALL_DURATION_SEC, SESSION_DROP_DELAY_SEC};
