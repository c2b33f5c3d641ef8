use std::net::SocketAddr;

use tracing::info;

use ue_codec_core::AudioCodec;
use ue_dialog_core::{engine, AnswerDecision, Session, SessionMode, SessionState};
use ue_sdp_core::negotiate::build_sdp;
use ue_sdp_core::Direction as MediaDirection;
use ue_sip_core::Method;
use ue_transaction_core::{Direction as TxDirection, TransactionKey};

use crate::error::{ClientError, Result};
use crate::registry::UeRegistry;
use crate::ue::RegistrationStatus;

/// The de facto RFC 4733 telephone-event payload type this client offers
/// on every outbound INVITE.
const OFFERED_TELEPHONE_EVENT_PT: u8 = 101;

/// The three actions `callAction` exposes on an existing call, per
/// spec.md §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    ResumeAnswer,
    RejectRelease,
    HoldCall,
}

/// What a call-control verb produced that the caller must actually
/// transmit. `None` means the verb only changed local/session state (or,
/// for an inbound ringing call, delivered its decision through the
/// session's answer channel, which whoever is holding the matching
/// `InviteOutcome::Accepted` is awaiting to send the real final response).
#[derive(Debug, Clone)]
pub enum CallActionOutcome {
    None,
    Send(ue_sip_core::Message),
}

/// `register(imsi)`: idempotent. A UE already `Registered` or
/// `BeingRegistered` is left alone; the actual REGISTER transaction and
/// Digest challenge loop live in the transport/transaction layers this
/// crate drives.
pub fn register(registry: &UeRegistry, imsi: &str) -> Result<()> {
    registry.with_ue_mut(imsi, |ue| {
        if matches!(ue.registration_status, RegistrationStatus::Registered | RegistrationStatus::BeingRegistered) {
            info!(imsi, "register is a no-op, already registered or registering");
            return;
        }
        ue.registration_status = RegistrationStatus::BeingRegistered;
    })
}

/// `unregister(imsi)`: idempotent, mirror of [`register`].
pub fn unregister(registry: &UeRegistry, imsi: &str) -> Result<()> {
    registry.with_ue_mut(imsi, |ue| {
        if matches!(ue.registration_status, RegistrationStatus::Unregistered | RegistrationStatus::BeingUnregistered) {
            info!(imsi, "unregister is a no-op, already unregistered or unregistering");
            return;
        }
        ue.registration_status = RegistrationStatus::BeingUnregistered;
    })
}

/// `call(imsi, cdpn)`: originate an INVITE to `cdpn` (the called-party
/// number, expressed as a `sip:`/`tel:` URI by the caller). Builds the
/// SDP offer, the outbound INVITE, and registers its transaction on the
/// UE; sending the built message over the wire is the transport layer's
/// job. Returns the new Call-ID and the INVITE to send.
#[allow(clippy::too_many_arguments)]
pub fn call(
    registry: &UeRegistry,
    imsi: &str,
    cdpn: &str,
    remote_sip_addr: SocketAddr,
    call_id: impl Into<String>,
    from_tag: impl Into<String>,
    local_uri: &str,
    via_sent_by: &str,
    local_media_addr: &str,
    local_media_port: u16,
) -> Result<(String, ue_sip_core::Message)> {
    let call_id = call_id.into();
    let from_tag = from_tag.into();

    registry.with_ue_mut(imsi, |ue| {
        let mut session = Session::new_outbound(call_id.clone(), from_tag, cdpn, remote_sip_addr, SessionMode::Multimedia);
        session.local_media_port = Some(local_media_port);

        let offer = build_sdp(
            &ue.imsi,
            local_media_addr,
            session.sdp_session_id,
            session.sdp_session_version,
            local_media_port,
            AudioCodec::Pcmu,
            Some(OFFERED_TELEPHONE_EVENT_PT),
            MediaDirection::SendRecv,
        );

        let via_branch = format!("z9hG4bK-{call_id}");
        let invite = engine::build_outbound_invite(&session, local_uri, via_sent_by, &via_branch, &offer);

        let key = TransactionKey::new(session.call_id.clone(), TxDirection::Outbound, Method::Invite, via_branch, session.forward_cseq);
        let cached = {
            let mut for_cache = invite.clone();
            ue_sip_core::writer::serialize(&mut for_cache).to_vec()
        };
        ue.transactions.start(key.clone(), session.from_tag.clone(), cached);
        session.transactions.push(key);

        ue.insert_session(call_id.clone(), session);
        (call_id.clone(), invite)
    })
}

/// `callAction(imsi, call-id, action)` per spec.md §4.8. `local_uri`/
/// `via_sent_by` are this UE's own identity, needed to build any CANCEL
/// or BYE this action originates.
pub fn call_action(
    registry: &UeRegistry,
    imsi: &str,
    call_id: &str,
    action: CallAction,
    local_uri: &str,
    via_sent_by: &str,
) -> Result<CallActionOutcome> {
    registry.with_ue_mut(imsi, |ue| {
        let session = ue
            .sessions_by_call_id
            .get_mut(call_id)
            .ok_or_else(|| ClientError::UnknownSession(call_id.to_string()))?;

        match action {
            CallAction::ResumeAnswer => match session.state {
                SessionState::BeingEstablished if session.direction == TxDirection::Inbound => {
                    let delivered = session.signal_answer(AnswerDecision::Answer);
                    info!(call_id, delivered, "resume-answer signals the answer channel");
                    Ok(CallActionOutcome::None)
                }
                SessionState::Established => {
                    session.apply_local_resume();
                    Ok(CallActionOutcome::None)
                }
                other => Err(ClientError::InvalidCallAction { action: "ResumeAnswer", state: other }),
            },
            CallAction::RejectRelease => match session.state {
                SessionState::BeingEstablished if session.direction == TxDirection::Inbound => {
                    let delivered = session.signal_answer(AnswerDecision::Reject);
                    info!(call_id, delivered, "reject-release declines an inbound ringing call");
                    session.transition(SessionState::BeingRejected);
                    session.finalize_current();
                    Ok(CallActionOutcome::None)
                }
                SessionState::BeingEstablished => {
                    engine::begin_cancel(session)?;
                    let cancel = engine::build_cancel_for_session(session, &ue.transactions)?;
                    info!(call_id, "reject-release cancels an outbound ringing call");
                    Ok(CallActionOutcome::Send(cancel))
                }
                SessionState::Established => {
                    engine::begin_bye(session)?;
                    let cseq = session.next_forward_cseq();
                    let via_branch = format!("z9hG4bK-{call_id}-bye");
                    let bye = engine::build_bye_request(session, local_uri, via_sent_by, &via_branch, cseq);

                    let key = TransactionKey::new(session.call_id.clone(), TxDirection::Outbound, Method::Bye, via_branch, cseq);
                    let cached = {
                        let mut for_cache = bye.clone();
                        ue_sip_core::writer::serialize(&mut for_cache).to_vec()
                    };
                    ue.transactions.start(key.clone(), session.local_tag().to_string(), cached);
                    session.transactions.push(key);

                    info!(call_id, "reject-release sends BYE on an established call");
                    Ok(CallActionOutcome::Send(bye))
                }
                other => Err(ClientError::InvalidCallAction { action: "RejectRelease", state: other }),
            },
            CallAction::HoldCall => match session.state {
                SessionState::Established => {
                    engine::request_hold(session)?;
                    Ok(CallActionOutcome::None)
                }
                other => Err(ClientError::InvalidCallAction { action: "HoldCall", state: other }),
            },
        }
    })?
}
