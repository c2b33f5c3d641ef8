use tokio::sync::oneshot;

use ue_rtp_core::MediaPortPool;
use ue_sdp_core::negotiate::{build_sdp, validate_offer};
use ue_sdp_core::{Direction as MediaDirection, SessionDescription};
use ue_sip_core::{add_contact, build_response, Body, BodyType, Headers, Message, Method, SideFields, StartLine, Uri};
use ue_transaction_core::{Direction as TxDirection, TransactionKey, TransactionManager};

use crate::error::{DialogError, Result};
use crate::session::{AnswerDecision, Session, SessionMode};
use crate::state::SessionState;

/// Q.850 cause values this engine attaches to SIP failure responses,
/// named the way spec.md §4.4/§4.6 refers to them.
pub mod q850 {
    pub const NOT_SUPPORTED_DELAYED_OFFER: u16 = 65;
    pub const NO_RESOURCE_AVAILABLE: u16 = 47;
    pub const NO_ANSWER: u16 = 19;

    /// User-Agent token this client identifies itself as in a `Warning`
    /// header fallback.
    pub const WARNING_AGENT: &str = "ue-softphone";

    /// `Reason: Q.850;cause=<code>;text="<text>"`, per spec.md §6.
    pub fn reason_value(cause: u16, text: &str) -> String {
        format!(r#"Q.850;cause={cause};text="{text}""#)
    }

    /// `Warning: 399 <agent> "<text>"`, the fallback spec.md §6 uses when
    /// no Q.850 cause applies.
    pub fn warning_value(text: &str) -> String {
        format!(r#"399 {WARNING_AGENT} "{text}""#)
    }
}

/// What the inbound-INVITE classifier decided to do with a fresh request
/// that has no To-tag yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundClassification {
    Invite,
    Registration,
    KeepAlive,
    Messaging,
    Subscription,
    /// REFER/NOTIFY/UPDATE/PRACK/INFO/PUBLISH with no existing dialog.
    ServiceUnavailable,
    /// ACK with no matching dialog: dropped silently.
    DropSilently,
}

/// Classify a fresh inbound request with no existing dialog, per
/// spec.md §4.4.
pub fn classify_inbound(method: Method) -> InboundClassification {
    match method {
        Method::Invite => InboundClassification::Invite,
        Method::Register => InboundClassification::Registration,
        Method::Options => InboundClassification::KeepAlive,
        Method::Message => InboundClassification::Messaging,
        Method::Subscribe => InboundClassification::Subscription,
        Method::Ack => InboundClassification::DropSilently,
        Method::Refer | Method::Notify | Method::Update | Method::Prack | Method::Info | Method::Publish => {
            InboundClassification::ServiceUnavailable
        }
        Method::ReInvite | Method::Cancel | Method::Bye => InboundClassification::DropSilently,
    }
}

/// Why an inbound INVITE is rejected before any offer/answer work
/// happens, per the precondition order in spec.md §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectReason {
    pub status_code: u16,
    pub reason_phrase: &'static str,
    pub q850_cause: Option<u16>,
    pub q850_text: &'static str,
}

/// Check an inbound INVITE against spec.md §4.4's preconditions, in
/// order: Request-URI scheme, body parts all recognized, no `Require`
/// extension, `Max-Forwards` not already exhausted, an SDP offer present
/// (a delayed/absent offer is 488 with Q.850 cause 65). Returns `None`
/// when every precondition passes.
pub fn validate_invite_preconditions(request: &Message) -> Option<RejectReason> {
    let request_uri = request.request_uri().unwrap_or("");
    if Uri::parse(request_uri).is_none() {
        return Some(RejectReason {
            status_code: 416,
            reason_phrase: "Unsupported URI Scheme",
            q850_cause: None,
            q850_text: "",
        });
    }

    if !request.body.has_only_known_parts() {
        return Some(RejectReason {
            status_code: 415,
            reason_phrase: "Unsupported Media Type",
            q850_cause: None,
            q850_text: "",
        });
    }

    if request.headers.contains("Require") {
        return Some(RejectReason { status_code: 420, reason_phrase: "Bad Extension", q850_cause: None, q850_text: "" });
    }

    if request.side.max_forwards == Some(0) {
        return Some(RejectReason { status_code: 483, reason_phrase: "Too Many Hops", q850_cause: None, q850_text: "" });
    }

    if request.body.find(BodyType::Sdp).is_none() {
        return Some(RejectReason {
            status_code: 488,
            reason_phrase: "Not Acceptable Here",
            q850_cause: Some(q850::NOT_SUPPORTED_DELAYED_OFFER),
            q850_text: "delayed offer not supported",
        });
    }

    None
}

fn build_status_response(request: &Message, status_code: u16, reason_phrase: &str, q850_cause: Option<u16>, q850_text: &str) -> Message {
    let mut response = build_response(request, status_code, reason_phrase, None);
    if let Some(cause) = q850_cause {
        response.headers.set("Reason", q850::reason_value(cause, q850_text));
    }
    response
}

/// Build the failure response for a rejected inbound INVITE.
pub fn build_rejection_response(request: &Message, reason: &RejectReason) -> Message {
    build_status_response(request, reason.status_code, reason.reason_phrase, reason.q850_cause, reason.q850_text)
}

fn map_dialog_error_to_response(request: &Message, err: &DialogError) -> Message {
    match err {
        DialogError::NoCompatibleMedia | DialogError::RejectedOffer(_) => build_status_response(request, 488, "Not Acceptable Here", None, ""),
        DialogError::PortPoolExhausted(_) => {
            build_status_response(request, 488, "Not Acceptable Here", Some(q850::NO_RESOURCE_AVAILABLE), "no media resource available")
        }
        DialogError::UnknownDialog => build_status_response(request, 481, "Call/Transaction Does Not Exist", None, ""),
        DialogError::DialogueChanging => build_status_response(request, 491, "Request Pending", None, ""),
        _ => build_status_response(request, 500, "Server Internal Error", None, ""),
    }
}

/// Outcome of validating an inbound INVITE's SDP offer and reserving
/// media, before any response is sent.
pub struct AcceptedOffer {
    pub local_port: u16,
    pub answer: SessionDescription,
}

/// Steps 1-5 of spec.md §4.4's inbound INVITE flow: validate the offer,
/// reserve a media port, and build the SDP answer. Sending 100/180/200
/// and waiting on the answer-channel is the caller's job (it owns the
/// transaction and the answer signal).
pub fn accept_invite_offer(
    offer: &SessionDescription,
    port_pool: &MediaPortPool,
    bind_addr: &str,
    local_username: &str,
    session: &mut Session,
) -> Result<AcceptedOffer> {
    let (media, codec) = validate_offer(offer)?;
    let telephone_event_pt = media.telephone_event_pt;

    let (port, socket) = port_pool.reserve(bind_addr)?;
    drop(socket); // handed off to the RTP listener by the caller once bound

    let remote_direction = offer.effective_direction(media);
    let negotiated = ue_sdp_core::negotiate::negotiate_direction(MediaDirection::SendRecv, remote_direction);
    session.local_media_direction = MediaDirection::SendRecv;
    session.remote_media_direction = remote_direction;
    session.local_media_port = Some(port);

    let answer = build_sdp(
        local_username,
        bind_addr,
        session.sdp_session_id,
        session.sdp_session_version,
        port,
        codec,
        telephone_event_pt,
        negotiated,
    );

    Ok(AcceptedOffer { local_port: port, answer })
}

/// What to do with an inbound INVITE once `begin_inbound_invite` has run:
/// either the three responses this client would send (100/180/200, the
/// last withheld until an `AnswerDecision::Answer` arrives on
/// `answer_rx`), or a single rejection.
pub enum InviteOutcome {
    Accepted {
        local_port: u16,
        trying: Message,
        ringing: Message,
        ok: Message,
        answer_rx: oneshot::Receiver<AnswerDecision>,
    },
    Rejected(Message),
}

/// Drive an inbound INVITE end to end: validate preconditions, negotiate
/// media, register its transaction on `session`, and build the response
/// set. Per spec.md §4.4; the caller transmits `trying`/`ringing`
/// immediately and holds `ok` until the armed answer channel resolves.
#[allow(clippy::too_many_arguments)]
pub fn begin_inbound_invite(
    request: &Message,
    transactions: &TransactionManager,
    port_pool: &MediaPortPool,
    bind_addr: &str,
    local_username: &str,
    local_contact_uri: &str,
    to_tag: &str,
    session: &mut Session,
) -> InviteOutcome {
    if let Some(reason) = validate_invite_preconditions(request) {
        session.transition(SessionState::BeingRejected);
        session.finalize_current();
        return InviteOutcome::Rejected(build_rejection_response(request, &reason));
    }

    let offer_text = request.body.find(BodyType::Sdp).map(|part| part.as_str()).unwrap_or("");
    let offer = match ue_sdp_core::parser::parse(offer_text) {
        Ok(offer) => offer,
        Err(_) => {
            session.transition(SessionState::BeingRejected);
            session.finalize_current();
            return InviteOutcome::Rejected(build_status_response(
                request,
                488,
                "Not Acceptable Here",
                Some(q850::NOT_SUPPORTED_DELAYED_OFFER),
                "malformed offer",
            ));
        }
    };

    match accept_invite_offer(&offer, port_pool, bind_addr, local_username, session) {
        Ok(accepted) => {
            session.transition(SessionState::BeingEstablished);

            let key = TransactionKey::new(
                request.side.call_id.clone(),
                TxDirection::Inbound,
                Method::Invite,
                request.side.via_branch.clone().unwrap_or_default(),
                request.side.cseq_number.unwrap_or(0),
            );
            transactions.start(key.clone(), request.side.from_tag.clone().unwrap_or_default(), request.cached_bytes.clone().unwrap_or_default());
            session.transactions.push(key);

            let trying = build_status_response(request, 100, "Trying", None, "");

            let mut ringing = build_response(request, 180, "Ringing", Some(to_tag));
            add_contact(&mut ringing, local_contact_uri);

            let mut ok = build_response(request, 200, "OK", Some(to_tag));
            add_contact(&mut ok, local_contact_uri);
            let sdp_text = ue_sdp_core::writer::write(&accepted.answer);
            ok.body = Body::single(BodyType::Sdp, sdp_text.into_bytes());

            let answer_rx = session.arm_answer_channel();

            InviteOutcome::Accepted { local_port: accepted.local_port, trying, ringing, ok, answer_rx }
        }
        Err(err) => {
            session.transition(SessionState::BeingRejected);
            session.finalize_current();
            InviteOutcome::Rejected(map_dialog_error_to_response(request, &err))
        }
    }
}

/// Build a 486 Busy Here for a user-declined ringing inbound INVITE.
/// spec.md never assigns a code for this case; 486 is RFC 3261's own
/// default for "callee present but not interested."
pub fn build_invite_decline(request: &Message, to_tag: &str) -> Message {
    build_response(request, 486, "Busy Here", Some(to_tag))
}

/// CANCEL is only valid while the session is `BeingEstablished`
/// (spec.md §4.4).
pub fn can_cancel(session: &Session) -> bool {
    matches!(session.state, SessionState::BeingEstablished)
}

/// BYE is only valid once the session is fully `Established`.
pub fn can_bye(session: &Session) -> bool {
    matches!(session.state, SessionState::Established)
}

/// Build a CANCEL for `original_invite`, per RFC 3261 §9.1: the
/// Request-URI, top Via, From, To, and Call-ID are copied verbatim; CSeq
/// keeps the INVITE's number but changes method to CANCEL.
pub fn build_cancel_request(original_invite: &Message) -> Message {
    let request_uri = original_invite.request_uri().unwrap_or("").to_string();
    let mut headers = Headers::new();
    if let Some(via) = original_invite.headers.get_all("Via").first() {
        headers.append("Via", via.clone());
    }
    if let Some(from) = original_invite.headers.get("From") {
        headers.append("From", from.to_string());
    }
    if let Some(to) = original_invite.headers.get("To") {
        headers.append("To", to.to_string());
    }
    if let Some(call_id) = original_invite.headers.get("Call-ID") {
        headers.append("Call-ID", call_id.to_string());
    }
    if let Some(max_forwards) = original_invite.headers.get("Max-Forwards") {
        headers.append("Max-Forwards", max_forwards.to_string());
    }
    let cseq_number = original_invite.side.cseq_number.unwrap_or(0);
    headers.append("CSeq", format!("{cseq_number} CANCEL"));

    Message {
        start_line: StartLine::Request { method: Method::Cancel, request_uri },
        headers,
        body: Body::empty(),
        side: SideFields {
            call_id: original_invite.side.call_id.clone(),
            from_tag: original_invite.side.from_tag.clone(),
            to_tag: original_invite.side.to_tag.clone(),
            via_branch: original_invite.side.via_branch.clone(),
            cseq_number: Some(cseq_number),
            cseq_method: Some(Method::Cancel),
            max_forwards: original_invite.side.max_forwards,
            contact_uri: None,
            record_route_uris: Vec::new(),
        },
        cached_bytes: None,
    }
}

/// Start cancelling a ringing session: tears down its timers and moves
/// it to `BeingCancelled`. Building and sending the CANCEL itself is
/// [`build_cancel_for_session`]'s job.
pub fn begin_cancel(session: &mut Session) -> Result<()> {
    if !can_cancel(session) {
        return Err(DialogError::InvalidState(session.state));
    }
    session.timers.cancel_all();
    session.transition(SessionState::BeingCancelled);
    Ok(())
}

pub fn finalize_cancel(session: &mut Session) {
    session.finalize_current();
}

/// Reparse the cached bytes of the session's INVITE transaction in the
/// given direction, so CANCEL/decline construction can work from the
/// actual wire request rather than re-deriving it from session fields.
pub fn cached_invite_request(session: &Session, transactions: &TransactionManager, direction: TxDirection) -> Result<Message> {
    let key = session
        .transactions
        .iter()
        .find(|key| key.method == Method::Invite && key.direction == direction)
        .cloned()
        .ok_or(DialogError::NoInviteTransaction)?;
    let cached_request = {
        let txn = transactions.get(&key).ok_or(DialogError::NoInviteTransaction)?;
        txn.cached_request.clone()
    };
    let (message, _rest) = ue_sip_core::parser::parse(&cached_request)?;
    Ok(message)
}

/// Build the CANCEL for a session's own outbound INVITE transaction.
pub fn build_cancel_for_session(session: &Session, transactions: &TransactionManager) -> Result<Message> {
    let invite = cached_invite_request(session, transactions, TxDirection::Outbound)?;
    Ok(build_cancel_request(&invite))
}

fn build_in_dialog_request(session: &Session, method: Method, local_uri: &str, via_sent_by: &str, via_branch: &str, cseq: u32) -> Message {
    let request_uri = session.remote_contact_uri.clone().unwrap_or_else(|| session.remote_uri.clone());
    let mut headers = Headers::new();
    headers.append("Via", format!("SIP/2.0/UDP {via_sent_by};branch={via_branch}"));
    headers.append("From", format!("<{local_uri}>;tag={}", session.local_tag()));
    headers.append("To", format!("<{}>;tag={}", session.remote_uri, session.remote_tag()));
    headers.append("Call-ID", session.call_id.clone());
    headers.append("CSeq", format!("{cseq} {}", method.wire_token()));
    headers.append("Max-Forwards", "70");

    Message {
        start_line: StartLine::Request { method, request_uri },
        headers,
        body: Body::empty(),
        side: SideFields {
            call_id: session.call_id.clone(),
            from_tag: Some(session.local_tag().to_string()),
            to_tag: Some(session.remote_tag().to_string()),
            via_branch: Some(via_branch.to_string()),
            cseq_number: Some(cseq),
            cseq_method: Some(method),
            max_forwards: Some(70),
            contact_uri: None,
            record_route_uris: Vec::new(),
        },
        cached_bytes: None,
    }
}

pub fn build_bye_request(session: &Session, local_uri: &str, via_sent_by: &str, via_branch: &str, cseq: u32) -> Message {
    build_in_dialog_request(session, Method::Bye, local_uri, via_sent_by, via_branch, cseq)
}

pub fn build_bye_response(bye_request: &Message) -> Message {
    build_response(bye_request, 200, "OK", None)
}

/// Start clearing an established session with an outbound BYE.
pub fn begin_bye(session: &mut Session) -> Result<()> {
    if !can_bye(session) {
        return Err(DialogError::InvalidState(session.state));
    }
    session.transition(SessionState::BeingCleared);
    Ok(())
}

pub fn finalize_bye(session: &mut Session) {
    session.timers.cancel_all();
    session.finalize_current();
}

/// An inbound BYE on an established dialog always succeeds immediately,
/// per spec.md §4.4.
pub fn accept_inbound_bye(session: &mut Session) {
    session.transition(SessionState::BeingCleared);
    finalize_bye(session);
}

/// Build a fresh outbound INVITE (our own offer) for `session`, which
/// must have just been created via [`Session::new_outbound`].
pub fn build_outbound_invite(session: &Session, local_uri: &str, via_sent_by: &str, via_branch: &str, offer: &SessionDescription) -> Message {
    let mut headers = Headers::new();
    headers.append("Via", format!("SIP/2.0/UDP {via_sent_by};branch={via_branch}"));
    headers.append("From", format!("<{local_uri}>;tag={}", session.from_tag));
    headers.append("To", format!("<{}>", session.remote_uri));
    headers.append("Call-ID", session.call_id.clone());
    headers.append("CSeq", format!("{} INVITE", session.forward_cseq));
    headers.append("Max-Forwards", "70");
    headers.append("Contact", format!("<{local_uri}>"));

    let sdp_text = ue_sdp_core::writer::write(offer);

    Message {
        start_line: StartLine::Request { method: Method::Invite, request_uri: session.remote_uri.clone() },
        headers,
        body: Body::single(BodyType::Sdp, sdp_text.into_bytes()),
        side: SideFields {
            call_id: session.call_id.clone(),
            from_tag: Some(session.from_tag.clone()),
            to_tag: None,
            via_branch: Some(via_branch.to_string()),
            cseq_number: Some(session.forward_cseq),
            cseq_method: Some(Method::Invite),
            max_forwards: Some(70),
            contact_uri: None,
            record_route_uris: Vec::new(),
        },
        cached_bytes: None,
    }
}

/// Build an out-of-dialog OPTIONS probe per spec.md §4.4's probing
/// section, along with the `BeingProbed` session tracking it.
pub fn build_probe(
    call_id: impl Into<String>,
    from_tag: impl Into<String>,
    remote_uri: impl Into<String>,
    remote_addr: std::net::SocketAddr,
    local_uri: &str,
    via_sent_by: &str,
    via_branch: &str,
) -> (Session, Message) {
    let call_id = call_id.into();
    let from_tag = from_tag.into();
    let remote_uri = remote_uri.into();

    let mut session = Session::new_outbound(call_id.clone(), from_tag.clone(), remote_uri.clone(), remote_addr, SessionMode::Probe);
    session.transition(SessionState::BeingProbed);

    let mut headers = Headers::new();
    headers.append("Via", format!("SIP/2.0/UDP {via_sent_by};branch={via_branch}"));
    headers.append("From", format!("<{local_uri}>;tag={from_tag}"));
    headers.append("To", format!("<{remote_uri}>"));
    headers.append("Call-ID", call_id.clone());
    headers.append("CSeq", "1 OPTIONS");
    headers.append("Max-Forwards", "70");

    let request = Message {
        start_line: StartLine::Request { method: Method::Options, request_uri: remote_uri },
        headers,
        body: Body::empty(),
        side: SideFields {
            call_id,
            from_tag: Some(from_tag),
            to_tag: None,
            via_branch: Some(via_branch.to_string()),
            cseq_number: Some(1),
            cseq_method: Some(Method::Options),
            max_forwards: Some(70),
            contact_uri: None,
            record_route_uris: Vec::new(),
        },
        cached_bytes: None,
    };

    (session, request)
}

/// Record the outcome of a probe transaction: a reply (of any kind)
/// means the remote is alive; a timeout means it isn't. Either way the
/// probe session finalizes.
pub fn record_probe_result(session: &mut Session, ok: bool) {
    session.remote_is_alive = ok;
    if ok {
        session.finalize_current();
    } else {
        session.transition(SessionState::BeingFailed);
        session.finalize_current();
    }
}

/// A competing inbound ReINVITE/UPDATE while one is already in flight is
/// rejected with 491, per spec.md §4.4's `dialogue_changing` guard.
pub fn begin_dialog_modification(session: &mut Session) -> Result<()> {
    if session.dialogue_changing {
        return Err(DialogError::DialogueChanging);
    }
    session.dialogue_changing = true;
    Ok(())
}

pub fn end_dialog_modification(session: &mut Session) {
    session.dialogue_changing = false;
}

/// Apply a local hold request: flip direction, bump SDP version, and
/// mark a dialog modification in flight so a competing ReINVITE is
/// rejected until this one completes.
pub fn request_hold(session: &mut Session) -> Result<()> {
    begin_dialog_modification(session)?;
    session.apply_local_hold();
    Ok(())
}

pub fn classify_session_mode(method: Method) -> SessionMode {
    match method {
        Method::Invite | Method::ReInvite => SessionMode::Multimedia,
        Method::Register => SessionMode::Registration,
        Method::Options => SessionMode::KeepAlive,
        Method::Message => SessionMode::Messaging,
        Method::Subscribe => SessionMode::Subscription,
        _ => SessionMode::Multimedia,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ue_transaction_core::Direction as TxDir;

    fn addr() -> std::net::SocketAddr {
        "10.0.0.1:5060".parse().unwrap()
    }

    fn manager() -> (TransactionManager, tokio::sync::mpsc::Receiver<ue_transaction_core::TimerEvent>) {
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        (TransactionManager::new(tx), rx)
    }

    fn parse_invite(raw: &str) -> Message {
        ue_sip_core::parser::parse(raw.as_bytes()).unwrap().0
    }

    const SAMPLE_INVITE: &str = concat!(
        "INVITE sip:1234@ims.example SIP/2.0\r\n",
        "Via: SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK-1\r\n",
        "From: <sip:caller@remote>;tag=tag-remote\r\n",
        "To: <sip:1234@ims.example>\r\n",
        "Call-ID: call-1\r\n",
        "CSeq: 1 INVITE\r\n",
        "Max-Forwards: 70\r\n",
        "Contact: <sip:caller@10.0.0.2:5060>\r\n",
        "Content-Type: application/sdp\r\n",
        "Content-Length: 97\r\n",
        "\r\n",
        "v=0\r\no=- 1 1 IN IP4 10.0.0.2\r\ns=-\r\nc=IN IP4 10.0.0.2\r\nt=0 0\r\nm=audio 40000 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\n",
    );

    #[test]
    fn classifies_invite_and_register() {
        assert_eq!(classify_inbound(Method::Invite), InboundClassification::Invite);
        assert_eq!(classify_inbound(Method::Register), InboundClassification::Registration);
        assert_eq!(classify_inbound(Method::Ack), InboundClassification::DropSilently);
    }

    #[test]
    fn refer_without_dialog_is_service_unavailable() {
        assert_eq!(classify_inbound(Method::Refer), InboundClassification::ServiceUnavailable);
    }

    #[test]
    fn cancel_only_valid_while_being_established() {
        let mut session = Session::new_outbound("call-1", "tag-a", "sip:b@x", addr(), SessionMode::Multimedia);
        assert!(!can_cancel(&session));
        session.transition(SessionState::BeingEstablished);
        assert!(can_cancel(&session));
    }

    #[test]
    fn competing_modification_is_rejected() {
        let mut session = Session::new_outbound("call-1", "tag-a", "sip:b@x", addr(), SessionMode::Multimedia);
        begin_dialog_modification(&mut session).unwrap();
        assert!(begin_dialog_modification(&mut session).is_err());
        end_dialog_modification(&mut session);
        assert!(begin_dialog_modification(&mut session).is_ok());
    }

    #[test]
    fn preconditions_reject_unsupported_scheme() {
        let mut invite = parse_invite(SAMPLE_INVITE);
        invite.start_line = StartLine::Request { method: Method::Invite, request_uri: "http://example.com".into() };
        let reason = validate_invite_preconditions(&invite).unwrap();
        assert_eq!(reason.status_code, 416);
    }

    #[test]
    fn preconditions_reject_require_extension() {
        let mut invite = parse_invite(SAMPLE_INVITE);
        invite.headers.set("Require", "100rel");
        let reason = validate_invite_preconditions(&invite).unwrap();
        assert_eq!(reason.status_code, 420);
    }

    #[test]
    fn preconditions_reject_exhausted_max_forwards() {
        let mut invite = parse_invite(SAMPLE_INVITE);
        invite.side.max_forwards = Some(0);
        let reason = validate_invite_preconditions(&invite).unwrap();
        assert_eq!(reason.status_code, 483);
    }

    #[test]
    fn preconditions_reject_missing_offer_with_q850_65() {
        let mut invite = parse_invite(SAMPLE_INVITE);
        invite.body = Body::empty();
        let reason = validate_invite_preconditions(&invite).unwrap();
        assert_eq!(reason.status_code, 488);
        assert_eq!(reason.q850_cause, Some(q850::NOT_SUPPORTED_DELAYED_OFFER));
    }

    #[test]
    fn preconditions_pass_for_a_well_formed_invite() {
        let invite = parse_invite(SAMPLE_INVITE);
        assert!(validate_invite_preconditions(&invite).is_none());
    }

    #[test]
    fn rejection_response_carries_reason_header() {
        let invite = parse_invite(SAMPLE_INVITE);
        let reason = RejectReason { status_code: 488, reason_phrase: "Not Acceptable Here", q850_cause: Some(65), q850_text: "delayed offer" };
        let response = build_rejection_response(&invite, &reason);
        assert_eq!(response.status_code(), Some(488));
        assert_eq!(response.headers.get("Reason"), Some(r#"Q.850;cause=65;text="delayed offer""#));
    }

    #[test]
    fn begin_inbound_invite_accepts_and_registers_transaction() {
        let invite = parse_invite(SAMPLE_INVITE);
        let (txns, _rx) = manager();
        let pool = MediaPortPool::new(40000, 40010);
        let mut session = Session::new_inbound("call-1", "tag-remote", "tag-local", "sip:caller@remote", addr(), SessionMode::Multimedia);

        let outcome = begin_inbound_invite(&invite, &txns, &pool, "127.0.0.1", "ue", "sip:ue@127.0.0.1:40000", "tag-local", &mut session);

        match outcome {
            InviteOutcome::Accepted { trying, ringing, ok, .. } => {
                assert_eq!(trying.status_code(), Some(100));
                assert_eq!(ringing.status_code(), Some(180));
                assert_eq!(ringing.headers.get("To"), Some("<sip:1234@ims.example>;tag=tag-local"));
                assert_eq!(ok.status_code(), Some(200));
                assert!(ok.body.find(BodyType::Sdp).is_some());
            }
            InviteOutcome::Rejected(_) => panic!("expected acceptance"),
        }
        assert_eq!(session.state, SessionState::BeingEstablished);
        assert_eq!(session.transactions.len(), 1);
    }

    #[test]
    fn begin_inbound_invite_rejects_bad_preconditions_without_touching_transactions() {
        let mut invite = parse_invite(SAMPLE_INVITE);
        invite.side.max_forwards = Some(0);
        let (txns, _rx) = manager();
        let pool = MediaPortPool::new(40000, 40010);
        let mut session = Session::new_inbound("call-1", "tag-remote", "tag-local", "sip:caller@remote", addr(), SessionMode::Multimedia);

        let outcome = begin_inbound_invite(&invite, &txns, &pool, "127.0.0.1", "ue", "sip:ue@127.0.0.1:40000", "tag-local", &mut session);

        match outcome {
            InviteOutcome::Rejected(response) => assert_eq!(response.status_code(), Some(483)),
            InviteOutcome::Accepted { .. } => panic!("expected rejection"),
        }
        assert_eq!(session.state, SessionState::Rejected);
        assert!(session.transactions.is_empty());
    }

    #[test]
    fn cancel_request_copies_invite_fields_with_cancel_cseq() {
        let invite = parse_invite(SAMPLE_INVITE);
        let cancel = build_cancel_request(&invite);
        assert_eq!(cancel.start_line, StartLine::Request { method: Method::Cancel, request_uri: "sip:1234@ims.example".into() });
        assert_eq!(cancel.headers.get("Via"), invite.headers.get("Via"));
        assert_eq!(cancel.headers.get("CSeq"), Some("1 CANCEL"));
    }

    #[test]
    fn build_cancel_for_session_reparses_cached_invite() {
        let invite = parse_invite(SAMPLE_INVITE);
        let (txns, _rx) = manager();
        let key = TransactionKey::new("call-1", TxDir::Outbound, Method::Invite, "z9hG4bK-1", 1);
        txns.start(key.clone(), "tag-remote".into(), invite.cached_bytes.clone().unwrap_or_else(|| SAMPLE_INVITE.as_bytes().to_vec()));

        let mut session = Session::new_outbound("call-1", "tag-remote", "sip:1234@ims.example", addr(), SessionMode::Multimedia);
        session.transactions.push(key);
        session.transition(SessionState::BeingEstablished);

        let cancel = build_cancel_for_session(&session, &txns).unwrap();
        assert_eq!(cancel.method(), Some(Method::Cancel));
        assert_eq!(cancel.headers.get("CSeq"), Some("1 CANCEL"));
    }

    #[test]
    fn begin_and_finalize_bye_round_trip() {
        let mut session = Session::new_outbound("call-1", "tag-a", "sip:b@x", addr(), SessionMode::Multimedia);
        session.transition(SessionState::Established);
        begin_bye(&mut session).unwrap();
        assert_eq!(session.state, SessionState::BeingCleared);
        finalize_bye(&mut session);
        assert_eq!(session.state, SessionState::Cleared);
    }

    #[test]
    fn bye_response_mirrors_the_request() {
        let session = Session::new_outbound("call-1", "tag-a", "sip:b@x", addr(), SessionMode::Multimedia);
        let bye = build_bye_request(&session, "sip:ue@127.0.0.1", "127.0.0.1:5060", "z9hG4bK-bye", 2);
        let response = build_bye_response(&bye);
        assert_eq!(response.status_code(), Some(200));
        assert_eq!(response.headers.get("Call-ID"), Some("call-1"));
    }

    #[test]
    fn outbound_invite_carries_sdp_offer() {
        let session = Session::new_outbound("call-1", "tag-a", "sip:b@x", addr(), SessionMode::Multimedia);
        let offer = build_sdp("ue", "127.0.0.1", 1, 1, 40000, ue_codec_core_test_helpers::pcmu(), None, MediaDirection::SendRecv);
        let invite = build_outbound_invite(&session, "sip:ue@127.0.0.1", "127.0.0.1:5060", "z9hG4bK-1", &offer);
        assert_eq!(invite.method(), Some(Method::Invite));
        assert!(invite.body.find(BodyType::Sdp).is_some());
    }

    #[test]
    fn probe_builds_a_being_probed_session_and_an_options_request() {
        let (session, request) = build_probe("call-probe", "tag-a", "sip:b@x", addr(), "sip:ue@127.0.0.1", "127.0.0.1:5060", "z9hG4bK-probe");
        assert_eq!(session.state, SessionState::BeingProbed);
        assert_eq!(request.method(), Some(Method::Options));
    }

    #[test]
    fn probe_result_finalizes_the_session_either_way() {
        let (mut session, _) = build_probe("call-probe", "tag-a", "sip:b@x", addr(), "sip:ue@127.0.0.1", "127.0.0.1:5060", "z9hG4bK-probe");
        record_probe_result(&mut session, true);
        assert_eq!(session.state, SessionState::Probed);
        assert!(session.remote_is_alive);

        let (mut session, _) = build_probe("call-probe-2", "tag-a", "sip:b@x", addr(), "sip:ue@127.0.0.1", "127.0.0.1:5060", "z9hG4bK-probe2");
        record_probe_result(&mut session, false);
        assert_eq!(session.state, SessionState::Failed);
        assert!(!session.remote_is_alive);
    }

    mod ue_codec_core_test_helpers {
        pub fn pcmu() -> ue_codec_core::AudioCodec {
            ue_codec_core::AudioCodec::Pcmu
        }
    }
}
