use std::net::SocketAddr;

use tokio::sync::oneshot;

use ue_sdp_core::Direction as MediaDirection;
use ue_transaction_core::{Direction as TxDirection, TransactionKey};

use crate::state::SessionState;
use crate::timers::DialogTimers;

/// What kind of dialog this session represents, decided at creation time
/// per spec.md §4.4's inbound classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Multimedia,
    Registration,
    KeepAlive,
    Messaging,
    Subscription,
    Probe,
}

/// Outcome handed back through a session's answer channel once the user
/// (or an application-level timeout) decides an inbound ringing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerDecision {
    Answer,
    Reject,
}

/// One SIP dialog: the Call-ID/tag identity, transaction sequencing, the
/// negotiated media, and the timer set that governs its lifecycle.
/// Mirrors spec.md §3's Session (Dialog) data model.
pub struct Session {
    pub direction: TxDirection,
    pub mode: SessionMode,
    pub state: SessionState,

    pub call_id: String,
    pub from_tag: String,
    pub to_tag: Option<String>,
    pub remote_uri: String,
    pub remote_contact_uri: Option<String>,
    pub record_routes: Vec<String>,

    pub remote_sip_addr: SocketAddr,
    pub remote_contact_addr: Option<SocketAddr>,
    pub remote_media_addr: Option<SocketAddr>,
    pub local_media_port: Option<u16>,

    pub local_media_direction: MediaDirection,
    pub remote_media_direction: MediaDirection,

    pub forward_cseq: u32,
    pub backward_cseq: u32,
    pub rseq_counter: u32,
    pub sdp_session_id: u64,
    pub sdp_session_version: u64,

    /// Guards ReINVITE/UPDATE concurrency: only one dialog-modifying
    /// exchange may be in flight at a time (spec.md §4.4).
    pub dialogue_changing: bool,

    pub timers: DialogTimers,
    pub is_disposed: bool,

    /// Transactions belonging to this dialog, in creation order. The
    /// INVITE transaction (inbound or outbound) is always `transactions[0]`
    /// for the lifetime of the call; CANCEL/BYE/in-dialog OPTIONS
    /// transactions are appended as they're started.
    pub transactions: Vec<TransactionKey>,

    /// Set by the most recent probe (out-of-dialog OPTIONS) result;
    /// irrelevant outside `SessionMode::Probe`.
    pub remote_is_alive: bool,

    /// Armed while a ringing inbound INVITE awaits an application
    /// decision; `signal_answer` consumes it exactly once.
    answer_tx: Option<oneshot::Sender<AnswerDecision>>,
}

impl Session {
    pub fn new_outbound(call_id: impl Into<String>, from_tag: impl Into<String>, remote_uri: impl Into<String>, remote_sip_addr: SocketAddr, mode: SessionMode) -> Self {
        Self {
            direction: TxDirection::Outbound,
            mode,
            state: SessionState::NotSet,
            call_id: call_id.into(),
            from_tag: from_tag.into(),
            to_tag: None,
            remote_uri: remote_uri.into(),
            remote_contact_uri: None,
            record_routes: Vec::new(),
            remote_sip_addr,
            remote_contact_addr: None,
            remote_media_addr: None,
            local_media_port: None,
            local_media_direction: MediaDirection::SendRecv,
            remote_media_direction: MediaDirection::SendRecv,
            forward_cseq: 1,
            backward_cseq: 0,
            rseq_counter: 0,
            sdp_session_id: 1,
            sdp_session_version: 1,
            dialogue_changing: false,
            timers: DialogTimers::default(),
            is_disposed: false,
            transactions: Vec::new(),
            remote_is_alive: false,
            answer_tx: None,
        }
    }

    pub fn new_inbound(call_id: impl Into<String>, from_tag: impl Into<String>, to_tag: impl Into<String>, remote_uri: impl Into<String>, remote_sip_addr: SocketAddr, mode: SessionMode) -> Self {
        let mut session = Self::new_outbound(call_id, from_tag, remote_uri, remote_sip_addr, mode);
        session.direction = TxDirection::Inbound;
        session.to_tag = Some(to_tag.into());
        session
    }

    /// A dialog is established once a To-tag exists, per spec.md §3.
    pub fn is_established_dialog(&self) -> bool {
        self.to_tag.as_deref().is_some_and(|tag| !tag.is_empty())
    }

    pub fn transition(&mut self, new_state: SessionState) {
        tracing::debug!(call_id = %self.call_id, from = ?self.state, to = ?new_state, "session state transition");
        self.state = new_state;
    }

    pub fn finalize_current(&mut self) {
        let finalized = self.state.finalize();
        self.transition(finalized);
    }

    /// Flip local direction to `sendonly`, bumping the SDP session
    /// version so a subsequent offer is recognized as changed.
    pub fn apply_local_hold(&mut self) {
        self.local_media_direction = MediaDirection::SendOnly;
        self.sdp_session_version += 1;
    }

    pub fn apply_local_resume(&mut self) {
        self.local_media_direction = MediaDirection::SendRecv;
        self.sdp_session_version += 1;
    }

    /// Whether the RTP sender should pause, per spec.md §4.4's hold rule:
    /// pause whenever the negotiated *remote* direction is holding.
    pub fn remote_is_holding(&self) -> bool {
        self.remote_media_direction.is_holding()
    }

    pub fn next_forward_cseq(&mut self) -> u32 {
        self.forward_cseq += 1;
        self.forward_cseq
    }

    /// This UE's own tag for in-dialog requests: `from_tag` when the
    /// dialog was established by an outbound request, `to_tag` when it
    /// was established by answering an inbound one (RFC 3261 §12).
    pub fn local_tag(&self) -> &str {
        match self.direction {
            TxDirection::Outbound => &self.from_tag,
            TxDirection::Inbound => self.to_tag.as_deref().unwrap_or(""),
        }
    }

    /// The remote party's tag, the mirror of `local_tag`.
    pub fn remote_tag(&self) -> &str {
        match self.direction {
            TxDirection::Outbound => self.to_tag.as_deref().unwrap_or(""),
            TxDirection::Inbound => &self.from_tag,
        }
    }

    /// Arm the answer channel for a ringing inbound INVITE, returning the
    /// receiving half for the caller to await. Replaces any previously
    /// armed (and un-signaled) channel.
    pub fn arm_answer_channel(&mut self) -> oneshot::Receiver<AnswerDecision> {
        let (tx, rx) = oneshot::channel();
        self.answer_tx = Some(tx);
        rx
    }

    /// Deliver a decision to whoever is awaiting this session's answer
    /// channel. Returns `false` if no channel was armed or the receiver
    /// was already dropped.
    pub fn signal_answer(&mut self, decision: AnswerDecision) -> bool {
        self.answer_tx.take().map(|tx| tx.send(decision).is_ok()).unwrap_or(false)
    }
}
