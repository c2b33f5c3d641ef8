use std::collections::HashSet;

use crate::key::TransactionKey;
use crate::timer::{CancelAuxTimer, RetransmitTimer};

/// One request plus everything needed to detect and answer retransmits of
/// it: the cached wire bytes of the request, the final response (if any),
/// and the ACK for a 2xx/non-2xx INVITE response.
pub struct Transaction {
    pub key: TransactionKey,
    pub from_tag: String,
    pub cached_request: Vec<u8>,
    pub cached_final_response: Option<(u16, Vec<u8>)>,
    pub cached_ack: Option<Vec<u8>>,
    pub sent_provisional_codes: HashSet<u16>,
    pub finalized: bool,
    pub(crate) retransmit_timer: Option<RetransmitTimer>,
    pub(crate) cancel_aux_timer: Option<CancelAuxTimer>,
}

impl Transaction {
    pub fn new(key: TransactionKey, from_tag: impl Into<String>, cached_request: Vec<u8>) -> Self {
        Self {
            key,
            from_tag: from_tag.into(),
            cached_request,
            cached_final_response: None,
            cached_ack: None,
            sent_provisional_codes: HashSet::new(),
            finalized: false,
            retransmit_timer: None,
            cancel_aux_timer: None,
        }
    }

    /// A duplicate INVITE per spec.md §4.2: same From-tag, Via-branch,
    /// and CSeq as this transaction.
    pub fn is_duplicate_invite(&self, from_tag: &str, via_branch: &str, cseq: u32) -> bool {
        self.from_tag == from_tag && self.key.via_branch == via_branch && self.key.cseq == cseq
    }

    pub fn record_final_response(&mut self, status_code: u16, bytes: Vec<u8>) {
        self.cached_final_response = Some((status_code, bytes));
        self.finalized = true;
    }

    pub fn record_ack(&mut self, bytes: Vec<u8>) {
        self.cached_ack = Some(bytes);
    }

    pub fn stop_timers(&mut self) {
        if let Some(timer) = self.retransmit_timer.take() {
            timer.cancel();
        }
    }

    pub fn stop_cancel_aux_timer(&mut self) {
        if let Some(timer) = self.cancel_aux_timer.take() {
            timer.cancel();
        }
    }
}
