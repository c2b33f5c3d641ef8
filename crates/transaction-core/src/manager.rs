use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransactionError};
use crate::key::{Direction, TransactionKey};
use crate::timer::{RetransmitTimer, TimerEvent};
use crate::transaction::Transaction;
use ue_sip_core::Method;

/// Key for an outstanding PRACK placeholder: the RSeq allocated when an
/// inbound reliable 1xx was sent, scoped to its Call-ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PrackPlaceholderKey {
    call_id: String,
    rseq: u32,
}

/// Per-call RSeq allocator: first value random in `[1, 999]`, then
/// monotonically increasing for the lifetime of the dialog.
pub struct RSeqAllocator {
    next: AtomicU32,
}

impl RSeqAllocator {
    pub fn new() -> Self {
        let first = rand::thread_rng().gen_range(1..=999);
        Self { next: AtomicU32::new(first) }
    }

    pub fn allocate(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RSeqAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns every in-flight transaction for one UE: matching, duplicate
/// detection, retransmission timers, and PRACK/RSeq placeholders.
pub struct TransactionManager {
    transactions: DashMap<TransactionKey, Transaction>,
    prack_placeholders: DashMap<PrackPlaceholderKey, TransactionKey>,
    timer_events: mpsc::Sender<TimerEvent>,
}

impl TransactionManager {
    pub fn new(timer_events: mpsc::Sender<TimerEvent>) -> Self {
        Self {
            transactions: DashMap::new(),
            prack_placeholders: DashMap::new(),
            timer_events,
        }
    }

    /// Register a freshly sent/received request as a new transaction and
    /// arm its retransmission timer.
    pub fn start(&self, key: TransactionKey, from_tag: String, cached_request: Vec<u8>) {
        let mut txn = Transaction::new(key.clone(), from_tag, cached_request);
        txn.retransmit_timer = Some(RetransmitTimer::arm(key.clone(), self.timer_events.clone()));
        debug!(?key, "transaction started");
        self.transactions.insert(key, txn);
    }

    /// Match an inbound request to an existing transaction, per spec.md
    /// §4.2: same method, branch, CSeq; ACK matches a finalized INVITE
    /// regardless of branch equality requirements beyond Call-ID.
    pub fn match_inbound_request(
        &self,
        call_id: &str,
        method: Method,
        via_branch: &str,
        cseq: u32,
        from_tag: &str,
    ) -> Result<Option<TransactionKey>> {
        if method == Method::Ack {
            let invite_key = TransactionKey::new(call_id, Direction::Inbound, Method::Invite, via_branch, cseq);
            if let Some(entry) = self.transactions.get(&invite_key) {
                if entry.finalized {
                    return Ok(Some(invite_key));
                }
            }
            // ACK after a 2xx may carry a different branch; fall back to
            // any finalized INVITE transaction for this Call-ID/CSeq.
            for entry in self.transactions.iter() {
                let k = entry.key();
                if k.call_id == call_id && k.direction == Direction::Inbound && k.method == Method::Invite && k.cseq == cseq && entry.finalized {
                    return Ok(Some(k.clone()));
                }
            }
            return Ok(None);
        }

        let key = TransactionKey::new(call_id, Direction::Inbound, method, via_branch, cseq);
        if let Some(entry) = self.transactions.get(&key) {
            if method == Method::Invite && entry.is_duplicate_invite(from_tag, via_branch, cseq) {
                return Err(TransactionError::DuplicateRequest);
            }
            if entry.finalized {
                return Err(TransactionError::DuplicateRequest);
            }
        }
        Ok(Some(key))
    }

    /// Match an inbound response to the outbound transaction that
    /// requested it: same branch, same CSeq, method equal to CSeq method
    /// (ReINVITE is matched under `Method::ReInvite` even though the wire
    /// token was `INVITE`).
    pub fn match_inbound_response(&self, call_id: &str, method: Method, via_branch: &str, cseq: u32) -> Option<TransactionKey> {
        let key = TransactionKey::new(call_id, Direction::Outbound, method, via_branch, cseq);
        self.transactions.contains_key(&key).then_some(key)
    }

    pub fn get(&self, key: &TransactionKey) -> Option<dashmap::mapref::one::Ref<'_, TransactionKey, Transaction>> {
        self.transactions.get(key)
    }

    pub fn get_mut(&self, key: &TransactionKey) -> Option<dashmap::mapref::one::RefMut<'_, TransactionKey, Transaction>> {
        self.transactions.get_mut(key)
    }

    /// Stop the transaction's timers and drop it; called once a BYE/ACK
    /// has fully closed it out.
    pub fn remove(&self, key: &TransactionKey) {
        if let Some((_, mut txn)) = self.transactions.remove(key) {
            txn.stop_timers();
            txn.stop_cancel_aux_timer();
        }
    }

    /// Register a PRACK placeholder for an allocated RSeq, per spec.md
    /// §4.2's PRACK binding rule.
    pub fn register_prack_placeholder(&self, call_id: &str, rseq: u32, invite_key: TransactionKey) {
        self.prack_placeholders.insert(PrackPlaceholderKey { call_id: call_id.to_string(), rseq }, invite_key);
    }

    /// Bind an inbound PRACK's `RAck: <rseq> <cseq> INVITE` to its
    /// placeholder, consuming it. Returns the linked INVITE transaction
    /// key, or `UnknownRSeq` if no placeholder was registered (481
    /// semantics apply per spec.md §4.2).
    pub fn bind_prack(&self, call_id: &str, rseq: u32) -> Result<TransactionKey> {
        self.prack_placeholders
            .remove(&PrackPlaceholderKey { call_id: call_id.to_string(), rseq })
            .map(|(_, key)| key)
            .ok_or(TransactionError::UnknownRSeq(rseq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (TransactionManager, mpsc::Receiver<TimerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (TransactionManager::new(tx), rx)
    }

    #[test]
    fn duplicate_invite_is_rejected() {
        let (mgr, _rx) = manager();
        let key = TransactionKey::new("call-1", Direction::Inbound, Method::Invite, "branch-1", 1);
        mgr.start(key.clone(), "tag-1".into(), b"INVITE".to_vec());
        if let Some(mut entry) = mgr.get_mut(&key) {
            entry.finalized = true;
        }
        let result = mgr.match_inbound_request("call-1", Method::Invite, "branch-1", 1, "tag-1");
        assert!(result.is_err());
    }

    #[test]
    fn prack_binds_to_registered_rseq() {
        let (mgr, _rx) = manager();
        let invite_key = TransactionKey::new("call-1", Direction::Inbound, Method::Invite, "branch-1", 1);
        mgr.register_prack_placeholder("call-1", 42, invite_key.clone());
        let bound = mgr.bind_prack("call-1", 42).unwrap();
        assert_eq!(bound, invite_key);
        assert!(mgr.bind_prack("call-1", 42).is_err());
    }

    #[test]
    fn unknown_rseq_is_an_error() {
        let (mgr, _rx) = manager();
        assert!(mgr.bind_prack("call-1", 999).is_err());
    }

    #[test]
    fn rseq_allocator_starts_in_range_and_increments() {
        let allocator = RSeqAllocator::new();
        let first = allocator.allocate();
        assert!((1..=999).contains(&first));
        assert_eq!(allocator.allocate(), first + 1);
    }
}
