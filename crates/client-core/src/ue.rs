use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ue_auth_core::AuthorizationCache;
use ue_dialog_core::Session;
use ue_transaction_core::TransactionManager;

/// Registration status of a UE, tracked independently of any one
/// session's `SessionState` since REGISTER is its own dialog mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RegistrationStatus {
    #[default]
    Unregistered,
    BeingRegistered,
    Registered,
    BeingUnregistered,
}

/// One provisioned subscriber: its IMS credentials, registration state,
/// and the sessions it currently owns. Sessions are destroyed with the
/// UE, per spec.md §3.
#[derive(Serialize, Deserialize)]
pub struct UserEquipment {
    pub imsi: String,
    pub ki: String,
    pub opc: String,
    pub msisdn: String,
    pub udp_port: u16,
    pub registration_status: RegistrationStatus,
    pub expires: Option<u32>,
    pub authorization_cache: AuthorizationCache,

    #[serde(skip)]
    pub sessions_by_call_id: HashMap<String, Session>,

    /// This UE's own transaction table, covering both the transactions it
    /// starts (outbound INVITE/BYE/CANCEL/OPTIONS) and the ones it
    /// answers. No consumer currently drains `timer_events`; retransmit
    /// timers fire into a channel whose receiver was dropped at
    /// construction, the same simplification already made for every
    /// other un-driven timer in this workspace.
    #[serde(skip, default = "default_transaction_manager")]
    pub transactions: TransactionManager,
}

fn default_transaction_manager() -> TransactionManager {
    let (timer_events, _unused) = tokio::sync::mpsc::channel(32);
    TransactionManager::new(timer_events)
}

impl UserEquipment {
    pub fn new(imsi: impl Into<String>, ki: impl Into<String>, opc: impl Into<String>, msisdn: impl Into<String>, udp_port: u16) -> Self {
        Self {
            imsi: imsi.into(),
            ki: ki.into(),
            opc: opc.into(),
            msisdn: msisdn.into(),
            udp_port,
            registration_status: RegistrationStatus::default(),
            expires: None,
            authorization_cache: AuthorizationCache::default(),
            sessions_by_call_id: HashMap::new(),
            transactions: default_transaction_manager(),
        }
    }

    pub fn session(&self, call_id: &str) -> Option<&Session> {
        self.sessions_by_call_id.get(call_id)
    }

    pub fn session_mut(&mut self, call_id: &str) -> Option<&mut Session> {
        self.sessions_by_call_id.get_mut(call_id)
    }

    pub fn insert_session(&mut self, call_id: String, session: Session) {
        self.sessions_by_call_id.insert(call_id, session);
    }

    pub fn remove_session(&mut self, call_id: &str) -> Option<Session> {
        self.sessions_by_call_id.remove(call_id)
    }
}
