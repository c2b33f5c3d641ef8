//! Per-request transaction matching, retransmission timers, and the
//! PRACK/RSeq bookkeeping spec.md §4.2 describes. Built on top of
//! `ue-sip-core` messages; the dialog/session state machine that owns
//! these transactions lives in `ue-dialog-core`.

pub mod error;
pub mod key;
pub mod manager;
pub mod timer;
pub mod transaction;

pub use error::{Result, TransactionError};
pub use key::{Direction, TransactionKey};
pub use manager::{RSeqAllocator, TransactionManager};
pub use timer::{CancelAuxTimer, RetransmitTimer, TimerEvent, CANCEL_AUX_TIMER, RETX_MAX, T1};
pub use transaction::Transaction;
