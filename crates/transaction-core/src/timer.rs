use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::key::TransactionKey;

pub const T1: Duration = Duration::from_millis(500);
pub const RETX_MAX: u32 = 5;
pub const CANCEL_AUX_TIMER: Duration = Duration::from_millis(500 * 20);

/// What the retransmission timer tells its owner on each expiry.
#[derive(Debug, Clone)]
pub enum TimerEvent {
    /// Resend the cached request/response; retx-count has not hit RETX_MAX.
    Retransmit { key: TransactionKey, attempt: u32 },
    /// RETX_MAX was reached; the session should be escalated to failure.
    Escalate { key: TransactionKey },
}

/// A single retransmission timer: doubles its delay on every expiry,
/// starting at `T1`, and escalates once `RETX_MAX` retransmits have fired
/// with no response. Cancelled when a matching response arrives.
pub struct RetransmitTimer {
    cancel: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl RetransmitTimer {
    /// Arm a timer for `key`, sending `TimerEvent`s on `events` until it is
    /// cancelled or escalates.
    pub fn arm(key: TransactionKey, events: mpsc::Sender<TimerEvent>) -> Self {
        let cancel = Arc::new(Notify::new());
        let cancel_for_task = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut delay = T1;
            for attempt in 1..=RETX_MAX {
                tokio::select! {
                    _ = cancel_for_task.notified() => {
                        trace!(?key, "retransmit timer cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                debug!(?key, attempt, ?delay, "retransmit timer expired");
                if events.send(TimerEvent::Retransmit { key: key.clone(), attempt }).await.is_err() {
                    return;
                }
                delay *= 2;
            }
            let _ = events.send(TimerEvent::Escalate { key }).await;
        });

        Self { cancel, handle }
    }

    /// Stop the timer; safe to call even if it already fired or finished.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

impl Drop for RetransmitTimer {
    fn drop(&mut self) {
        self.cancel.notify_one();
        self.handle.abort();
    }
}

/// A standalone timer for the CANCEL auxiliary wait (spec.md §4.2): armed
/// when a CANCEL is finalized, firing once after `20 * T1` unless the
/// linked INVITE finalizes first.
pub struct CancelAuxTimer {
    cancel: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl CancelAuxTimer {
    pub fn arm(key: TransactionKey, events: mpsc::Sender<TimerEvent>) -> Self {
        let cancel = Arc::new(Notify::new());
        let cancel_for_task = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel_for_task.notified() => {}
                _ = tokio::time::sleep(CANCEL_AUX_TIMER) => {
                    let _ = events.send(TimerEvent::Escalate { key }).await;
                }
            }
        });

        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

impl Drop for CancelAuxTimer {
    fn drop(&mut self) {
        self.cancel.notify_one();
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Direction;
    use ue_sip_core::Method;

    fn sample_key() -> TransactionKey {
        TransactionKey::new("call-1", Direction::Outbound, Method::Invite, "branch-1", 1)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_retransmit_then_escalates() {
        let (tx, mut rx) = mpsc::channel(16);
        let timer = RetransmitTimer::arm(sample_key(), tx);

        for expected_attempt in 1..=RETX_MAX {
            tokio::time::advance(Duration::from_secs(60)).await;
            match rx.recv().await.unwrap() {
                TimerEvent::Retransmit { attempt, .. } => assert_eq!(attempt, expected_attempt),
                TimerEvent::Escalate { .. } => panic!("escalated too early"),
            }
        }
        tokio::time::advance(Duration::from_secs(1)).await;
        match rx.recv().await.unwrap() {
            TimerEvent::Escalate { .. } => {}
            other => panic!("expected escalation, got {other:?}"),
        }
        drop(timer);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_events() {
        let (tx, mut rx) = mpsc::channel(16);
        let timer = RetransmitTimer::arm(sample_key(), tx);
        timer.cancel();
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }
}
