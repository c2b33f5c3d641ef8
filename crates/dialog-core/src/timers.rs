use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

pub const SESSION_DROP_DELAY_SEC: u64 = 4;
pub const IN_DIALOG_PROBING_SEC: u64 = 60;
pub const MAX_CALL_DURATION_SEC: u64 = 7200;

/// Which dialog timer fired; `ue-dialog-core`'s engine matches on this to
/// decide the next action (CANCEL, BYE, drop, probe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogTimer {
    No18x,
    NoAnswer,
    MaxCallDuration,
    InDialogProbing,
    SessionDropDelay,
}

/// A cancellable one-shot or periodic timer feeding a single shared
/// channel, the same cancel-via-`Notify` idiom as the transaction
/// retransmission timer.
pub struct SessionTimer {
    cancel: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SessionTimer {
    pub fn one_shot(kind: DialogTimer, delay: Duration, events: mpsc::Sender<DialogTimer>) -> Self {
        let cancel = Arc::new(Notify::new());
        let cancel_for_task = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel_for_task.notified() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = events.send(kind).await;
                }
            }
        });
        Self { cancel, handle }
    }

    /// In-dialog probing fires repeatedly until cancelled; the engine is
    /// expected to release the call if a single probe transaction times
    /// out, so this timer only ever emits the tick, not a retry count.
    pub fn periodic(kind: DialogTimer, period: Duration, events: mpsc::Sender<DialogTimer>) -> Self {
        let cancel = Arc::new(Notify::new());
        let cancel_for_task = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // first tick fires immediately; discard it
            loop {
                tokio::select! {
                    _ = cancel_for_task.notified() => return,
                    _ = ticker.tick() => {
                        if events.send(kind).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });
        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.cancel.notify_one();
        self.handle.abort();
    }
}

/// The set of timers a single session may have armed at once; unused
/// slots are `None`. Mirrors spec.md §4.4's per-dialog timer list.
#[derive(Default)]
pub struct DialogTimers {
    pub no_18x: Option<SessionTimer>,
    pub no_answer: Option<SessionTimer>,
    pub max_call_duration: Option<SessionTimer>,
    pub in_dialog_probing: Option<SessionTimer>,
    pub session_drop_delay: Option<SessionTimer>,
}

impl DialogTimers {
    pub fn cancel_all(&mut self) {
        for timer in [
            self.no_18x.take(),
            self.no_answer.take(),
            self.max_call_duration.take(),
            self.in_dialog_probing.take(),
            self.session_drop_delay.take(),
        ]
        .into_iter()
        .flatten()
        {
            timer.cancel();
        }
    }
}
