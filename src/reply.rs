use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A simulated reply whose delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDue {
    /// Id of the user message that asked for this reply.
    pub trigger_id: String,
}

/// Schedules the counterpart's delayed replies.
///
/// Every user message gets its own timer; timers are never merged. Each
/// one is keyed by the id of the message that triggered it so it can be
/// cancelled, and dropping the scheduler cancels whatever is still
/// pending. Due replies are sent over the channel returned by [`new`]; the
/// receiving side owns the timeline and does the actual append.
///
/// [`new`]: ReplyScheduler::new
pub struct ReplyScheduler {
    delay: Duration,
    runtime: Handle,
    tx: mpsc::UnboundedSender<ReplyDue>,
    pending: HashMap<String, JoinHandle<()>>,
}

impl ReplyScheduler {
    pub fn new(delay: Duration, runtime: Handle) -> (Self, mpsc::UnboundedReceiver<ReplyDue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            delay,
            runtime,
            tx,
            pending: HashMap::new(),
        };
        (scheduler, rx)
    }

    pub fn schedule(&mut self, trigger_id: &str) {
        self.pending.retain(|_, task| !task.is_finished());
        // trigger ids are unique message ids, so a live entry here is a caller bug
        debug_assert!(
            !self.pending.contains_key(trigger_id),
            "reply for {trigger_id} already pending"
        );

        let tx = self.tx.clone();
        let delay = self.delay;
        let due = ReplyDue { trigger_id: trigger_id.to_string() };
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the window is closing
            let _ = tx.send(due);
        });
        log::debug!("reply for {trigger_id} due in {}ms", delay.as_millis());
        if let Some(previous) = self.pending.insert(trigger_id.to_string(), task) {
            previous.abort();
        }
    }

    /// Forgets a reply that has been delivered.
    pub fn settle(&mut self, trigger_id: &str) {
        self.pending.remove(trigger_id);
    }

    pub fn cancel(&mut self, trigger_id: &str) -> bool {
        match self.pending.remove(trigger_id) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("cancelling {} pending replies", self.pending.len());
        }
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.values().filter(|task| !task.is_finished()).count()
    }
}

impl Drop for ReplyScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
