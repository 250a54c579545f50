//! Delivery of [`TableEvent`]s to subscribers.

use std::sync::{Arc, OnceLock};

use crossbeam_channel::{Receiver, Sender};
use ringlock_core::TableEvent;

/// Shared, lazily created event channel.
///
/// Until somebody subscribes, emitting is a no-op. All receivers handed
/// out share one queue.
#[derive(Clone, Default)]
pub(crate) struct EventSink {
    channel: Arc<OnceLock<(Sender<TableEvent>, Receiver<TableEvent>)>>,
}

impl EventSink {
    pub fn subscribe(&self) -> Receiver<TableEvent> {
        let (_, rx) = self.channel.get_or_init(crossbeam_channel::unbounded);
        rx.clone()
    }

    pub fn emit(&self, event: TableEvent) {
        if let Some((tx, _)) = self.channel.get() {
            // Unbounded: never blocks an actor.
            let _ = tx.send(event);
        }
    }
}
