//! Debounced downstream change signal.
//!
//! Mutation bursts are coalesced into a single "state changed" ping: every
//! submitted event restarts a short timer, and only when the ledger has
//! been quiet for the debounce window does the generation counter bump.
//! The timer lives in one consumer task fed by a channel, so submitters never
//! juggle timers themselves.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

/// Handle to the coalescing notifier task.
///
/// Cheap to clone observers out of via [`subscribe`]; the task exits when
/// the last `ChangeNotifier` is dropped.
///
/// [`subscribe`]: ChangeNotifier::subscribe
#[derive(Debug)]
pub struct ChangeNotifier {
    events: mpsc::UnboundedSender<()>,
    generation: watch::Receiver<u64>,
}

impl ChangeNotifier {
    /// Spawns the consumer task. `debounce` is roughly one UI frame.
    #[must_use]
    pub fn spawn(debounce: Duration) -> Self {
        let (events, mut rx) = mpsc::unbounded_channel::<()>();
        let (generation_tx, generation) = watch::channel(0u64);

        tokio::spawn(async move {
            // Outer loop: wait for the first event of a burst. Inner loop:
            // every further event restarts the quiet-period timer; silence
            // for `debounce` ends the burst with exactly one bump.
            while rx.recv().await.is_some() {
                loop {
                    match tokio::time::timeout(debounce, rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => {
                            generation_tx.send_modify(|generation| *generation += 1);
                            return;
                        }
                        Err(_) => break,
                    }
                }
                generation_tx.send_modify(|generation| *generation += 1);
            }
        });

        Self { events, generation }
    }

    /// Feeds one mutation into the current burst.
    pub fn submit(&self) {
        // Send can only fail when the consumer is gone, i.e. at shutdown.
        let _ = self.events.send(());
    }

    /// A receiver whose value increments once per coalesced burst.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.clone()
    }

    /// The number of bursts notified so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}
