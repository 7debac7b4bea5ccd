use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

/// One-shot side effects (toasts, navigation) waiting to be consumed.
///
/// Each pushed effect is handed out exactly once, either by [`drain`] or by
/// [`recv`]. Nothing is replayed to a consumer that shows up later.
///
/// [`drain`]: EffectQueue::drain
/// [`recv`]: EffectQueue::recv
pub struct EffectQueue<E> {
    pending: Mutex<VecDeque<E>>,
    notify: Notify,
}

impl<E> Default for EffectQueue<E> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }
}

impl<E> EffectQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, effect: E) {
        self.lock().push_back(effect);
        self.notify.notify_one();
    }

    /// Take every pending effect, oldest first.
    pub fn drain(&self) -> Vec<E> {
        self.lock().drain(..).collect()
    }

    /// Wait for the next effect.
    pub async fn recv(&self) -> E {
        loop {
            if let Some(effect) = self.lock().pop_front() {
                return effect;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<E>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
