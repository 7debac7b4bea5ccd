use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::call::CallId;

/// Events emitted by the call backend to registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum HuddleEvent {
    ConnectionStateChanged { cid: CallId, state: ConnectionState },
    CallCreated { cid: CallId, created_by: String },
    ParticipantJoined { cid: CallId, info: ParticipantInfo },
    ParticipantLeft { cid: CallId, participant_sid: String },
    ReactionReceived { cid: CallId, sender: String, emoji_code: String },
}

/// Realtime connection state of one call, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Disconnected,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub sid: String,
    pub identity: String,
    pub name: Option<String>,
}

/// Trait for receiving events from the backend.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait HuddleEventListener: Send + Sync {
    fn on_event(&self, event: HuddleEvent);
}

/// Handle returned by [`EventEmitter::add_listener`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listeners = Vec<(ListenerId, Arc<dyn HuddleEventListener>)>;

/// Dispatches events to every registered listener.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Listeners>>,
    next_id: Arc<AtomicU64>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn HuddleEventListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push((id, listener)),
            Err(poisoned) => poisoned.into_inner().push((id, listener)),
        }
        id
    }

    /// Unregister `id`. Unknown ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.retain(|(registered, _)| *registered != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn emit(&self, event: HuddleEvent) {
        let listeners: Vec<_> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, l)| l.clone()).collect(),
            Err(poisoned) => poisoned.into_inner().iter().map(|(_, l)| l.clone()).collect(),
        };
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }
}
