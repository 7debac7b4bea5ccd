use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::{Call, CallService};
use crate::effects::EffectQueue;
use crate::errors::HuddleError;
use crate::events::ConnectionState;

/// The only call type this client creates or joins.
pub const DEFAULT_CALL_TYPE: &str = "default";

/// A `(type, id)` pair identifying one meeting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId {
    pub call_type: String,
    pub id: String,
}

impl CallId {
    pub fn new(call_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            call_type: call_type.into(),
            id: id.into(),
        }
    }

    pub fn default_type(id: impl Into<String>) -> Self {
        Self::new(DEFAULT_CALL_TYPE, id)
    }

    /// Parse a `type:id` cid.
    pub fn parse(cid: &str) -> Result<Self, HuddleError> {
        match cid.split_once(':') {
            Some((call_type, id)) if !call_type.is_empty() && !id.is_empty() => {
                Ok(Self::new(call_type, id))
            }
            _ => Err(HuddleError::InvalidCode(format!("expected 'type:id', got '{cid}'"))),
        }
    }

    pub fn cid(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.call_type, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    pub cid: CallId,
    pub created_by: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    JoinOrCreate,
    CreateOnly,
}

/// Side effects the lifecycle asks its screen to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEffect {
    ShowToast(String),
    Finish,
}

/// Connection status of the in-call screen.
///
/// `Connecting → Connected → {Disconnected, Failed}`; the last two are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    Connecting,
    Connected,
    Disconnected,
    Failed(String),
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Disconnected | CallStatus::Failed(_))
    }

    /// Status after the backend reports `state`. Terminal statuses never move.
    pub fn next(&self, state: &ConnectionState) -> CallStatus {
        if self.is_terminal() {
            return self.clone();
        }
        match state {
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {
                CallStatus::Connecting
            }
            ConnectionState::Connected => CallStatus::Connected,
            ConnectionState::Disconnected => CallStatus::Disconnected,
            ConnectionState::Failed(reason) => CallStatus::Failed(reason.clone()),
        }
    }
}

struct Shared<E> {
    cid: CallId,
    mode: AcquireMode,
    effects: Arc<EffectQueue<E>>,
    outcome: watch::Sender<Option<Result<(), String>>>,
    status: Mutex<CallStatus>,
    finished: AtomicBool,
}

impl<E: From<CallEffect>> Shared<E> {
    fn toast(&self, message: String) {
        self.effects.push(E::from(CallEffect::ShowToast(message)));
    }

    /// Ask the screen to go away. Happens at most once per lifecycle.
    fn finish(&self) {
        if !self.finished.swap(true, Ordering::SeqCst) {
            self.effects.push(E::from(CallEffect::Finish));
        }
    }

    fn status(&self) -> CallStatus {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn apply(&self, state: &ConnectionState) -> CallStatus {
        let (before, after) = {
            let mut status = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let before = status.clone();
            *status = before.next(state);
            (before, status.clone())
        };
        if before.is_terminal() || before == after {
            return after;
        }
        match &after {
            CallStatus::Disconnected => {
                tracing::info!("call {} disconnected", self.cid);
                self.finish();
            }
            CallStatus::Failed(reason) => {
                tracing::warn!("call {} failed: {reason}", self.cid);
                if !self.finished.load(Ordering::SeqCst) {
                    self.toast(format!("Call connection failed ({reason})"));
                }
                self.finish();
            }
            _ => {}
        }
        after
    }
}

/// Creates or joins one call exactly once for the screen that owns it, and
/// tears it down again.
///
/// Dropping the lifecycle aborts a request that is still in flight. The remote
/// side is not told about it.
pub struct CallLifecycle<E> {
    service: Arc<dyn CallService>,
    shared: Arc<Shared<E>>,
    call: OnceLock<Arc<dyn Call>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<E> CallLifecycle<E>
where
    E: From<CallEffect> + Send + 'static,
{
    pub fn new(
        service: Arc<dyn CallService>,
        cid: CallId,
        mode: AcquireMode,
        effects: Arc<EffectQueue<E>>,
    ) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            service,
            shared: Arc::new(Shared {
                cid,
                mode,
                effects,
                outcome,
                status: Mutex::new(CallStatus::Connecting),
                finished: AtomicBool::new(false),
            }),
            call: OnceLock::new(),
            task: Mutex::new(None),
        }
    }

    pub fn cid(&self) -> &CallId {
        &self.shared.cid
    }

    /// The call handle. The first access spawns the create/join request;
    /// every later access returns the same handle and touches nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn acquire(&self) -> Arc<dyn Call> {
        self.call
            .get_or_init(|| {
                let call = self.service.call(&self.shared.cid);
                tracing::info!("acquiring call {} ({:?})", self.shared.cid, self.shared.mode);
                let handle = tokio::spawn(Self::run(self.shared.clone(), call.clone()));
                *self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
                call
            })
            .clone()
    }

    /// Wait for the create/join request to finish, acquiring the call first
    /// if nobody has yet.
    pub async fn settled(&self) -> Result<(), String> {
        self.acquire();
        let mut rx = self.shared.outcome.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Ok(())),
            Err(_) => Err("call request dropped".to_string()),
        }
    }

    pub fn status(&self) -> CallStatus {
        self.shared.status()
    }

    /// Feed a connection change from the backend.
    pub fn on_connection_state(&self, state: &ConnectionState) -> CallStatus {
        self.shared.apply(state)
    }

    /// The user left: stop a pending create/join, tell the backend, then ask
    /// the screen to finish.
    pub async fn leave(&self) {
        let task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some(handle) = task {
            handle.abort();
        }
        self.shared.outcome.send_if_modified(|outcome| {
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(Err("left before the call was ready".to_string()));
            true
        });
        if let Some(call) = self.call.get() {
            tracing::info!("leaving call {}", self.shared.cid);
            call.leave().await;
        }
        {
            let mut status = self
                .shared
                .status
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !status.is_terminal() {
                *status = CallStatus::Disconnected;
            }
        }
        self.shared.finish();
    }

    async fn run(shared: Arc<Shared<E>>, call: Arc<dyn Call>) {
        let result = match shared.mode {
            AcquireMode::JoinOrCreate => call.join(true).await,
            AcquireMode::CreateOnly => call.create().await.map(|_| ()),
        };

        if let Err(e) = &result {
            tracing::warn!("call {} request failed: {e}", shared.cid);
            let verb = match shared.mode {
                AcquireMode::JoinOrCreate => "join",
                AcquireMode::CreateOnly => "create",
            };
            shared.toast(format!("Failed to {verb} call ({e})"));
            shared.finish();
        }
        let joined = result.is_ok() && shared.mode == AcquireMode::JoinOrCreate;
        shared.outcome.send_replace(Some(result.map_err(|e| e.to_string())));

        if joined {
            Self::follow_connection(&shared, call.connection()).await;
        }
    }

    async fn follow_connection(shared: &Shared<E>, mut rx: watch::Receiver<ConnectionState>) {
        loop {
            let state = rx.borrow_and_update().clone();
            if shared.apply(&state).is_terminal() {
                break;
            }
            if rx.changed().await.is_err() {
                tracing::debug!("connection channel closed for {}", shared.cid);
                break;
            }
        }
    }
}

impl<E> Drop for CallLifecycle<E> {
    fn drop(&mut self) {
        let task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some(handle) = task {
            handle.abort();
        }
    }
}
