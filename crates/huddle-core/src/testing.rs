//! In-memory fakes for the auth endpoint and the call service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};

use crate::auth::{AuthApi, AuthData};
use crate::backend::{Call, CallFilter, CallService, CallServiceFactory, SortOrder, sort_calls};
use crate::call::{CallId, CallSummary};
use crate::errors::HuddleError;
use crate::events::{
    ConnectionState, EventEmitter, HuddleEvent, HuddleEventListener, ListenerId,
};
use crate::session_store::Identity;

pub struct FakeAuth {
    requests: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<HuddleError>>,
    delay: Duration,
    issued: AtomicUsize,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay,
            issued: AtomicUsize::new(0),
        })
    }

    pub fn fail_with(&self, error: HuddleError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn auth_data(&self, environment: &str, user_id: &str) -> Result<AuthData, HuddleError> {
        self.requests
            .lock()
            .unwrap()
            .push((environment.to_string(), user_id.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AuthData {
            user_id: user_id.to_string(),
            token: format!("token-{n}"),
            api_key: "fake-key".to_string(),
        })
    }
}

pub struct FakeCall {
    cid: CallId,
    created_by: String,
    emitter: EventEmitter,
    joins: AtomicUsize,
    creates: AtomicUsize,
    gets: AtomicUsize,
    leaves: AtomicUsize,
    join_failure: Mutex<Option<HuddleError>>,
    get_failure: Mutex<Option<HuddleError>>,
    create_failure: Mutex<Option<HuddleError>>,
    join_gate: Mutex<Option<Arc<Notify>>>,
    get_gate: Mutex<Option<Arc<Notify>>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
    reactions: Mutex<Vec<(String, String)>>,
    microphone: AtomicBool,
    camera: AtomicBool,
    connection: watch::Sender<ConnectionState>,
}

impl FakeCall {
    fn new(cid: CallId, created_by: &str, emitter: EventEmitter) -> Self {
        let (connection, _) = watch::channel(ConnectionState::Connecting);
        Self {
            cid,
            created_by: created_by.to_string(),
            emitter,
            joins: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            leaves: AtomicUsize::new(0),
            join_failure: Mutex::new(None),
            get_failure: Mutex::new(None),
            create_failure: Mutex::new(None),
            join_gate: Mutex::new(None),
            get_gate: Mutex::new(None),
            create_gate: Mutex::new(None),
            reactions: Mutex::new(Vec::new()),
            microphone: AtomicBool::new(true),
            camera: AtomicBool::new(false),
            connection,
        }
    }

    pub fn fail_join(&self, error: HuddleError) {
        *self.join_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_get(&self, error: HuddleError) {
        *self.get_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_create(&self, error: HuddleError) {
        *self.create_failure.lock().unwrap() = Some(error);
    }

    /// Make `join` wait until the returned gate is notified.
    pub fn hold_join(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.join_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Make `get` wait until the returned gate is notified.
    pub fn hold_get(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.get_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_connection(&self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    pub fn join_count(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn leave_count(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }

    pub fn reactions(&self) -> Vec<(String, String)> {
        self.reactions.lock().unwrap().clone()
    }

    fn summary(&self) -> CallSummary {
        CallSummary {
            cid: self.cid.clone(),
            created_by: self.created_by.clone(),
            created_at: None,
        }
    }
}

#[async_trait]
impl Call for FakeCall {
    fn cid(&self) -> &CallId {
        &self.cid
    }

    async fn get(&self) -> Result<CallSummary, HuddleError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let gate = self.get_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.get_failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(self.summary()),
        }
    }

    async fn create(&self) -> Result<CallSummary, HuddleError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.create_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.emitter.emit(HuddleEvent::CallCreated {
            cid: self.cid.clone(),
            created_by: self.created_by.clone(),
        });
        Ok(self.summary())
    }

    async fn join(&self, _create: bool) -> Result<(), HuddleError> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        let gate = self.join_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.join_failure.lock().unwrap().clone() {
            self.connection.send_replace(ConnectionState::Failed(error.to_string()));
            return Err(error);
        }
        self.connection.send_replace(ConnectionState::Connected);
        Ok(())
    }

    async fn leave(&self) {
        self.leaves.fetch_add(1, Ordering::SeqCst);
        self.connection.send_replace(ConnectionState::Disconnected);
    }

    async fn send_reaction(&self, kind: &str, emoji_code: &str) -> Result<(), HuddleError> {
        self.reactions
            .lock()
            .unwrap()
            .push((kind.to_string(), emoji_code.to_string()));
        Ok(())
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), HuddleError> {
        self.microphone.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn set_camera_enabled(&self, enabled: bool) -> Result<(), HuddleError> {
        self.camera.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn microphone_enabled(&self) -> bool {
        self.microphone.load(Ordering::SeqCst)
    }

    fn camera_enabled(&self) -> bool {
        self.camera.load(Ordering::SeqCst)
    }

    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}

pub struct FakeCallService {
    user_id: String,
    emitter: EventEmitter,
    calls: Mutex<HashMap<CallId, Arc<FakeCall>>>,
    listed: Mutex<Result<Vec<CallSummary>, HuddleError>>,
    queries: Mutex<Vec<(CallFilter, SortOrder)>>,
    query_gate: Mutex<Option<Arc<Notify>>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
    log_outs: AtomicUsize,
    token: Mutex<Option<String>>,
}

impl FakeCallService {
    pub fn new(user_id: &str) -> Arc<Self> {
        Arc::new(Self {
            user_id: user_id.to_string(),
            emitter: EventEmitter::new(),
            calls: Mutex::new(HashMap::new()),
            listed: Mutex::new(Ok(Vec::new())),
            queries: Mutex::new(Vec::new()),
            query_gate: Mutex::new(None),
            create_gate: Mutex::new(None),
            log_outs: AtomicUsize::new(0),
            token: Mutex::new(None),
        })
    }

    /// The fake behind `cid`, created on first use.
    pub fn fake_call(&self, cid: &CallId) -> Arc<FakeCall> {
        self.calls
            .lock()
            .unwrap()
            .entry(cid.clone())
            .or_insert_with(|| {
                let call = FakeCall::new(cid.clone(), &self.user_id, self.emitter.clone());
                *call.create_gate.lock().unwrap() = self.create_gate.lock().unwrap().clone();
                Arc::new(call)
            })
            .clone()
    }

    /// Make `create` wait on the returned gate for every call handed out from now on.
    pub fn hold_creates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// `create` attempts across every call.
    pub fn create_count(&self) -> usize {
        self.calls.lock().unwrap().values().map(|call| call.create_count()).sum()
    }

    pub fn set_listed(&self, result: Result<Vec<CallSummary>, HuddleError>) {
        *self.listed.lock().unwrap() = result;
    }

    /// Make `query_calls` wait until the returned gate is notified.
    pub fn hold_queries(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.query_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn queries(&self) -> Vec<(CallFilter, SortOrder)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn log_out_count(&self) -> usize {
        self.log_outs.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn emit(&self, event: HuddleEvent) {
        self.emitter.emit(event);
    }

    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }
}

#[async_trait]
impl CallService for FakeCallService {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn call(&self, cid: &CallId) -> Arc<dyn Call> {
        self.fake_call(cid)
    }

    async fn query_calls(
        &self,
        filter: CallFilter,
        sort: SortOrder,
    ) -> Result<Vec<CallSummary>, HuddleError> {
        self.queries.lock().unwrap().push((filter, sort));
        let gate = self.query_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut calls = self.listed.lock().unwrap().clone()?;
        sort_calls(&mut calls, sort);
        Ok(calls)
    }

    async fn log_out(&self) -> Result<(), HuddleError> {
        self.log_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update_token(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }

    fn add_listener(&self, listener: Arc<dyn HuddleEventListener>) -> ListenerId {
        self.emitter.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.emitter.remove_listener(id);
    }
}

/// Hands out one shared [`FakeCallService`] for every sign-in.
pub struct FakeFactory {
    pub service: Arc<FakeCallService>,
    connects: AtomicUsize,
}

impl FakeFactory {
    pub fn new(service: Arc<FakeCallService>) -> Arc<Self> {
        Arc::new(Self {
            service,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl CallServiceFactory for FakeFactory {
    fn connect(
        &self,
        _user: &Identity,
        auth: &AuthData,
    ) -> Result<Arc<dyn CallService>, HuddleError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.service.update_token(&auth.token);
        Ok(self.service.clone())
    }
}

/// A session manager wired to fakes, backed by a temp data dir.
pub struct Harness {
    _dir: tempfile::TempDir,
    pub store: Arc<crate::session_store::SessionStore>,
    pub auth: Arc<FakeAuth>,
    pub service: Arc<FakeCallService>,
    pub factory: Arc<FakeFactory>,
    pub manager: Arc<crate::session::SessionManager>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(crate::session_store::SessionStore::new(dir.path()));
        let auth = FakeAuth::new();
        let service = FakeCallService::new("demo1@gmail.com");
        let factory = FakeFactory::new(service.clone());
        let config = crate::config::ClientConfig {
            sign_out_grace_ms: 1,
            ..crate::config::ClientConfig::default()
        };
        let manager = Arc::new(crate::session::SessionManager::new(
            config,
            store.clone(),
            auth.clone(),
            factory.clone(),
        ));
        Self {
            _dir: dir,
            store,
            auth,
            service,
            factory,
            manager,
        }
    }

    /// Signed in as `demo1@gmail.com`.
    pub async fn signed_in() -> Self {
        let harness = Self::new();
        harness
            .manager
            .ensure_signed_in(Some(Identity::new("demo1@gmail.com", "Demo User 1")))
            .await
            .unwrap();
        harness
    }
}
