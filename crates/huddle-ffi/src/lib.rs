//! UniFFI bindings for huddle-core.
//!
//! Provides a HuddleClient object that owns the session manager and one view
//! model per open screen behind a single FFI-safe interface.

use std::sync::{Arc, Mutex as StdMutex};

use huddle_core::{
    self,
    call::{CallStatus as CoreCallStatus, CallSummary as CoreCallSummary},
    events::{
        ConnectionState as CoreConnectionState, HuddleEvent as CoreHuddleEvent,
        ParticipantInfo as CoreParticipantInfo,
    },
    viewmodels::{
        AppViewModel, JoinEffect, JoinViewModel, LobbyEffect, LoginEffect,
        LoginStatus as CoreLoginStatus, LoginViewModel, MeetingEffect, MeetingListViewModel,
        MeetingLobbyViewModel, MeetingViewModel, NewMeetingEffect, NewMeetingViewModel,
    },
};

uniffi::include_scaffolding!("huddle");

// ── Android WebRTC initialization ────────────────────────────────────
//
// Must be called from Kotlin AFTER System.loadLibrary, before any call is
// joined. webrtc::InitAndroid needs a valid JNI class loader context, which
// is NOT available inside JNI_OnLoad.

#[cfg(target_os = "android")]
#[unsafe(no_mangle)]
pub extern "C" fn Java_app_huddle_HuddleApplication_nativeInitWebrtc(
    env: *mut std::ffi::c_void,
    _class: *mut std::ffi::c_void,
) {
    huddle_log("HUDDLE FFI: nativeInitWebrtc called");
    let env = match unsafe { jni::JNIEnv::from_raw(env as *mut jni::sys::JNIEnv) } {
        Ok(env) => env,
        Err(e) => {
            huddle_log(&format!("HUDDLE FFI: nativeInitWebrtc: invalid JNIEnv: {e}"));
            return;
        }
    };
    let jvm = match env.get_java_vm() {
        Ok(jvm) => jvm,
        Err(e) => {
            huddle_log(&format!("HUDDLE FFI: nativeInitWebrtc: no JavaVM: {e}"));
            return;
        }
    };

    libwebrtc::android::initialize_android(&jvm);

    // Prevent Drop from calling DestroyJavaVM
    std::mem::forget(jvm);
    huddle_log("HUDDLE FFI: WebRTC initialized successfully");
}

// ── Platform log helper ──────────────────────────────────────────────

/// Write a message to logcat on Android, syslog on iOS, stderr elsewhere.
fn huddle_log(msg: &str) {
    #[cfg(target_os = "android")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn __android_log_write(
                prio: i32,
                tag: *const std::ffi::c_char,
                text: *const std::ffi::c_char,
            ) -> i32;
        }
        let text = CString::new(msg).unwrap_or_else(|_| c"(invalid utf8)".to_owned());
        unsafe {
            __android_log_write(4 /* INFO */, c"HUDDLE_FFI".as_ptr(), text.as_ptr());
        }
    }
    #[cfg(target_os = "ios")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn syslog(priority: i32, message: *const std::ffi::c_char, ...);
        }
        let text = CString::new(msg).unwrap_or_else(|_| c"(invalid utf8)".to_owned());
        unsafe { syslog(6 /* LOG_INFO */, text.as_ptr()); }
    }
    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    eprintln!("{msg}");
}

/// Run `f`, turning a panic into an error message instead of letting it
/// unwind across the FFI boundary.
fn catch_panic<T>(what: &str, f: impl FnOnce() -> T) -> Result<T, String> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).map_err(|panic_info| {
        let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        huddle_log(&format!("HUDDLE FFI: {what}() PANIC caught: {msg}"));
        msg
    })
}

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before using HuddleClient.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("huddle_core=debug,huddle_ffi=debug")
                }),
            )
            .with_ansi(false)
            .init();
    });
}

fn generate_meeting_id() -> String {
    huddle_core::meeting_id::generate()
}

fn extract_meeting_code(input: String) -> Result<String, HuddleError> {
    huddle_core::meeting_id::extract_code(&input).map_err(HuddleError::from)
}

// ── FFI-safe type conversions ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Authenticated,
    NotAuthenticated,
}

impl From<CoreLoginStatus> for LoginStatus {
    fn from(s: CoreLoginStatus) -> Self {
        match s {
            CoreLoginStatus::Authenticated => Self::Authenticated,
            CoreLoginStatus::NotAuthenticated => Self::NotAuthenticated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn,
    AlreadySignedIn,
    InProgress,
    NoIdentity,
}

impl From<huddle_core::SignInOutcome> for SignInOutcome {
    fn from(o: huddle_core::SignInOutcome) -> Self {
        match o {
            huddle_core::SignInOutcome::SignedIn => Self::SignedIn,
            huddle_core::SignInOutcome::AlreadySignedIn => Self::AlreadySignedIn,
            huddle_core::SignInOutcome::InProgress => Self::InProgress,
            huddle_core::SignInOutcome::NoIdentity => Self::NoIdentity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<huddle_core::Identity> for Identity {
    fn from(i: huddle_core::Identity) -> Self {
        Self {
            id: i.id,
            name: i.name,
            image: i.image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub login_status: LoginStatus,
    pub route: String,
}

#[derive(Debug, Clone)]
pub struct LoginState {
    pub accounts: Vec<Identity>,
    pub selected_account: Identity,
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
pub struct CallSummary {
    pub cid: String,
    pub created_by: String,
    pub created_at_ms: Option<i64>,
}

impl From<CoreCallSummary> for CallSummary {
    fn from(c: CoreCallSummary) -> Self {
        Self {
            cid: c.cid.cid(),
            created_by: c.created_by,
            created_at_ms: c.created_at.map(|t| t.timestamp_millis()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeetingListState {
    pub is_loading: bool,
    pub calls: Vec<CallSummary>,
    pub current_user: Option<Identity>,
}

#[derive(Debug, Clone)]
pub struct JoinState {
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
pub struct NewMeetingState {
    pub is_loading: bool,
    pub show_new_meeting_dialog: bool,
    pub created_cid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LobbyState {
    pub cid: String,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    Connecting,
    Connected,
    Disconnected,
    Failed { reason: String },
}

impl From<CoreCallStatus> for CallStatus {
    fn from(s: CoreCallStatus) -> Self {
        match s {
            CoreCallStatus::Connecting => Self::Connecting,
            CoreCallStatus::Connected => Self::Connected,
            CoreCallStatus::Disconnected => Self::Disconnected,
            CoreCallStatus::Failed(reason) => Self::Failed { reason },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeetingState {
    pub cid: String,
    pub status: CallStatus,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
    pub speakerphone_enabled: bool,
}

/// One-shot instruction for the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    ShowToast { message: String },
    Finish,
    NavigateToLobby { cid: String },
    NavigateToMeeting { cid: String },
}

impl From<LoginEffect> for UiEffect {
    fn from(e: LoginEffect) -> Self {
        match e {
            LoginEffect::ShowToast(message) => Self::ShowToast { message },
        }
    }
}

impl From<JoinEffect> for UiEffect {
    fn from(e: JoinEffect) -> Self {
        match e {
            JoinEffect::ShowToast(message) => Self::ShowToast { message },
            JoinEffect::NavigateToLobby(cid) => Self::NavigateToLobby { cid },
        }
    }
}

impl From<NewMeetingEffect> for UiEffect {
    fn from(e: NewMeetingEffect) -> Self {
        match e {
            NewMeetingEffect::ShowToast(message) => Self::ShowToast { message },
        }
    }
}

impl From<LobbyEffect> for UiEffect {
    fn from(e: LobbyEffect) -> Self {
        match e {
            LobbyEffect::ShowToast(message) => Self::ShowToast { message },
            LobbyEffect::Finish => Self::Finish,
            LobbyEffect::NavigateToMeeting(cid) => Self::NavigateToMeeting { cid },
        }
    }
}

impl From<MeetingEffect> for UiEffect {
    fn from(e: MeetingEffect) -> Self {
        match e {
            MeetingEffect::ShowToast(message) => Self::ShowToast { message },
            MeetingEffect::Finish => Self::Finish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Disconnected,
    Failed { reason: String },
}

impl From<CoreConnectionState> for ConnectionState {
    fn from(s: CoreConnectionState) -> Self {
        match s {
            CoreConnectionState::Connecting => Self::Connecting,
            CoreConnectionState::Connected => Self::Connected,
            CoreConnectionState::Reconnecting { attempt } => Self::Reconnecting { attempt },
            CoreConnectionState::Disconnected => Self::Disconnected,
            CoreConnectionState::Failed(reason) => Self::Failed { reason },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantInfo {
    pub sid: String,
    pub identity: String,
    pub name: Option<String>,
}

impl From<CoreParticipantInfo> for ParticipantInfo {
    fn from(p: CoreParticipantInfo) -> Self {
        Self {
            sid: p.sid,
            identity: p.identity,
            name: p.name,
        }
    }
}

#[derive(Debug, Clone)]
pub enum HuddleEvent {
    ConnectionStateChanged { cid: String, state: ConnectionState },
    CallCreated { cid: String, created_by: String },
    ParticipantJoined { cid: String, info: ParticipantInfo },
    ParticipantLeft { cid: String, participant_sid: String },
    ReactionReceived { cid: String, sender: String, emoji_code: String },
}

impl From<CoreHuddleEvent> for HuddleEvent {
    fn from(e: CoreHuddleEvent) -> Self {
        match e {
            CoreHuddleEvent::ConnectionStateChanged { cid, state } => Self::ConnectionStateChanged {
                cid: cid.cid(),
                state: state.into(),
            },
            CoreHuddleEvent::CallCreated { cid, created_by } => Self::CallCreated {
                cid: cid.cid(),
                created_by,
            },
            CoreHuddleEvent::ParticipantJoined { cid, info } => Self::ParticipantJoined {
                cid: cid.cid(),
                info: info.into(),
            },
            CoreHuddleEvent::ParticipantLeft { cid, participant_sid } => Self::ParticipantLeft {
                cid: cid.cid(),
                participant_sid,
            },
            CoreHuddleEvent::ReactionReceived {
                cid,
                sender,
                emoji_code,
            } => Self::ReactionReceived {
                cid: cid.cid(),
                sender,
                emoji_code,
            },
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum HuddleError {
    #[error("Connection error: {msg}")]
    Connection { msg: String },
    #[error("Call error: {msg}")]
    Call { msg: String },
    #[error("Auth error: {msg}")]
    Auth { msg: String },
    #[error("HTTP error: {msg}")]
    Http { msg: String },
    #[error("Invalid meeting code: {msg}")]
    InvalidCode { msg: String },
    #[error("Not found: {msg}")]
    NotFound { msg: String },
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Storage error: {msg}")]
    Storage { msg: String },
}

impl From<huddle_core::HuddleError> for HuddleError {
    fn from(e: huddle_core::HuddleError) -> Self {
        tracing::error!("HuddleError: {e}");
        match e {
            huddle_core::HuddleError::Connection(msg) => Self::Connection { msg },
            huddle_core::HuddleError::Call(msg) => Self::Call { msg },
            huddle_core::HuddleError::Auth(msg) => Self::Auth { msg },
            huddle_core::HuddleError::Http(msg) => Self::Http { msg },
            huddle_core::HuddleError::InvalidCode(msg) => Self::InvalidCode { msg },
            huddle_core::HuddleError::NotFound(msg) => Self::NotFound { msg },
            huddle_core::HuddleError::NotSignedIn => Self::NotSignedIn,
            huddle_core::HuddleError::Storage(msg) => Self::Storage { msg },
        }
    }
}

// ── Callback interface ────────────────────────────────────────────────

pub trait HuddleEventListener: Send + Sync {
    fn on_event(&self, event: HuddleEvent);
}

// ── Bridge listener: FFI callback → core listener ─────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn HuddleEventListener>,
}

impl huddle_core::HuddleEventListener for BridgeListener {
    fn on_event(&self, event: CoreHuddleEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

// ── HuddleClient: main FFI object ─────────────────────────────────────

/// View model slot for a screen the host may open and close.
type Screen<T> = StdMutex<Option<Arc<T>>>;

fn current<T>(slot: &Screen<T>) -> Option<Arc<T>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

fn install<T>(slot: &Screen<T>, vm: Option<T>) {
    *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = vm.map(Arc::new);
}

pub struct HuddleClient {
    session: Arc<huddle_core::SessionManager>,
    app: AppViewModel,
    login: LoginViewModel,
    meeting_list: Screen<MeetingListViewModel>,
    join: Screen<JoinViewModel>,
    new_meeting: Screen<NewMeetingViewModel>,
    lobby: Screen<MeetingLobbyViewModel>,
    meeting: Screen<MeetingViewModel>,
    // Declared last so every view model drops before the runtime.
    rt: tokio::runtime::Runtime,
}

impl HuddleClient {
    pub fn new(data_dir: String) -> Result<Self, HuddleError> {
        huddle_log("HUDDLE FFI: HuddleClient::new() called");
        let rt = tokio::runtime::Runtime::new().map_err(|e| HuddleError::Connection {
            msg: format!("failed to create tokio runtime: {e}"),
        })?;

        let config = huddle_core::ClientConfig::load(&data_dir);
        let store = Arc::new(huddle_core::SessionStore::new(&data_dir));
        let auth = Arc::new(huddle_core::AuthService::new(config.auth_url.clone()));
        let factory = Arc::new(huddle_core::LiveKitFactory::new(config.clone()));
        let session = Arc::new(huddle_core::SessionManager::new(
            config,
            store.clone(),
            auth,
            factory,
        ));

        huddle_log("HUDDLE FFI: HuddleClient::new() completed");
        Ok(Self {
            app: AppViewModel::new(&store),
            login: LoginViewModel::new(session.clone()),
            session,
            meeting_list: StdMutex::new(None),
            join: StdMutex::new(None),
            new_meeting: StdMutex::new(None),
            lobby: StdMutex::new(None),
            meeting: StdMutex::new(None),
            rt,
        })
    }

    pub fn app_state(&self) -> AppState {
        let status = self.app.ui_state().login_status;
        AppState {
            login_status: status.into(),
            route: status.app_route().route(),
        }
    }

    /// Sign the persisted identity back in, if there is one.
    pub fn restore_session(&self) -> Result<SignInOutcome, HuddleError> {
        let result = catch_panic("restore_session", || {
            self.rt.block_on(self.session.ensure_signed_in(None))
        });
        match result {
            Ok(outcome) => outcome.map(SignInOutcome::from).map_err(HuddleError::from),
            Err(msg) => Err(HuddleError::Connection {
                msg: format!("panic in restore_session: {msg}"),
            }),
        }
    }

    pub fn refresh_token(&self) -> Result<(), HuddleError> {
        let result = catch_panic("refresh_token", || {
            self.rt.block_on(self.session.refresh_token())
        });
        match result {
            Ok(credential) => credential.map(|_| ()).map_err(HuddleError::from),
            Err(msg) => Err(HuddleError::Auth { msg: format!("panic in refresh_token: {msg}") }),
        }
    }

    /// Register for backend events of the signed-in session.
    pub fn add_listener(&self, listener: Box<dyn HuddleEventListener>) -> Result<(), HuddleError> {
        let client = self.session.require()?;
        let bridge = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });
        client.calls().add_listener(bridge);
        Ok(())
    }

    // ── Login ──

    pub fn login_state(&self) -> LoginState {
        let state = self.login.ui_state();
        LoginState {
            accounts: state.accounts.into_iter().map(Identity::from).collect(),
            selected_account: state.selected_account.into(),
            is_loading: state.is_loading,
        }
    }

    pub fn select_account(&self, id: String) {
        self.login.select_account(&id);
    }

    pub fn login(&self) {
        let result = catch_panic("login", || {
            self.rt.block_on(self.login.login_with_selected_account())
        });
        if result.is_err() {
            self.login
                .effects()
                .push(LoginEffect::ShowToast("Sign-in failed".to_string()));
        }
    }

    pub fn login_effects(&self) -> Vec<UiEffect> {
        self.login.effects().drain().into_iter().map(UiEffect::from).collect()
    }

    // ── Meeting list ──

    /// Open the home screen and start loading the user's meetings.
    pub fn open_meeting_list(&self) {
        let _guard = self.rt.enter();
        let vm = Arc::new(MeetingListViewModel::new(self.session.clone()));
        let loader = vm.clone();
        self.rt.spawn(async move { loader.load().await });
        *self.meeting_list.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(vm);
    }

    pub fn meeting_list_state(&self) -> Option<MeetingListState> {
        let state = current(&self.meeting_list)?.ui_state();
        Some(MeetingListState {
            is_loading: state.is_loading,
            calls: state.calls.into_iter().map(CallSummary::from).collect(),
            current_user: state.current_user.map(Identity::from),
        })
    }

    pub fn load_meetings(&self) {
        if let Some(vm) = current(&self.meeting_list) {
            self.rt.block_on(vm.load());
        }
    }

    pub fn sign_out(&self) {
        match current(&self.meeting_list) {
            Some(vm) => self.rt.block_on(vm.sign_out()),
            None => self.rt.block_on(self.session.sign_out()),
        }
    }

    pub fn close_meeting_list(&self) {
        install(&self.meeting_list, None);
    }

    // ── Join by code ──

    pub fn open_join(&self) {
        install(&self.join, Some(JoinViewModel::new(self.session.clone())));
    }

    pub fn join_state(&self) -> Option<JoinState> {
        let state = current(&self.join)?.ui_state();
        Some(JoinState { is_loading: state.is_loading })
    }

    pub fn join_meeting(&self, code: String) {
        if let Some(vm) = current(&self.join) {
            if catch_panic("join_meeting", || self.rt.block_on(vm.join(&code))).is_err() {
                vm.effects()
                    .push(JoinEffect::ShowToast("Failed to look up meeting".to_string()));
            }
        }
    }

    pub fn join_effects(&self) -> Vec<UiEffect> {
        current(&self.join)
            .map(|vm| vm.effects().drain().into_iter().map(UiEffect::from).collect())
            .unwrap_or_default()
    }

    pub fn close_join(&self) {
        install(&self.join, None);
    }

    // ── New meeting ──

    pub fn open_new_meeting(&self) {
        install(&self.new_meeting, Some(NewMeetingViewModel::new(self.session.clone())));
    }

    pub fn new_meeting_state(&self) -> Option<NewMeetingState> {
        let state = current(&self.new_meeting)?.ui_state();
        Some(NewMeetingState {
            is_loading: state.is_loading,
            show_new_meeting_dialog: state.show_new_meeting_dialog,
            created_cid: state.created_call_id.map(|cid| cid.cid()),
        })
    }

    pub fn create_new_meeting(&self) {
        if let Some(vm) = current(&self.new_meeting) {
            let result = catch_panic("create_new_meeting", || {
                self.rt.block_on(vm.create_new_meeting())
            });
            if result.is_err() {
                vm.effects()
                    .push(NewMeetingEffect::ShowToast("Failed to create meeting".to_string()));
            }
        }
    }

    pub fn dismiss_new_meeting_dialog(&self) {
        if let Some(vm) = current(&self.new_meeting) {
            vm.dismiss_new_meeting_dialog();
        }
    }

    pub fn new_meeting_effects(&self) -> Vec<UiEffect> {
        current(&self.new_meeting)
            .map(|vm| vm.effects().drain().into_iter().map(UiEffect::from).collect())
            .unwrap_or_default()
    }

    pub fn close_new_meeting(&self) {
        install(&self.new_meeting, None);
    }

    // ── Lobby ──

    /// Open the lobby for `cid` (`type:id`) and start creating the call.
    pub fn open_lobby(&self, cid: String) -> Result<(), HuddleError> {
        let vm = MeetingLobbyViewModel::new(&self.session, &cid)?;
        {
            let _guard = self.rt.enter();
            vm.call();
        }
        install(&self.lobby, Some(vm));
        Ok(())
    }

    pub fn lobby_state(&self) -> Option<LobbyState> {
        let state = current(&self.lobby)?.ui_state();
        Some(LobbyState {
            cid: state.cid.cid(),
            microphone_enabled: state.microphone_enabled,
            camera_enabled: state.camera_enabled,
        })
    }

    pub fn lobby_toggle_microphone(&self) {
        if let Some(vm) = current(&self.lobby) {
            self.rt.block_on(vm.toggle_microphone());
        }
    }

    pub fn lobby_toggle_camera(&self) {
        if let Some(vm) = current(&self.lobby) {
            self.rt.block_on(vm.toggle_camera());
        }
    }

    pub fn lobby_join_meeting(&self) {
        if let Some(vm) = current(&self.lobby) {
            vm.join_meeting();
        }
    }

    pub fn lobby_effects(&self) -> Vec<UiEffect> {
        current(&self.lobby)
            .map(|vm| vm.effects().drain().into_iter().map(UiEffect::from).collect())
            .unwrap_or_default()
    }

    pub fn close_lobby(&self) {
        install(&self.lobby, None);
    }

    // ── Meeting ──

    /// Open the in-call screen for `cid` and start joining.
    pub fn open_meeting(&self, cid: String) -> Result<(), HuddleError> {
        let vm = MeetingViewModel::new(&self.session, &cid)?;
        {
            let _guard = self.rt.enter();
            vm.call();
        }
        install(&self.meeting, Some(vm));
        Ok(())
    }

    pub fn meeting_state(&self) -> Option<MeetingState> {
        let state = current(&self.meeting)?.ui_state();
        Some(MeetingState {
            cid: state.cid.cid(),
            status: state.status.into(),
            microphone_enabled: state.microphone_enabled,
            camera_enabled: state.camera_enabled,
            speakerphone_enabled: state.speakerphone_enabled,
        })
    }

    pub fn meeting_toggle_microphone(&self) {
        if let Some(vm) = current(&self.meeting) {
            self.rt.block_on(vm.toggle_microphone());
        }
    }

    pub fn meeting_toggle_camera(&self) {
        if let Some(vm) = current(&self.meeting) {
            self.rt.block_on(vm.toggle_camera());
        }
    }

    pub fn meeting_toggle_speakerphone(&self) {
        if let Some(vm) = current(&self.meeting) {
            vm.toggle_speakerphone();
        }
    }

    pub fn raise_hand(&self) {
        if let Some(vm) = current(&self.meeting) {
            self.rt.block_on(vm.raise_hand());
        }
    }

    pub fn leave_meeting(&self) {
        if let Some(vm) = current(&self.meeting) {
            if catch_panic("leave_meeting", || self.rt.block_on(vm.leave())).is_err() {
                vm.effects().push(MeetingEffect::Finish);
            }
        }
    }

    pub fn meeting_effects(&self) -> Vec<UiEffect> {
        current(&self.meeting)
            .map(|vm| vm.effects().drain().into_iter().map(UiEffect::from).collect())
            .unwrap_or_default()
    }

    pub fn close_meeting(&self) {
        install(&self.meeting, None);
    }
}
