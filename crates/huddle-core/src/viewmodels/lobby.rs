use std::sync::Arc;

use crate::backend::Call;
use crate::call::{AcquireMode, CallEffect, CallId, CallLifecycle};
use crate::effects::EffectQueue;
use crate::errors::HuddleError;
use crate::session::SessionManager;
use crate::state::StateHolder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLobbyUiState {
    pub cid: CallId,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
}

enum LobbyAction {
    Microphone(bool),
    Camera(bool),
}

fn reduce(state: &MeetingLobbyUiState, action: LobbyAction) -> MeetingLobbyUiState {
    match action {
        LobbyAction::Microphone(microphone_enabled) => MeetingLobbyUiState {
            microphone_enabled,
            ..state.clone()
        },
        LobbyAction::Camera(camera_enabled) => MeetingLobbyUiState {
            camera_enabled,
            ..state.clone()
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEffect {
    ShowToast(String),
    Finish,
    NavigateToMeeting(String),
}

impl From<CallEffect> for LobbyEffect {
    fn from(effect: CallEffect) -> Self {
        match effect {
            CallEffect::ShowToast(message) => LobbyEffect::ShowToast(message),
            CallEffect::Finish => LobbyEffect::Finish,
        }
    }
}

/// Pre-join screen. Makes sure the call exists and holds the camera and
/// microphone choices for it.
pub struct MeetingLobbyViewModel {
    lifecycle: CallLifecycle<LobbyEffect>,
    state: StateHolder<MeetingLobbyUiState, LobbyAction>,
    effects: Arc<EffectQueue<LobbyEffect>>,
}

impl MeetingLobbyViewModel {
    /// `cid` is the `type:id` string carried by the lobby route.
    pub fn new(session: &SessionManager, cid: &str) -> Result<Self, HuddleError> {
        let cid = CallId::parse(cid)?;
        let client = session.require()?;
        let effects = Arc::new(EffectQueue::new());
        let initial = MeetingLobbyUiState {
            cid: cid.clone(),
            microphone_enabled: session.config().mic_enabled_on_join,
            camera_enabled: session.config().camera_enabled_on_join,
        };
        Ok(Self {
            lifecycle: CallLifecycle::new(
                client.calls(),
                cid,
                AcquireMode::CreateOnly,
                effects.clone(),
            ),
            state: StateHolder::new(initial, reduce),
            effects,
        })
    }

    pub fn ui_state(&self) -> MeetingLobbyUiState {
        self.state.current()
    }

    pub fn effects(&self) -> &EffectQueue<LobbyEffect> {
        &self.effects
    }

    /// The lobby's call. First access creates it on the backend.
    pub fn call(&self) -> Arc<dyn Call> {
        self.lifecycle.acquire()
    }

    pub async fn settled(&self) -> Result<(), String> {
        self.lifecycle.settled().await
    }

    pub async fn toggle_microphone(&self) {
        let enabled = !self.state.current().microphone_enabled;
        match self.call().set_microphone_enabled(enabled).await {
            Ok(()) => self.state.dispatch(LobbyAction::Microphone(enabled)),
            Err(e) => self.effects.push(LobbyEffect::ShowToast(e.to_string())),
        }
    }

    pub async fn toggle_camera(&self) {
        let enabled = !self.state.current().camera_enabled;
        match self.call().set_camera_enabled(enabled).await {
            Ok(()) => self.state.dispatch(LobbyAction::Camera(enabled)),
            Err(e) => self.effects.push(LobbyEffect::ShowToast(e.to_string())),
        }
    }

    pub fn join_meeting(&self) {
        self.effects
            .push(LobbyEffect::NavigateToMeeting(self.lifecycle.cid().cid()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn lobby_creates_the_call_once() {
        let h = Harness::signed_in().await;
        let vm = MeetingLobbyViewModel::new(&h.manager, "default:abc-defg-hij").unwrap();

        vm.call();
        vm.call();
        assert_eq!(vm.settled().await, Ok(()));

        let call = h.service.fake_call(&CallId::default_type("abc-defg-hij"));
        assert_eq!(call.create_count(), 1);
        assert_eq!(call.join_count(), 0);
        assert!(vm.effects().is_empty());
    }

    #[tokio::test]
    async fn failed_creation_toasts_and_finishes() {
        let h = Harness::signed_in().await;
        h.service
            .fake_call(&CallId::default_type("abc-defg-hij"))
            .fail_create(HuddleError::Http("network unreachable".to_string()));
        let vm = MeetingLobbyViewModel::new(&h.manager, "default:abc-defg-hij").unwrap();

        assert!(vm.settled().await.is_err());

        let effects = vm.effects().drain();
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            &effects[0],
            LobbyEffect::ShowToast(m) if m.contains("network unreachable")
        ));
        assert_eq!(effects[1], LobbyEffect::Finish);
    }

    #[tokio::test]
    async fn toggles_follow_the_call() {
        let h = Harness::signed_in().await;
        let vm = MeetingLobbyViewModel::new(&h.manager, "default:abc-defg-hij").unwrap();
        assert!(vm.ui_state().microphone_enabled);
        assert!(!vm.ui_state().camera_enabled);

        vm.toggle_camera().await;
        vm.toggle_microphone().await;

        let state = vm.ui_state();
        assert!(state.camera_enabled);
        assert!(!state.microphone_enabled);
        let call = h.service.fake_call(&CallId::default_type("abc-defg-hij"));
        assert!(call.camera_enabled());
        assert!(!call.microphone_enabled());
    }

    #[tokio::test]
    async fn join_meeting_navigates_with_the_cid() {
        let h = Harness::signed_in().await;
        let vm = MeetingLobbyViewModel::new(&h.manager, "default:abc-defg-hij").unwrap();

        vm.join_meeting();

        assert_eq!(
            vm.effects().drain(),
            vec![LobbyEffect::NavigateToMeeting("default:abc-defg-hij".to_string())]
        );
    }

    #[tokio::test]
    async fn rejects_bad_cid_and_missing_session() {
        let h = Harness::new();
        assert!(matches!(
            MeetingLobbyViewModel::new(&h.manager, "abc"),
            Err(HuddleError::InvalidCode(_))
        ));
        assert!(matches!(
            MeetingLobbyViewModel::new(&h.manager, "default:abc"),
            Err(HuddleError::NotSignedIn)
        ));
    }
}
