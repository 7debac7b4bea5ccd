use std::sync::Arc;

use crate::backend::Call;
use crate::call::{AcquireMode, CallEffect, CallId, CallLifecycle, CallStatus, DEFAULT_CALL_TYPE};
use crate::effects::EffectQueue;
use crate::errors::HuddleError;
use crate::events::ConnectionState;
use crate::session::SessionManager;
use crate::state::StateHolder;

/// Reaction sent by the raise-hand button.
pub const RAISE_HAND_REACTION: &str = ":raise-hand:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingUiState {
    pub cid: CallId,
    pub status: CallStatus,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
    /// Audio route preference; the platform layer applies it to its output.
    pub speakerphone_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaState {
    microphone_enabled: bool,
    camera_enabled: bool,
    speakerphone_enabled: bool,
}

enum MediaAction {
    Microphone(bool),
    Camera(bool),
    Speakerphone(bool),
}

fn reduce(state: &MediaState, action: MediaAction) -> MediaState {
    match action {
        MediaAction::Microphone(microphone_enabled) => MediaState {
            microphone_enabled,
            ..state.clone()
        },
        MediaAction::Camera(camera_enabled) => MediaState {
            camera_enabled,
            ..state.clone()
        },
        MediaAction::Speakerphone(speakerphone_enabled) => MediaState {
            speakerphone_enabled,
            ..state.clone()
        },
    }
}

pub type MeetingEffect = CallEffect;

/// In-call screen.
pub struct MeetingViewModel {
    lifecycle: CallLifecycle<MeetingEffect>,
    media: StateHolder<MediaState, MediaAction>,
    effects: Arc<EffectQueue<MeetingEffect>>,
}

impl MeetingViewModel {
    pub fn new(session: &SessionManager, cid: &str) -> Result<Self, HuddleError> {
        let cid = CallId::parse(cid)?;
        let client = session.require()?;
        let calls = client.calls();
        let existing = calls.call(&cid);
        let media = MediaState {
            microphone_enabled: existing.microphone_enabled(),
            camera_enabled: existing.camera_enabled(),
            speakerphone_enabled: true,
        };
        let effects = Arc::new(EffectQueue::new());
        Ok(Self {
            lifecycle: CallLifecycle::new(calls, cid, AcquireMode::JoinOrCreate, effects.clone()),
            media: StateHolder::new(media, reduce),
            effects,
        })
    }

    pub fn ui_state(&self) -> MeetingUiState {
        let media = self.media.current();
        MeetingUiState {
            cid: self.lifecycle.cid().clone(),
            status: self.lifecycle.status(),
            microphone_enabled: media.microphone_enabled,
            camera_enabled: media.camera_enabled,
            speakerphone_enabled: media.speakerphone_enabled,
        }
    }

    pub fn effects(&self) -> &EffectQueue<MeetingEffect> {
        &self.effects
    }

    /// The joined call. First access joins (creating it if needed).
    pub fn call(&self) -> Arc<dyn Call> {
        self.lifecycle.acquire()
    }

    pub async fn settled(&self) -> Result<(), String> {
        self.lifecycle.settled().await
    }

    /// Connection changes reported outside the backend's own channel.
    pub fn on_connection_state(&self, state: &ConnectionState) -> CallStatus {
        self.lifecycle.on_connection_state(state)
    }

    pub async fn leave(&self) {
        self.lifecycle.leave().await;
    }

    pub async fn toggle_microphone(&self) {
        let enabled = !self.media.current().microphone_enabled;
        match self.call().set_microphone_enabled(enabled).await {
            Ok(()) => self.media.dispatch(MediaAction::Microphone(enabled)),
            Err(e) => self.effects.push(CallEffect::ShowToast(e.to_string())),
        }
    }

    pub async fn toggle_camera(&self) {
        let enabled = !self.media.current().camera_enabled;
        match self.call().set_camera_enabled(enabled).await {
            Ok(()) => self.media.dispatch(MediaAction::Camera(enabled)),
            Err(e) => self.effects.push(CallEffect::ShowToast(e.to_string())),
        }
    }

    /// Flip between loudspeaker and earpiece output. Nothing is sent to the call.
    pub fn toggle_speakerphone(&self) -> bool {
        let enabled = !self.media.current().speakerphone_enabled;
        tracing::debug!("speakerphone {}", if enabled { "on" } else { "off" });
        self.media.dispatch(MediaAction::Speakerphone(enabled));
        enabled
    }

    pub async fn raise_hand(&self) {
        if let Err(e) = self
            .call()
            .send_reaction(DEFAULT_CALL_TYPE, RAISE_HAND_REACTION)
            .await
        {
            tracing::warn!("failed to send reaction: {e}");
            self.effects.push(CallEffect::ShowToast(e.to_string()));
        }
    }
}
