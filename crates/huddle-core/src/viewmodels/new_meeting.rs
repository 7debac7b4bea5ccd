use std::sync::Arc;

use crate::call::CallId;
use crate::effects::EffectQueue;
use crate::meeting_id;
use crate::session::SessionManager;
use crate::state::StateHolder;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMeetingUiState {
    pub is_loading: bool,
    pub show_new_meeting_dialog: bool,
    pub created_call_id: Option<CallId>,
}

enum NewMeetingAction {
    Started,
    Finished,
    Created(CallId),
    Dismissed,
}

fn reduce(state: &NewMeetingUiState, action: NewMeetingAction) -> NewMeetingUiState {
    match action {
        NewMeetingAction::Started => NewMeetingUiState {
            is_loading: true,
            show_new_meeting_dialog: true,
            ..state.clone()
        },
        NewMeetingAction::Finished => NewMeetingUiState {
            is_loading: false,
            ..state.clone()
        },
        NewMeetingAction::Created(cid) => NewMeetingUiState {
            created_call_id: Some(cid),
            ..state.clone()
        },
        NewMeetingAction::Dismissed => NewMeetingUiState {
            show_new_meeting_dialog: false,
            created_call_id: None,
            ..state.clone()
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewMeetingEffect {
    ShowToast(String),
}

pub struct NewMeetingViewModel {
    session: Arc<SessionManager>,
    state: StateHolder<NewMeetingUiState, NewMeetingAction>,
    effects: EffectQueue<NewMeetingEffect>,
}

impl NewMeetingViewModel {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            state: StateHolder::new(NewMeetingUiState::default(), reduce),
            effects: EffectQueue::new(),
        }
    }

    pub fn ui_state(&self) -> NewMeetingUiState {
        self.state.current()
    }

    pub fn effects(&self) -> &EffectQueue<NewMeetingEffect> {
        &self.effects
    }

    /// Create a meeting under a freshly generated code and show it in the dialog.
    pub async fn create_new_meeting(&self) {
        let _busy = self
            .state
            .busy(NewMeetingAction::Started, NewMeetingAction::Finished);
        let client = match self.session.require() {
            Ok(client) => client,
            Err(e) => {
                self.effects.push(NewMeetingEffect::ShowToast(e.to_string()));
                return;
            }
        };

        let cid = CallId::default_type(meeting_id::generate());
        match client.calls().call(&cid).create().await {
            Ok(_) => {
                tracing::info!("created meeting {cid}");
                self.state.dispatch(NewMeetingAction::Created(cid));
            }
            Err(e) => {
                tracing::warn!("failed to create meeting {cid}: {e}");
                self.effects.push(NewMeetingEffect::ShowToast(format!(
                    "Failed to create meeting ({e})"
                )));
            }
        }
    }

    pub fn dismiss_new_meeting_dialog(&self) {
        self.state.dispatch(NewMeetingAction::Dismissed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn creates_a_meeting_with_a_generated_code() {
        let h = Harness::signed_in().await;
        let vm = NewMeetingViewModel::new(h.manager.clone());

        vm.create_new_meeting().await;

        let state = vm.ui_state();
        assert!(!state.is_loading);
        assert!(state.show_new_meeting_dialog);
        let cid = state.created_call_id.unwrap();
        assert_eq!(cid.call_type, "default");
        assert!(meeting_id::extract_code(&cid.id).is_ok());
        assert_eq!(h.service.fake_call(&cid).create_count(), 1);
    }

    #[tokio::test]
    async fn loading_flag_spans_the_create_request() {
        let h = Harness::signed_in().await;
        let gate = h.service.hold_creates();
        let vm = Arc::new(NewMeetingViewModel::new(h.manager.clone()));

        let creator = vm.clone();
        let task = tokio::spawn(async move { creator.create_new_meeting().await });
        while h.service.create_count() == 0 {
            tokio::task::yield_now().await;
        }
        let state = vm.ui_state();
        assert!(state.is_loading);
        assert!(state.show_new_meeting_dialog);
        assert_eq!(state.created_call_id, None);

        gate.notify_one();
        task.await.unwrap();
        let state = vm.ui_state();
        assert!(!state.is_loading);
        assert!(state.created_call_id.is_some());
    }

    #[tokio::test]
    async fn dismiss_hides_dialog_and_forgets_call() {
        let h = Harness::signed_in().await;
        let vm = NewMeetingViewModel::new(h.manager.clone());
        vm.create_new_meeting().await;

        vm.dismiss_new_meeting_dialog();

        let state = vm.ui_state();
        assert!(!state.show_new_meeting_dialog);
        assert_eq!(state.created_call_id, None);
    }

    #[tokio::test]
    async fn signed_out_creation_toasts() {
        let h = Harness::new();
        let vm = NewMeetingViewModel::new(h.manager.clone());

        vm.create_new_meeting().await;

        assert!(!vm.ui_state().is_loading);
        assert_eq!(vm.effects().len(), 1);
        assert_eq!(vm.ui_state().created_call_id, None);
    }
}
