use std::sync::Arc;

use crate::call::CallId;
use crate::effects::EffectQueue;
use crate::session::SessionManager;
use crate::state::StateHolder;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinUiState {
    pub is_loading: bool,
}

enum JoinAction {
    Loading(bool),
}

fn reduce(_state: &JoinUiState, action: JoinAction) -> JoinUiState {
    match action {
        JoinAction::Loading(is_loading) => JoinUiState { is_loading },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinEffect {
    ShowToast(String),
    NavigateToLobby(String),
}

/// Join-by-code screen.
pub struct JoinViewModel {
    session: Arc<SessionManager>,
    state: StateHolder<JoinUiState, JoinAction>,
    effects: EffectQueue<JoinEffect>,
}

impl JoinViewModel {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            state: StateHolder::new(JoinUiState::default(), reduce),
            effects: EffectQueue::new(),
        }
    }

    pub fn ui_state(&self) -> JoinUiState {
        self.state.current()
    }

    pub fn effects(&self) -> &EffectQueue<JoinEffect> {
        &self.effects
    }

    /// Look up the meeting behind `code` (a bare code or a link ending in one).
    pub async fn join(&self, code: &str) {
        let code = code.trim().trim_end_matches('/');
        let code = code.rsplit('/').next().unwrap_or(code);
        if code.is_empty() {
            self.effects
                .push(JoinEffect::ShowToast("Enter a meeting code".to_string()));
            return;
        }

        let _busy = self
            .state
            .busy(JoinAction::Loading(true), JoinAction::Loading(false));
        let client = match self.session.require() {
            Ok(client) => client,
            Err(e) => {
                self.effects.push(JoinEffect::ShowToast(e.to_string()));
                return;
            }
        };

        let call = client.calls().call(&CallId::default_type(code));
        match call.get().await {
            Ok(summary) => self
                .effects
                .push(JoinEffect::NavigateToLobby(summary.cid.cid())),
            Err(e) => {
                tracing::info!("no meeting for code {code}: {e}");
                self.effects.push(JoinEffect::ShowToast(e.to_string()));
            }
        }
    }
}
