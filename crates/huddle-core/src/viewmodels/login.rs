use std::sync::Arc;

use crate::effects::EffectQueue;
use crate::session::SessionManager;
use crate::session_store::Identity;
use crate::state::StateHolder;

/// Accounts offered on the sign-in screen.
pub fn demo_accounts() -> Vec<Identity> {
    vec![
        Identity::new("demo1@gmail.com", "Demo User 1"),
        Identity::new("demo2@gmail.com", "Demo User 2"),
        Identity::new("demo3@gmail.com", "Demo User 3"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUiState {
    pub accounts: Vec<Identity>,
    pub selected_account: Identity,
    pub is_loading: bool,
}

impl LoginUiState {
    fn with_accounts(accounts: Vec<Identity>) -> Option<Self> {
        let selected_account = accounts.first()?.clone();
        Some(Self {
            accounts,
            selected_account,
            is_loading: false,
        })
    }
}

enum LoginAction {
    Select(String),
    Loading(bool),
}

fn reduce(state: &LoginUiState, action: LoginAction) -> LoginUiState {
    match action {
        LoginAction::Select(id) => match state.accounts.iter().find(|a| a.id == id) {
            Some(account) => LoginUiState {
                selected_account: account.clone(),
                ..state.clone()
            },
            None => state.clone(),
        },
        LoginAction::Loading(is_loading) => LoginUiState {
            is_loading,
            ..state.clone()
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEffect {
    ShowToast(String),
}

pub struct LoginViewModel {
    session: Arc<SessionManager>,
    state: StateHolder<LoginUiState, LoginAction>,
    effects: EffectQueue<LoginEffect>,
}

impl LoginViewModel {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self::with_accounts(session, demo_accounts())
    }

    /// Falls back to the demo accounts when `accounts` is empty.
    pub fn with_accounts(session: Arc<SessionManager>, accounts: Vec<Identity>) -> Self {
        let initial = LoginUiState::with_accounts(accounts)
            .or_else(|| LoginUiState::with_accounts(demo_accounts()))
            .unwrap_or_else(|| LoginUiState {
                accounts: Vec::new(),
                selected_account: Identity::new("", ""),
                is_loading: false,
            });
        Self {
            session,
            state: StateHolder::new(initial, reduce),
            effects: EffectQueue::new(),
        }
    }

    pub fn ui_state(&self) -> LoginUiState {
        self.state.current()
    }

    pub fn effects(&self) -> &EffectQueue<LoginEffect> {
        &self.effects
    }

    /// Unknown ids leave the selection unchanged.
    pub fn select_account(&self, id: &str) {
        self.state.dispatch(LoginAction::Select(id.to_string()));
    }

    pub async fn login_with_selected_account(&self) {
        let _busy = self
            .state
            .busy(LoginAction::Loading(true), LoginAction::Loading(false));
        let account = self.state.current().selected_account;
        if let Err(e) = self.session.ensure_signed_in(Some(account)).await {
            tracing::warn!("sign-in failed: {e}");
            self.effects.push(LoginEffect::ShowToast(e.to_string()));
        }
    }
}
