use tokio::sync::watch;

use crate::navigation::AppRoute;
use crate::session_store::{Identity, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Authenticated,
    NotAuthenticated,
}

impl LoginStatus {
    /// Where the navigation graph starts for this status.
    pub fn app_route(&self) -> AppRoute {
        match self {
            LoginStatus::Authenticated => AppRoute::MeetingList,
            LoginStatus::NotAuthenticated => AppRoute::Login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUiState {
    pub login_status: LoginStatus,
}

/// Routes between the signed-in and signed-out halves of the app.
pub struct AppViewModel {
    user: watch::Receiver<Option<Identity>>,
}

impl AppViewModel {
    pub fn new(store: &SessionStore) -> Self {
        Self {
            user: store.subscribe(),
        }
    }

    pub fn ui_state(&self) -> AppUiState {
        Self::state_for(self.user.borrow().as_ref())
    }

    /// Wait until the signed-in user changes and return the new state.
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<AppUiState> {
        self.user.changed().await.ok()?;
        Some(Self::state_for(self.user.borrow_and_update().as_ref()))
    }

    fn state_for(user: Option<&Identity>) -> AppUiState {
        let login_status = if user.is_some() {
            LoginStatus::Authenticated
        } else {
            LoginStatus::NotAuthenticated
        };
        AppUiState { login_status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follows_the_current_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut vm = AppViewModel::new(&store);
        assert_eq!(vm.ui_state().login_status, LoginStatus::NotAuthenticated);
        assert_eq!(vm.ui_state().login_status.app_route(), AppRoute::Login);

        store.update_user(Some(Identity::new("demo1@gmail.com", "Demo User 1"))).unwrap();
        let state = vm.changed().await.unwrap();
        assert_eq!(state.login_status, LoginStatus::Authenticated);
        assert_eq!(state.login_status.app_route(), AppRoute::MeetingList);

        store.clear().unwrap();
        assert_eq!(
            vm.changed().await.unwrap().login_status,
            LoginStatus::NotAuthenticated
        );
    }
}
