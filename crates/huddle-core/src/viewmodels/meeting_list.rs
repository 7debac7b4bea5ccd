use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{CallFilter, CallService, SortOrder};
use crate::call::CallSummary;
use crate::events::{HuddleEvent, HuddleEventListener, ListenerId};
use crate::session::SessionManager;
use crate::session_store::Identity;
use crate::state::StateHolder;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingListUiState {
    pub is_loading: bool,
    pub calls: Vec<CallSummary>,
    pub current_user: Option<Identity>,
}

enum MeetingListAction {
    Loading(bool),
    Loaded(Vec<CallSummary>),
    UserChanged(Option<Identity>),
}

fn reduce(state: &MeetingListUiState, action: MeetingListAction) -> MeetingListUiState {
    match action {
        MeetingListAction::Loading(is_loading) => MeetingListUiState {
            is_loading,
            ..state.clone()
        },
        MeetingListAction::Loaded(calls) => MeetingListUiState {
            calls,
            ..state.clone()
        },
        MeetingListAction::UserChanged(current_user) => MeetingListUiState {
            current_user,
            ..state.clone()
        },
    }
}

type ListState = StateHolder<MeetingListUiState, MeetingListAction>;

/// Forwards "call created by me" notifications to the reload task.
struct CreatedByMe {
    user_id: String,
    tx: mpsc::UnboundedSender<()>,
}

impl HuddleEventListener for CreatedByMe {
    fn on_event(&self, event: HuddleEvent) {
        if let HuddleEvent::CallCreated { created_by, .. } = event {
            if created_by == self.user_id {
                let _ = self.tx.send(());
            }
        }
    }
}

/// Home screen: the user's meetings, newest first.
///
/// Background tasks (user tracking, reload on new calls) live as long as the
/// view model and are aborted when it drops. The call listener is unregistered
/// at the same time.
pub struct MeetingListViewModel {
    session: Arc<SessionManager>,
    state: Arc<ListState>,
    tasks: Vec<JoinHandle<()>>,
    listener: Option<(Arc<dyn CallService>, ListenerId)>,
}

impl MeetingListViewModel {
    /// Must be called from within a tokio runtime.
    pub fn new(session: Arc<SessionManager>) -> Self {
        let initial = MeetingListUiState {
            current_user: session.store().user(),
            ..MeetingListUiState::default()
        };
        let state = Arc::new(StateHolder::new(initial, reduce));
        let mut tasks = Vec::new();

        let mut user_rx = session.store().subscribe();
        let user_state = state.clone();
        tasks.push(tokio::spawn(async move {
            while user_rx.changed().await.is_ok() {
                let user = user_rx.borrow_and_update().clone();
                user_state.dispatch(MeetingListAction::UserChanged(user));
            }
        }));

        let mut listener = None;
        if let Some(client) = session.current() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let calls = client.calls();
            let id = calls.add_listener(Arc::new(CreatedByMe {
                user_id: client.user_id().to_string(),
                tx,
            }));
            listener = Some((calls, id));
            let reload_session = session.clone();
            let reload_state = state.clone();
            tasks.push(tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    tracing::debug!("call created, reloading meeting list");
                    load_calls(&reload_session, &reload_state).await;
                }
            }));
        }

        Self {
            session,
            state,
            tasks,
            listener,
        }
    }

    pub fn ui_state(&self) -> MeetingListUiState {
        self.state.current()
    }

    pub async fn load(&self) {
        load_calls(&self.session, &self.state).await;
    }

    pub async fn sign_out(&self) {
        self.session.sign_out().await;
    }
}

impl Drop for MeetingListViewModel {
    fn drop(&mut self) {
        if let Some((calls, id)) = self.listener.take() {
            calls.remove_listener(id);
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn load_calls(session: &SessionManager, state: &ListState) {
    let _busy = state.busy(
        MeetingListAction::Loading(true),
        MeetingListAction::Loading(false),
    );
    let Some(user) = session.store().user() else {
        return;
    };
    let Some(client) = session.current() else {
        tracing::debug!("meeting list requested without a session");
        return;
    };

    match client
        .calls()
        .query_calls(CallFilter::CreatedBy(user.id), SortOrder::NewestFirst)
        .await
    {
        Ok(calls) => state.dispatch(MeetingListAction::Loaded(calls)),
        Err(e) => tracing::warn!("failed to load meetings: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallId;
    use crate::errors::HuddleError;
    use crate::testing::Harness;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn summary(id: &str, secs: i64) -> CallSummary {
        CallSummary {
            cid: CallId::default_type(id),
            created_by: "demo1@gmail.com".to_string(),
            created_at: Some(Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn load_queries_own_calls_newest_first() {
        let h = Harness::signed_in().await;
        h.service
            .set_listed(Ok(vec![summary("old-call-aaa", 10), summary("new-call-bbb", 20)]));
        let vm = MeetingListViewModel::new(h.manager.clone());

        vm.load().await;

        let state = vm.ui_state();
        assert!(!state.is_loading);
        assert_eq!(state.calls[0].cid.id, "new-call-bbb");
        assert_eq!(state.current_user.unwrap().id, "demo1@gmail.com");
        assert_eq!(
            h.service.queries(),
            vec![(
                CallFilter::CreatedBy("demo1@gmail.com".to_string()),
                SortOrder::NewestFirst
            )]
        );
    }

    #[tokio::test]
    async fn loading_flag_spans_the_request() {
        let h = Harness::signed_in().await;
        let gate = h.service.hold_queries();
        let vm = Arc::new(MeetingListViewModel::new(h.manager.clone()));

        let loader = vm.clone();
        let task = tokio::spawn(async move { loader.load().await });
        while h.service.queries().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(vm.ui_state().is_loading);

        gate.notify_one();
        task.await.unwrap();
        assert!(!vm.ui_state().is_loading);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_stale_list() {
        let h = Harness::signed_in().await;
        h.service.set_listed(Ok(vec![summary("abc-defg-hij", 10)]));
        let vm = MeetingListViewModel::new(h.manager.clone());
        vm.load().await;

        h.service
            .set_listed(Err(HuddleError::Http("network unreachable".to_string())));
        vm.load().await;

        let state = vm.ui_state();
        assert!(!state.is_loading);
        assert_eq!(state.calls.len(), 1);
    }

    #[tokio::test]
    async fn signed_out_load_clears_loading_without_query() {
        let h = Harness::new();
        let vm = MeetingListViewModel::new(h.manager.clone());
        vm.load().await;
        assert!(!vm.ui_state().is_loading);
        assert!(h.service.queries().is_empty());
    }

    #[tokio::test]
    async fn reloads_when_the_user_creates_a_call() {
        let h = Harness::signed_in().await;
        let vm = MeetingListViewModel::new(h.manager.clone());

        h.service.emit(HuddleEvent::CallCreated {
            cid: CallId::default_type("someone-else"),
            created_by: "demo2@gmail.com".to_string(),
        });
        h.service.emit(HuddleEvent::CallCreated {
            cid: CallId::default_type("abc-defg-hij"),
            created_by: "demo1@gmail.com".to_string(),
        });

        tokio::time::timeout(Duration::from_secs(1), async {
            while h.service.queries().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(h.service.queries().len(), 1);
        drop(vm);
    }

    #[tokio::test]
    async fn sign_out_clears_current_user() {
        let h = Harness::signed_in().await;
        let vm = MeetingListViewModel::new(h.manager.clone());

        vm.sign_out().await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while vm.ui_state().current_user.is_some() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(h.manager.current().is_none());
    }

    #[tokio::test]
    async fn dropping_the_view_model_unregisters_its_listener() {
        let h = Harness::signed_in().await;
        let first = MeetingListViewModel::new(h.manager.clone());
        assert_eq!(h.service.listener_count(), 1);

        drop(first);
        assert_eq!(h.service.listener_count(), 0);

        let second = MeetingListViewModel::new(h.manager.clone());
        let third = MeetingListViewModel::new(h.manager.clone());
        assert_eq!(h.service.listener_count(), 2);
        drop(second);
        drop(third);
        assert_eq!(h.service.listener_count(), 0);
    }
}
