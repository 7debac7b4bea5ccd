//! Boundary to the call service.
//!
//! Everything that talks to the network for calls sits behind these traits:
//! the bundled implementation is [`crate::livekit_call`], tests use fakes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::auth::AuthData;
use crate::call::{CallId, CallSummary};
use crate::errors::HuddleError;
use crate::events::{ConnectionState, HuddleEventListener, ListenerId};
use crate::session_store::Identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFilter {
    All,
    CreatedBy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

/// One call as seen by the backend.
#[async_trait]
pub trait Call: Send + Sync {
    fn cid(&self) -> &CallId;

    /// Look the call up without creating it.
    async fn get(&self) -> Result<CallSummary, HuddleError>;

    async fn create(&self) -> Result<CallSummary, HuddleError>;

    /// Join the realtime session, creating the call first when `create` is set
    /// and it does not exist yet.
    async fn join(&self, create: bool) -> Result<(), HuddleError>;

    async fn leave(&self);

    async fn send_reaction(&self, kind: &str, emoji_code: &str) -> Result<(), HuddleError>;

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), HuddleError>;

    async fn set_camera_enabled(&self, enabled: bool) -> Result<(), HuddleError>;

    fn microphone_enabled(&self) -> bool;

    fn camera_enabled(&self) -> bool;

    fn connection(&self) -> watch::Receiver<ConnectionState>;
}

/// The authenticated connection to the call service.
#[async_trait]
pub trait CallService: Send + Sync {
    fn user_id(&self) -> &str;

    /// Handle for `cid`. Asking twice for the same live call returns the same object.
    fn call(&self, cid: &CallId) -> Arc<dyn Call>;

    async fn query_calls(
        &self,
        filter: CallFilter,
        sort: SortOrder,
    ) -> Result<Vec<CallSummary>, HuddleError>;

    async fn log_out(&self) -> Result<(), HuddleError>;

    fn update_token(&self, token: &str);

    fn add_listener(&self, listener: Arc<dyn HuddleEventListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Builds a [`CallService`] for a freshly authenticated user.
pub trait CallServiceFactory: Send + Sync {
    fn connect(
        &self,
        user: &Identity,
        auth: &AuthData,
    ) -> Result<Arc<dyn CallService>, HuddleError>;
}

/// Order `calls` by creation time. Calls without a timestamp sort last.
pub fn sort_calls(calls: &mut [CallSummary], order: SortOrder) {
    calls.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => match order {
            SortOrder::NewestFirst => y.cmp(&x),
            SortOrder::OldestFirst => x.cmp(&y),
        },
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
