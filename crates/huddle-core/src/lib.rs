//! Huddle core business logic.
//!
//! Session bootstrap, call lifecycle and per-screen view models for the
//! Huddle meeting client. Consumed by native UI shells via UniFFI bindings.

pub mod auth;
pub mod backend;
pub mod call;
pub mod config;
pub mod effects;
pub mod errors;
pub mod events;
pub mod livekit_call;
pub mod meet_api;
pub mod meeting_id;
pub mod navigation;
pub mod session;
pub mod session_store;
pub mod state;
pub mod viewmodels;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthApi, AuthData, AuthService};
pub use backend::{Call, CallFilter, CallService, CallServiceFactory, SortOrder};
pub use call::{AcquireMode, CallEffect, CallId, CallLifecycle, CallStatus, CallSummary};
pub use config::ClientConfig;
pub use effects::EffectQueue;
pub use errors::HuddleError;
pub use events::{ConnectionState, HuddleEvent, HuddleEventListener, ListenerId, ParticipantInfo};
pub use livekit_call::{LiveKitCall, LiveKitCallService, LiveKitFactory};
pub use meet_api::MeetApi;
pub use navigation::AppRoute;
pub use session::{ClientSession, SessionManager, SignInOutcome};
pub use session_store::{Credential, Identity, SessionStore};
