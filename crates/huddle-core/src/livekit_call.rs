//! [`CallService`] backed by the Meet REST API and LiveKit rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use livekit::data_stream::StreamTextOptions;
use livekit::prelude::{RemoteParticipant, Room, RoomEvent, RoomOptions};
use livekit::track::TrackSource as LkTrackSource;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::auth::AuthData;
use crate::backend::{Call, CallFilter, CallService, CallServiceFactory, SortOrder, sort_calls};
use crate::call::{CallId, CallSummary};
use crate::config::ClientConfig;
use crate::errors::HuddleError;
use crate::events::{
    ConnectionState, EventEmitter, HuddleEvent, HuddleEventListener, ListenerId, ParticipantInfo,
};
use crate::meet_api::{MeetApi, RoomInfo};
use crate::session_store::Identity;

/// Text stream topic carrying reactions.
const REACTION_TOPIC: &str = "lk.reaction";

/// Disconnect reasons that mean the session broke rather than ended.
const FAILURE_REASONS: &[&str] = &[
    "JoinFailure",
    "SignalClose",
    "StateMismatch",
    "ConnectionTimeout",
];

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct ReactionPayload {
    #[serde(rename = "type")]
    kind: String,
    emoji_code: String,
}

/// State reported for a room that closed with `reason` (its `Debug` form).
fn state_after_disconnect(reason: &str) -> ConnectionState {
    if FAILURE_REASONS.contains(&reason) {
        ConnectionState::Failed(reason.to_string())
    } else {
        ConnectionState::Disconnected
    }
}

fn participant_info(p: &RemoteParticipant) -> ParticipantInfo {
    let name = p.name().to_string();
    ParticipantInfo {
        sid: p.sid().to_string(),
        identity: p.identity().to_string(),
        name: if name.is_empty() { None } else { Some(name) },
    }
}

/// One meeting: a Meet room plus, once joined, its LiveKit session.
pub struct LiveKitCall {
    cid: CallId,
    user_id: String,
    api: Arc<MeetApi>,
    emitter: EventEmitter,
    room: Arc<Mutex<Option<Arc<Room>>>>,
    connection: watch::Sender<ConnectionState>,
    mic_enabled: AtomicBool,
    camera_enabled: AtomicBool,
    event_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LiveKitCall {
    fn new(
        cid: CallId,
        user_id: String,
        api: Arc<MeetApi>,
        emitter: EventEmitter,
        config: &ClientConfig,
    ) -> Self {
        let (connection, _) = watch::channel(ConnectionState::Connecting);
        Self {
            cid,
            user_id,
            api,
            emitter,
            room: Arc::new(Mutex::new(None)),
            connection,
            mic_enabled: AtomicBool::new(config.mic_enabled_on_join),
            camera_enabled: AtomicBool::new(config.camera_enabled_on_join),
            event_task: std::sync::Mutex::new(None),
        }
    }

    /// True while a LiveKit room is open for this call.
    pub async fn is_connected(&self) -> bool {
        self.room.lock().await.is_some()
    }

    fn set_connection(&self, state: ConnectionState) {
        self.connection.send_replace(state.clone());
        self.emitter.emit(HuddleEvent::ConnectionStateChanged {
            cid: self.cid.clone(),
            state,
        });
    }

    fn announce_created(&self, room: &RoomInfo) -> CallSummary {
        let summary = room.summary(&self.cid.call_type);
        let created_by = if summary.created_by.is_empty() {
            self.user_id.clone()
        } else {
            summary.created_by.clone()
        };
        self.emitter.emit(HuddleEvent::CallCreated {
            cid: self.cid.clone(),
            created_by,
        });
        summary
    }

    /// Mute or unmute the local publication for `source`, if there is one.
    async fn apply_publication(&self, source: LkTrackSource, enabled: bool) {
        let room = self.room.lock().await;
        let Some(room) = room.as_ref() else {
            return;
        };
        let local = room.local_participant();
        for (_, publication) in local.track_publications() {
            if publication.source() == source {
                if enabled {
                    publication.unmute();
                } else {
                    publication.mute();
                }
                break;
            }
        }
    }

    async fn event_loop(
        mut events: tokio::sync::mpsc::UnboundedReceiver<RoomEvent>,
        cid: CallId,
        emitter: EventEmitter,
        connection: watch::Sender<ConnectionState>,
        room_ref: Arc<Mutex<Option<Arc<Room>>>>,
    ) {
        let mut reconnect_attempt: u32 = 0;
        let set_state = |state: ConnectionState| {
            connection.send_replace(state.clone());
            emitter.emit(HuddleEvent::ConnectionStateChanged {
                cid: cid.clone(),
                state,
            });
        };

        while let Some(event) = events.recv().await {
            match event {
                RoomEvent::Connected { .. } | RoomEvent::Reconnected => {
                    reconnect_attempt = 0;
                    set_state(ConnectionState::Connected);
                }

                RoomEvent::Reconnecting => {
                    reconnect_attempt += 1;
                    set_state(ConnectionState::Reconnecting { attempt: reconnect_attempt });
                }

                RoomEvent::Disconnected { reason } => {
                    let reason = format!("{reason:?}");
                    tracing::info!("room {cid} disconnected: {reason}");
                    if *connection.borrow() != ConnectionState::Disconnected {
                        set_state(state_after_disconnect(&reason));
                    }
                    *room_ref.lock().await = None;
                    break;
                }

                RoomEvent::ParticipantConnected(participant) => {
                    emitter.emit(HuddleEvent::ParticipantJoined {
                        cid: cid.clone(),
                        info: participant_info(&participant),
                    });
                }

                RoomEvent::ParticipantDisconnected(participant) => {
                    emitter.emit(HuddleEvent::ParticipantLeft {
                        cid: cid.clone(),
                        participant_sid: participant.sid().to_string(),
                    });
                }

                RoomEvent::TextStreamOpened { reader, topic, participant_identity } => {
                    if topic != REACTION_TOPIC {
                        tracing::debug!("TextStreamOpened: topic={topic} (ignored)");
                        continue;
                    }
                    let Some(reader) = reader.take() else {
                        tracing::warn!("TextStreamOpened: reader already taken");
                        continue;
                    };
                    let emitter = emitter.clone();
                    let cid = cid.clone();
                    let sender = participant_identity.to_string();
                    tokio::spawn(async move {
                        let text = match reader.read_all().await {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::warn!("failed to read reaction stream: {e}");
                                return;
                            }
                        };
                        match serde_json::from_str::<ReactionPayload>(&text) {
                            Ok(reaction) => emitter.emit(HuddleEvent::ReactionReceived {
                                cid,
                                sender,
                                emoji_code: reaction.emoji_code,
                            }),
                            Err(e) => {
                                tracing::warn!("ignoring malformed reaction from {sender}: {e}")
                            }
                        }
                    });
                }

                _ => {
                    tracing::debug!("unhandled room event: {event:?}");
                }
            }
        }

        tracing::info!("room event loop ended for {cid}");
    }
}

#[async_trait]
impl Call for LiveKitCall {
    fn cid(&self) -> &CallId {
        &self.cid
    }

    async fn get(&self) -> Result<CallSummary, HuddleError> {
        let room = self.api.get_room(&self.cid.id).await?;
        Ok(room.summary(&self.cid.call_type))
    }

    async fn create(&self) -> Result<CallSummary, HuddleError> {
        let room = self.api.create_room(&self.cid.id).await?;
        Ok(self.announce_created(&room))
    }

    async fn join(&self, create: bool) -> Result<(), HuddleError> {
        if self.is_connected().await {
            return Ok(());
        }
        self.set_connection(ConnectionState::Connecting);

        let room_info = match self.api.get_room(&self.cid.id).await {
            Ok(room) => room,
            Err(HuddleError::NotFound(_)) if create => {
                let room = self.api.create_room(&self.cid.id).await?;
                self.announce_created(&room);
                room
            }
            Err(e) => return Err(e),
        };
        let credentials = room_info
            .livekit
            .ok_or_else(|| HuddleError::Call(format!("no media credentials for {}", self.cid)))?;

        let mut options = RoomOptions::default();
        options.auto_subscribe = true;

        let connected =
            Room::connect(&credentials.livekit_url, &credentials.token, options).await;
        let (room, events) = match connected {
            Ok(connected) => connected,
            Err(e) => {
                self.set_connection(ConnectionState::Failed(e.to_string()));
                return Err(HuddleError::Connection(e.to_string()));
            }
        };
        let room = Arc::new(room);

        for (_, participant) in room.remote_participants() {
            self.emitter.emit(HuddleEvent::ParticipantJoined {
                cid: self.cid.clone(),
                info: participant_info(&participant),
            });
        }

        *self.room.lock().await = Some(room);
        self.apply_publication(LkTrackSource::Microphone, self.microphone_enabled()).await;
        self.apply_publication(LkTrackSource::Camera, self.camera_enabled()).await;
        self.set_connection(ConnectionState::Connected);
        tracing::info!("joined {} as {}", self.cid, self.user_id);

        let handle = tokio::spawn(Self::event_loop(
            events,
            self.cid.clone(),
            self.emitter.clone(),
            self.connection.clone(),
            self.room.clone(),
        ));
        if let Some(previous) = self
            .event_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle)
        {
            previous.abort();
        }
        Ok(())
    }

    async fn leave(&self) {
        self.set_connection(ConnectionState::Disconnected);
        let room = self.room.lock().await.take();
        if let Some(room) = room {
            if let Err(e) = room.close().await {
                tracing::warn!("error closing room {}: {e}", self.cid);
            }
        }
        let task = self
            .event_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }

    async fn send_reaction(&self, kind: &str, emoji_code: &str) -> Result<(), HuddleError> {
        let room = self.room.lock().await;
        let room = room
            .as_ref()
            .ok_or_else(|| HuddleError::Call("not connected".into()))?;

        let body = serde_json::to_string(&ReactionPayload {
            kind: kind.to_string(),
            emoji_code: emoji_code.to_string(),
        })
        .map_err(|e| HuddleError::Call(format!("encode reaction: {e}")))?;

        let options = StreamTextOptions {
            topic: REACTION_TOPIC.to_string(),
            ..Default::default()
        };
        room.local_participant()
            .send_text(&body, options)
            .await
            .map_err(|e| HuddleError::Call(format!("send reaction: {e}")))?;

        tracing::info!("reaction {emoji_code} sent in {}", self.cid);
        Ok(())
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), HuddleError> {
        self.mic_enabled.store(enabled, Ordering::SeqCst);
        self.apply_publication(LkTrackSource::Microphone, enabled).await;
        tracing::info!("microphone enabled: {enabled}");
        Ok(())
    }

    async fn set_camera_enabled(&self, enabled: bool) -> Result<(), HuddleError> {
        self.camera_enabled.store(enabled, Ordering::SeqCst);
        self.apply_publication(LkTrackSource::Camera, enabled).await;
        tracing::info!("camera enabled: {enabled}");
        Ok(())
    }

    fn microphone_enabled(&self) -> bool {
        self.mic_enabled.load(Ordering::SeqCst)
    }

    fn camera_enabled(&self) -> bool {
        self.camera_enabled.load(Ordering::SeqCst)
    }

    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}

impl Drop for LiveKitCall {
    fn drop(&mut self) {
        let task = self
            .event_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// The signed-in user's connection to Meet.
pub struct LiveKitCallService {
    user_id: String,
    api: Arc<MeetApi>,
    config: ClientConfig,
    emitter: EventEmitter,
    calls: std::sync::Mutex<HashMap<CallId, Weak<LiveKitCall>>>,
}

impl LiveKitCallService {
    pub fn new(user_id: impl Into<String>, api: MeetApi, config: ClientConfig) -> Self {
        Self {
            user_id: user_id.into(),
            api: Arc::new(api),
            config,
            emitter: EventEmitter::new(),
            calls: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn live_calls(&self) -> Vec<Arc<LiveKitCall>> {
        let mut calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        calls.retain(|_, call| call.strong_count() > 0);
        calls.values().filter_map(Weak::upgrade).collect()
    }
}

#[async_trait]
impl CallService for LiveKitCallService {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn call(&self, cid: &CallId) -> Arc<dyn Call> {
        let mut calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(call) = calls.get(cid).and_then(Weak::upgrade) {
            return call;
        }
        let call = Arc::new(LiveKitCall::new(
            cid.clone(),
            self.user_id.clone(),
            self.api.clone(),
            self.emitter.clone(),
            &self.config,
        ));
        calls.insert(cid.clone(), Arc::downgrade(&call));
        call
    }

    async fn query_calls(
        &self,
        filter: CallFilter,
        sort: SortOrder,
    ) -> Result<Vec<CallSummary>, HuddleError> {
        let created_by = match &filter {
            CallFilter::All => None,
            CallFilter::CreatedBy(user) => Some(user.as_str()),
        };
        let rooms = self.api.list_rooms(created_by).await?;
        let mut calls: Vec<CallSummary> = rooms
            .iter()
            .map(|room| room.summary(crate::call::DEFAULT_CALL_TYPE))
            .filter(|call| match &filter {
                CallFilter::All => true,
                CallFilter::CreatedBy(user) => {
                    call.created_by.is_empty() || &call.created_by == user
                }
            })
            .collect();
        sort_calls(&mut calls, sort);
        Ok(calls)
    }

    async fn log_out(&self) -> Result<(), HuddleError> {
        let calls = self.live_calls();
        tracing::info!("logging out {} ({} live calls)", self.user_id, calls.len());
        futures_util::future::join_all(calls.iter().map(|call| call.leave())).await;
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        Ok(())
    }

    fn update_token(&self, token: &str) {
        self.api.set_token(token);
    }

    fn add_listener(&self, listener: Arc<dyn HuddleEventListener>) -> ListenerId {
        self.emitter.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.emitter.remove_listener(id);
    }
}

/// Connects signed-in users to Meet with the configured API root.
pub struct LiveKitFactory {
    config: ClientConfig,
}

impl LiveKitFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl CallServiceFactory for LiveKitFactory {
    fn connect(
        &self,
        user: &Identity,
        auth: &AuthData,
    ) -> Result<Arc<dyn CallService>, HuddleError> {
        let api = MeetApi::new(&self.config.meet_api_url, auth.token.clone())?;
        tracing::info!("call service ready for {}", user.id);
        Ok(Arc::new(LiveKitCallService::new(
            user.id.clone(),
            api,
            self.config.clone(),
        )))
    }
}
