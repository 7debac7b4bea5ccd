use std::sync::RwLock;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::call::{CallId, CallSummary};
use crate::errors::HuddleError;

#[derive(Debug, Deserialize)]
struct RoomResponse {
    slug: String,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    livekit: Option<LiveKitCredentials>,
}

#[derive(Debug, Deserialize)]
struct LiveKitCredentials {
    url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoomListResponse {
    Page { results: Vec<RoomResponse> },
    Plain(Vec<RoomResponse>),
}

#[derive(Serialize)]
struct CreateRoomRequest<'a> {
    slug: &'a str,
}

/// Media credentials for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// WebSocket URL for LiveKit (wss://)
    pub livekit_url: String,
    /// JWT access token
    pub token: String,
}

/// A room as returned by the Meet API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub slug: String,
    pub created_by: String,
    pub created_at: Option<DateTime<Utc>>,
    pub livekit: Option<TokenInfo>,
}

impl RoomInfo {
    pub fn summary(&self, call_type: &str) -> CallSummary {
        CallSummary {
            cid: CallId::new(call_type, self.slug.clone()),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
        }
    }
}

impl From<RoomResponse> for RoomInfo {
    fn from(room: RoomResponse) -> Self {
        let created_at = room.created_at.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| tracing::debug!("unparseable created_at '{s}': {e}"))
                .ok()
        });
        Self {
            slug: room.slug,
            created_by: room.created_by.unwrap_or_default(),
            created_at,
            livekit: room.livekit.map(|lk| TokenInfo {
                livekit_url: websocket_url(&lk.url),
                token: lk.token,
            }),
        }
    }
}

/// Convert an http(s) URL to its WebSocket equivalent.
fn websocket_url(url: &str) -> String {
    url.replace("https://", "wss://").replace("http://", "ws://")
}

/// REST client for the Meet rooms API.
pub struct MeetApi {
    http: reqwest::Client,
    base: Url,
    token: RwLock<String>,
}

impl MeetApi {
    /// `base_url` is the API root, e.g. `https://meet.example.com/api/v1.0/`.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, HuddleError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| HuddleError::Http(format!("invalid meet api url '{base_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: RwLock::new(token.into()),
        })
    }

    /// Replace the bearer token used for later requests.
    pub fn set_token(&self, token: &str) {
        match self.token.write() {
            Ok(mut current) => *current = token.to_string(),
            Err(poisoned) => *poisoned.into_inner() = token.to_string(),
        }
    }

    fn bearer(&self) -> String {
        let token = match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        format!("Bearer {token}")
    }

    fn endpoint(&self, path: &str) -> Result<Url, HuddleError> {
        self.base
            .join(path)
            .map_err(|e| HuddleError::Http(format!("invalid endpoint '{path}': {e}")))
    }

    fn room_url(&self, slug: &str) -> Result<Url, HuddleError> {
        self.endpoint(&format!("rooms/{}/", urlencoding::encode(slug)))
    }

    fn list_url(&self, created_by: Option<&str>) -> Result<Url, HuddleError> {
        let mut url = self.endpoint("rooms/")?;
        if let Some(user) = created_by {
            url.query_pairs_mut().append_pair("created_by", user);
        }
        Ok(url)
    }

    /// Fetch one room. A missing room is [`HuddleError::NotFound`].
    pub async fn get_room(&self, slug: &str) -> Result<RoomInfo, HuddleError> {
        let url = self.room_url(slug)?;
        tracing::debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(HuddleError::NotFound(format!("room '{slug}'")));
        }
        if !resp.status().is_success() {
            return Err(HuddleError::Call(format!(
                "Meet API returned status {}",
                resp.status()
            )));
        }

        let room: RoomResponse = resp
            .json()
            .await
            .map_err(|e| HuddleError::Call(format!("invalid Meet API response: {e}")))?;
        Ok(room.into())
    }

    pub async fn create_room(&self, slug: &str) -> Result<RoomInfo, HuddleError> {
        let url = self.endpoint("rooms/")?;
        tracing::info!("creating room {slug}");
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .json(&CreateRoomRequest { slug })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HuddleError::Call(format!(
                "Meet API returned status {} creating '{slug}'",
                resp.status()
            )));
        }

        let room: RoomResponse = resp
            .json()
            .await
            .map_err(|e| HuddleError::Call(format!("invalid Meet API response: {e}")))?;
        Ok(room.into())
    }

    pub async fn list_rooms(&self, created_by: Option<&str>) -> Result<Vec<RoomInfo>, HuddleError> {
        let url = self.list_url(created_by)?;
        tracing::debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HuddleError::Call(format!(
                "Meet API returned status {}",
                resp.status()
            )));
        }

        let list: RoomListResponse = resp
            .json()
            .await
            .map_err(|e| HuddleError::Call(format!("invalid Meet API response: {e}")))?;
        let rooms = match list {
            RoomListResponse::Page { results } => results,
            RoomListResponse::Plain(rooms) => rooms,
        };
        Ok(rooms.into_iter().map(RoomInfo::from).collect())
    }
}
