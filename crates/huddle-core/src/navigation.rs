use crate::call::CallId;

/// Named destinations of the native navigation graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRoute {
    Login,
    MeetingList,
    JoinMeeting,
    NewMeeting,
    MeetingLobby(CallId),
    Meeting(CallId),
}

impl AppRoute {
    pub fn route(&self) -> String {
        match self {
            AppRoute::Login => "login".to_string(),
            AppRoute::MeetingList => "meeting-list".to_string(),
            AppRoute::JoinMeeting => "join-meeting".to_string(),
            AppRoute::NewMeeting => "new-meeting".to_string(),
            AppRoute::MeetingLobby(cid) => format!("meeting-lobby/{cid}"),
            AppRoute::Meeting(cid) => format!("meeting/{cid}"),
        }
    }
}
