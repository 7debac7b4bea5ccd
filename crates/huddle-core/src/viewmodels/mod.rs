//! One state holder per screen.
//!
//! Each view model exposes an immutable `*UiState` snapshot and, where the
//! screen needs them, a queue of one-shot effects.

pub mod app;
pub mod join;
pub mod lobby;
pub mod login;
pub mod meeting;
pub mod meeting_list;
pub mod new_meeting;

pub use app::{AppUiState, AppViewModel, LoginStatus};
pub use join::{JoinEffect, JoinUiState, JoinViewModel};
pub use lobby::{LobbyEffect, MeetingLobbyUiState, MeetingLobbyViewModel};
pub use login::{LoginEffect, LoginUiState, LoginViewModel, demo_accounts};
pub use meeting::{MeetingEffect, MeetingUiState, MeetingViewModel, RAISE_HAND_REACTION};
pub use meeting_list::{MeetingListUiState, MeetingListViewModel};
pub use new_meeting::{NewMeetingEffect, NewMeetingUiState, NewMeetingViewModel};
