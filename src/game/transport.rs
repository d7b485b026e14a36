//! Contract with the host platform's messaging SDK
//!
//! The SDK is callback driven; here listeners are registered by kind with
//! [`Transport::listen`] and the events they capture are drained with
//! [`Transport::poll_events`] on the game thread. State updates are delivered
//! at least once with no ordering guarantee.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::sync::{GameOutcome, IncomingState, PlayerId, PlayerInfo, StateUpdate};

/// Solo or two-peer session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Solo,
    Multiplayer,
}

impl Mode {
    /// Build-time override from the `GAME_MULTIPLAYER_MODE` environment variable
    pub fn build_flag() -> Option<bool> {
        option_env!("GAME_MULTIPLAYER_MODE").and_then(parse_flag)
    }

    /// Resolve the mode once at startup: build flag, then configured
    /// override, then probing the transport.
    pub fn resolve(
        build_flag: Option<bool>,
        configured: Option<bool>,
        probe: impl FnOnce() -> bool,
    ) -> Self {
        let (multiplayer, source) = match (build_flag, configured) {
            (Some(flag), _) => (flag, "build"),
            (None, Some(flag)) => (flag, "settings"),
            (None, None) => (probe(), "transport probe"),
        };
        let mode = if multiplayer {
            Mode::Multiplayer
        } else {
            Mode::Solo
        };
        log::info!("Mode {:?} (from {})", mode, source);
        mode
    }

    pub fn is_multiplayer(&self) -> bool {
        *self == Mode::Multiplayer
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Host events the game can listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayAgain,
    ToggleMute,
    GameInfo,
    GameStateUpdated,
}

impl EventKind {
    /// Event name used by the host SDK
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PlayAgain => "play_again",
            EventKind::ToggleMute => "toggle_mute",
            EventKind::GameInfo => "game_info",
            EventKind::GameStateUpdated => "game_state_updated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "play_again" => Some(EventKind::PlayAgain),
            "toggle_mute" => Some(EventKind::ToggleMute),
            "game_info" => Some(EventKind::GameInfo),
            "game_state_updated" => Some(EventKind::GameStateUpdated),
            _ => None,
        }
    }

    /// Listeners required for a mode
    pub fn required(mode: Mode) -> &'static [EventKind] {
        match mode {
            Mode::Solo => &[EventKind::PlayAgain, EventKind::ToggleMute],
            Mode::Multiplayer => &[
                EventKind::PlayAgain,
                EventKind::ToggleMute,
                EventKind::GameInfo,
                EventKind::GameStateUpdated,
            ],
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    PlayAgain,
    ToggleMute { is_muted: bool },
    GameInfo { players: Vec<PlayerInfo>, me_id: PlayerId },
    GameStateUpdated(IncomingState),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameInfoPayload {
    #[serde(default)]
    players: Vec<PlayerInfo>,
    me_id: PlayerId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutePayload {
    is_muted: bool,
}

impl TransportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TransportEvent::PlayAgain => EventKind::PlayAgain,
            TransportEvent::ToggleMute { .. } => EventKind::ToggleMute,
            TransportEvent::GameInfo { .. } => EventKind::GameInfo,
            TransportEvent::GameStateUpdated(_) => EventKind::GameStateUpdated,
        }
    }

    /// Decode a raw SDK callback. Returns `None` for payloads that cannot be
    /// interpreted (state updates never fail: they degrade to
    /// [`IncomingState::Malformed`]).
    pub fn decode(kind: EventKind, payload: Option<&Value>) -> Option<Self> {
        match kind {
            EventKind::PlayAgain => Some(TransportEvent::PlayAgain),
            EventKind::ToggleMute => {
                let muted = payload
                    .and_then(|p| MutePayload::deserialize(p).ok())
                    .map(|p| p.is_muted);
                match muted {
                    Some(is_muted) => Some(TransportEvent::ToggleMute { is_muted }),
                    None => {
                        log::warn!("Ignoring toggle_mute without isMuted");
                        None
                    }
                }
            }
            EventKind::GameInfo => match payload.map(|p| GameInfoPayload::deserialize(p)) {
                Some(Ok(info)) => Some(TransportEvent::GameInfo {
                    players: info.players,
                    me_id: info.me_id,
                }),
                Some(Err(e)) => {
                    log::warn!("Ignoring malformed game_info: {}", e);
                    None
                }
                None => {
                    log::warn!("Ignoring empty game_info");
                    None
                }
            },
            EventKind::GameStateUpdated => Some(TransportEvent::GameStateUpdated(
                IncomingState::from_value(payload),
            )),
        }
    }
}

/// Host messaging collaborator.
///
/// Implementations own serialization and delivery. None of the calls are
/// retried by the game.
pub trait Transport {
    /// Whether the host exposes multiplayer actions
    fn supports_multiplayer(&self) -> bool;

    /// Register interest in an event. Must happen before [`Transport::ready`].
    fn listen(&mut self, kind: EventKind) -> Result<(), TransportError>;

    /// Tell the host the scene is interactive
    fn ready(&mut self, mode: Mode) -> Result<(), TransportError>;

    /// Broadcast local state to the other participant
    fn update_game_state(&mut self, update: &StateUpdate) -> Result<(), TransportError>;

    /// Declare the terminal outcome
    fn game_over(&mut self, outcome: &GameOutcome) -> Result<(), TransportError>;

    /// Drain events captured by registered listeners
    fn poll_events(&mut self) -> Vec<TransportEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_resolution_order() {
        assert_eq!(Mode::resolve(Some(false), Some(true), || true), Mode::Solo);
        assert_eq!(Mode::resolve(None, Some(true), || false), Mode::Multiplayer);
        assert_eq!(Mode::resolve(None, None, || true), Mode::Multiplayer);
        assert_eq!(Mode::resolve(None, None, || false), Mode::Solo);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" FALSE "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_event_names_round_trip() {
        for kind in EventKind::required(Mode::Multiplayer) {
            assert_eq!(EventKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(EventKind::from_name("unknown"), None);
    }

    #[test]
    fn test_decode_game_info() {
        let payload = json!({
            "players": [{"id": "a", "name": "Alice"}, {"id": "b", "name": "Bob"}],
            "meId": "b"
        });
        let event = TransportEvent::decode(EventKind::GameInfo, Some(&payload)).unwrap();
        let TransportEvent::GameInfo { players, me_id } = event else {
            panic!("expected game info");
        };
        assert_eq!(players.len(), 2);
        assert_eq!(me_id, "b");

        assert!(TransportEvent::decode(EventKind::GameInfo, None).is_none());
        let no_me = json!({"players": []});
        assert!(TransportEvent::decode(EventKind::GameInfo, Some(&no_me)).is_none());
    }

    #[test]
    fn test_decode_toggle_mute() {
        let event = TransportEvent::decode(EventKind::ToggleMute, Some(&json!({"isMuted": true})));
        assert_eq!(event, Some(TransportEvent::ToggleMute { is_muted: true }));
        assert!(TransportEvent::decode(EventKind::ToggleMute, None).is_none());
    }

    #[test]
    fn test_decode_state_update_never_fails() {
        let event = TransportEvent::decode(EventKind::GameStateUpdated, None).unwrap();
        assert_eq!(event, TransportEvent::GameStateUpdated(IncomingState::Absent));
        assert_eq!(event.kind(), EventKind::GameStateUpdated);
    }
}
