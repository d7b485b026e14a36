//! Shared state exchanged between peers
//!
//! Everything here crosses the transport as JSON, so field names follow the
//! host SDK's camelCase convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;
use crate::game::Session;

/// Player identifier assigned by the host platform
pub type PlayerId = String;

/// A participant as announced by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PlayerInfo {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: None,
        }
    }
}

/// Snapshot of the click race sent to the other peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncState {
    /// Roster; only meaningful at session start
    pub players: Vec<PlayerInfo>,
    /// Clicks per player
    pub click_counts: BTreeMap<PlayerId, u32>,
    /// Terminal flag, never reverts to false within a session
    pub game_over: bool,
}

impl SyncState {
    /// Build the outgoing payload from the local session.
    ///
    /// Reports our own count and the last count we know for the other peer.
    pub fn from_session(session: &Session) -> Result<Self, SyncError> {
        if !session.has_roster() {
            return Err(SyncError::MissingRoster);
        }

        let mut click_counts = BTreeMap::new();
        click_counts.insert(session.me_id.clone(), session.local_clicks);
        if let Some(remote) = session.remote_id() {
            click_counts.insert(remote.clone(), session.remote_clicks);
        }

        Ok(Self {
            players: session.players.clone(),
            click_counts,
            game_over: session.game_over,
        })
    }

    pub fn count_for(&self, id: &str) -> Option<u32> {
        self.click_counts.get(id).copied()
    }
}

/// Incoming `game_state_updated` payload, classified once at the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingState {
    /// No state exists yet for this session
    Absent,
    /// Payload present but unusable
    Malformed(String),
    /// A well-formed state wrapped as `{id, data}`
    Valid { id: Option<String>, state: SyncState },
}

impl IncomingState {
    /// Classify a raw `{id, data}` payload
    pub fn from_value(payload: Option<&Value>) -> Self {
        let payload = match payload {
            None | Some(Value::Null) => return IncomingState::Absent,
            Some(value) => value,
        };

        let Some(envelope) = payload.as_object() else {
            return IncomingState::Malformed(format!("expected an object, got {}", payload));
        };

        let data = match envelope.get("data") {
            None | Some(Value::Null) => {
                return IncomingState::Malformed("missing data field".into());
            }
            Some(data) => data,
        };

        let id = envelope.get("id").and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        match SyncState::deserialize(data) {
            Ok(state) => IncomingState::Valid { id, state },
            Err(e) => IncomingState::Malformed(e.to_string()),
        }
    }

    /// Parse a JSON string payload, as delivered by browser callbacks
    pub fn from_json(json: Option<&str>) -> Self {
        match json.map(serde_json::from_str::<Value>) {
            None => IncomingState::Absent,
            Some(Ok(value)) => Self::from_value(Some(&value)),
            Some(Err(e)) => IncomingState::Malformed(e.to_string()),
        }
    }

    /// The usable state, if any
    pub fn state(&self) -> Option<&SyncState> {
        match self {
            IncomingState::Valid { state, .. } => Some(state),
            _ => None,
        }
    }
}

/// Outgoing `updateGameState` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    pub data: SyncState,
    /// Players to notify (the other participant)
    pub alert_user_ids: Vec<PlayerId>,
}

/// One entry of a multiplayer score set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub score: u32,
}

/// Terminal outcome declared to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameOutcome {
    Multiplayer { scores: Vec<PlayerScore> },
    Solo { score: u32 },
}

impl GameOutcome {
    /// Score reported for `id`, if present
    pub fn score_for(&self, id: &str) -> Option<u32> {
        match self {
            GameOutcome::Solo { score } => Some(*score),
            GameOutcome::Multiplayer { scores } => {
                scores.iter().find(|s| s.player_id == id).map(|s| s.score)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster_session() -> Session {
        let mut session = Session::new("p1");
        session.players = vec![PlayerInfo::new("p1", "Alice"), PlayerInfo::new("p2", "Bob")];
        session.local_clicks = 2;
        session.remote_clicks = 1;
        session
    }

    #[test]
    fn test_from_session_requires_roster() {
        let session = Session::new("p1");
        assert_eq!(SyncState::from_session(&session), Err(SyncError::MissingRoster));
    }

    #[test]
    fn test_from_session_reports_both_counts() {
        let state = SyncState::from_session(&roster_session()).unwrap();
        assert_eq!(state.count_for("p1"), Some(2));
        assert_eq!(state.count_for("p2"), Some(1));
        assert_eq!(state.players.len(), 2);
        assert!(!state.game_over);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let state = SyncState::from_session(&roster_session()).unwrap();
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["clickCounts"]["p1"], json!(2));
        assert_eq!(value["gameOver"], json!(false));
        assert!(value["players"][0].get("imageUrl").is_none());

        let outcome = GameOutcome::Multiplayer {
            scores: vec![PlayerScore {
                player_id: "p1".into(),
                score: 3,
            }],
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"scores": [{"playerId": "p1", "score": 3}]})
        );
        assert_eq!(
            serde_json::to_value(GameOutcome::Solo { score: 3 }).unwrap(),
            json!({"score": 3})
        );
    }

    #[test]
    fn test_absent_payloads() {
        assert_eq!(IncomingState::from_value(None), IncomingState::Absent);
        assert_eq!(IncomingState::from_value(Some(&Value::Null)), IncomingState::Absent);
        assert_eq!(IncomingState::from_json(None), IncomingState::Absent);
    }

    #[test]
    fn test_malformed_payloads() {
        let cases = [
            json!({"id": "s1"}),
            json!({"id": "s1", "data": null}),
            json!({"data": {"clickCounts": {"p1": -1}}}),
            json!({"data": {"gameOver": "yes"}}),
            json!(42),
        ];
        for case in &cases {
            assert!(
                matches!(IncomingState::from_value(Some(case)), IncomingState::Malformed(_)),
                "{} should be malformed",
                case
            );
        }
        assert!(matches!(IncomingState::from_json(Some("{oops")), IncomingState::Malformed(_)));
    }

    #[test]
    fn test_valid_payload_with_missing_fields() {
        let payload = json!({"id": 7, "data": {"clickCounts": {"p2": 2}}});
        let incoming = IncomingState::from_value(Some(&payload));

        let IncomingState::Valid { id, state } = incoming else {
            panic!("expected a valid state");
        };
        assert_eq!(id.as_deref(), Some("7"));
        assert_eq!(state.count_for("p2"), Some(2));
        assert!(state.players.is_empty());
        assert!(!state.game_over);
    }

    #[test]
    fn test_roster_with_image() {
        let payload = json!({
            "id": "s",
            "data": {
                "players": [{"id": "p1", "name": "Alice", "imageUrl": "https://img/a.png"}],
                "clickCounts": {},
                "gameOver": true
            }
        });
        let incoming = IncomingState::from_value(Some(&payload));
        let state = incoming.state().unwrap();
        assert_eq!(state.players[0].image_url.as_deref(), Some("https://img/a.png"));
        assert!(state.game_over);
    }
}
