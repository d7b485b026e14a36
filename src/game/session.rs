//! Per-session counters owned by the controller

use std::collections::BTreeMap;

use crate::sync::{PlayerId, PlayerInfo, PlayerScore};

/// Default local id until the host announces the real one
pub const DEFAULT_ME_ID: &str = "1";

/// Everything one peer knows about the current click race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub me_id: PlayerId,
    /// Two-peer roster, empty when solo or not yet announced
    pub players: Vec<PlayerInfo>,
    /// Our own clicks (this peer is authoritative for it)
    pub local_clicks: u32,
    /// Last count reported by the other peer
    pub remote_clicks: u32,
    /// Last known count per player, used to build the final score set
    pub click_counts: BTreeMap<PlayerId, u32>,
    pub game_over: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_ME_ID)
    }
}

impl Session {
    pub fn new(me_id: impl Into<PlayerId>) -> Self {
        let me_id = me_id.into();
        Self {
            click_counts: BTreeMap::from([(me_id.clone(), 0)]),
            me_id,
            players: Vec::new(),
            local_clicks: 0,
            remote_clicks: 0,
            game_over: false,
        }
    }

    pub fn has_roster(&self) -> bool {
        !self.players.is_empty()
    }

    /// The other participant, if the roster names one
    pub fn remote_id(&self) -> Option<&PlayerId> {
        self.players.iter().map(|p| &p.id).find(|id| **id != self.me_id)
    }

    /// Ids of every known participant: the roster when announced,
    /// otherwise whoever appears in the click counts
    pub fn participant_ids(&self) -> Vec<PlayerId> {
        if self.has_roster() {
            return self.players.iter().map(|p| p.id.clone()).collect();
        }
        self.click_counts.keys().cloned().collect()
    }

    /// Zero all counters and clear the terminal flag, keeping identity and roster
    pub fn reset(&mut self) {
        self.local_clicks = 0;
        self.remote_clicks = 0;
        self.game_over = false;
        self.click_counts = self
            .participant_ids()
            .into_iter()
            .chain(std::iter::once(self.me_id.clone()))
            .map(|id| (id, 0))
            .collect();
    }

    /// Count one local click, returning the new total
    pub fn record_local_click(&mut self) -> u32 {
        self.local_clicks += 1;
        self.click_counts.insert(self.me_id.clone(), self.local_clicks);
        self.local_clicks
    }

    /// Score set: last known count for every participant
    pub fn scores(&self) -> Vec<PlayerScore> {
        self.participant_ids()
            .into_iter()
            .map(|id| PlayerScore {
                score: self.click_counts.get(&id).copied().unwrap_or(0),
                player_id: id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player() -> Session {
        let mut s = Session::new("p1");
        s.players = vec![PlayerInfo::new("p1", "Alice"), PlayerInfo::new("p2", "Bob")];
        s
    }

    #[test]
    fn test_remote_id() {
        assert_eq!(Session::new("p1").remote_id(), None);
        assert_eq!(two_player().remote_id().map(String::as_str), Some("p2"));
    }

    #[test]
    fn test_reset_zeroes_every_participant() {
        let mut s = two_player();
        s.record_local_click();
        s.remote_clicks = 2;
        s.click_counts.insert("p2".into(), 2);
        s.game_over = true;

        s.reset();
        assert_eq!(s.local_clicks, 0);
        assert_eq!(s.remote_clicks, 0);
        assert!(!s.game_over);
        assert_eq!(s.click_counts.len(), 2);
        assert!(s.click_counts.values().all(|&c| c == 0));
        assert_eq!(s.players.len(), 2);
    }

    #[test]
    fn test_scores_cover_roster() {
        let mut s = two_player();
        s.record_local_click();
        s.record_local_click();
        s.click_counts.insert("p2".into(), 1);

        let scores = s.scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0], PlayerScore { player_id: "p1".into(), score: 2 });
        assert_eq!(scores[1], PlayerScore { player_id: "p2".into(), score: 1 });
    }

    #[test]
    fn test_scores_without_roster_use_known_counts() {
        let s = Session::default();
        let scores = s.scores();
        assert_eq!(scores, vec![PlayerScore { player_id: "1".into(), score: 0 }]);
    }
}
