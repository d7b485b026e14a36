//! Convergent merge of a remote snapshot into the local session
//!
//! Delivery contract assumed from the transport: at-least-once, unordered.
//! The merge therefore has to be idempotent (duplicates are harmless) and
//! must never lose local progress to a stale message:
//! - own count: max(local, reported)
//! - remote count: taken from the remote peer, which owns it
//! - terminal flag: OR

use super::state::SyncState;
use crate::game::Session;

/// Merge `incoming` into a copy of `local`.
///
/// Pure: the caller decides what to do with the result.
pub fn merge(local: &Session, incoming: &SyncState) -> Session {
    let mut merged = local.clone();

    // The roster is fixed once known
    if merged.players.is_empty() && !incoming.players.is_empty() {
        merged.players = incoming.players.clone();
    }

    for (id, &count) in &incoming.click_counts {
        if *id != merged.me_id {
            merged.click_counts.insert(id.clone(), count);
        }
    }

    if let Some(remote) = merged.remote_id().cloned() {
        if let Some(count) = incoming.count_for(&remote) {
            merged.remote_clicks = count;
        }
    }

    if let Some(count) = incoming.count_for(&merged.me_id) {
        merged.local_clicks = merged.local_clicks.max(count);
    }
    merged.click_counts.insert(merged.me_id.clone(), merged.local_clicks);

    merged.game_over |= incoming.game_over;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::PlayerInfo;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn session(local: u32, remote: u32) -> Session {
        let mut s = Session::new("p1");
        s.players = vec![PlayerInfo::new("p1", "Alice"), PlayerInfo::new("p2", "Bob")];
        s.local_clicks = local;
        s.remote_clicks = remote;
        s.click_counts = BTreeMap::from([("p1".to_string(), local), ("p2".to_string(), remote)]);
        s
    }

    fn incoming(p1: u32, p2: u32, game_over: bool) -> SyncState {
        SyncState {
            players: Vec::new(),
            click_counts: BTreeMap::from([("p1".to_string(), p1), ("p2".to_string(), p2)]),
            game_over,
        }
    }

    #[test]
    fn test_lower_own_report_is_ignored() {
        let merged = merge(&session(2, 1), &incoming(1, 1, false));
        assert_eq!(merged.local_clicks, 2);
        assert_eq!(merged.click_counts["p1"], 2);
        assert_eq!(merged.remote_clicks, 1);
    }

    #[test]
    fn test_higher_own_report_is_adopted() {
        let merged = merge(&session(1, 0), &incoming(2, 0, false));
        assert_eq!(merged.local_clicks, 2);
        assert_eq!(merged.click_counts["p1"], 2);
    }

    #[test]
    fn test_remote_count_is_taken_as_reported() {
        let merged = merge(&session(0, 2), &incoming(0, 0, false));
        assert_eq!(merged.remote_clicks, 0);
        assert_eq!(merged.click_counts["p2"], 0);

        let merged = merge(&session(0, 0), &incoming(0, 3, true));
        assert_eq!(merged.remote_clicks, 3);
        assert!(merged.game_over);
    }

    #[test]
    fn test_game_over_never_reverts() {
        let mut local = session(3, 1);
        local.game_over = true;
        let merged = merge(&local, &incoming(0, 0, false));
        assert!(merged.game_over);
    }

    #[test]
    fn test_roster_adopted_only_when_unknown() {
        let mut local = Session::new("p2");
        let mut state = incoming(1, 0, false);
        state.players = vec![PlayerInfo::new("p1", "Alice"), PlayerInfo::new("p2", "Bob")];

        let merged = merge(&local, &state);
        assert_eq!(merged.players.len(), 2);
        assert_eq!(merged.remote_clicks, 1);

        local.players = vec![PlayerInfo::new("p2", "Bob"), PlayerInfo::new("p3", "Carol")];
        let merged = merge(&local, &state);
        assert_eq!(merged.players, local.players);
        assert_eq!(merged.remote_id().map(String::as_str), Some("p3"));
    }

    #[test]
    fn test_missing_entries_leave_counts() {
        let empty = SyncState::default();
        let merged = merge(&session(2, 1), &empty);
        assert_eq!(merged, session(2, 1));
    }

    proptest! {
        #[test]
        fn prop_own_count_is_max(local in 0u32..100, reported in 0u32..100, remote in 0u32..100) {
            let merged = merge(&session(local, 0), &incoming(reported, remote, false));
            prop_assert_eq!(merged.local_clicks, local.max(reported));
            prop_assert_eq!(merged.remote_clicks, remote);
        }

        #[test]
        fn prop_merge_is_idempotent(
            local in 0u32..100, remote in 0u32..100,
            r1 in 0u32..100, r2 in 0u32..100,
            local_over: bool, incoming_over: bool,
        ) {
            let mut s = session(local, remote);
            s.game_over = local_over;
            let state = incoming(r1, r2, incoming_over);

            let once = merge(&s, &state);
            let twice = merge(&once, &state);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.game_over, local_over || incoming_over);
        }

        #[test]
        fn prop_own_count_and_flag_commute(
            a1 in 0u32..100, a2 in 0u32..100, a_over: bool,
            b1 in 0u32..100, b2 in 0u32..100, b_over: bool,
        ) {
            let s = session(0, 0);
            let a = incoming(a1, a2, a_over);
            let b = incoming(b1, b2, b_over);

            let ab = merge(&merge(&s, &a), &b);
            let ba = merge(&merge(&s, &b), &a);
            prop_assert_eq!(ab.local_clicks, ba.local_clicks);
            prop_assert_eq!(ab.game_over, ba.game_over);
        }

        #[test]
        fn prop_game_over_is_sticky(
            seq in proptest::collection::vec((0u32..10, 0u32..10, any::<bool>()), 1..20),
        ) {
            let mut s = session(0, 0);
            let mut seen = false;
            for (p1, p2, over) in seq {
                s = merge(&s, &incoming(p1, p2, over));
                seen |= over;
                prop_assert_eq!(s.game_over, seen);
            }
        }
    }
}
