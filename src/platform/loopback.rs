//! In-process transport connecting peers on the same thread
//!
//! Stands in for the host SDK in the native demo and in tests. Messages go
//! through the same JSON shapes the SDK uses, and the network can be told to
//! duplicate and reorder state updates to exercise the at-least-once,
//! unordered delivery contract.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::{Value, json};

use crate::error::TransportError;
use crate::game::{EventKind, Mode, Transport, TransportEvent};
use crate::sync::{GameOutcome, PlayerId, PlayerInfo, StateUpdate};

/// A raw event waiting in a peer's inbox
#[derive(Debug, Clone)]
struct Envelope {
    kind: EventKind,
    payload: Option<Value>,
}

#[derive(Debug)]
struct Network {
    rng: Pcg32,
    duplicate_chance: f64,
    reorder: bool,
    roster: Vec<PlayerInfo>,
    inboxes: BTreeMap<PlayerId, Vec<Envelope>>,
    next_state_id: u64,
}

impl Network {
    fn deliver(&mut self, to: &str, envelope: Envelope) {
        let Some(inbox) = self.inboxes.get_mut(to) else {
            log::debug!("Dropping {} for unknown player {}", envelope.kind, to);
            return;
        };
        if envelope.kind == EventKind::GameStateUpdated
            && self.rng.random_bool(self.duplicate_chance)
        {
            inbox.push(envelope.clone());
        }
        inbox.push(envelope);
    }
}

/// Shared message hub; cheap to clone
#[derive(Debug, Clone)]
pub struct LoopbackNetwork {
    inner: Rc<RefCell<Network>>,
}

impl LoopbackNetwork {
    /// Reliable, ordered, exactly-once delivery
    pub fn new(seed: u64) -> Self {
        Self::with_chaos(seed, 0.0, false)
    }

    /// Duplicate each state update with probability `duplicate_chance` and,
    /// if `reorder`, shuffle each batch of delivered events
    pub fn with_chaos(seed: u64, duplicate_chance: f64, reorder: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Network {
                rng: Pcg32::seed_from_u64(seed),
                duplicate_chance: duplicate_chance.clamp(0.0, 1.0),
                reorder,
                roster: Vec::new(),
                inboxes: BTreeMap::new(),
                next_state_id: 1,
            })),
        }
    }

    /// Add a participant and return its endpoint
    pub fn join(&self, id: &str, name: &str) -> LoopbackPeer {
        let mut net = self.inner.borrow_mut();
        net.roster.push(PlayerInfo::new(id, name));
        net.inboxes.insert(id.to_string(), Vec::new());
        LoopbackPeer::new(id, true, self.inner.clone())
    }

    /// Endpoint for a single-player host (no multiplayer actions)
    pub fn solo(&self) -> LoopbackPeer {
        self.inner
            .borrow_mut()
            .inboxes
            .insert(crate::game::session::DEFAULT_ME_ID.to_string(), Vec::new());
        LoopbackPeer::new(crate::game::session::DEFAULT_ME_ID, false, self.inner.clone())
    }

    /// Send `game_info` with the full roster to every participant
    pub fn announce_roster(&self) {
        let mut net = self.inner.borrow_mut();
        let players = serde_json::to_value(&net.roster).unwrap_or(Value::Null);
        let ids: Vec<PlayerId> = net.roster.iter().map(|p| p.id.clone()).collect();
        for id in ids {
            let payload = json!({ "players": players, "meId": id });
            net.deliver(
                &id,
                Envelope {
                    kind: EventKind::GameInfo,
                    payload: Some(payload),
                },
            );
        }
    }

    /// Deliver a raw `game_state_updated` payload, e.g. `None` for "no state yet"
    pub fn push_state(&self, to: &str, payload: Option<Value>) {
        self.inner.borrow_mut().deliver(
            to,
            Envelope {
                kind: EventKind::GameStateUpdated,
                payload,
            },
        );
    }

    /// The host's "play again" button, delivered to every participant
    pub fn play_again(&self) {
        let mut net = self.inner.borrow_mut();
        let ids: Vec<PlayerId> = net.inboxes.keys().cloned().collect();
        for id in ids {
            net.deliver(
                &id,
                Envelope {
                    kind: EventKind::PlayAgain,
                    payload: None,
                },
            );
        }
    }
}

/// One participant's view of the loopback network
#[derive(Debug)]
pub struct LoopbackPeer {
    id: PlayerId,
    multiplayer: bool,
    network: Rc<RefCell<Network>>,
    listening: HashSet<EventKind>,
    ready: Option<Mode>,
    sent: Vec<StateUpdate>,
    outcomes: Vec<GameOutcome>,
}

impl LoopbackPeer {
    fn new(id: &str, multiplayer: bool, network: Rc<RefCell<Network>>) -> Self {
        Self {
            id: id.to_string(),
            multiplayer,
            network,
            listening: HashSet::new(),
            ready: None,
            sent: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// State updates this peer has broadcast
    pub fn sent(&self) -> &[StateUpdate] {
        &self.sent
    }

    /// Outcomes this peer has declared
    pub fn outcomes(&self) -> &[GameOutcome] {
        &self.outcomes
    }
}

impl Transport for LoopbackPeer {
    fn supports_multiplayer(&self) -> bool {
        self.multiplayer
    }

    fn listen(&mut self, kind: EventKind) -> Result<(), TransportError> {
        if self.ready.is_some() {
            return Err(TransportError::ListenerAfterReady(kind));
        }
        self.listening.insert(kind);
        Ok(())
    }

    fn ready(&mut self, mode: Mode) -> Result<(), TransportError> {
        log::debug!("[loopback {}] ready ({:?})", self.id, mode);
        self.ready = Some(mode);
        Ok(())
    }

    fn update_game_state(&mut self, update: &StateUpdate) -> Result<(), TransportError> {
        if self.ready.is_none() {
            return Err(TransportError::NotReady);
        }
        if !self.multiplayer {
            return Err(TransportError::Unavailable);
        }

        let data = serde_json::to_value(&update.data)?;
        let mut net = self.network.borrow_mut();
        let state_id = net.next_state_id;
        net.next_state_id += 1;

        for to in &update.alert_user_ids {
            let payload = json!({ "id": state_id.to_string(), "data": data });
            net.deliver(
                to,
                Envelope {
                    kind: EventKind::GameStateUpdated,
                    payload: Some(payload),
                },
            );
        }
        drop(net);

        self.sent.push(update.clone());
        Ok(())
    }

    fn game_over(&mut self, outcome: &GameOutcome) -> Result<(), TransportError> {
        if self.ready.is_none() {
            return Err(TransportError::NotReady);
        }
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut net = self.network.borrow_mut();
        let mut batch = net
            .inboxes
            .get_mut(&self.id)
            .map(std::mem::take)
            .unwrap_or_default();
        if net.reorder {
            batch.shuffle(&mut net.rng);
        }
        drop(net);

        batch
            .into_iter()
            .filter(|envelope| {
                let heard = self.listening.contains(&envelope.kind);
                if !heard {
                    log::debug!("[loopback {}] No listener for {}", self.id, envelope.kind);
                }
                heard
            })
            .filter_map(|envelope| TransportEvent::decode(envelope.kind, envelope.payload.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{IncomingState, SyncState};

    #[test]
    fn test_listen_after_ready_is_rejected() {
        let network = LoopbackNetwork::new(0);
        let mut peer = network.join("a", "Alice");
        peer.ready(Mode::Multiplayer).unwrap();

        let err = peer.listen(EventKind::PlayAgain).unwrap_err();
        assert!(matches!(err, TransportError::ListenerAfterReady(EventKind::PlayAgain)));
    }

    #[test]
    fn test_update_before_ready_is_rejected() {
        let network = LoopbackNetwork::new(0);
        let mut peer = network.join("a", "Alice");
        let update = StateUpdate {
            data: SyncState::default(),
            alert_user_ids: vec!["b".into()],
        };
        assert!(matches!(peer.update_game_state(&update), Err(TransportError::NotReady)));
    }

    #[test]
    fn test_state_reaches_alerted_peer() {
        let network = LoopbackNetwork::new(0);
        let mut alice = network.join("a", "Alice");
        let mut bob = network.join("b", "Bob");
        bob.listen(EventKind::GameStateUpdated).unwrap();
        alice.ready(Mode::Multiplayer).unwrap();
        bob.ready(Mode::Multiplayer).unwrap();

        let mut data = SyncState::default();
        data.click_counts.insert("a".into(), 2);
        alice
            .update_game_state(&StateUpdate {
                data: data.clone(),
                alert_user_ids: vec!["b".into()],
            })
            .unwrap();

        let events = bob.poll_events();
        assert_eq!(events.len(), 1);
        let TransportEvent::GameStateUpdated(IncomingState::Valid { id, state }) = &events[0] else {
            panic!("expected a valid state");
        };
        assert_eq!(id.as_deref(), Some("1"));
        assert_eq!(state, &data);
        assert!(alice.poll_events().is_empty());
        assert_eq!(alice.sent().len(), 1);
    }

    #[test]
    fn test_unlistened_events_are_dropped() {
        let network = LoopbackNetwork::new(0);
        let mut peer = network.solo();
        peer.listen(EventKind::PlayAgain).unwrap();
        peer.ready(Mode::Solo).unwrap();

        network.push_state(peer.id(), None);
        network.play_again();

        assert_eq!(peer.poll_events(), vec![TransportEvent::PlayAgain]);
    }

    #[test]
    fn test_roster_announcement() {
        let network = LoopbackNetwork::new(0);
        let mut alice = network.join("a", "Alice");
        let _bob = network.join("b", "Bob");
        alice.listen(EventKind::GameInfo).unwrap();

        network.announce_roster();
        let events = alice.poll_events();
        let [TransportEvent::GameInfo { players, me_id }] = events.as_slice() else {
            panic!("expected one game_info");
        };
        assert_eq!(me_id, "a");
        assert_eq!(players.len(), 2);
    }

    #[test]
    fn test_duplication() {
        let network = LoopbackNetwork::with_chaos(0, 1.0, false);
        let mut peer = network.join("a", "Alice");
        peer.listen(EventKind::GameStateUpdated).unwrap();

        network.push_state("a", None);
        assert_eq!(peer.poll_events().len(), 2);
    }
}
