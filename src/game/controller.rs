//! Click-race state machine
//!
//! `Idle -> Playing -> Over`, with `play_again` from either peer re-entering
//! `Playing`. Each peer declares its own game over; there is no single
//! authority ending the session.

use super::schedule::{Scheduler, TaskHandle};
use super::session::Session;
use super::transport::{EventKind, Mode, Transport, TransportEvent};
use crate::consts::{INITIAL_BROADCAST_DELAY, RESTART_BROADCAST_DELAY};
use crate::error::{SyncError, TransportError};
use crate::sync::{GameOutcome, IncomingState, PlayerId, PlayerInfo, StateUpdate, SyncState, merge};

/// Phase of the click race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the roster (multiplayer) or for `start`
    Idle,
    /// Clicks count
    Playing,
    /// Game over declared; only `play_again` leaves this phase
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Broadcast,
}

/// Owns the session counters and drives the transport
#[derive(Debug)]
pub struct GameController {
    mode: Mode,
    threshold: u32,
    phase: GamePhase,
    session: Session,
    /// Latest remote state received before the roster
    pending: Option<SyncState>,
    scheduler: Scheduler<Task>,
    broadcast_task: Option<TaskHandle>,
    /// Bumped on every restart so the scene can reset the arena
    generation: u32,
    score_text: String,
    muted: bool,
}

impl GameController {
    pub fn new(mode: Mode, threshold: u32) -> Self {
        let mut controller = Self {
            mode,
            threshold,
            phase: GamePhase::Idle,
            session: Session::default(),
            pending: None,
            scheduler: Scheduler::new(),
            broadcast_task: None,
            generation: 0,
            score_text: String::new(),
            muted: false,
        };
        controller.refresh_text();
        controller
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// HUD line, e.g. `Score: 1/3`
    pub fn score_text(&self) -> &str {
        &self.score_text
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn has_pending_broadcast(&self) -> bool {
        self.broadcast_task.is_some()
    }

    /// Register listeners, signal ready, and begin play (solo) or wait for
    /// the roster (multiplayer).
    pub fn start<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        for kind in EventKind::required(self.mode) {
            transport.listen(*kind)?;
        }

        log::info!("Calling ready() in {:?} mode", self.mode);
        transport.ready(self.mode)?;

        match self.mode {
            Mode::Solo => self.begin(),
            Mode::Multiplayer => self.schedule_broadcast(INITIAL_BROADCAST_DELAY),
        }
        Ok(())
    }

    /// Handle a local click
    pub fn click<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        if self.phase != GamePhase::Playing {
            log::debug!("[Player {}] Click ignored in {:?}", self.session.me_id, self.phase);
            return Ok(());
        }

        let clicks = self.session.record_local_click();
        self.refresh_text();

        if clicks < self.threshold {
            return self.broadcast(transport);
        }

        log::info!("[Player {}] Reached {} clicks", self.session.me_id, clicks);
        self.session.game_over = true;
        self.phase = GamePhase::Over;

        // Tell the peer first, then the host; a failed broadcast must not
        // suppress our own announcement
        let sent = self.broadcast(transport);
        let declared = self.declare_game_over(transport);
        sent.and(declared)
    }

    /// Handle an event delivered by the host
    pub fn handle_event<T: Transport + ?Sized>(
        &mut self,
        event: TransportEvent,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        match event {
            TransportEvent::PlayAgain
                if self.mode.is_multiplayer() && self.phase == GamePhase::Idle =>
            {
                // No session to restart yet; the roster starts it
                log::info!("[Player {}] Play again before roster, waiting", self.session.me_id);
                self.pending = None;
                Ok(())
            }
            TransportEvent::PlayAgain => {
                log::info!("[Player {}] Play again triggered", self.session.me_id);
                self.restart();
                if self.mode.is_multiplayer() {
                    self.schedule_broadcast(RESTART_BROADCAST_DELAY);
                }
                Ok(())
            }
            TransportEvent::ToggleMute { is_muted } => {
                log::info!("Toggle mute: {}", is_muted);
                self.muted = is_muted;
                Ok(())
            }
            TransportEvent::GameInfo { players, me_id } => {
                self.on_game_info(players, me_id, transport)
            }
            TransportEvent::GameStateUpdated(incoming) => {
                self.on_state_updated(incoming, transport)
            }
        }
    }

    /// Advance the controller's clock, running due broadcasts
    pub fn advance<T: Transport + ?Sized>(
        &mut self,
        dt: f32,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        let mut result = Ok(());
        for (handle, task) in self.scheduler.advance(dt) {
            if self.broadcast_task == Some(handle) {
                self.broadcast_task = None;
            }
            let outcome = match task {
                Task::Broadcast => self.broadcast(transport),
            };
            result = result.and(outcome);
        }
        result
    }

    /// Outcome as it would be declared now
    pub fn outcome(&self) -> GameOutcome {
        match self.mode {
            Mode::Solo => GameOutcome::Solo {
                score: self.session.local_clicks,
            },
            Mode::Multiplayer => GameOutcome::Multiplayer {
                scores: self.session.scores(),
            },
        }
    }

    fn on_game_info<T: Transport + ?Sized>(
        &mut self,
        players: Vec<PlayerInfo>,
        me_id: PlayerId,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        log::info!("[Player {}] Initialized with {} players", me_id, players.len());
        self.session.me_id = me_id;
        self.session.players = players;

        if self.phase != GamePhase::Idle {
            return Ok(());
        }

        self.begin();
        let applied = match self.pending.take() {
            Some(state) => self.apply_remote(state, transport),
            None => Ok(()),
        };

        // The initial broadcast may already have run without a roster
        let sent = if self.broadcast_task.is_none() {
            self.broadcast(transport)
        } else {
            Ok(())
        };
        applied.and(sent)
    }

    fn on_state_updated<T: Transport + ?Sized>(
        &mut self,
        incoming: IncomingState,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        match incoming {
            IncomingState::Valid { id, state } => {
                log::debug!(
                    "[Player {}] Received state {:?}: {:?}",
                    self.session.me_id,
                    id,
                    state
                );
                self.apply_remote(state, transport)
            }
            IncomingState::Absent if self.phase == GamePhase::Idle => {
                log::debug!("[Player {}] No state yet, waiting for roster", self.session.me_id);
                self.pending = None;
                Ok(())
            }
            IncomingState::Absent => {
                log::info!("[Player {}] No state yet, setting up new game", self.session.me_id);
                self.setup_new_game(transport)
            }
            IncomingState::Malformed(reason) => {
                log::warn!(
                    "[Player {}] Malformed state ({}), setting up new game",
                    self.session.me_id,
                    reason
                );
                if self.phase == GamePhase::Idle {
                    self.pending = None;
                    return Ok(());
                }
                self.setup_new_game(transport)
            }
        }
    }

    fn apply_remote<T: Transport + ?Sized>(
        &mut self,
        state: SyncState,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        if self.phase == GamePhase::Idle {
            log::debug!("[Player {}] Holding state until roster arrives", self.session.me_id);
            self.pending = Some(state);
            return Ok(());
        }

        let before = self.session.local_clicks;
        self.session = merge(&self.session, &state);
        if self.session.local_clicks != before {
            log::info!(
                "[Player {}] Adopted own count {} from peer",
                self.session.me_id,
                self.session.local_clicks
            );
            self.refresh_text();
        }

        if self.phase == GamePhase::Playing && self.session.game_over {
            log::info!("[Player {}] Other player triggered game over", self.session.me_id);
            self.phase = GamePhase::Over;
            return self.declare_game_over(transport);
        }
        Ok(())
    }

    /// Enter `Playing` with zeroed counters
    fn begin(&mut self) {
        self.session.reset();
        self.phase = GamePhase::Playing;
        self.refresh_text();
    }

    /// Start a new session, invalidating any broadcast scheduled for the old one
    fn restart(&mut self) {
        self.cancel_broadcast();
        self.pending = None;
        self.begin();
        self.generation += 1;
    }

    fn setup_new_game<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        self.restart();
        self.broadcast(transport)
    }

    fn schedule_broadcast(&mut self, delay: f32) {
        self.cancel_broadcast();
        self.broadcast_task = Some(self.scheduler.schedule(delay, Task::Broadcast));
    }

    fn cancel_broadcast(&mut self) {
        if let Some(handle) = self.broadcast_task.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn broadcast<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), TransportError> {
        if !self.mode.is_multiplayer() {
            return Ok(());
        }

        let data = match SyncState::from_session(&self.session) {
            Ok(data) => data,
            Err(SyncError::MissingRoster) => {
                log::warn!(
                    "[Player {}] Cannot send state - no player info yet",
                    self.session.me_id
                );
                return Ok(());
            }
        };
        let alert_user_ids = self.session.remote_id().cloned().into_iter().collect();

        log::debug!("[Player {}] Sending state: {:?}", self.session.me_id, data);
        transport.update_game_state(&StateUpdate { data, alert_user_ids })
    }

    fn declare_game_over<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        let outcome = self.outcome();
        log::info!("[Player {}] Game over: {:?}", self.session.me_id, outcome);
        transport.game_over(&outcome)
    }

    fn refresh_text(&mut self) {
        self.score_text = format!("Score: {}/{}", self.session.local_clicks, self.threshold);
    }
}
