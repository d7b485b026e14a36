//! Browser transport backed by `window.FarcadeSDK`
//!
//! SDK callbacks fire on the JS event loop; they only push decoded events
//! into a shared queue, which the frame loop drains via `poll_events`.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::error::TransportError;
use crate::game::{EventKind, Mode, Transport, TransportEvent};
use crate::sync::{GameOutcome, StateUpdate};

#[wasm_bindgen(inline_js = "
    function sdk() {
        if (!window.FarcadeSDK) { throw new Error('FarcadeSDK not loaded'); }
        return window.FarcadeSDK;
    }

    export function sdk_present() {
        return !!window.FarcadeSDK;
    }

    export function sdk_has_multiplayer() {
        const s = window.FarcadeSDK;
        return !!(s && s.multiplayer && s.multiplayer.actions);
    }

    export function sdk_on(name, handler) {
        sdk().on(name, (payload) => {
            const missing = payload === undefined || payload === null;
        handler(missing ? undefined : JSON.stringify(payload));
        });
    }

    export function sdk_ready(multiplayer) {
        const s = sdk();
        const actions = multiplayer ? s.multiplayer.actions : s.singlePlayer.actions;
        actions.ready();
    }

    export function sdk_update_game_state(json) {
        sdk().multiplayer.actions.updateGameState(JSON.parse(json));
    }

    export function sdk_game_over(multiplayer, json) {
        const s = sdk();
        const outcome = JSON.parse(json);
        const actions = multiplayer ? s.multiplayer.actions : s.singlePlayer.actions;
        actions.gameOver(outcome);
    }
")]
extern "C" {
    fn sdk_present() -> bool;
    fn sdk_has_multiplayer() -> bool;
    #[wasm_bindgen(catch)]
    fn sdk_on(name: &str, handler: &Closure<dyn FnMut(Option<String>)>) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn sdk_ready(multiplayer: bool) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn sdk_update_game_state(json: &str) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn sdk_game_over(multiplayer: bool, json: &str) -> Result<(), JsValue>;
}

fn rejected(err: JsValue) -> TransportError {
    TransportError::Rejected(format!("{:?}", err))
}

/// Transport talking to the host page's SDK
pub struct WebTransport {
    queue: Rc<RefCell<VecDeque<TransportEvent>>>,
    /// Keeps SDK callbacks alive for the lifetime of the page
    handlers: Vec<Closure<dyn FnMut(Option<String>)>>,
    listening: HashSet<EventKind>,
    mode: Option<Mode>,
}

impl Default for WebTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebTransport {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
            handlers: Vec::new(),
            listening: HashSet::new(),
            mode: None,
        }
    }

    /// Whether the page loaded the SDK at all
    pub fn is_present(&self) -> bool {
        sdk_present()
    }
}

impl Transport for WebTransport {
    fn supports_multiplayer(&self) -> bool {
        sdk_has_multiplayer()
    }

    fn listen(&mut self, kind: EventKind) -> Result<(), TransportError> {
        if self.mode.is_some() {
            return Err(TransportError::ListenerAfterReady(kind));
        }
        if !sdk_present() {
            return Err(TransportError::Unavailable);
        }
        if !self.listening.insert(kind) {
            return Ok(());
        }

        let queue = self.queue.clone();
        let handler = Closure::<dyn FnMut(Option<String>)>::new(move |json: Option<String>| {
            let payload = match json.as_deref().map(serde_json::from_str::<Value>) {
                Some(Ok(value)) => Some(value),
                Some(Err(e)) => {
                    log::warn!("Unparseable {} payload: {}", kind, e);
                    None
                }
                None => None,
            };
            if let Some(event) = TransportEvent::decode(kind, payload.as_ref()) {
                queue.borrow_mut().push_back(event);
            }
        });
        sdk_on(kind.name(), &handler).map_err(rejected)?;
        self.handlers.push(handler);
        Ok(())
    }

    fn ready(&mut self, mode: Mode) -> Result<(), TransportError> {
        if !sdk_present() {
            return Err(TransportError::Unavailable);
        }
        sdk_ready(mode.is_multiplayer()).map_err(rejected)?;
        self.mode = Some(mode);
        Ok(())
    }

    fn update_game_state(&mut self, update: &StateUpdate) -> Result<(), TransportError> {
        if self.mode.is_none() {
            return Err(TransportError::NotReady);
        }
        let json = serde_json::to_string(update)?;
        sdk_update_game_state(&json).map_err(rejected)
    }

    fn game_over(&mut self, outcome: &GameOutcome) -> Result<(), TransportError> {
        let Some(mode) = self.mode else {
            return Err(TransportError::NotReady);
        };
        let json = serde_json::to_string(outcome)?;
        sdk_game_over(mode.is_multiplayer(), &json).map_err(rejected)
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
