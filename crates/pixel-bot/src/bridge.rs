//! Frame bridge: decode → dispatch → render → send.
//!
//! Runs inside the session's read loop, so each frame's replies are written
//! before the next frame is read.

#[path = "bridge_tests.rs"]
mod bridge_tests;

use pixel_types::{Decoder, EventKind};
use pixel_ws::{Clock, FrameHandler, FrameSink};
use tracing::{debug, trace, warn};

use crate::context::BotState;
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::responder::{Reply, Responder};

pub struct Bridge<K: Clock> {
    decoder: Decoder,
    dispatcher: Dispatcher,
    responder: Responder,
    state: BotState,
    clock: K,
    dispatched: u64,
}

impl<K: Clock> Bridge<K> {
    pub fn new(
        decoder: Decoder,
        dispatcher: Dispatcher,
        responder: Responder,
        state: BotState,
        clock: K,
    ) -> Self {
        Self {
            decoder,
            dispatcher,
            responder,
            state,
            clock,
            dispatched: 0,
        }
    }

    /// Number of events handed to the dispatcher so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BotState {
        &mut self.state
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Decode one frame and dispatch it if it carries a command. Returns
    /// the replies to send, in order.
    pub fn handle(&mut self, frame: &str) -> Option<(Dispatch, Vec<Reply>)> {
        let event = match self.decoder.decode(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, frame = %frame, "Dropping malformed frame");
                return None;
            }
        };

        let dispatchable = event.is_dispatchable();
        let Some(call) = event.command.filter(|_| dispatchable) else {
            match event.kind {
                EventKind::Ignored => trace!(tag = %event.tag, "Ignored frame"),
                EventKind::Unknown => {
                    debug!(tag = %event.tag, frame = %event.text, "Unrecognised frame")
                }
                EventKind::CustomOther => {
                    debug!(sender = %event.sender, payload = %event.text, "Custom frame without a command")
                }
                EventKind::Chat | EventKind::Custom => trace!(sender = %event.sender, "Chat line"),
            }
            return None;
        };
        self.dispatched += 1;
        let mut replies = Vec::new();
        let outcome = self.dispatcher.dispatch(
            &mut self.state,
            &event.sender,
            &call,
            self.clock.now(),
            &mut replies,
        );
        debug!(command = %call.name, ?outcome, replies = replies.len(), "Dispatched");
        Some((outcome, replies))
    }
}

impl<K: Clock> FrameHandler for Bridge<K> {
    async fn on_frame<S: FrameSink>(&mut self, frame: &str, sink: &mut S) {
        let Some((_, replies)) = self.handle(frame) else {
            return;
        };
        for reply in &replies {
            let Some(out) = self.responder.render(reply, &self.state.flags) else {
                continue;
            };
            if let Err(e) = sink.send_frame(out).await {
                warn!(error = %e, "Reply lost");
            }
        }
    }
}
