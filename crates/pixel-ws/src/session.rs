//! Connection lifecycle: connect, authenticate, pump frames, reconnect.
//!
//! ```text
//! Idle ──open──▶ Connecting ──▶ Authenticating ──LOGIN sent──▶ Active
//!                    ▲                                           │
//!                    └──────── delay ◀──────── Closed ◀──────────┘
//! ```
//!
//! Inbound frames are handled strictly one at a time: the next frame is not
//! read until [`FrameHandler::on_frame`] has returned, so replies are always
//! written in the order their commands arrived.

#[path = "session_tests.rs"]
mod session_tests;

use std::time::Duration;

use pixel_types::encode_login;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::error::SessionError;
use crate::login::SignatureProvider;
use crate::transport::{Connector, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Authenticating,
    Active,
    Closed,
}

/// How long to wait before the next connection attempt.
///
/// `attempt` counts consecutive failed opens since the last session that
/// reached `Active`; it is `0` right after a healthy session drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Fixed(Duration),
    /// Doubles per failed attempt, never exceeding `max`.
    Capped { base: Duration, max: Duration },
}

impl ReconnectPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Capped { base, max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Where replies go. Implemented by [`Session`]; tests use a recording sink.
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    async fn send_frame(&mut self, frame: String) -> Result<(), SessionError>;
}

/// Consumer of inbound frames.
#[allow(async_fn_in_trait)]
pub trait FrameHandler {
    async fn on_frame<S: FrameSink>(&mut self, frame: &str, sink: &mut S);
}

pub struct Session<C: Connector, L, K> {
    connector: C,
    login: L,
    clock: K,
    policy: ReconnectPolicy,
    state: SessionState,
    transport: Option<C::Transport>,
    failures: u32,
    connections: u64,
}

impl<C, L, K> Session<C, L, K>
where
    C: Connector,
    L: SignatureProvider,
    K: Clock,
{
    pub fn new(connector: C, login: L, clock: K, policy: ReconnectPolicy) -> Self {
        Self {
            connector,
            login,
            clock,
            policy,
            state: SessionState::Idle,
            transport: None,
            failures: 0,
            connections: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of sessions that reached `Active`.
    pub fn connections(&self) -> u64 {
        self.connections
    }

    /// Consecutive failed opens since the last `Active` session.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Connect, obtain a signature and send `LOGIN=`. On success the session
    /// is `Active` and the failure counter is reset.
    #[instrument(name = "session.open", skip(self), fields(attempt = self.failures))]
    pub async fn open(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Active {
            return Err(SessionError::AlreadyActive);
        }

        self.state = SessionState::Connecting;
        let mut transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(e.into());
            }
        };

        self.state = SessionState::Authenticating;
        let signature = match self.login.signature().await {
            Ok(signature) => signature,
            Err(e) => {
                transport.close().await;
                self.state = SessionState::Closed;
                return Err(e.into());
            }
        };

        if let Err(e) = transport.send(encode_login(&signature)).await {
            self.state = SessionState::Closed;
            return Err(e.into());
        }

        self.transport = Some(transport);
        self.state = SessionState::Active;
        self.failures = 0;
        self.connections += 1;
        info!(connection = self.connections, "Session active");
        Ok(())
    }

    /// Next inbound frame, or `None` once the connection is gone. Any
    /// transport fault ends the session; it is never surfaced to handlers.
    pub async fn next_frame(&mut self) -> Option<String> {
        let transport = self.transport.as_mut()?;
        match transport.recv().await {
            Some(Ok(frame)) => {
                debug!(frame = %frame, "Frame received");
                Some(frame)
            }
            Some(Err(e)) => {
                warn!(error = %e, "Transport error, closing session");
                self.mark_closed();
                None
            }
            None => {
                info!("Connection closed by peer");
                self.mark_closed();
                None
            }
        }
    }

    /// One full connection: wait out the reconnect delay if a previous
    /// session closed, open, then feed every frame to `handler` until the
    /// connection ends.
    pub async fn run_once<H: FrameHandler>(&mut self, handler: &mut H) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            let delay = self.policy.delay(self.failures);
            info!(delay_secs = delay.as_secs_f64(), attempt = self.failures, "Reconnecting after delay");
            self.clock.sleep(delay).await;
        }

        if self.state != SessionState::Active {
            if let Err(e) = self.open().await {
                self.failures = self.failures.saturating_add(1);
                return Err(e);
            }
        }

        while let Some(frame) = self.next_frame().await {
            handler.on_frame(&frame, self).await;
        }
        Ok(())
    }

    /// Runs sessions back to back forever. Stop it by dropping the future.
    pub async fn start<H: FrameHandler>(&mut self, handler: &mut H) {
        loop {
            if let Err(e) = self.run_once(handler).await {
                warn!(error = %e, failures = self.failures, "Connection attempt failed");
            }
        }
    }

    /// Close the current connection, if any. Used on shutdown.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        self.state = SessionState::Closed;
    }

    fn mark_closed(&mut self) {
        self.transport = None;
        self.state = SessionState::Closed;
    }
}

impl<C, L, K> FrameSink for Session<C, L, K>
where
    C: Connector,
    L: SignatureProvider,
    K: Clock,
{
    async fn send_frame(&mut self, frame: String) -> Result<(), SessionError> {
        let Some(transport) = self.transport.as_mut() else {
            warn!(frame = %frame, "No active connection, dropping outbound frame");
            return Err(SessionError::NotConnected);
        };
        if let Err(e) = transport.send(frame).await {
            warn!(error = %e, "Send failed, closing session");
            self.mark_closed();
            return Err(e.into());
        }
        Ok(())
    }
}
