//! Scripted stand-ins for the connector, login and sink seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{LoginError, SessionError, TransportError};
use crate::login::SignatureProvider;
use crate::session::FrameSink;
use crate::transport::{Connector, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Close,
    Error,
}

#[derive(Debug)]
enum Script {
    Open { frames: Vec<String>, ending: Ending },
    Refuse,
}

#[derive(Debug, Default)]
struct ConnectorState {
    scripts: VecDeque<Script>,
    attempts: u32,
    sent: Vec<String>,
}

/// Hands out one scripted connection per `connect()`.
///
/// When the script runs out every further attempt is refused. Frames sent
/// on any connection are collected in a single log, readable via `sent()`.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection that delivers `frames` and then closes cleanly.
    pub fn with_session<I, S>(self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(frames, Ending::Close)
    }

    /// A connection that delivers `frames` and then fails with a transport error.
    pub fn with_failing_session<I, S>(self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(frames, Ending::Error)
    }

    pub fn with_refusal(self) -> Self {
        self.state.lock().unwrap().scripts.push_back(Script::Refuse);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.state.lock().unwrap().attempts
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    fn push<I, S>(self, frames: I, ending: Ending) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let frames = frames.into_iter().map(Into::into).collect();
        self.state
            .lock()
            .unwrap()
            .scripts
            .push_back(Script::Open { frames, ending });
        self
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self) -> Result<MockTransport, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;
        match state.scripts.pop_front() {
            Some(Script::Open { frames, ending }) => Ok(MockTransport {
                frames: frames.into(),
                ending: Some(ending),
                closed: false,
                log: Arc::clone(&self.state),
            }),
            Some(Script::Refuse) | None => Err(TransportError::Refused("scripted refusal".into())),
        }
    }
}

#[derive(Debug)]
pub struct MockTransport {
    frames: VecDeque<String>,
    ending: Option<Ending>,
    closed: bool,
    log: Arc<Mutex<ConnectorState>>,
}

impl Transport for MockTransport {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        if let Some(frame) = self.frames.pop_front() {
            return Some(Ok(frame));
        }
        self.closed = true;
        match self.ending.take()? {
            Ending::Close => None,
            Ending::Error => Some(Err(TransportError::Dropped("scripted reset".into()))),
        }
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Dropped("send after close".into()));
        }
        self.log.lock().unwrap().sent.push(frame);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[derive(Debug)]
struct LoginState {
    signature: String,
    failures_left: u32,
    calls: u32,
}

#[derive(Debug, Clone)]
pub struct MockLogin {
    state: Arc<Mutex<LoginState>>,
}

impl MockLogin {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoginState {
                signature: signature.into(),
                failures_left: 0,
                calls: 0,
            })),
        }
    }

    /// The next `count` calls fail with `SignatureNotFound`.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().unwrap().failures_left = count;
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls
    }
}

impl SignatureProvider for MockLogin {
    async fn signature(&self) -> Result<String, LoginError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(LoginError::SignatureNotFound);
        }
        Ok(state.signature.clone())
    }
}

/// Records frames instead of sending them.
#[derive(Debug, Default)]
pub struct MockSink {
    pub sent: Vec<String>,
    pub disconnected: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disconnected() -> Self {
        Self {
            sent: Vec::new(),
            disconnected: true,
        }
    }
}

impl FrameSink for MockSink {
    async fn send_frame(&mut self, frame: String) -> Result<(), SessionError> {
        if self.disconnected {
            return Err(SessionError::NotConnected);
        }
        self.sent.push(frame);
        Ok(())
    }
}
