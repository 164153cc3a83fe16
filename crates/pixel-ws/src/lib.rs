//! # pixel-ws
//!
//! The transport side of the Idle Pixel bot:
//! - [`Session`]: the open → authenticate → active → closed → reconnect state machine
//! - [`Connector`] / [`Transport`]: seams over the websocket so tests never open a socket
//! - [`SignatureProvider`]: the login collaborator that yields the `LOGIN=` signature
//! - [`Clock`]: time seam shared with the dispatcher's cooldown ledger
//! - Scripted mocks for all of the above (with the `test-support` feature)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use pixel_ws::{FrameHandler, FrameSink, ReconnectPolicy, Session, StaticSignature, SystemClock, WsConnector};
//!
//! struct Echo;
//!
//! impl FrameHandler for Echo {
//!     async fn on_frame<S: FrameSink>(&mut self, frame: &str, sink: &mut S) {
//!         let _ = sink.send_frame(frame.to_string()).await;
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = Session::new(
//!         WsConnector::new("wss://server1.idle-pixel.com"),
//!         StaticSignature::new("sig"),
//!         SystemClock,
//!         ReconnectPolicy::Fixed(Duration::from_secs(10)),
//!     );
//!     session.start(&mut Echo).await;
//! }
//! ```

pub mod clock;
pub mod error;
pub mod login;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use clock::{Clock, SystemClock};
pub use error::{LoginError, SessionError, TransportError};
pub use login::{HttpLogin, SignatureProvider, StaticSignature};
pub use session::{FrameHandler, FrameSink, ReconnectPolicy, Session, SessionState};
pub use transport::{Connector, Transport, WsConnector, WsTransport};

#[cfg(any(test, feature = "test-support"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-support"))]
pub use mocks::{MockConnector, MockLogin, MockSink, MockTransport};
