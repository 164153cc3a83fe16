//! Error types for pixel-ws

use thiserror::Error;

/// Faults on the socket itself. Never fatal: the session reconnects.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("TLS setup error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Connection refused: {0}")]
    Refused(String),

    #[error("Connection dropped: {0}")]
    Dropped(String),
}

/// Faults from the login collaborator. Fatal to one connection attempt only.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("HTTP error during login: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login page did not contain a signature")]
    SignatureNotFound,

    #[error("login rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("login: {0}")]
    Login(#[from] LoginError),

    #[error("not connected; frame dropped")]
    NotConnected,

    #[error("a connection is already active")]
    AlreadyActive,
}
