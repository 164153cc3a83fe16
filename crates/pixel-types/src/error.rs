//! Decode faults for inbound frames

use thiserror::Error;

/// A frame that carries a recognised tag but cannot be parsed.
///
/// Decode faults are never fatal: the frame is dropped and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty frame")]
    Empty,

    #[error("{tag} frame has {found} fields, expected at least {expected}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        found: usize,
    },
}
