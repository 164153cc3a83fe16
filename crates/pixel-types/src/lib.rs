//! Shared types for the Idle Pixel chat integration
//!
//! - [`frame`]: decode inbound `TAG=payload` frames into [`Event`]s and encode replies.
//! - [`identity`]: case-normalised player identities.
//! - [`store`]: the persisted allow/deny lists, shortcuts and joke book.
//! - [`policies`]: trust-tier checks over the persisted lists (blacklist wins).

pub mod error;
pub mod frame;
pub mod identity;
pub mod policies;
pub mod store;

pub use error::DecodeError;
pub use frame::{
    encode_chat, encode_custom, encode_login, Callout, CommandCall, Decoder, Event, EventKind,
};
pub use identity::Identity;
pub use policies::{BanPatterns, Standing};
pub use store::{Credentials, JokeBook, StoreRecord};
