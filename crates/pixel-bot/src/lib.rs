//! # pixel-bot
//!
//! The wiki bot that sits on an Idle Pixel connection:
//! - [`config`]: TOML / environment configuration
//! - [`store`]: access lists, shortcuts and jokes, persisted after every change
//! - [`dispatcher`]: command table and the gate chain (blacklist, whitelist,
//!   cooldown, audit) in front of every handler
//! - [`handlers`]: the commands themselves
//! - [`responder`]: public vs debug-channel reply framing
//! - [`bridge`]: glue between the session's frames and the dispatcher

pub mod bridge;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod errors;
pub mod flags;
pub mod handlers;
pub mod responder;
pub mod store;

pub use bridge::Bridge;
pub use config::Config;
pub use context::{BotState, CommandContext, Settings};
pub use dispatcher::{AccessPolicy, Command, Dispatch, Dispatcher, Gates};
pub use errors::{HandlerError, StoreError};
pub use flags::{Flag, RuntimeFlags};
pub use responder::{Reply, Responder};
pub use store::{AclStore, JsonFileBackend, StoreBackend};

#[cfg(any(test, feature = "test-support"))]
pub use store::MemoryBackend;
