//! Explicit state handed to every handler call

use std::collections::HashMap;
use std::time::Duration;

use chrono::Local;
use pixel_types::Identity;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::error;

use crate::config::BotConfig;
use crate::flags::RuntimeFlags;
use crate::responder::Reply;
use crate::store::AclStore;

/// Handler-facing settings that never change at runtime.
#[derive(Debug, Clone)]
pub struct Settings {
    pub sigil: char,
    pub wiki_url: String,
    pub rules_url: String,
    /// One in `user_joke_odds` lookups by a user with jokes gets one.
    pub user_joke_odds: u32,
}

impl Settings {
    pub fn from_config(bot: &BotConfig) -> Self {
        Self {
            sigil: bot.sigil,
            wiki_url: bot.wiki_url.clone(),
            rules_url: bot.rules_url.clone(),
            user_joke_odds: 20,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&BotConfig::default())
    }
}

/// The last joke told per pool, so the next pick can avoid it.
#[derive(Debug, Default)]
pub struct JokeMemory {
    help: Option<String>,
    axe: Option<String>,
    users: HashMap<Identity, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JokePool {
    Help,
    Axe,
    User(Identity),
}

impl JokeMemory {
    /// A random entry of `pool` other than the previous pick from the same
    /// pool. A single-entry pool repeats; an empty pool yields `None`.
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        which: JokePool,
        pool: &[String],
        rng: &mut R,
    ) -> Option<String> {
        let last = match &which {
            JokePool::Help => self.help.as_ref(),
            JokePool::Axe => self.axe.as_ref(),
            JokePool::User(id) => self.users.get(id),
        };
        let fresh: Vec<&String> = pool.iter().filter(|j| Some(*j) != last).collect();
        let choice = match fresh.choose(rng) {
            Some(joke) => (*joke).clone(),
            None => pool.first()?.clone(),
        };

        match which {
            JokePool::Help => self.help = Some(choice.clone()),
            JokePool::Axe => self.axe = Some(choice.clone()),
            JokePool::User(id) => {
                self.users.insert(id, choice.clone());
            }
        }
        Some(choice)
    }
}

/// Everything handlers may read or mutate, shared across dispatches.
#[derive(Debug)]
pub struct BotState {
    pub store: AclStore,
    pub flags: RuntimeFlags,
    pub settings: Settings,
    pub jokes: JokeMemory,
}

impl BotState {
    pub fn new(store: AclStore, flags: RuntimeFlags, settings: Settings) -> Self {
        Self {
            store,
            flags,
            settings,
            jokes: JokeMemory::default(),
        }
    }
}

/// One handler invocation's view of the world.
pub struct CommandContext<'a> {
    /// Sender after identity substitution.
    pub sender: Identity,
    pub true_sender: Identity,
    pub command: &'a str,
    pub cooldown: Duration,
    pub state: &'a mut BotState,
    replies: &'a mut Vec<Reply>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        sender: Identity,
        true_sender: Identity,
        command: &'a str,
        cooldown: Duration,
        state: &'a mut BotState,
        replies: &'a mut Vec<Reply>,
    ) -> Self {
        Self {
            sender,
            true_sender,
            command,
            cooldown,
            state,
            replies,
        }
    }

    /// Normal response: public chat unless the debug flag is on.
    pub fn reply(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::public(text));
    }

    /// Always goes to the debug channel.
    pub fn debug(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::debug(text));
    }

    pub fn is_whitelisted(&self) -> bool {
        self.state.store.record().is_whitelisted(&self.sender)
    }

    /// Write the store after a mutation. A failure is logged and reported on
    /// the debug channel; the in-memory change stands.
    pub fn persist(&mut self) {
        if let Err(e) = self.state.store.save() {
            error!(command = %self.command, error = %e, "Failed to save store");
            self.debug(format!("Failed to save changes from {}: {}", self.command, e));
        }
    }
}

/// Local time in the `%c` format used by audit lines.
pub fn timestamp() -> String {
    Local::now().format("%c").to_string()
}
