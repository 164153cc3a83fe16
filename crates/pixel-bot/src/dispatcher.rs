//! Command dispatch and the gate chain around every handler.
//!
//! Gates run outermost first:
//!
//! 1. identity substitution (testing mode)
//! 2. blacklist and ban patterns
//! 3. access policy: whitelist-only, super-user, or cooldown
//! 4. audit log entry and debug-channel line
//! 5. the handler
//!
//! The cooldown ledger is keyed by command name, so commands never share a
//! slot. Whitelisted callers bypass it without writing to it.

#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;

use std::collections::HashMap;
use std::time::Duration;

use pixel_types::{BanPatterns, CommandCall, Identity, Standing};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::context::{timestamp, BotState, CommandContext};
use crate::errors::HandlerError;
use crate::responder::Reply;

pub type HandlerFn =
    Box<dyn Fn(&mut CommandContext<'_>, &str) -> Result<(), HandlerError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Whitelisted senders only.
    WhitelistOnly,
    /// Only the configured super-user.
    SuperUser,
    /// Whitelisted senders always; everyone else at most once per window
    /// per command.
    Cooldown,
}

/// A handler plus how it is gated.
pub struct Command {
    policy: AccessPolicy,
    sees_true_sender: bool,
    handler: HandlerFn,
}

impl Command {
    pub fn new<F>(policy: AccessPolicy, handler: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &str) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            policy,
            sees_true_sender: false,
            handler: Box::new(handler),
        }
    }

    /// Skip identity substitution: the command is gated and run as the
    /// real sender even in testing mode.
    pub fn with_true_sender(mut self) -> Self {
        self.sees_true_sender = true;
        self
    }
}

/// Last successful non-bypassed invocation per command name.
#[derive(Debug, Default)]
pub struct CooldownLedger {
    last: HashMap<String, Instant>,
}

impl CooldownLedger {
    /// Records `now` and returns `true` if the window has passed (or the
    /// command was never run); otherwise leaves the entry alone.
    pub fn try_claim(&mut self, command: &str, now: Instant, window: Duration) -> bool {
        if let Some(last) = self.last.get(command) {
            if now.saturating_duration_since(*last) < window {
                return false;
            }
        }
        self.last.insert(command.to_string(), now);
        true
    }

    #[cfg(test)]
    pub(crate) fn last(&self, command: &str) -> Option<Instant> {
        self.last.get(command).copied()
    }
}

/// Gate settings shared by every command.
#[derive(Debug, Clone)]
pub struct Gates {
    pub cooldown: Duration,
    pub bans: BanPatterns,
    pub super_user: Identity,
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Unknown,
    Banned,
    Denied,
    OnCooldown,
    Handled,
    Failed,
}

pub struct Dispatcher {
    commands: HashMap<String, Command>,
    ledger: CooldownLedger,
    gates: Gates,
}

impl Dispatcher {
    pub fn new(gates: Gates) -> Self {
        Self {
            commands: HashMap::new(),
            ledger: CooldownLedger::default(),
            gates,
        }
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register(mut self, name: &str, command: Command) -> Self {
        self.commands.insert(name.to_lowercase(), command);
        self
    }

    #[cfg(test)]
    pub(crate) fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    pub fn dispatch(
        &mut self,
        state: &mut BotState,
        sender: &Identity,
        call: &CommandCall,
        now: Instant,
        replies: &mut Vec<Reply>,
    ) -> Dispatch {
        let name = call.name.as_str();
        let Some(command) = self.commands.get(name) else {
            warn!(command = %name, sender = %sender, "Unknown command");
            return Dispatch::Unknown;
        };

        let record = state.store.record();
        // Only a trusted sender is impersonated; a banned one stays banned.
        let effective = if state.flags.testing
            && !command.sees_true_sender
            && record.standing(sender, &self.gates.bans) == Standing::Trusted
        {
            state.flags.fake_identity.clone()
        } else {
            sender.clone()
        };

        let standing = record.standing(&effective, &self.gates.bans);
        if standing == Standing::Banned {
            warn!(sender = %effective, command = %name, "Blacklisted sender rejected");
            replies.push(Reply::debug(format!(
                "Blacklisted user {} attempted to trigger {}",
                effective, name
            )));
            return Dispatch::Banned;
        }

        let trusted = standing == Standing::Trusted;
        match command.policy {
            AccessPolicy::WhitelistOnly if !trusted => {
                return deny(replies, &effective, call);
            }
            AccessPolicy::SuperUser if effective != self.gates.super_user => {
                return deny(replies, &effective, call);
            }
            AccessPolicy::Cooldown if !trusted => {
                if !self.ledger.try_claim(name, now, self.gates.cooldown) {
                    info!(sender = %effective, command = %name, "Command on cooldown");
                    replies.push(Reply::debug(format!(
                        "{} attempted to call {} while on cooldown",
                        effective, name
                    )));
                    return Dispatch::OnCooldown;
                }
            }
            _ => {}
        }

        info!(
            sender = %effective,
            true_sender = %sender,
            command = %name,
            argument = %call.argument,
            "Command triggered"
        );
        replies.push(Reply::debug(audit_line(&effective, call, "triggered")));

        let mut ctx = CommandContext::new(
            effective,
            sender.clone(),
            name,
            self.gates.cooldown,
            state,
            replies,
        );
        match (command.handler)(&mut ctx, &call.argument) {
            Ok(()) => Dispatch::Handled,
            Err(e) => {
                error!(command = %name, error = %e, "Handler failed");
                ctx.debug(format!("Internal error in {}: {}", name, e));
                Dispatch::Failed
            }
        }
    }
}

fn deny(replies: &mut Vec<Reply>, sender: &Identity, call: &CommandCall) -> Dispatch {
    info!(sender = %sender, command = %call.name, "Sender not allowed");
    replies.push(Reply::debug(audit_line(sender, call, "tried to trigger")));
    Dispatch::Denied
}

fn audit_line(sender: &Identity, call: &CommandCall, verb: &str) -> String {
    if call.argument.is_empty() {
        format!("{} {} {} at {}", sender, verb, call.name, timestamp())
    } else {
        format!(
            "{} {} {} with conditions {} at {}",
            sender,
            verb,
            call.name,
            call.argument,
            timestamp()
        )
    }
}
