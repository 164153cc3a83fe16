//! The registered command set

#[path = "handlers_tests.rs"]
mod handlers_tests;

pub mod lists;
pub mod lookup;
pub mod operator;
pub mod shortcuts;

use crate::dispatcher::{AccessPolicy, Command, Dispatcher, Gates};
use crate::flags::Flag;
use crate::store::AccessList;

/// Commands listed to whitelisted senders by `help`.
pub const PUBLIC_COMMANDS: &[&str] = &["wiki", "add", "remove", "keys", "axe"];

/// Every command the bot answers to, gated as documented on each handler.
pub fn dispatcher(gates: Gates) -> Dispatcher {
    use AccessPolicy::{Cooldown, SuperUser, WhitelistOnly};

    let mut d = Dispatcher::new(gates)
        .register("wiki", Command::new(Cooldown, lookup::wiki))
        .register("help", Command::new(Cooldown, lookup::help))
        .register(
            pixel_types::frame::WOOF_COMMAND,
            Command::new(Cooldown, lookup::woof),
        )
        .register("axe", Command::new(WhitelistOnly, lookup::axe))
        .register("add", Command::new(WhitelistOnly, shortcuts::add))
        .register("remove", Command::new(WhitelistOnly, shortcuts::remove))
        .register("keys", Command::new(WhitelistOnly, shortcuts::keys))
        .register("say", Command::new(WhitelistOnly, operator::say))
        .register(
            "name",
            Command::new(WhitelistOnly, operator::name).with_true_sender(),
        );

    for flag in Flag::ALL {
        d = d.register(
            flag.name(),
            Command::new(WhitelistOnly, move |ctx, arg| operator::toggle(ctx, flag, arg))
                .with_true_sender(),
        );
    }

    for (name, policy, list, add) in [
        ("allow", SuperUser, AccessList::Whitelist, true),
        ("disallow", SuperUser, AccessList::Whitelist, false),
        ("ban", WhitelistOnly, AccessList::Blacklist, true),
        ("unban", WhitelistOnly, AccessList::Blacklist, false),
        ("alttrader", WhitelistOnly, AccessList::AltTraders, true),
        ("unalttrader", WhitelistOnly, AccessList::AltTraders, false),
    ] {
        d = d.register(
            name,
            Command::new(policy, move |ctx, arg| lists::edit(ctx, list, add, arg)),
        );
    }

    d
}
