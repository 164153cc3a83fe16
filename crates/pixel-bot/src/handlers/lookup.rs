//! Wiki lookup and the joke commands

use rand::Rng;
use tracing::info;
use url::Url;

use super::PUBLIC_COMMANDS;
use crate::context::{timestamp, CommandContext, JokePool};
use crate::errors::HandlerError;

const HI_REFUSAL: &str = "I'm not ChatGPT, I won't pretend to be your girlfriend.";
const WOOF_REPLY: &str = "Woof!";

/// `wiki <term>[@anything]`: a search link on the wiki.
///
/// Shortcut keys are swapped for their text before the link is built.
pub fn wiki(ctx: &mut CommandContext<'_>, argument: &str) -> Result<(), HandlerError> {
    let sender = ctx.sender.clone();

    if ctx.state.store.record().is_alt_trader(&sender) {
        let rules = ctx.state.settings.rules_url.clone();
        ctx.reply(format!(
            "I think this is the link you're looking for: {} (under alt trading)",
            rules
        ));
        ctx.debug(format!("{} triggered alt trader response @ {}", sender, timestamp()));
        return Ok(());
    }

    let term = argument.split('@').next().unwrap_or_default().trim();
    if term.is_empty() {
        let sigil = ctx.state.settings.sigil;
        ctx.reply(format!(
            "Use {}wiki <search term>. Cooldown applied, try again in {} seconds",
            sigil,
            ctx.cooldown.as_secs()
        ));
        return Ok(());
    }

    if ctx.state.store.record().contains_profanity(term) {
        info!(sender = %sender, "Profanity in wiki search");
        ctx.debug(format!("Profanity detected from {} at {}", sender, timestamp()));
        return Ok(());
    }

    if term.eq_ignore_ascii_case("hi") {
        ctx.reply(HI_REFUSAL);
        ctx.debug(format!("{} said hi at {}", sender, timestamp()));
        return Ok(());
    }

    let search = ctx.state.store.shortcut(term).unwrap_or(term).to_string();
    let link = Url::parse_with_params(&ctx.state.settings.wiki_url, &[("search", &search)])?;

    let odds = ctx.state.settings.user_joke_odds.max(1);
    let pool = ctx.state.store.record().jokes.users.get(&sender).cloned();
    let joke = match pool {
        Some(pool) if ctx.state.flags.jokes && rand::thread_rng().gen_range(0..odds) == 0 => {
            ctx.state
                .jokes
                .pick(JokePool::User(sender.clone()), &pool, &mut rand::thread_rng())
        }
        _ => None,
    };

    match joke.filter(|j| !j.trim().is_empty()) {
        Some(joke) => {
            ctx.reply(format!("{} {}", joke, link));
            ctx.debug(format!(
                "{} triggered a joke with {} at {}",
                sender,
                term,
                timestamp()
            ));
        }
        None => ctx.reply(link.to_string()),
    }
    Ok(())
}

/// Whitelisted senders get the command list, everyone else a help joke.
pub fn help(ctx: &mut CommandContext<'_>, _argument: &str) -> Result<(), HandlerError> {
    let sigil = ctx.state.settings.sigil;
    if ctx.is_whitelisted() {
        let list: Vec<String> = PUBLIC_COMMANDS
            .iter()
            .map(|c| format!("{}{}", sigil, c))
            .collect();
        ctx.reply(format!("Available functions: {}", list.join(", ")));
        return Ok(());
    }

    let pool = ctx.state.store.record().jokes.help.clone();
    match ctx
        .state
        .jokes
        .pick(JokePool::Help, &pool, &mut rand::thread_rng())
    {
        Some(joke) => ctx.reply(joke),
        None => ctx.reply(format!("Use {}wiki <search term> to search the wiki", sigil)),
    }
    Ok(())
}

pub fn woof(ctx: &mut CommandContext<'_>, _argument: &str) -> Result<(), HandlerError> {
    ctx.reply(WOOF_REPLY);
    Ok(())
}

pub fn axe(ctx: &mut CommandContext<'_>, _argument: &str) -> Result<(), HandlerError> {
    let pool = ctx.state.store.record().jokes.axe.clone();
    match ctx
        .state
        .jokes
        .pick(JokePool::Axe, &pool, &mut rand::thread_rng())
    {
        Some(joke) => ctx.reply(joke),
        None => ctx.debug("No axe jokes configured"),
    }
    Ok(())
}
