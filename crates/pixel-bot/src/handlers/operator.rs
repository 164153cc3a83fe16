//! Operator commands: flag toggles, impersonation identity, `say`

use pixel_types::Identity;
use tracing::info;

use crate::context::CommandContext;
use crate::errors::HandlerError;
use crate::flags::Flag;

/// `debug|local|testing|jokes [true|false]`. An empty argument flips.
pub fn toggle(ctx: &mut CommandContext<'_>, flag: Flag, argument: &str) -> Result<(), HandlerError> {
    match ctx.state.flags.apply(flag, argument) {
        Some(value) => {
            info!(flag = %flag, value, by = %ctx.true_sender, "Runtime flag changed");
            ctx.debug(format!("{} set to {}. {}", flag, value, flag.describe()));
        }
        None => ctx.debug(format!(
            "Failed to set {} value, expects \"true\" or \"false\", received {}",
            flag,
            argument.trim()
        )),
    }
    Ok(())
}

/// `name <identity>`: who whitelisted senders become in testing mode.
pub fn name(ctx: &mut CommandContext<'_>, argument: &str) -> Result<(), HandlerError> {
    let id = Identity::new(argument);
    if id.is_empty() {
        let current = ctx.state.flags.fake_identity.clone();
        ctx.debug(format!("Impersonation identity is {}. Use name <identity> to change it.", current));
        return Ok(());
    }
    ctx.state.flags.fake_identity = id.clone();
    ctx.debug(format!(
        "Impersonation identity set to {}. Set testing to true to use.",
        id
    ));
    Ok(())
}

/// `say <text>`: relayed verbatim through the normal response path.
pub fn say(ctx: &mut CommandContext<'_>, argument: &str) -> Result<(), HandlerError> {
    if !argument.is_empty() {
        ctx.reply(argument);
    }
    Ok(())
}
