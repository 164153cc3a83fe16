//! Access list edits: allow/disallow, ban/unban, alttrader/unalttrader

use pixel_types::Identity;

use crate::context::CommandContext;
use crate::errors::HandlerError;
use crate::store::AccessList;

pub fn edit(
    ctx: &mut CommandContext<'_>,
    list: AccessList,
    add: bool,
    argument: &str,
) -> Result<(), HandlerError> {
    let id = Identity::new(argument.split_whitespace().next().unwrap_or_default());
    if id.is_empty() {
        let sigil = ctx.state.settings.sigil;
        let command = ctx.command.to_string();
        ctx.reply(format!("Use {}{} <player>", sigil, command));
        return Ok(());
    }

    let changed = if add {
        ctx.state.store.insert(list, id.clone())
    } else {
        ctx.state.store.remove(list, &id)
    };

    let text = match (add, changed) {
        (true, true) => format!("{} added to the {}", id, list.label()),
        (true, false) => format!("{} is already on the {}", id, list.label()),
        (false, true) => format!("{} removed from the {}", id, list.label()),
        (false, false) => format!("{} is not on the {}", id, list.label()),
    };
    if changed {
        ctx.persist();
    }
    ctx.reply(text);
    Ok(())
}
