//! `add`, `remove` and `keys`

use crate::context::CommandContext;
use crate::errors::{HandlerError, StoreError};

/// Whole-message budget for a keys page, prefix included.
pub const KEYS_BUDGET: usize = 240;
pub const KEYS_PREFIX: &str = "Keys page ";

/// `add key:value`
pub fn add(ctx: &mut CommandContext<'_>, argument: &str) -> Result<(), HandlerError> {
    let parsed = argument
        .split_once(':')
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty());
    let Some((key, value)) = parsed else {
        ctx.reply("Expected key:value, item not added");
        return Ok(());
    };

    match ctx.state.store.add_shortcut(&key, value) {
        Ok(()) => {
            ctx.persist();
            ctx.reply(format!("{} has been added as a shortcut", key));
        }
        Err(StoreError::KeyExists { existing, .. }) => {
            let sigil = ctx.state.settings.sigil;
            ctx.reply(format!(
                "That key is already in use for {}. Use {}keys to view the err... Keys...",
                existing, sigil
            ));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// `remove key`
pub fn remove(ctx: &mut CommandContext<'_>, argument: &str) -> Result<(), HandlerError> {
    let key = argument.trim().to_lowercase();
    match ctx.state.store.remove_shortcut(&key) {
        Ok(_) => {
            ctx.persist();
            ctx.reply(format!("{} has been removed.", key));
        }
        Err(StoreError::KeyMissing(_)) => {
            ctx.reply(format!("The key {} doesn't exist. Nothing to remove.", key));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// `keys [page]`
pub fn keys(ctx: &mut CommandContext<'_>, argument: &str) -> Result<(), HandlerError> {
    let joined = ctx.state.store.shortcut_keys().collect::<Vec<_>>().join(", ");
    let requested = argument
        .split_whitespace()
        .next()
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(0);
    let sigil = ctx.state.settings.sigil;
    let text = render_keys(&joined, KEYS_BUDGET - KEYS_PREFIX.len(), requested, sigil);
    ctx.reply(text);
    Ok(())
}

/// Split `joined` into consecutive slices of at most `width` characters.
pub fn paginate(joined: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = joined.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Page 0 asks which page to show unless there is only one. Pages past
/// the end clamp to the last page.
pub fn render_keys(joined: &str, width: usize, requested: usize, sigil: char) -> String {
    let pages = paginate(joined, width);
    let total = pages.len();
    if total == 0 {
        return "There are no shortcuts yet.".to_string();
    }

    let page = match requested {
        0 if total == 1 => 1,
        0 => {
            return format!(
                "Use \"{}keys n\" to specify a page. Currently, there are {} pages.",
                sigil, total
            )
        }
        n => n.min(total),
    };
    format!("{}{} of {}: {}", KEYS_PREFIX, page, total, pages[page - 1])
}
