//! Trust tiers derived from the persisted lists

use crate::identity::Identity;
use crate::store::StoreRecord;

/// Where a sender stands with the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Blacklisted or matching a permanent ban pattern. Wins over everything.
    Banned,
    /// Whitelisted and not banned.
    Trusted,
    Member,
}

/// Substrings that ban any identity containing them, regardless of the lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanPatterns(Vec<String>);

impl BanPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, id: &Identity) -> bool {
        self.0.iter().any(|p| id.as_str().contains(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl StoreRecord {
    pub fn is_blacklisted(&self, id: &Identity) -> bool {
        self.blacklist.contains(id)
    }

    pub fn is_whitelisted(&self, id: &Identity) -> bool {
        self.whitelist.contains(id)
    }

    pub fn is_alt_trader(&self, id: &Identity) -> bool {
        self.alt_traders.contains(id)
    }

    /// Blacklist and ban patterns are checked before the whitelist.
    pub fn standing(&self, id: &Identity, bans: &BanPatterns) -> Standing {
        if self.is_blacklisted(id) || bans.matches(id) {
            Standing::Banned
        } else if self.is_whitelisted(id) {
            Standing::Trusted
        } else {
            Standing::Member
        }
    }

    /// True when any whitespace-separated word of `text` is on the profanity list.
    pub fn contains_profanity(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        lowered
            .split_whitespace()
            .any(|word| self.profanity.iter().any(|bad| bad == word))
    }
}
