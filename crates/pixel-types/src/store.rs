//! Persisted bot state: allow/deny lists, shortcuts, jokes, default credentials

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// The whole persisted document. Loaded at startup and rewritten in full
/// after every mutating command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    #[serde(default)]
    pub blacklist: BTreeSet<Identity>,
    #[serde(default)]
    pub whitelist: BTreeSet<Identity>,
    #[serde(default, rename = "alttraderlist")]
    pub alt_traders: BTreeSet<Identity>,
    #[serde(default, rename = "profanitylist")]
    pub profanity: Vec<String>,
    /// Lower-cased key → replacement search text.
    #[serde(default)]
    pub shortcuts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default, skip_serializing_if = "JokeBook::is_empty")]
    pub jokes: JokeBook,
}

impl StoreRecord {
    /// Lower-case every shortcut key. Later duplicates overwrite earlier ones.
    pub fn normalized(mut self) -> Self {
        self.shortcuts = self
            .shortcuts
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        self.profanity = self.profanity.iter().map(|w| w.to_lowercase()).collect();
        self
    }
}

/// Login credentials shipped with the store as a fallback for the config.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Canned lines used by the help, axe and per-user lookup responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeBook {
    #[serde(default)]
    pub help: Vec<String>,
    #[serde(default)]
    pub axe: Vec<String>,
    #[serde(default)]
    pub users: BTreeMap<Identity, Vec<String>>,
}

impl JokeBook {
    pub fn is_empty(&self) -> bool {
        self.help.is_empty() && self.axe.is_empty() && self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "blacklist": ["Spammer"],
        "whitelist": ["zlef", "godofnades"],
        "alttraderlist": ["alty"],
        "profanitylist": ["Darn"],
        "shortcuts": {"Ore": "Mining#Ores", "bar": "Smelting"}
    }"#;

    #[test]
    fn test_parses_original_field_names() {
        let rec: StoreRecord = serde_json::from_str(SAMPLE).unwrap();
        assert!(rec.blacklist.contains(&Identity::new("spammer")));
        assert!(rec.whitelist.contains(&Identity::new("zlef")));
        assert!(rec.alt_traders.contains(&Identity::new("alty")));
        assert_eq!(rec.profanity, vec!["Darn"]);
        assert!(rec.credentials.is_none());
        assert!(rec.jokes.is_empty());
    }

    #[test]
    fn test_normalized_lowercases_keys_and_profanity() {
        let rec: StoreRecord = serde_json::from_str::<StoreRecord>(SAMPLE).unwrap().normalized();
        assert_eq!(rec.shortcuts.get("ore").map(String::as_str), Some("Mining#Ores"));
        assert!(!rec.shortcuts.contains_key("Ore"));
        assert_eq!(rec.profanity, vec!["darn"]);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let rec: StoreRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(rec, StoreRecord::default());
    }

    #[test]
    fn test_serialize_uses_wire_names_and_skips_empty_optionals() {
        let json = serde_json::to_string(&StoreRecord::default()).unwrap();
        assert!(json.contains("\"alttraderlist\""));
        assert!(json.contains("\"profanitylist\""));
        assert!(!json.contains("credentials"));
        assert!(!json.contains("jokes"));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "wikibot".into(),
            password: "hunter2".into(),
        };
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("wikibot"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn test_joke_book_user_keys_are_identities() {
        let json = r#"{"jokes": {"users": {"CammyRock": ["Who's a good girl!"]}}}"#;
        let rec: StoreRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.jokes.users[&Identity::new("cammyrock")].len(), 1);
    }
}
