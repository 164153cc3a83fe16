//! Configuration management for pixel-bot

#[path = "config_tests.rs"]
mod config_tests;

use std::fmt;
use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use pixel_types::{BanPatterns, Credentials, Identity};
use pixel_ws::ReconnectPolicy;
use serde::{Deserialize, Serialize};

/// Environment lookup seam so `from_env` can be tested without touching the
/// process environment.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Complete bot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

/// Game server connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_ws_url")]
    pub url: String,
    /// Skip certificate validation. On by default: the game server's
    /// certificates have not reliably validated.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            accept_invalid_certs: true,
        }
    }
}

/// How the `LOGIN=` signature is obtained.
///
/// A pre-issued `signature` wins. Otherwise the bot logs in through the
/// website with `username`/`password`, falling back to the credentials
/// stored alongside the access lists.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_login_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            url: default_login_url(),
            username: None,
            password: None,
            signature: None,
        }
    }
}

impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("signature", &self.signature.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LoginConfig {
    /// Configured credentials if both halves are present, else the stored ones.
    pub fn credentials(&self, stored: Option<&Credentials>) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => stored.filter(|c| !c.username.is_empty()).cloned(),
        }
    }
}

/// Dispatcher, handler and persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// JSON document holding the access lists, shortcuts and jokes
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// When set, reconnect delays double per failed attempt up to this cap.
    #[serde(default)]
    pub reconnect_max_delay_secs: Option<u64>,
    /// The only identity allowed to edit the whitelist
    #[serde(default = "default_super_user")]
    pub super_user: String,
    /// Identity substituted for whitelisted senders while testing mode is on
    #[serde(default = "default_fake_identity")]
    pub fake_identity: String,
    /// Recipient of debug-channel replies
    #[serde(default = "default_super_user")]
    pub callout_identity: String,
    #[serde(default = "default_response_tag")]
    pub response_tag: String,
    #[serde(default = "default_sigil")]
    pub sigil: char,
    /// Whole chat message that triggers the `woof` command. Unset disables it.
    #[serde(default)]
    pub woof_phrase: Option<String>,
    /// Substrings that ban any identity containing them
    #[serde(default = "default_banned_patterns")]
    pub banned_patterns: Vec<String>,
    #[serde(default = "default_wiki_url")]
    pub wiki_url: String,
    #[serde(default = "default_rules_url")]
    pub rules_url: String,
    #[serde(default)]
    pub flags: FlagDefaults,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            cooldown_secs: default_cooldown_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            reconnect_max_delay_secs: None,
            super_user: default_super_user(),
            fake_identity: default_fake_identity(),
            callout_identity: default_super_user(),
            response_tag: default_response_tag(),
            sigil: default_sigil(),
            woof_phrase: None,
            banned_patterns: default_banned_patterns(),
            wiki_url: default_wiki_url(),
            rules_url: default_rules_url(),
            flags: FlagDefaults::default(),
        }
    }
}

impl BotConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let base = Duration::from_secs(self.reconnect_delay_secs);
        match self.reconnect_max_delay_secs {
            Some(max) if max > self.reconnect_delay_secs => ReconnectPolicy::Capped {
                base,
                max: Duration::from_secs(max),
            },
            _ => ReconnectPolicy::Fixed(base),
        }
    }

    pub fn ban_patterns(&self) -> BanPatterns {
        BanPatterns::new(&self.banned_patterns)
    }

    pub fn super_user(&self) -> Identity {
        Identity::new(&self.super_user)
    }
}

/// Runtime flag values at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDefaults {
    #[serde(default = "default_true")]
    pub debug: bool,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub testing: bool,
    #[serde(default = "default_true")]
    pub jokes: bool,
}

impl Default for FlagDefaults {
    fn default() -> Self {
        Self {
            debug: true,
            local: false,
            testing: false,
            jokes: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_impl(&SystemEnv)
    }

    pub(crate) fn from_env_impl<E: ReadEnv>(env: &E) -> Result<Self> {
        let mut config = Config::default();
        let var = |key: &str| env.var(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("PIXEL_WS_URL") {
            config.server.url = url;
        }
        if let Some(raw) = var("PIXEL_ACCEPT_INVALID_CERTS") {
            config.server.accept_invalid_certs = parse_bool("PIXEL_ACCEPT_INVALID_CERTS", &raw)?;
        }

        if let Some(url) = var("PIXEL_LOGIN_URL") {
            config.login.url = url;
        }
        config.login.username = var("PIXEL_USERNAME");
        config.login.password = var("PIXEL_PASSWORD");
        config.login.signature = var("PIXEL_SIGNATURE");

        if let Some(path) = var("PIXEL_STORE_PATH") {
            config.bot.store_path = path;
        }
        if let Some(raw) = var("PIXEL_COOLDOWN_SECS") {
            config.bot.cooldown_secs = parse_secs("PIXEL_COOLDOWN_SECS", &raw)?;
        }
        if let Some(raw) = var("PIXEL_RECONNECT_DELAY_SECS") {
            config.bot.reconnect_delay_secs = parse_secs("PIXEL_RECONNECT_DELAY_SECS", &raw)?;
        }
        if let Some(raw) = var("PIXEL_RECONNECT_MAX_DELAY_SECS") {
            config.bot.reconnect_max_delay_secs =
                Some(parse_secs("PIXEL_RECONNECT_MAX_DELAY_SECS", &raw)?);
        }
        if let Some(id) = var("PIXEL_SUPER_USER") {
            config.bot.super_user = id;
        }
        if let Some(id) = var("PIXEL_FAKE_IDENTITY") {
            config.bot.fake_identity = id;
        }
        if let Some(id) = var("PIXEL_CALLOUT_IDENTITY") {
            config.bot.callout_identity = id;
        }
        config.bot.woof_phrase = var("PIXEL_WOOF_PHRASE");
        if let Some(raw) = var("PIXEL_BANNED_PATTERNS") {
            config.bot.banned_patterns = parse_list(&raw);
        }
        if let Some(url) = var("PIXEL_WIKI_URL") {
            config.bot.wiki_url = url;
        }

        Ok(config)
    }
}

fn default_true() -> bool {
    true
}

fn default_ws_url() -> String {
    "wss://server1.idle-pixel.com".to_string()
}

fn default_login_url() -> String {
    "https://idle-pixel.com/login/".to_string()
}

fn default_store_path() -> String {
    "config.json".to_string()
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_reconnect_delay_secs() -> u64 {
    10
}

fn default_super_user() -> String {
    "zlef".to_string()
}

fn default_fake_identity() -> String {
    "notzlef".to_string()
}

fn default_response_tag() -> String {
    "WIKI".to_string()
}

fn default_sigil() -> char {
    '?'
}

fn default_banned_patterns() -> Vec<String> {
    vec!["austin".to_string()]
}

fn default_wiki_url() -> String {
    "https://idle-pixel.wiki/index.php".to_string()
}

fn default_rules_url() -> String {
    "https://idle-pixel.com/rules/".to_string()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be true or false, got {:?}", key, other),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of seconds, got {:?}", key, raw))
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .map(String::from)
        .collect()
}
