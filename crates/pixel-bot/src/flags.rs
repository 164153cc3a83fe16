//! Runtime flags toggled by whitelisted operators

use std::fmt;

use pixel_types::Identity;

use crate::config::FlagDefaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Every response goes to the debug channel instead of public chat.
    Debug,
    /// Debug-channel responses are logged locally instead of sent.
    Local,
    /// Whitelisted senders are replaced by the impersonation identity.
    Testing,
    /// Per-user jokes may be prepended to lookup links.
    Jokes,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::Debug, Flag::Local, Flag::Testing, Flag::Jokes];

    pub fn name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Local => "local",
            Self::Testing => "testing",
            Self::Jokes => "jokes",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Debug => "When true all responses go via CUSTOM instead of CHAT",
            Self::Local => "When true all CUSTOM responses are logged locally instead of sent",
            Self::Testing => "When true whitelisted senders are treated as the impersonation identity",
            Self::Jokes => "When true there is a chance of jokes for set users",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFlags {
    pub debug: bool,
    pub local: bool,
    pub testing: bool,
    pub jokes: bool,
    /// Identity substituted for whitelisted senders while `testing` is on.
    pub fake_identity: Identity,
}

impl RuntimeFlags {
    pub fn new(defaults: FlagDefaults, fake_identity: Identity) -> Self {
        Self {
            debug: defaults.debug,
            local: defaults.local,
            testing: defaults.testing,
            jokes: defaults.jokes,
            fake_identity,
        }
    }

    fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Debug => self.debug,
            Flag::Local => self.local,
            Flag::Testing => self.testing,
            Flag::Jokes => self.jokes,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Debug => &mut self.debug,
            Flag::Local => &mut self.local,
            Flag::Testing => &mut self.testing,
            Flag::Jokes => &mut self.jokes,
        };
        *slot = value;
    }

    /// `true`/`false` set the flag, an empty argument flips it. Returns the
    /// new value, or `None` (flag untouched) for anything else.
    pub fn apply(&mut self, flag: Flag, argument: &str) -> Option<bool> {
        let value = match argument.trim().to_lowercase().as_str() {
            "true" => true,
            "false" => false,
            "" => !self.get(flag),
            _ => return None,
        };
        self.set(flag, value);
        Some(value)
    }
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self::new(FlagDefaults::default(), Identity::new("notzlef"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        let flags = RuntimeFlags::default();
        assert!(flags.debug);
        assert!(!flags.local);
        assert!(!flags.testing);
        assert!(flags.jokes);
    }

    #[test]
    fn test_apply_sets_and_flips() {
        let mut flags = RuntimeFlags::default();
        assert_eq!(flags.apply(Flag::Debug, "false"), Some(false));
        assert!(!flags.debug);
        assert_eq!(flags.apply(Flag::Debug, ""), Some(true));
        assert!(flags.debug);
        assert_eq!(flags.apply(Flag::Testing, " TRUE "), Some(true));
        assert!(flags.testing);
    }

    #[test]
    fn test_apply_rejects_other_values() {
        let mut flags = RuntimeFlags::default();
        assert_eq!(flags.apply(Flag::Jokes, "maybe"), None);
        assert!(flags.jokes);
    }
}
