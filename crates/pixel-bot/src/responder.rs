//! Turns handler replies into outbound frames.
//!
//! A reply goes to the debug channel when the `debug` flag is on or the
//! reply forces it, and to public chat otherwise. With `local` on, debug
//! replies are logged instead of sent and do not consume a sequence number.

use pixel_types::{encode_chat, encode_custom, Callout};
use tracing::info;

use crate::flags::RuntimeFlags;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub force_debug: bool,
}

impl Reply {
    pub fn public(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            force_debug: false,
        }
    }

    pub fn debug(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            force_debug: true,
        }
    }
}

/// Owns the debug-channel sequence counter for the life of the process.
#[derive(Debug)]
pub struct Responder {
    callout: Callout,
    sequence: u64,
}

impl Responder {
    pub fn new(callout: Callout) -> Self {
        Self {
            callout,
            sequence: 1,
        }
    }

    /// Sequence number the next debug-channel frame will carry.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// `None` when the reply was routed to the local log.
    pub fn render(&mut self, reply: &Reply, flags: &RuntimeFlags) -> Option<String> {
        if !(flags.debug || reply.force_debug) {
            return Some(encode_chat(&reply.text));
        }
        if flags.local {
            info!(sequence = self.sequence, "[local] {}", reply.text);
            return None;
        }
        let frame = encode_custom(&self.callout, self.sequence, &reply.text);
        self.sequence += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder() -> Responder {
        Responder::new(Callout::new("zlef", "WIKI"))
    }

    fn flags(debug: bool, local: bool) -> RuntimeFlags {
        RuntimeFlags {
            debug,
            local,
            ..RuntimeFlags::default()
        }
    }

    #[test]
    fn test_public_reply_when_debug_off() {
        let mut r = responder();
        let frame = r.render(&Reply::public("hello"), &flags(false, false));
        assert_eq!(frame.as_deref(), Some("CHAT=hello"));
        assert_eq!(r.sequence(), 1);
    }

    #[test]
    fn test_debug_flag_routes_everything_to_custom() {
        let mut r = responder();
        let f = flags(true, false);
        assert_eq!(
            r.render(&Reply::public("a"), &f).as_deref(),
            Some("CUSTOM=zlef~WIKI1:wikibot:a")
        );
        assert_eq!(
            r.render(&Reply::public("b"), &f).as_deref(),
            Some("CUSTOM=zlef~WIKI2:wikibot:b")
        );
    }

    #[test]
    fn test_forced_debug_reply_with_debug_off() {
        let mut r = responder();
        let frame = r.render(&Reply::debug("audit"), &flags(false, false));
        assert_eq!(frame.as_deref(), Some("CUSTOM=zlef~WIKI1:wikibot:audit"));
    }

    #[test]
    fn test_local_mode_does_not_consume_sequence() {
        let mut r = responder();
        assert!(r.render(&Reply::debug("x"), &flags(true, true)).is_none());
        assert_eq!(r.sequence(), 1);
        // Public replies are unaffected by local mode.
        assert_eq!(
            r.render(&Reply::public("y"), &flags(false, true)).as_deref(),
            Some("CHAT=y")
        );
    }
}
