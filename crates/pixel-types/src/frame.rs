//! Line-oriented `TAG=payload` frame codec
//!
//! Inbound frames are decoded into [`Event`]s; outbound replies are built with
//! [`encode_chat`], [`encode_custom`] and [`encode_login`].
//!
//! The protocol has no escaping. A reply containing `~` or `:` is sent as-is
//! and the receiving client will split it wherever those characters land.

#[path = "frame_tests.rs"]
mod frame_tests;

use crate::error::DecodeError;
use crate::identity::Identity;

/// Frame tags understood by the decoder.
pub mod tags {
    pub const CHAT: &str = "CHAT";
    pub const CUSTOM: &str = "CUSTOM";
    pub const LOGIN: &str = "LOGIN";
    pub const SET_ITEMS: &str = "SET_ITEMS";
    pub const YELL: &str = "YELL";
    pub const EVENT_GLOBAL_PROGRESS: &str = "EVENT_GLOBAL_PROGRESS";
}

pub const DEFAULT_SIGIL: char = '?';
pub const FIELD_DELIMITER: char = '~';
pub const CUSTOM_MARKER: &str = "interactor";
pub const CUSTOM_DELIMITER: char = ':';
pub const WOOF_COMMAND: &str = "woof";

/// Channel name embedded in every debug-channel reply.
pub const CALLOUT_CHANNEL: &str = "wikibot";

/// `sender~sigil~tag~level~message`
const CHAT_FIELDS: usize = 5;
/// `sender~payload`
const CUSTOM_FIELDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Chat,
    Custom,
    /// A `CUSTOM=` frame without a usable `interactor` sub-tag.
    CustomOther,
    /// Recognised but deliberately not acted on (`SET_ITEMS`, `YELL`, ...).
    Ignored,
    Unknown,
}

/// A command name plus the rest of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    pub name: String,
    pub argument: String,
}

impl CommandCall {
    pub fn new(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.into(),
        }
    }
}

/// One decoded inbound frame. Consumed immediately, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// The frame tag (`CHAT`, `CUSTOM`, ...); empty when the frame had no `=`.
    pub tag: String,
    pub sender: Identity,
    /// Chat message text, custom payload, or the raw frame for unknown tags.
    pub text: String,
    pub command: Option<CommandCall>,
}

impl Event {
    fn new(kind: EventKind, tag: &str, sender: Identity, text: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            sender,
            text: text.to_string(),
            command: None,
        }
    }

    /// Only chat and custom frames with a parsed command ever reach the dispatcher.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self.kind, EventKind::Chat | EventKind::Custom) && self.command.is_some()
    }
}

/// Frame decoder. Holds the two knobs that change how chat text is read:
/// the command sigil and the phrase that maps to the synthetic `woof` command.
#[derive(Debug, Clone)]
pub struct Decoder {
    sigil: char,
    woof_phrase: Option<String>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            sigil: DEFAULT_SIGIL,
            woof_phrase: None,
        }
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sigil(mut self, sigil: char) -> Self {
        self.sigil = sigil;
        self
    }

    pub fn with_woof_phrase(mut self, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into().trim().to_lowercase();
        self.woof_phrase = (!phrase.is_empty()).then_some(phrase);
        self
    }

    pub fn decode(&self, raw: &str) -> Result<Event, DecodeError> {
        let frame = raw.trim_end_matches(['\r', '\n']);
        if frame.is_empty() {
            return Err(DecodeError::Empty);
        }

        let Some((tag, payload)) = frame.split_once('=') else {
            return Ok(Event::new(EventKind::Unknown, "", Identity::default(), frame));
        };

        match tag {
            tags::CHAT => self.decode_chat(payload),
            tags::CUSTOM => decode_custom(payload),
            tags::SET_ITEMS | tags::YELL | tags::EVENT_GLOBAL_PROGRESS => Ok(Event::new(
                EventKind::Ignored,
                tag,
                Identity::default(),
                payload,
            )),
            _ => Ok(Event::new(EventKind::Unknown, tag, Identity::default(), frame)),
        }
    }

    fn decode_chat(&self, payload: &str) -> Result<Event, DecodeError> {
        let fields: Vec<&str> = payload.splitn(CHAT_FIELDS, FIELD_DELIMITER).collect();
        if fields.len() < CHAT_FIELDS {
            return Err(DecodeError::FieldCount {
                tag: tags::CHAT,
                expected: CHAT_FIELDS,
                found: fields.len(),
            });
        }

        let message = fields[CHAT_FIELDS - 1];
        let mut event = Event::new(EventKind::Chat, tags::CHAT, Identity::new(fields[0]), message);
        event.command = self.chat_command(message);
        Ok(event)
    }

    fn chat_command(&self, message: &str) -> Option<CommandCall> {
        if let Some(phrase) = &self.woof_phrase {
            if message.trim().to_lowercase() == *phrase {
                return Some(CommandCall::new(WOOF_COMMAND, ""));
            }
        }

        let rest = message.strip_prefix(self.sigil)?;
        let (name, argument) = rest.split_once(' ').unwrap_or((rest, ""));
        let name = name.to_lowercase();
        if name.is_empty() {
            return None;
        }
        Some(CommandCall::new(name, argument.trim()))
    }
}

/// Decode with the default sigil and no woof phrase.
pub fn decode(raw: &str) -> Result<Event, DecodeError> {
    Decoder::default().decode(raw)
}

fn decode_custom(payload: &str) -> Result<Event, DecodeError> {
    let fields: Vec<&str> = payload.splitn(CUSTOM_FIELDS, FIELD_DELIMITER).collect();
    if fields.len() < CUSTOM_FIELDS {
        return Err(DecodeError::FieldCount {
            tag: tags::CUSTOM,
            expected: CUSTOM_FIELDS,
            found: fields.len(),
        });
    }

    let body = fields[1];
    let mut event = Event::new(
        EventKind::CustomOther,
        tags::CUSTOM,
        Identity::new(fields[0]),
        body,
    );

    if let Some(call) = custom_command(body) {
        event.kind = EventKind::Custom;
        event.command = Some(call);
    }
    Ok(event)
}

/// `...interactor:<name>:<argument>` → `(name, argument)`.
///
/// A marker with nothing after it is not a command. A marker followed by a
/// bare name is a command with an empty argument, same as a chat command
/// without a space.
fn custom_command(body: &str) -> Option<CommandCall> {
    let start = body.find(CUSTOM_MARKER)? + CUSTOM_MARKER.len();
    let rest = body[start..].trim_start_matches(CUSTOM_DELIMITER);
    let (name, argument) = rest.split_once(CUSTOM_DELIMITER).unwrap_or((rest, ""));
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some(CommandCall::new(name, argument.trim()))
}

/// Identity and tag used to address debug-channel replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    pub identity: String,
    pub response_tag: String,
}

impl Callout {
    pub fn new(identity: impl Into<String>, response_tag: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            response_tag: response_tag.into(),
        }
    }
}

/// Public chat reply: `CHAT=<text>`.
pub fn encode_chat(text: &str) -> String {
    format!("{}={}", tags::CHAT, text)
}

/// Debug-channel reply: `CUSTOM=<identity>~<tag><sequence>:wikibot:<text>`.
pub fn encode_custom(callout: &Callout, sequence: u64, text: &str) -> String {
    format!(
        "{}={}{}{}{}{}{}{}{}",
        tags::CUSTOM,
        callout.identity,
        FIELD_DELIMITER,
        callout.response_tag,
        sequence,
        CUSTOM_DELIMITER,
        CALLOUT_CHANNEL,
        CUSTOM_DELIMITER,
        text
    )
}

pub fn encode_login(signature: &str) -> String {
    format!("{}={}", tags::LOGIN, signature)
}
