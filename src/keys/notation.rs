//! Key canonicalization.
//!
//! Keys reach the registrar in several shapes: a textual description such as
//! `"C-x ."` or `"<f2>"`, a vector of terminal events, or strokes that were
//! already normalised. [`canonicalize`] folds all of them into one
//! [`CanonicalKey`], so the same logical key always yields the same identity.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use super::stroke::{CanonicalKey, KeyStroke, is_bindable};
use crate::error::DispatchError;

/// Every key representation accepted by the registrar.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKey {
    Text(String),
    Events(Vec<Event>),
    Strokes(Vec<KeyStroke>),
}

impl From<&str> for RawKey {
    fn from(text: &str) -> Self {
        RawKey::Text(text.to_string())
    }
}

impl From<String> for RawKey {
    fn from(text: String) -> Self {
        RawKey::Text(text)
    }
}

impl From<KeyEvent> for RawKey {
    fn from(event: KeyEvent) -> Self {
        RawKey::Events(vec![Event::Key(event)])
    }
}

impl From<Vec<KeyEvent>> for RawKey {
    fn from(events: Vec<KeyEvent>) -> Self {
        RawKey::Events(events.into_iter().map(Event::Key).collect())
    }
}

impl From<KeyStroke> for RawKey {
    fn from(stroke: KeyStroke) -> Self {
        RawKey::Strokes(vec![stroke])
    }
}

impl From<CanonicalKey> for RawKey {
    fn from(key: CanonicalKey) -> Self {
        RawKey::Strokes(key.strokes().to_vec())
    }
}

impl From<&CanonicalKey> for RawKey {
    fn from(key: &CanonicalKey) -> Self {
        RawKey::Strokes(key.strokes().to_vec())
    }
}

pub fn canonicalize(key: impl Into<RawKey>) -> Result<CanonicalKey, DispatchError> {
    match key.into() {
        RawKey::Text(text) => parse_key_text(&text),
        RawKey::Events(events) => {
            if events.is_empty() {
                return Err(DispatchError::malformed("[]", "empty event vector"));
            }
            let mut strokes = Vec::with_capacity(events.len());
            for event in &events {
                match event {
                    Event::Key(key) => strokes.push(KeyStroke::from(*key)),
                    other => {
                        return Err(DispatchError::malformed(
                            format!("{other:?}"),
                            "not a key event",
                        ));
                    }
                }
            }
            bindable(strokes)
        }
        RawKey::Strokes(strokes) => {
            if strokes.is_empty() {
                return Err(DispatchError::malformed("[]", "empty stroke vector"));
            }
            bindable(strokes)
        }
    }
}

fn bindable(strokes: Vec<KeyStroke>) -> Result<CanonicalKey, DispatchError> {
    if let Some(stroke) = strokes.iter().find(|s| !is_bindable(s.code())) {
        return Err(DispatchError::malformed(
            format!("{:?}", stroke.code()),
            "media and modifier keys cannot be bound",
        ));
    }
    Ok(CanonicalKey::from_strokes(strokes))
}

/// Parse a textual key description (`"C-x C-f"`, `"M-RET"`, `"<f2>"`).
pub fn parse_key_text(text: &str) -> Result<CanonicalKey, DispatchError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DispatchError::malformed(text, "empty key description"));
    }

    let strokes = text
        .split_whitespace()
        .map(parse_token)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CanonicalKey::from_strokes(strokes))
}

fn parse_token(token: &str) -> Result<KeyStroke, DispatchError> {
    let mut modifiers = KeyModifiers::NONE;
    let mut rest = token;

    // A bare "C-" style remainder is a dangling modifier, not a prefix.
    while rest.len() > 2 {
        let flag = match rest.get(..2) {
            Some("C-") => KeyModifiers::CONTROL,
            Some("M-") => KeyModifiers::ALT,
            Some("s-") => KeyModifiers::SUPER,
            Some("S-") => KeyModifiers::SHIFT,
            _ => break,
        };
        modifiers.insert(flag);
        rest = &rest[2..];
    }

    let code = parse_key_name(rest)
        .ok_or_else(|| DispatchError::malformed(token, format!("unknown key `{rest}`")))?;
    Ok(KeyStroke::new(code, modifiers))
}

fn parse_key_name(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }

    let bare = name
        .strip_prefix('<')
        .and_then(|n| n.strip_suffix('>'))
        .unwrap_or(name);

    let code = match bare {
        "RET" | "return" => KeyCode::Enter,
        "TAB" | "tab" => KeyCode::Tab,
        "SPC" | "space" => KeyCode::Char(' '),
        "ESC" | "escape" => KeyCode::Esc,
        "DEL" | "BS" | "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "prior" | "pageup" => KeyCode::PageUp,
        "next" | "pagedown" => KeyCode::PageDown,
        "insert" => KeyCode::Insert,
        "delete" | "deletechar" => KeyCode::Delete,
        "backtab" => KeyCode::BackTab,
        "null" => KeyCode::Null,
        "capslock" => KeyCode::CapsLock,
        "scrolllock" => KeyCode::ScrollLock,
        "numlock" => KeyCode::NumLock,
        "print" | "printscreen" => KeyCode::PrintScreen,
        "pause" => KeyCode::Pause,
        "menu" => KeyCode::Menu,
        "begin" => KeyCode::KeypadBegin,
        other => {
            let n: u8 = other.strip_prefix('f')?.parse().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    };
    Some(code)
}
