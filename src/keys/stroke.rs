use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Serialize, Serializer};
use std::fmt;

/// Modifiers that take part in key identity. Anything else reported by the
/// terminal (HYPER, keypad state, release/repeat kind) is dropped.
const SIGNIFICANT_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT)
    .union(KeyModifiers::SUPER);

/// One normalised keystroke: the event code used for every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyStroke {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers = modifiers;
        if modifiers.contains(KeyModifiers::META) {
            modifiers.insert(KeyModifiers::ALT);
        }
        modifiers &= SIGNIFICANT_MODIFIERS;

        let code = match code {
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::SHIFT) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::Char(c.to_ascii_uppercase())
            }
            KeyCode::BackTab => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            other => other,
        };

        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn code(&self) -> KeyCode {
        self.code
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }
}

/// Whether `code` can take part in a key sequence. Media keys and lone
/// modifier presses are only reported with keyboard enhancement enabled and
/// cannot be bound.
pub fn is_bindable(code: KeyCode) -> bool {
    !matches!(code, KeyCode::Media(_) | KeyCode::Modifier(_))
}

impl From<KeyEvent> for KeyStroke {
    fn from(event: KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("C-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("M-")?;
        }
        if self.modifiers.contains(KeyModifiers::SUPER) {
            f.write_str("s-")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("S-")?;
        }

        match self.code {
            KeyCode::Char(' ') => f.write_str("SPC"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => f.write_str("RET"),
            KeyCode::Tab => f.write_str("TAB"),
            KeyCode::Esc => f.write_str("ESC"),
            KeyCode::Backspace => f.write_str("DEL"),
            KeyCode::F(n) => write!(f, "<f{n}>"),
            KeyCode::Up => f.write_str("<up>"),
            KeyCode::Down => f.write_str("<down>"),
            KeyCode::Left => f.write_str("<left>"),
            KeyCode::Right => f.write_str("<right>"),
            KeyCode::Home => f.write_str("<home>"),
            KeyCode::End => f.write_str("<end>"),
            KeyCode::PageUp => f.write_str("<prior>"),
            KeyCode::PageDown => f.write_str("<next>"),
            KeyCode::Insert => f.write_str("<insert>"),
            KeyCode::Delete => f.write_str("<delete>"),
            KeyCode::BackTab => f.write_str("<backtab>"),
            KeyCode::Null => f.write_str("<null>"),
            KeyCode::CapsLock => f.write_str("<capslock>"),
            KeyCode::ScrollLock => f.write_str("<scrolllock>"),
            KeyCode::NumLock => f.write_str("<numlock>"),
            KeyCode::PrintScreen => f.write_str("<print>"),
            KeyCode::Pause => f.write_str("<pause>"),
            KeyCode::Menu => f.write_str("<menu>"),
            KeyCode::KeypadBegin => f.write_str("<begin>"),
            // Never part of a canonical key, see `is_bindable`.
            other => write!(f, "<{}>", format!("{other:?}").to_lowercase()),
        }
    }
}

/// A normalised, non-empty key sequence.
///
/// Used as the identity of a binding: two keys are the same logical key iff
/// their canonical forms compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(Vec<KeyStroke>);

impl CanonicalKey {
    /// Callers must not pass an empty sequence; the canonicalizer rejects
    /// those before reaching here.
    pub(crate) fn from_strokes(strokes: Vec<KeyStroke>) -> Self {
        debug_assert!(!strokes.is_empty());
        Self(strokes)
    }

    pub fn single(stroke: KeyStroke) -> Self {
        Self(vec![stroke])
    }

    pub fn strokes(&self) -> &[KeyStroke] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sequence without its final stroke, or `None` for a single stroke.
    pub fn prefix(&self) -> Option<CanonicalKey> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    pub fn push(&mut self, stroke: KeyStroke) {
        self.0.push(stroke);
    }
}

impl From<KeyStroke> for CanonicalKey {
    fn from(stroke: KeyStroke) -> Self {
        Self::single(stroke)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stroke) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{stroke}")?;
        }
        Ok(())
    }
}

impl Serialize for CanonicalKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
