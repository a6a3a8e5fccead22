use crate::keys::{CanonicalKey, KeyStroke};

/// Strokes typed so far while walking down prefix tables.
#[derive(Default)]
pub struct KeySeq {
    key_sequence: Option<CanonicalKey>,
}

impl KeySeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, stroke: KeyStroke) -> CanonicalKey {
        match self.key_sequence.as_mut() {
            Some(sequence) => sequence.push(stroke),
            None => self.key_sequence = Some(CanonicalKey::single(stroke)),
        }
        self.current_sequence().cloned().unwrap_or_else(|| stroke.into())
    }

    pub fn clear(&mut self) {
        self.key_sequence = None;
    }

    pub fn current_sequence(&self) -> Option<&CanonicalKey> {
        self.key_sequence.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_until_cleared() {
        let mut seq = KeySeq::new();
        seq.handle_key(KeyStroke::ctrl('x'));
        let key = seq.handle_key(KeyStroke::char('4'));
        assert_eq!(key.to_string(), "C-x 4");

        seq.clear();
        assert!(seq.current_sequence().is_none());
        assert_eq!(seq.handle_key(KeyStroke::char('a')).to_string(), "a");
    }
}
