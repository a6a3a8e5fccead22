//! Decides whether a freshly read key is a second press of the key that
//! activated a trampoline.
//!
//! When a command sits inside a prefix table, the host has already consumed
//! the prefix by the time the trampoline runs. The user repeats only the
//! terminating stroke, so `C-x .` followed by a bare `.` is a repeat.

use crossterm::event::{KeyCode, KeyModifiers};

use super::stroke::{CanonicalKey, KeyStroke};

/// `C-x`, `C-c` and `C-h`: prefixes whose tables sit directly under the root.
const TOP_LEVEL_PREFIXES: [char; 3] = ['x', 'c', 'h'];

/// Tables reachable as `C-x <stroke>`: other-window (`4`), frame (`5`),
/// two-column (`6`), version control (`v`) and multilingual (`RET`).
const CTL_X_SUBMAPS: [KeyCode; 5] = [
    KeyCode::Char('4'),
    KeyCode::Char('5'),
    KeyCode::Char('6'),
    KeyCode::Char('v'),
    KeyCode::Enter,
];

fn is_top_level_prefix(stroke: &KeyStroke) -> bool {
    match stroke.code() {
        KeyCode::Char(c) => {
            stroke.modifiers() == KeyModifiers::CONTROL && TOP_LEVEL_PREFIXES.contains(&c)
        }
        _ => false,
    }
}

fn is_ctl_x(stroke: &KeyStroke) -> bool {
    *stroke == KeyStroke::ctrl('x')
}

fn is_ctl_x_submap(stroke: &KeyStroke) -> bool {
    stroke.modifiers() == KeyModifiers::NONE && CTL_X_SUBMAPS.contains(&stroke.code())
}

fn is_bare(observed: &CanonicalKey, stroke: KeyStroke) -> bool {
    observed.strokes() == [stroke]
}

/// Returns `true` when `observed` counts as pressing `trigger` again.
///
/// Three-stroke keys under a prefix outside the known `C-x` submaps never
/// match.
pub fn is_repeat(trigger: &CanonicalKey, observed: &CanonicalKey) -> bool {
    match trigger.strokes() {
        [_] => trigger == observed,
        [first, last] => {
            if is_top_level_prefix(first) {
                is_bare(observed, *last)
            } else {
                trigger == observed
            }
        }
        [first, second, last] => {
            is_ctl_x(first) && is_ctl_x_submap(second) && is_bare(observed, *last)
        }
        _ => trigger == observed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::parse_key_text;

    fn key(text: &str) -> CanonicalKey {
        parse_key_text(text).unwrap()
    }

    #[test]
    fn test_single_stroke_requires_equality() {
        assert!(is_repeat(&key("<f2>"), &key("<f2>")));
        assert!(!is_repeat(&key("<f2>"), &key("<f3>")));
        assert!(!is_repeat(&key("a"), &key("A")));
    }

    #[test]
    fn test_top_level_prefix_matches_last_stroke() {
        assert!(is_repeat(&key("C-x ."), &key(".")));
        assert!(!is_repeat(&key("C-x ."), &key("x")));
        assert!(is_repeat(&key("C-c a"), &key("a")));
        assert!(is_repeat(&key("C-h k"), &key("k")));
        assert!(!is_repeat(&key("C-x ."), &key("C-x .")));
    }

    #[test]
    fn test_other_two_stroke_keys_need_full_sequence() {
        assert!(!is_repeat(&key("M-g g"), &key("g")));
        assert!(is_repeat(&key("M-g g"), &key("M-g g")));
    }

    #[test]
    fn test_ctl_x_submaps() {
        assert!(is_repeat(&key("C-x 4 ."), &key(".")));
        assert!(is_repeat(&key("C-x 5 f"), &key("f")));
        assert!(is_repeat(&key("C-x 6 2"), &key("2")));
        assert!(is_repeat(&key("C-x v l"), &key("l")));
        assert!(is_repeat(&key("C-x RET c"), &key("c")));
        assert!(!is_repeat(&key("C-x 4 ."), &key(",")));
    }

    #[test]
    fn test_unknown_three_stroke_prefix_never_matches() {
        assert!(!is_repeat(&key("C-x r t"), &key("t")));
        assert!(!is_repeat(&key("C-c 4 ."), &key(".")));
        assert!(!is_repeat(&key("C-x r t"), &key("C-x r t")));
    }

    #[test]
    fn test_long_sequences_need_full_sequence() {
        assert!(is_repeat(&key("a b c d"), &key("a b c d")));
        assert!(!is_repeat(&key("a b c d"), &key("d")));
    }
}
