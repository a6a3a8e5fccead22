pub mod matcher;
pub mod notation;
pub mod stroke;

pub use matcher::is_repeat;
pub use notation::{RawKey, canonicalize, parse_key_text};
pub use stroke::{CanonicalKey, KeyStroke, is_bindable};
