//! Static table of supported response languages.

use serde::ser::{Serialize, SerializeMap, Serializer};

const LANGUAGES: [(&str, &str); 13] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("hi", "Hindi"),
    ("mr", "Marathi"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("bn", "Bengali"),
    ("gu", "Gujarati"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("ur", "Urdu"),
];

/// Language code to English display name, in a fixed order.
///
/// Serializes as a JSON object `{ code: name }` preserving that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageTable {
    entries: &'static [(&'static str, &'static str)],
}

impl LanguageTable {
    /// The table of every language the worker can answer in.
    pub fn supported() -> Self {
        Self {
            entries: &LANGUAGES,
        }
    }

    pub fn get(&self, code: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

impl Serialize for LanguageTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, name) in self.entries {
            map.serialize_entry(code, name)?;
        }
        map.end()
    }
}
