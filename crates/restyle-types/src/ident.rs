//! Case-insensitive identifiers.
//!
//! CSS property names, media names, HTML tag names and attribute names are
//! all compared ASCII-case-insensitively. [`Ident`] keeps the spelling it was
//! created with for display, while equality, ordering and hashing operate on
//! the ASCII-lowercased form.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An ASCII-case-insensitive identifier.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Ident {
    original: String,
    folded: String,
}

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        let original = value.into();
        let folded = original.to_ascii_lowercase();
        Self { original, folded }
    }

    /// The spelling this identifier was created with.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The lowercased form used for comparisons.
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Case-insensitive comparison against a plain string.
    pub fn is(&self, other: &str) -> bool {
        self.folded.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for Ident {}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

// Lookups in `HashMap<Ident, _>` by an already-lowercased `&str`.
impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        &self.folded
    }
}

impl From<String> for Ident {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Ident> for String {
    fn from(value: Ident) -> Self {
        value.original
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.original)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn equality_ignores_case() {
        assert_eq!(Ident::new("Font-Size"), Ident::new("font-size"));
        assert_ne!(Ident::new("font"), Ident::new("font-size"));
    }

    #[test]
    fn keeps_original_spelling() {
        let id = Ident::new("Screen");
        assert_eq!(id.as_str(), "Screen");
        assert_eq!(id.folded(), "screen");
        assert_eq!(id.to_string(), "Screen");
    }

    #[test]
    fn is_compares_case_insensitively() {
        let id = Ident::new("DIV");
        assert!(id.is("div"));
        assert!(id.is("Div"));
        assert!(!id.is("span"));
    }

    #[test]
    fn map_lookup_by_folded_str() {
        let mut map = HashMap::new();
        map.insert(Ident::new("Color"), 1);
        assert_eq!(map.get("color"), Some(&1));
        assert_eq!(map.get(&Ident::new("COLOR")), Some(&1));
    }

    #[test]
    fn serde_round_trips_as_plain_string() {
        let json = serde_json::to_string(&Ident::new("Print")).unwrap();
        assert_eq!(json, "\"Print\"");
        let back: Ident = serde_json::from_str("\"PRINT\"").unwrap();
        assert_eq!(back, Ident::new("print"));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ordering_matches_lowercase(a in "[a-zA-Z-]{1,12}", b in "[a-zA-Z-]{1,12}") {
                let expected = a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase());
                prop_assert_eq!(Ident::new(a).cmp(&Ident::new(b)), expected);
            }
        }
    }
}
