//! Identifier management using string interning for efficient string storage and comparison
//!
//! This module provides the [`Id`] type used for task ids, category names and
//! assignees. Identifiers are cheap to copy and hash; ordering follows the
//! resolved strings so every "task id ascending" tie-break is stable across runs.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Efficient identifier type using string interning
///
/// # Examples
///
/// ```
/// use almanac_core::identifier::Id;
///
/// let design = Id::new("design");
/// let review = Id::new("review");
///
/// assert_eq!(design, "design");
/// assert!(design < review);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Examples
    ///
    /// ```
    /// use almanac_core::identifier::Id;
    ///
    /// let task_id = Id::new("T-001");
    /// let category = Id::new("engineering");
    /// ```
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the string this identifier was created from.
    pub fn as_string(&self) -> String {
        interner()
            .resolve(self.0)
            .map(str::to_owned)
            .unwrap_or_default()
    }
}

impl Ord for Id {
    /// Orders identifiers by their resolved strings, not by interning order.
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let interner = interner();
        interner.resolve(self.0).cmp(&interner.resolve(other.0))
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.as_string();
        f.write_str(&name)
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    /// Creates an `Id` from a string slice
    ///
    /// ```
    /// use almanac_core::identifier::Id;
    ///
    /// let id: Id = "launch".into();
    /// assert_eq!(id, "launch");
    /// ```
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("design");
        let id2 = Id::new("design");
        let id3 = Id::new("build");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "design");
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("display_test");
        assert_eq!(format!("{}", id), "display_test");
        assert_eq!(id.as_string(), "display_test");
    }

    #[test]
    fn test_ordering_follows_strings_not_interning_order() {
        // Interned in reverse alphabetical order on purpose.
        let zulu = Id::new("ordering-zulu");
        let alpha = Id::new("ordering-alpha");
        let mike = Id::new("ordering-mike");

        let mut ids = vec![mike, zulu, alpha];
        ids.sort();

        assert_eq!(ids, vec![alpha, mike, zulu]);
        assert_eq!(alpha.cmp(&alpha), Ordering::Equal);
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let id1 = Id::new("key1");
        let id2 = Id::new("key1");
        let id3 = Id::new("key2");

        let mut map = HashMap::new();
        map.insert(id1, "value1");
        map.insert(id3, "value2");

        assert_eq!(map.get(&id2), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("Release");

        assert!(id == "Release");
        assert!(id != "release");

        let name = String::from("Release");
        assert!(id == name.as_str());

        let empty = Id::new("");
        assert!(empty == "");
    }

    #[test]
    fn test_from_str() {
        let parsed: Id = "parsed".parse().unwrap();
        assert_eq!(parsed, Id::new("parsed"));
    }
}
