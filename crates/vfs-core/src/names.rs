//! Case-insensitive naming policies for item names and user names

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// Ordering and equality policy for names
pub trait NameComparer {
    fn compare(&self, a: &str, b: &str) -> Ordering;

    fn equals(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Policy used for sibling uniqueness and for sorting items in the printed tree
#[derive(Clone, Copy, Debug, Default)]
pub struct ItemNameComparer;

impl NameComparer for ItemNameComparer {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        folded(a).cmp(folded(b))
    }
}

impl ItemNameComparer {
    /// Key under which a name is stored among its siblings.
    pub(crate) fn key(name: &str) -> String {
        folded(name).collect()
    }
}

/// Policy used for lock holders
#[derive(Clone, Copy, Debug, Default)]
pub struct UserNameComparer;

impl NameComparer for UserNameComparer {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        folded(a).cmp(folded(b))
    }
}

/// A validated user name, compared case-insensitively
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn new<S: AsRef<str>>(name: S) -> FsResult<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FsError::invalid_argument("user name is empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = FsError;

    fn try_from(value: String) -> FsResult<Self> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq for UserName {
    fn eq(&self, other: &Self) -> bool {
        UserNameComparer.equals(&self.0, &other.0)
    }
}

impl Eq for UserName {}

impl PartialOrd for UserName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserName {
    fn cmp(&self, other: &Self) -> Ordering {
        UserNameComparer.compare(&self.0, &other.0)
    }
}

impl Hash for UserName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in folded(&self.0) {
            c.hash(state);
        }
    }
}

/// Lock holders of a file, unique and ordered by [`UserNameComparer`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserNameSet {
    names: BTreeSet<UserName>,
}

impl UserNameSet {
    pub const fn new() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Returns false when an equal name (ignoring case) is already present.
    pub fn insert(&mut self, name: UserName) -> bool {
        self.names.insert(name)
    }

    pub fn remove(&mut self, name: &UserName) -> bool {
        self.names.remove(name)
    }

    pub fn contains(&self, name: &UserName) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserName> {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparers_ignore_case() {
        assert!(ItemNameComparer.equals("Docs", "DOCS"));
        assert!(UserNameComparer.equals("alice", "Alice"));
        assert_eq!(ItemNameComparer.compare("apple", "Banana"), Ordering::Less);
        assert_eq!(ItemNameComparer.compare("b", "A"), Ordering::Greater);
    }

    #[test]
    fn test_user_name_validation() {
        assert!(UserName::new("").is_err());
        assert!(UserName::new("   ").is_err());
        assert_eq!(UserName::new("  bob ").unwrap().as_str(), "bob");
    }

    #[test]
    fn test_user_name_set_is_case_insensitive_and_sorted() {
        let mut set = UserNameSet::new();
        assert!(set.insert(UserName::new("carol").unwrap()));
        assert!(set.insert(UserName::new("Alice").unwrap()));
        assert!(!set.insert(UserName::new("ALICE").unwrap()));
        assert!(set.insert(UserName::new("bob").unwrap()));

        let names: Vec<&str> = set.iter().map(UserName::as_str).collect();
        assert_eq!(names, vec!["Alice", "bob", "carol"]);

        assert!(set.remove(&UserName::new("alice").unwrap()));
        assert!(!set.contains(&UserName::new("Alice").unwrap()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_user_name_deserialize_rejects_blank() {
        let ok: UserName = serde_json::from_str("\"dave\"").unwrap();
        assert_eq!(ok.as_str(), "dave");
        assert!(serde_json::from_str::<UserName>("\" \"").is_err());
    }
}
