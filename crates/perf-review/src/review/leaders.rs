use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const SEPARATOR: char = ',';

/// Ordered, duplicate-free set of leader display names.
///
/// Names are compared by exact string equality after trimming. The comma-joined form only
/// exists at the serde boundary, so membership checks never fall back to substring matching
/// ("Li" is not a member of "Li Wei,Zhao").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderSet {
    names: Vec<String>,
}

impl LeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Parses the stored comma-joined representation.
    pub fn parse(joined: &str) -> Self {
        Self::from_names(joined.split(SEPARATOR))
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|existing| existing == name)
    }

    /// Inserts a name, keeping insertion order. Blank names are ignored.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.names.len();
        self.names.retain(|existing| existing != name);
        self.names.len() != before
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn joined(&self) -> String {
        self.names.join(",")
    }
}

impl fmt::Display for LeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<S: AsRef<str>> FromIterator<S> for LeaderSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_names(iter)
    }
}

impl Serialize for LeaderSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.joined())
    }
}

impl<'de> Deserialize<'de> for LeaderSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
