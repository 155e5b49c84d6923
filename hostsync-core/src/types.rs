//! Domain types shared across the hostsync crates.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A strongly-typed hostname — the unique key within a managed host set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostName(pub String);

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for HostName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HostName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for HostName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single observed name/address pair from the metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    pub name: HostName,
    pub address: String,
}

impl HostEntry {
    pub fn new(name: impl Into<HostName>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_display() {
        assert_eq!(HostName::from("node-1").to_string(), "node-1");
    }

    #[test]
    fn hostname_equality() {
        let a = HostName::from("worker");
        let b = HostName::from(String::from("worker"));
        assert_eq!(a, b);
    }

    #[test]
    fn hostname_orders_lexicographically() {
        let mut names = vec![HostName::from("b"), HostName::from("a")];
        names.sort();
        assert_eq!(names, vec![HostName::from("a"), HostName::from("b")]);
    }

    #[test]
    fn entry_constructor() {
        let entry = HostEntry::new("node-1", "10.0.0.1");
        assert_eq!(entry.name, HostName::from("node-1"));
        assert_eq!(entry.address, "10.0.0.1");
    }
}
