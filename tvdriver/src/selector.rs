use std::fmt;

/// A textual reference to a position in the device's accessibility tree.
///
/// Selectors are XPath strings in the dialect the remote driver accepts. They
/// are never validated locally: a malformed path simply fails to resolve.
/// Two selectors are equal iff their textual forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector(String);

impl Selector {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Selector for the parent of whatever `self` resolves to.
    pub fn parent(&self) -> Selector {
        Selector(format!("({})/parent::*", self.0))
    }

    /// Selector for the `index`-th child (1-based) of whatever `self` resolves to.
    pub fn nth_child(&self, index: usize) -> Selector {
        Selector(format!("{}/*[{}]", self.0, index))
    }

    /// Walks `levels` parents up, then optionally into a child. Pure function of
    /// its inputs, so the same `(self, levels, child)` always yields the same path.
    pub fn derive(&self, levels: usize, child: Option<usize>) -> Selector {
        let ancestor = (0..levels).fold(self.clone(), |acc, _| acc.parent());
        match child {
            Some(index) => ancestor.nth_child(index),
            None => ancestor,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Selector::new(s)
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector(s)
    }
}

impl AsRef<str> for Selector {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
