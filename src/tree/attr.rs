//! Attribute storage.

use std::collections::TryReserveError;

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name as written in the source.
    pub name: String,
    /// The attribute value with references resolved. Never absent; a missing
    /// value is stored as the empty string.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The attributes of one element.
///
/// Attributes are stored in the order they were added (for parsed documents,
/// source order). [`AttrList::iter`] walks that storage backwards, so it
/// enumerates newest first, as a list built by prepending would;
/// [`AttrList::iter_added`] walks it forwards. Lookups are by name and ignore
/// ASCII case; code must not depend on the enumeration order.
///
/// # Examples
///
/// ```
/// use xmldom::tree::AttrList;
///
/// let mut attrs = AttrList::new();
/// attrs.add("title", "Dune");
/// attrs.add("year", "1965");
///
/// assert_eq!(attrs.find("YEAR"), Some("1965"));
/// let names: Vec<_> = attrs.iter().map(|a| a.name.as_str()).collect();
/// assert_eq!(names, ["year", "title"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrList {
    items: Vec<Attribute>,
}

impl AttrList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends an attribute to storage. It becomes the first one yielded by
    /// [`AttrList::iter`] and the last one yielded by
    /// [`AttrList::iter_added`].
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push(Attribute::new(name, value));
    }

    pub(crate) fn push(&mut self, attr: Attribute) {
        self.items.push(attr);
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.items.try_reserve(additional)
    }

    /// Returns the value of the attribute called `name`, compared without
    /// regard to ASCII case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Iterates the attributes, most recently added first.
    pub fn iter(&self) -> std::iter::Rev<std::slice::Iter<'_, Attribute>> {
        self.items.iter().rev()
    }

    /// Iterates the attributes in the order they were added.
    pub fn iter_added(&self) -> std::slice::Iter<'_, Attribute> {
        self.items.iter()
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for AttrList {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (name, value) in iter {
            list.add(name, value);
        }
        list
    }
}

impl<'a> IntoIterator for &'a AttrList {
    type Item = &'a Attribute;
    type IntoIter = std::iter::Rev<std::slice::Iter<'a, Attribute>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_iteration_is_reversed() {
        let attrs: AttrList = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        let added: Vec<&str> = attrs.iter_added().map(|a| a.name.as_str()).collect();
        assert_eq!(added, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_ignores_case() {
        let attrs: AttrList = [("Year", "1994"), ("title", "x")].into_iter().collect();
        assert_eq!(attrs.find("year"), Some("1994"));
        assert_eq!(attrs.find("YEAR"), Some("1994"));
        assert_eq!(attrs.find("TITLE"), Some("x"));
        assert_eq!(attrs.find("yea"), None);
    }

    #[test]
    fn test_empty_value() {
        let mut attrs = AttrList::new();
        attrs.add("flag", "");
        assert_eq!(attrs.find("flag"), Some(""));
        assert_eq!(attrs.len(), 1);
        assert!(!attrs.is_empty());
    }

    #[test]
    fn test_push_after_reserve() {
        let mut attrs = AttrList::new();
        assert!(attrs.try_reserve(1).is_ok());
        attrs.push(Attribute::new("k", "v"));
        assert_eq!(attrs.find("K"), Some("v"));
    }
}
