//! Shape name table.

use std::collections::HashMap;

use tracing::warn;

/// Append-only string table with case-insensitive lookup.
///
/// Every name-bearing record (nodes, objects, details, sequences, IFL
/// materials) stores an index into this table. Indices never change once
/// assigned. The original spelling of the first insertion is kept.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from names in file order.
    ///
    /// Files are not required to be free of case-insensitive duplicates. All
    /// entries are kept so indices stay valid; lookups resolve to the first one.
    pub fn from_names(names: Vec<String>) -> Self {
        let mut lookup = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let key = name.to_lowercase();
            if let Some(first) = lookup.get(&key) {
                warn!(name = %name, index = i, first, "duplicate name in name table");
            } else {
                lookup.insert(key, i);
            }
        }
        Self { names, lookup }
    }

    /// Return the index of `name`, appending it if no entry matches ignoring case.
    pub fn intern(&mut self, name: impl AsRef<str>) -> usize {
        let name = name.as_ref();
        let key = name.to_lowercase();
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name.to_owned());
        self.lookup.insert(key, index);
        index
    }

    /// Index of `name` ignoring case, without inserting.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.lookup.get(&name.to_lowercase()).copied()
    }

    /// Name at `index`.
    pub fn resolve(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Name for a stored `i32` index field. Negative indices resolve to `None`.
    pub fn resolve_index(&self, index: i32) -> Option<&str> {
        usize::try_from(index).ok().and_then(|i| self.resolve(i))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl PartialEq for NameTable {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameTable {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut table = Self::new();
        for name in iter {
            table.intern(name);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_case_insensitive() {
        let mut names = NameTable::new();
        let a = names.intern("Foo");
        let b = names.intern("foo");
        let c = names.intern("FOO");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(names.len(), 1);
        assert_eq!(names.resolve(a), Some("Foo"));
    }

    #[test]
    fn test_indices_are_stable() {
        let mut names: NameTable = ["root", "child"].into_iter().collect();
        assert_eq!(names.intern("Detail32"), 2);
        assert_eq!(names.lookup("ROOT"), Some(0));
        assert_eq!(names.lookup("missing"), None);
        assert_eq!(names.resolve_index(1), Some("child"));
        assert_eq!(names.resolve_index(-1), None);
        assert_eq!(names.resolve_index(3), None);
    }

    #[test]
    fn test_from_names_keeps_duplicates() {
        let names = NameTable::from_names(vec!["Hip".into(), "hip".into(), "Knee".into()]);
        assert_eq!(names.len(), 3);
        assert_eq!(names.lookup("HIP"), Some(0));
        assert_eq!(names.resolve(1), Some("hip"));
    }
}
