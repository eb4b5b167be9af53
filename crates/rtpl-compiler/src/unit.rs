use std::hash::Hash;
use std::hash::Hasher;

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::names::Namespace;
use crate::names::QualifiedName;

/// One generated Rust module. Identity is the qualified name alone.
#[derive(Clone, Debug)]
pub struct CompilationUnit {
    name: QualifiedName,
    source: String,
    code: String,
}

impl CompilationUnit {
    #[must_use]
    pub fn new(name: QualifiedName, source: impl Into<String>, code: String) -> Self {
        Self {
            name,
            source: source.into(),
            code,
        }
    }

    #[must_use]
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Resolver name of the template source the unit was generated from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl PartialEq for CompilationUnit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CompilationUnit {}

impl Hash for CompilationUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Reserved(String),
    Ready(CompilationUnit),
}

impl Slot {
    fn source(&self) -> &str {
        match self {
            Slot::Reserved(source) => source,
            Slot::Ready(unit) => &unit.source,
        }
    }
}

/// Two different sources mapped to the same qualified name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameCollision {
    pub name: QualifiedName,
    pub existing: String,
    pub incoming: String,
}

/// Every unit produced by one top-level compile, in first-encounter order.
///
/// A tag or layout is reserved before its body is generated so that a second
/// reference (including a recursive one) finds it present and stops there.
#[derive(Clone, Debug, Default)]
pub struct DependencySet {
    units: IndexMap<QualifiedName, Slot>,
}

impl DependencySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source the unit `name` was (or is being) generated from.
    #[must_use]
    pub fn source(&self, name: &QualifiedName) -> Option<&str> {
        self.units.get(name).map(Slot::source)
    }

    /// Claim `name` for `source` ahead of generation. Returns `false` if it
    /// was already present.
    pub fn reserve(&mut self, name: QualifiedName, source: impl Into<String>) -> bool {
        match self.units.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Slot::Reserved(source.into()));
                true
            }
        }
    }

    /// Store a unit, filling its reservation in place or appending it.
    pub fn finalize(&mut self, unit: CompilationUnit) {
        self.units.insert(unit.name.clone(), Slot::Ready(unit));
    }

    #[must_use]
    pub fn get(&self, name: &QualifiedName) -> Option<&CompilationUnit> {
        match self.units.get(name)? {
            Slot::Ready(unit) => Some(unit),
            Slot::Reserved(_) => None,
        }
    }

    /// Finalized units in insertion order.
    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.values().filter_map(|slot| match slot {
            Slot::Ready(unit) => Some(unit),
            Slot::Reserved(_) => None,
        })
    }

    pub fn templates(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units()
            .filter(|unit| unit.name.namespace() == Namespace::Templates)
    }

    /// The unit inserted last, which is the top-level template of a compile.
    #[must_use]
    pub fn main(&self) -> Option<&CompilationUnit> {
        match self.units.last()?.1 {
            Slot::Ready(unit) => Some(unit),
            Slot::Reserved(_) => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.units
            .values()
            .all(|slot| matches!(slot, Slot::Ready(_)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Add the units of `other` not already present here. Fails without
    /// changing `self` if a name present on both sides comes from different
    /// sources.
    pub fn merge(&mut self, other: DependencySet) -> Result<(), NameCollision> {
        for (name, slot) in &other.units {
            if let Some(existing) = self.source(name) {
                if existing != slot.source() {
                    return Err(NameCollision {
                        name: name.clone(),
                        existing: existing.to_string(),
                        incoming: slot.source().to_string(),
                    });
                }
            }
        }
        for (name, slot) in other.units {
            self.units.entry(name).or_insert(slot);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::Naming;

    fn tag(path: &str) -> QualifiedName {
        Naming::default().qualify(Namespace::Tags, path)
    }

    #[test]
    fn test_reserve_then_finalize_keeps_position() {
        let mut set = DependencySet::new();
        assert!(set.reserve(tag("a.rtag"), "a.rtag"));
        set.finalize(CompilationUnit::new(tag("b.rtag"), "b.rtag", "b".to_string()));
        assert!(!set.is_complete());
        assert!(set.get(&tag("a.rtag")).is_none());

        set.finalize(CompilationUnit::new(tag("a.rtag"), "a.rtag", "a".to_string()));
        assert!(set.is_complete());
        let codes: Vec<_> = set.units().map(CompilationUnit::code).collect();
        assert_eq!(codes, vec!["a", "b"]);
    }

    #[test]
    fn test_reserve_twice() {
        let mut set = DependencySet::new();
        assert!(set.reserve(tag("a.rtag"), "a.rtag"));
        assert!(!set.reserve(tag("a.rtag"), "a.rtag"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_units_compare_by_name() {
        let first = CompilationUnit::new(tag("a.rtag"), "a.rtag", "one".to_string());
        let second = CompilationUnit::new(tag("a.rtag"), "a.rtag", "two".to_string());
        assert_eq!(first, second);
    }

    #[test]
    fn test_main_is_last() {
        let mut set = DependencySet::new();
        set.finalize(CompilationUnit::new(tag("a.rtag"), "a.rtag", String::new()));
        let main = Naming::default().qualify(Namespace::Templates, "index.rtpl");
        set.finalize(CompilationUnit::new(main.clone(), "index.rtpl", String::new()));
        assert_eq!(set.main().map(CompilationUnit::name), Some(&main));
        assert_eq!(set.templates().count(), 1);
    }

    #[test]
    fn test_merge_dedups_by_name() {
        let mut left = DependencySet::new();
        left.finalize(CompilationUnit::new(tag("a.rtag"), "a.rtag", "left".to_string()));

        let mut right = DependencySet::new();
        right.finalize(CompilationUnit::new(tag("a.rtag"), "a.rtag", "right".to_string()));
        right.finalize(CompilationUnit::new(tag("b.rtag"), "b.rtag", "b".to_string()));

        left.merge(right).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(left.get(&tag("a.rtag")).map(CompilationUnit::code), Some("left"));
        assert_eq!(left.source(&tag("b.rtag")), Some("b.rtag"));
    }

    #[test]
    fn test_merge_rejects_colliding_sources() {
        let naming = Naming::default();
        let dash = naming.qualify(Namespace::Templates, "my-page.rtpl");
        let underscore = naming.qualify(Namespace::Templates, "my_page.rtpl");
        assert_eq!(dash, underscore);

        let mut left = DependencySet::new();
        left.finalize(CompilationUnit::new(dash, "my-page.rtpl", "dash".to_string()));

        let mut right = DependencySet::new();
        right.finalize(CompilationUnit::new(tag("b.rtag"), "b.rtag", "b".to_string()));
        right.finalize(CompilationUnit::new(
            underscore.clone(),
            "my_page.rtpl",
            "underscore".to_string(),
        ));

        let err = left.merge(right).unwrap_err();
        assert_eq!(err.name, underscore);
        assert_eq!(err.existing, "my-page.rtpl");
        assert_eq!(err.incoming, "my_page.rtpl");
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn test_reserved_source() {
        let mut set = DependencySet::new();
        set.reserve(tag("a.rtag"), "a.rtag");
        assert_eq!(set.source(&tag("a.rtag")), Some("a.rtag"));
        assert_eq!(set.source(&tag("b.rtag")), None);
    }
}
