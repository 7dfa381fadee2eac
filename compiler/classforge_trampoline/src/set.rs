//! A de-duplicated, deterministically ordered collection of trampolines.
//!
//! Built on `BTreeSet` rather than a hash set so iteration order is always
//! the total order `Trampoline`'s derived `Ord` defines — no separate sort
//! pass is ever needed before emitting declarations. Per-class accumulation
//! merges via `union`, which is plain set union and therefore commutative
//! and associative: compiling classes in any order, or in parallel, and
//! merging the results, produces the same final set.

use std::collections::BTreeSet;

use crate::trampoline::Trampoline;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrampolineSet {
    inner: BTreeSet<Trampoline>,
}

impl TrampolineSet {
    pub fn new() -> Self {
        TrampolineSet { inner: BTreeSet::new() }
    }

    /// Records a trampoline, returning `true` if it was not already present.
    pub fn insert(&mut self, trampoline: Trampoline) -> bool {
        self.inner.insert(trampoline)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, trampoline: &Trampoline) -> bool {
        self.inner.contains(trampoline)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trampoline> {
        self.inner.iter()
    }

    /// Merges `other` into `self`. Order-independent: `a.union(b)` and
    /// `b.union(a)` produce equal sets, and unioning is associative, so
    /// per-class trampoline sets compiled independently can be folded
    /// together in any order.
    pub fn union(&mut self, other: &TrampolineSet) {
        for t in &other.inner {
            self.inner.insert(t.clone());
        }
    }
}

impl FromIterator<Trampoline> for TrampolineSet {
    fn from_iter<I: IntoIterator<Item = Trampoline>>(iter: I) -> Self {
        TrampolineSet { inner: iter.into_iter().collect() }
    }
}

impl IntoIterator for TrampolineSet {
    type Item = Trampoline;
    type IntoIter = std::collections::btree_set::IntoIter<Trampoline>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut set = TrampolineSet::new();
        let t = Trampoline::new_get_field("A", "B", "x", "I");
        assert!(set.insert(t.clone()));
        assert!(!set.insert(t));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn union_is_commutative() {
        let mut a = TrampolineSet::new();
        a.insert(Trampoline::new_get_field("A", "B", "x", "I"));
        let mut b = TrampolineSet::new();
        b.insert(Trampoline::new_put_field("A", "B", "y", "I"));

        let mut ab = a.clone();
        ab.union(&b);
        let mut ba = b.clone();
        ba.union(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 2);
    }

    #[test]
    fn iteration_order_matches_total_order() {
        let mut set = TrampolineSet::new();
        set.insert(Trampoline::new_put_field("A", "B", "x", "I"));
        set.insert(Trampoline::new_get_field("A", "B", "x", "I"));
        let kinds: Vec<_> = set.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![crate::trampoline::TrampolineKind::GetField, crate::trampoline::TrampolineKind::PutField]);
    }
}
