use slotmap::new_key_type;

use crate::error::ComparisonError;
use crate::maxima::Rank;
use crate::order::Compare;
use crate::tree::{Iter, Search, Tree};

new_key_type! {
    /// Stable handle on a domain entry.
    pub(crate) struct Slot;
}

/// One point of the function.
#[derive(Clone, Debug)]
pub(crate) struct Entry<A, V> {
    pub(crate) arg: A,
    pub(crate) value: V,
    /// Node of this entry in the maxima index, if it currently is a local maximum.
    pub(crate) rank: Option<Rank>,
}

/// The argument-ordered map from arguments to values.
#[derive(Clone, Debug)]
pub(crate) struct Domain<A, V> {
    tree: Tree<Slot, Entry<A, V>>,
}

impl<A, V> Domain<A, V> {
    pub(crate) fn new() -> Self {
        Self { tree: Tree::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len()
    }

    pub(crate) fn entry(&self, slot: Slot) -> &Entry<A, V> {
        self.tree.get(slot)
    }

    pub(crate) fn entry_mut(&mut self, slot: Slot) -> &mut Entry<A, V> {
        self.tree.get_mut(slot)
    }

    pub(crate) fn value(&self, slot: Option<Slot>) -> Option<&V> {
        slot.map(|slot| &self.entry(slot).value)
    }

    pub(crate) fn prev(&self, slot: Slot) -> Option<Slot> {
        self.tree.prev(slot)
    }

    pub(crate) fn next(&self, slot: Slot) -> Option<Slot> {
        self.tree.next(slot)
    }

    /// Locate `arg`, or the pair of entries it would be inserted between.
    pub(crate) fn search<C>(&self, cmp: &C, arg: &A) -> Result<Search<Slot>, ComparisonError>
    where
        C: Compare<A> + ?Sized,
    {
        self.tree.search(|entry| cmp.compare(arg, &entry.arg))
    }

    /// Insert a fresh entry right after `pred`, as located by [`Domain::search`].
    pub(crate) fn insert_after(&mut self, pred: Option<Slot>, arg: A, value: V) -> Slot {
        self.tree.insert_after(
            pred,
            Entry {
                arg,
                value,
                rank: None,
            },
        )
    }

    pub(crate) fn remove(&mut self, slot: Slot) -> Option<Entry<A, V>> {
        self.tree.remove(slot)
    }

    pub(crate) fn iter(&self) -> Iter<'_, Slot, Entry<A, V>> {
        self.tree.iter()
    }

    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        self.tree.check()
    }
}
