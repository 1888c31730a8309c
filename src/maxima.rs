use std::cmp::Ordering;

use slotmap::new_key_type;

use crate::domain::{Domain, Slot};
use crate::error::ComparisonError;
use crate::order::Compare;
use crate::tree::{Iter, Search, Tree};

new_key_type! {
    /// Stable handle on a node of the maxima index.
    pub(crate) struct Rank;
}

/// Orders two `(value, argument)` keys the way maxima are ranked: higher values first,
/// ties broken by ascending argument.
pub(crate) fn rank_order<A, V, C>(
    cmp: &C,
    lhs: (&V, &A),
    rhs: (&V, &A),
) -> Result<Ordering, ComparisonError>
where
    C: Compare<A> + Compare<V> + ?Sized,
{
    match Compare::<V>::compare(cmp, rhs.0, lhs.0)? {
        Ordering::Equal => Compare::<A>::compare(cmp, lhs.1, rhs.1),
        order => Ok(order),
    }
}

/// The ranked set of current local maxima.
///
/// Each node only names the domain [`Slot`] it ranks; ordering keys are always read back from
/// the domain, so the index never owns a copy of an argument or a value. Membership is
/// mirrored by [`crate::domain::Entry::rank`], which lets [`Maxima::admit_after`] and
/// [`Maxima::retire`] work without comparing anything.
#[derive(Clone, Debug)]
pub(crate) struct Maxima {
    tree: Tree<Rank, Slot>,
}

impl Maxima {
    pub(crate) fn new() -> Self {
        Self { tree: Tree::new() }
    }

    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn len(&self) -> usize {
        self.tree.len()
    }

    pub(crate) fn slot(&self, rank: Rank) -> Slot {
        *self.tree.get(rank)
    }

    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn try_slot(&self, rank: Rank) -> Option<Slot> {
        self.tree.try_get(rank).copied()
    }

    pub(crate) fn prev(&self, rank: Rank) -> Option<Rank> {
        self.tree.prev(rank)
    }

    pub(crate) fn iter(&self) -> Iter<'_, Rank, Slot> {
        self.tree.iter()
    }

    pub(crate) fn contains<A, V>(&self, domain: &Domain<A, V>, slot: Slot) -> bool {
        domain.entry(slot).rank.is_some()
    }

    fn search<A, V, C>(
        &self,
        domain: &Domain<A, V>,
        cmp: &C,
        value: &V,
        arg: &A,
    ) -> Result<Search<Rank>, ComparisonError>
    where
        C: Compare<A> + Compare<V> + ?Sized,
    {
        self.tree.search(|slot| {
            let entry = domain.entry(*slot);
            rank_order(cmp, (value, arg), (&entry.value, &entry.arg))
        })
    }

    /// Look up the node ranking exactly `(value, arg)`.
    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn find<A, V, C>(
        &self,
        domain: &Domain<A, V>,
        cmp: &C,
        value: &V,
        arg: &A,
    ) -> Result<Option<Rank>, ComparisonError>
    where
        C: Compare<A> + Compare<V> + ?Sized,
    {
        Ok(match self.search(domain, cmp, value, arg)? {
            Search::Found(rank) => Some(rank),
            Search::Vacant { .. } => None,
        })
    }

    /// The last node ranked before `(value, arg)`; `None` means the key would rank first.
    pub(crate) fn locate<A, V, C>(
        &self,
        domain: &Domain<A, V>,
        cmp: &C,
        value: &V,
        arg: &A,
    ) -> Result<Option<Rank>, ComparisonError>
    where
        C: Compare<A> + Compare<V> + ?Sized,
    {
        Ok(match self.search(domain, cmp, value, arg)? {
            // Only an inconsistent ordering lets a distinct entry rank as equivalent; keep
            // both adjacent.
            Search::Found(rank) => Some(rank),
            Search::Vacant { pred, .. } => pred,
        })
    }

    /// Rank `slot` right after `after`. A slot that is already ranked keeps its node.
    pub(crate) fn admit_after<A, V>(
        &mut self,
        domain: &mut Domain<A, V>,
        after: Option<Rank>,
        slot: Slot,
    ) -> Rank {
        if let Some(rank) = domain.entry(slot).rank {
            return rank;
        }
        let rank = self.tree.insert_after(after, slot);
        domain.entry_mut(slot).rank = Some(rank);
        rank
    }

    /// Drop the ranking of `slot`. Unranked slots are left alone.
    pub(crate) fn retire<A, V>(&mut self, domain: &mut Domain<A, V>, slot: Slot) {
        if let Some(rank) = domain.entry_mut(slot).rank.take() {
            let removed = self.tree.remove(rank);
            debug_assert_eq!(removed, Some(slot));
        }
    }

    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        self.tree.check()
    }
}
