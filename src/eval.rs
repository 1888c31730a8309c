use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::domain::{Domain, Slot};
use crate::error::ComparisonError;
use crate::maxima::{rank_order, Maxima, Rank};
use crate::order::Compare;

/// Local-maximum predicate. A missing neighbour (a domain edge) never disqualifies.
pub(crate) fn qualifies<V, C>(
    cmp: &C,
    left: Option<&V>,
    value: &V,
    right: Option<&V>,
) -> Result<bool, ComparisonError>
where
    C: Compare<V> + ?Sized,
{
    if let Some(left) = left {
        if cmp.less(value, left)? {
            return Ok(false);
        }
    }
    if let Some(right) = right {
        if cmp.less(value, right)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The entry a maxima change refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Subject {
    /// An entry already present in the domain.
    Stored(Slot),
    /// The point being written; its slot is only known once the write is applied.
    Written,
}

/// Where an admitted subject goes in the ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    Front,
    After(Rank),
    /// Directly after the subject admitted just before this one.
    Chained,
}

/// Maxima changes decided while preparing a mutation.
///
/// Building a plan is the only fallible part of a mutation and touches nothing. Applying it
/// with [`Plan::commit`] only relinks nodes that were located while planning.
#[derive(Debug)]
pub(crate) struct Plan {
    retire: SmallVec<[Slot; 3]>,
    admit: SmallVec<[(Subject, Anchor); 3]>,
}

impl Plan {
    /// Apply the plan. `write` performs the domain mutation and reports the slot of the
    /// written point, if one survives.
    pub(crate) fn commit<A, V, W>(self, domain: &mut Domain<A, V>, maxima: &mut Maxima, write: W)
    where
        W: FnOnce(&mut Domain<A, V>) -> Option<Slot>,
    {
        log::trace!(
            "committing plan: {} retired, {} admitted",
            self.retire.len(),
            self.admit.len()
        );
        for slot in self.retire {
            maxima.retire(domain, slot);
        }
        let written = write(domain);
        let mut last = None;
        for (subject, anchor) in self.admit {
            let slot = match subject {
                Subject::Stored(slot) => slot,
                Subject::Written => match written {
                    Some(slot) => slot,
                    None => continue,
                },
            };
            let after = match anchor {
                Anchor::Front => None,
                Anchor::After(rank) => Some(rank),
                Anchor::Chained => last,
            };
            last = Some(maxima.admit_after(domain, after, slot));
        }
    }
}

/// Collects the maxima changes caused by writing or erasing one point.
///
/// The domain is read as it is before the mutation; the point being written is described by
/// `written` instead, so its new value can be weighed against the unchanged topology.
pub(crate) struct Planner<'a, A, V, C: ?Sized> {
    domain: &'a Domain<A, V>,
    maxima: &'a Maxima,
    cmp: &'a C,
    written: (&'a V, &'a A),
    retire: SmallVec<[Slot; 3]>,
    admit: SmallVec<[Subject; 3]>,
}

impl<'a, A, V, C> Planner<'a, A, V, C>
where
    C: Compare<A> + Compare<V> + ?Sized,
{
    pub(crate) fn new(
        domain: &'a Domain<A, V>,
        maxima: &'a Maxima,
        cmp: &'a C,
        arg: &'a A,
        value: &'a V,
    ) -> Self {
        Self {
            domain,
            maxima,
            cmp,
            written: (value, arg),
            retire: SmallVec::new(),
            admit: SmallVec::new(),
        }
    }

    /// Re-evaluate a stored entry against the neighbour values it will have afterwards.
    pub(crate) fn reconcile(
        &mut self,
        slot: Slot,
        left: Option<&V>,
        right: Option<&V>,
    ) -> Result<(), ComparisonError> {
        let entry = self.domain.entry(slot);
        let qualifies = qualifies(self.cmp, left, &entry.value, right)?;
        match (self.maxima.contains(self.domain, slot), qualifies) {
            (false, true) => self.admit.push(Subject::Stored(slot)),
            (true, false) => self.retire.push(slot),
            _ => {}
        }
        Ok(())
    }

    /// Evaluate the written point. `previous` is the slot it overwrites, whose ranking keys
    /// on the old value and is always dropped.
    pub(crate) fn reconcile_written(
        &mut self,
        previous: Option<Slot>,
        left: Option<&V>,
        right: Option<&V>,
    ) -> Result<(), ComparisonError> {
        let qualifies = qualifies(self.cmp, left, self.written.0, right)?;
        if let Some(slot) = previous {
            self.drop_ranking(slot);
        }
        if qualifies {
            self.admit.push(Subject::Written);
        }
        Ok(())
    }

    /// Drop the ranking of an entry that is about to change or disappear.
    pub(crate) fn drop_ranking(&mut self, slot: Slot) {
        if self.maxima.contains(self.domain, slot) {
            self.retire.push(slot);
        }
    }

    /// Order the admissions and locate where each one goes.
    pub(crate) fn finish(self) -> Result<Plan, ComparisonError> {
        let mut ordered: SmallVec<[Subject; 3]> = SmallVec::new();
        for &subject in &self.admit {
            let key = self.key(subject);
            let mut at = ordered.len();
            while at > 0 && rank_order(self.cmp, key, self.key(ordered[at - 1]))? == Ordering::Less
            {
                at -= 1;
            }
            ordered.insert(at, subject);
        }

        let mut admit = SmallVec::new();
        let mut previous = None;
        for subject in ordered {
            let (value, arg) = self.key(subject);
            let pred = self.surviving(self.maxima.locate(self.domain, self.cmp, value, arg)?);
            let anchor = if previous == Some(pred) {
                Anchor::Chained
            } else {
                pred.map_or(Anchor::Front, Anchor::After)
            };
            previous = Some(pred);
            admit.push((subject, anchor));
        }
        Ok(Plan {
            retire: self.retire,
            admit,
        })
    }

    fn key(&self, subject: Subject) -> (&'a V, &'a A) {
        match subject {
            Subject::Stored(slot) => {
                let entry = self.domain.entry(slot);
                (&entry.value, &entry.arg)
            }
            Subject::Written => self.written,
        }
    }

    /// Step back from `rank` past every node the plan retires.
    fn surviving(&self, mut rank: Option<Rank>) -> Option<Rank> {
        while let Some(current) = rank {
            if !self.retire.contains(&self.maxima.slot(current)) {
                break;
            }
            rank = self.maxima.prev(current);
        }
        rank
    }
}
