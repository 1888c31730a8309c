//! `function-maxima` keeps a partial function over an ordered domain together with the ranked
//! set of its local maxima. A point is a local maximum when neither of its immediate neighbours
//! (in argument order) holds a greater value; points on the edge of the domain only look at the
//! single neighbour they have, and plateaus count as maxima throughout.
//!
//! ```
//! use function_maxima::FunctionMaxima;
//!
//! let mut f = FunctionMaxima::new();
//! f.set_value(1, 10).unwrap();
//! f.set_value(2, 5).unwrap();
//! f.set_value(3, 10).unwrap();
//!
//! let maxima: Vec<_> = f.maxima_iter().map(|p| (*p.arg(), *p.value())).collect();
//! assert_eq!(maxima, vec![(1, 10), (3, 10)]);
//!
//! f.set_value(2, 20).unwrap();
//! let top = f.maxima_iter().next().unwrap();
//! assert_eq!((*top.arg(), *top.value()), (2, 20));
//! ```
//!
//! Orderings are allowed to fail. Every argument and value comparison goes through a
//! [`Compare`] implementation which may return a [`ComparisonError`]; [`Natural`] is the
//! infallible default for [`Ord`] types and [`Fallible`] adapts types implementing [`TryLess`].
//! A mutation whose comparison fails returns the error and leaves the structure exactly as it
//! was:
//!
//! ```
//! use std::cell::Cell;
//! use function_maxima::{Compare, ComparisonError, FunctionMaxima};
//!
//! #[derive(Default)]
//! struct Picky(Cell<bool>);
//!
//! impl Compare<i32> for Picky {
//!     fn less(&self, lhs: &i32, rhs: &i32) -> Result<bool, ComparisonError> {
//!         if self.0.get() {
//!             return Err(ComparisonError::new("comparisons are switched off"));
//!         }
//!         Ok(lhs < rhs)
//!     }
//! }
//!
//! let mut f = FunctionMaxima::with_comparator(Picky::default());
//! f.set_value(1, 1).unwrap();
//! f.comparator().0.set(true);
//! assert!(f.set_value(2, 2).is_err());
//! f.comparator().0.set(false);
//! assert_eq!(f.size(), 1);
//! ```
//!
//! Internally, a mutation first plans every change to the maxima ranking without touching
//! anything (this is where comparisons happen), then commits the plan with positional,
//! comparison-free tree operations. Only the written point and its two neighbours are ever
//! re-evaluated, so both `set_value` and `erase` run in logarithmic time.
use std::fmt;

use crate::domain::{Domain, Slot};
use crate::eval::{Plan, Planner};
use crate::maxima::Maxima;
use crate::tree::Search;

pub use crate::error::{ComparisonError, LookupError};
pub use crate::order::{Compare, Fallible, Natural, TryLess};
pub use crate::point::{DomainIter, MaximaIter, Point};

/// Consistency checking for the two indices.
#[cfg(any(test, feature = "audit"))]
pub mod audit;
mod domain;
/// Error types.
pub mod error;
mod eval;
mod maxima;
/// Fallible orderings.
pub mod order;
/// Point views and iterators.
pub mod point;
mod tree;

#[cfg(test)]
mod test;

/// How a prepared `set_value` lands in the domain.
#[derive(Clone, Copy, Debug)]
enum Target {
    Overwrite(Slot),
    Insert(Option<Slot>),
}

/// A partial function from `A` to `V` that tracks its local maxima.
///
/// `C` decides how arguments and values are ordered; see [`Compare`].
#[derive(Clone)]
pub struct FunctionMaxima<A, V, C = Natural> {
    domain: Domain<A, V>,
    maxima: Maxima,
    cmp: C,
}

impl<A, V> FunctionMaxima<A, V> {
    /// Create an empty function ordered by [`Ord`].
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<A, V, C: Default> Default for FunctionMaxima<A, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<A, V, C> FunctionMaxima<A, V, C> {
    /// Create an empty function ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            domain: Domain::new(),
            maxima: Maxima::new(),
            cmp,
        }
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Number of arguments with a value.
    pub fn size(&self) -> usize {
        self.domain.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Points in ascending argument order.
    pub fn iter(&self) -> DomainIter<'_, A, V> {
        DomainIter::new(&self.domain)
    }

    /// Same as [`FunctionMaxima::iter`].
    pub fn domain_iter(&self) -> DomainIter<'_, A, V> {
        self.iter()
    }

    /// Local maxima by descending value, ties by ascending argument. The first item, if any,
    /// is a global maximum.
    pub fn maxima_iter(&self) -> MaximaIter<'_, A, V> {
        MaximaIter::new(&self.domain, &self.maxima)
    }
}

impl<A, V, C: Compare<A>> FunctionMaxima<A, V, C> {
    /// The value at `arg`.
    pub fn value_at(&self, arg: &A) -> Result<&V, LookupError> {
        match self.domain.search(&self.cmp, arg)? {
            Search::Found(slot) => Ok(&self.domain.entry(slot).value),
            Search::Vacant { .. } => Err(LookupError::NotFound),
        }
    }

    /// The point at `arg`, if the function is defined there.
    pub fn find(&self, arg: &A) -> Result<Option<Point<'_, A, V>>, ComparisonError> {
        Ok(match self.domain.search(&self.cmp, arg)? {
            Search::Found(slot) => Some(Point::new(self.domain.entry(slot))),
            Search::Vacant { .. } => None,
        })
    }

    /// Whether the point at `arg` currently is a local maximum.
    pub fn is_local_maximum(&self, arg: &A) -> Result<bool, LookupError> {
        match self.domain.search(&self.cmp, arg)? {
            Search::Found(slot) => Ok(self.maxima.contains(&self.domain, slot)),
            Search::Vacant { .. } => Err(LookupError::NotFound),
        }
    }
}

impl<A, V, C> FunctionMaxima<A, V, C>
where
    C: Compare<A> + Compare<V>,
{
    /// Define the function at `arg` as `value`, replacing any previous value.
    ///
    /// Writing a value equivalent to the current one changes nothing. On error the function
    /// and its maxima are left untouched.
    pub fn set_value(&mut self, arg: A, value: V) -> Result<(), ComparisonError> {
        let prepared = self
            .prepare_set(&arg, &value)
            .inspect_err(|err| log::trace!("set_value abandoned before commit: {err}"))?;
        let Some((plan, target)) = prepared else {
            return Ok(());
        };
        plan.commit(&mut self.domain, &mut self.maxima, move |domain| {
            Some(match target {
                Target::Overwrite(slot) => {
                    domain.entry_mut(slot).value = value;
                    slot
                }
                Target::Insert(pred) => domain.insert_after(pred, arg, value),
            })
        });
        Ok(())
    }

    /// Remove `arg` from the domain. Unknown arguments are ignored.
    ///
    /// On error the function and its maxima are left untouched.
    pub fn erase(&mut self, arg: &A) -> Result<(), ComparisonError> {
        let prepared = self
            .prepare_erase(arg)
            .inspect_err(|err| log::trace!("erase abandoned before commit: {err}"))?;
        if let Some((plan, slot)) = prepared {
            plan.commit(&mut self.domain, &mut self.maxima, |domain| {
                domain.remove(slot);
                None
            });
        }
        Ok(())
    }

    fn prepare_set(&self, arg: &A, value: &V) -> Result<Option<(Plan, Target)>, ComparisonError> {
        let domain = &self.domain;
        let (target, left, right) = match domain.search(&self.cmp, arg)? {
            Search::Found(slot) => {
                if Compare::<V>::equivalent(&self.cmp, &domain.entry(slot).value, value)? {
                    return Ok(None);
                }
                (Target::Overwrite(slot), domain.prev(slot), domain.next(slot))
            }
            Search::Vacant { pred, succ } => (Target::Insert(pred), pred, succ),
        };
        let previous = match target {
            Target::Overwrite(slot) => Some(slot),
            Target::Insert(_) => None,
        };

        let mut planner = Planner::new(domain, &self.maxima, &self.cmp, arg, value);
        planner.reconcile_written(previous, domain.value(left), domain.value(right))?;
        if let Some(left) = left {
            planner.reconcile(left, domain.value(domain.prev(left)), Some(value))?;
        }
        if let Some(right) = right {
            planner.reconcile(right, Some(value), domain.value(domain.next(right)))?;
        }
        Ok(Some((planner.finish()?, target)))
    }

    fn prepare_erase(&self, arg: &A) -> Result<Option<(Plan, Slot)>, ComparisonError> {
        let domain = &self.domain;
        let slot = match domain.search(&self.cmp, arg)? {
            Search::Found(slot) => slot,
            Search::Vacant { .. } => return Ok(None),
        };
        let entry = domain.entry(slot);
        let (left, right) = (domain.prev(slot), domain.next(slot));

        // The neighbours become adjacent once the point is gone.
        let mut planner = Planner::new(domain, &self.maxima, &self.cmp, &entry.arg, &entry.value);
        planner.drop_ranking(slot);
        if let Some(left) = left {
            planner.reconcile(left, domain.value(domain.prev(left)), domain.value(right))?;
        }
        if let Some(right) = right {
            planner.reconcile(right, domain.value(left), domain.value(domain.next(right)))?;
        }
        Ok(Some((planner.finish()?, slot)))
    }
}

impl<'a, A, V, C> IntoIterator for &'a FunctionMaxima<A, V, C> {
    type Item = Point<'a, A, V>;
    type IntoIter = DomainIter<'a, A, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A: fmt::Debug, V: fmt::Debug, C> fmt::Debug for FunctionMaxima<A, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let domain: Vec<_> = self.iter().map(<(&A, &V)>::from).collect();
        let maxima: Vec<_> = self.maxima_iter().map(<(&A, &V)>::from).collect();
        f.debug_struct("FunctionMaxima")
            .field("domain", &domain)
            .field("maxima", &maxima)
            .finish()
    }
}
