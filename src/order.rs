use std::cmp::Ordering;

use crate::error::ComparisonError;

/// A strict weak ordering over `T` whose predicate is allowed to fail.
///
/// Only [`Compare::less`] has to be provided. Equality is never consulted: two items are
/// considered the same whenever neither is less than the other.
pub trait Compare<T: ?Sized> {
    /// Returns whether `lhs` is strictly less than `rhs`.
    fn less(&self, lhs: &T, rhs: &T) -> Result<bool, ComparisonError>;

    /// Returns whether neither side is less than the other.
    fn equivalent(&self, lhs: &T, rhs: &T) -> Result<bool, ComparisonError> {
        Ok(!self.less(lhs, rhs)? && !self.less(rhs, lhs)?)
    }

    /// Three-way comparison assembled from at most two calls to [`Compare::less`].
    fn compare(&self, lhs: &T, rhs: &T) -> Result<Ordering, ComparisonError> {
        if self.less(lhs, rhs)? {
            Ok(Ordering::Less)
        } else if self.less(rhs, lhs)? {
            Ok(Ordering::Greater)
        } else {
            Ok(Ordering::Equal)
        }
    }
}

/// The total order of [`Ord`]; never fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    #[inline]
    fn less(&self, lhs: &T, rhs: &T) -> Result<bool, ComparisonError> {
        Ok(lhs < rhs)
    }
}

/// Types carrying their own fallible `<`.
pub trait TryLess {
    /// Returns whether `self` is strictly less than `other`.
    fn try_less(&self, other: &Self) -> Result<bool, ComparisonError>;
}

/// Orders every [`TryLess`] type by its own predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Fallible;

impl<T: TryLess + ?Sized> Compare<T> for Fallible {
    #[inline]
    fn less(&self, lhs: &T, rhs: &T) -> Result<bool, ComparisonError> {
        lhs.try_less(rhs)
    }
}
