use std::fmt;
use std::iter::FusedIterator;

use crate::domain::{Domain, Entry, Slot};
use crate::maxima::{Maxima, Rank};
use crate::tree::Iter;

/// A read-only view on one point of the function.
///
/// Points borrow the structure they were taken from, so no mutation can happen while one is
/// alive.
pub struct Point<'a, A, V> {
    arg: &'a A,
    value: &'a V,
}

impl<'a, A, V> Point<'a, A, V> {
    pub(crate) fn new(entry: &'a Entry<A, V>) -> Self {
        Self {
            arg: &entry.arg,
            value: &entry.value,
        }
    }

    /// The argument of this point.
    pub fn arg(&self) -> &'a A {
        self.arg
    }

    /// The value the function takes at [`Point::arg`].
    pub fn value(&self) -> &'a V {
        self.value
    }
}

impl<A, V> Clone for Point<'_, A, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, V> Copy for Point<'_, A, V> {}

impl<A: fmt::Debug, V: fmt::Debug> fmt::Debug for Point<'_, A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Point").field(self.arg).field(self.value).finish()
    }
}

impl<'a, A, V> From<Point<'a, A, V>> for (&'a A, &'a V) {
    fn from(point: Point<'a, A, V>) -> Self {
        (point.arg, point.value)
    }
}

/// Points in ascending argument order.
pub struct DomainIter<'a, A, V> {
    inner: Iter<'a, Slot, Entry<A, V>>,
}

impl<'a, A, V> DomainIter<'a, A, V> {
    pub(crate) fn new(domain: &'a Domain<A, V>) -> Self {
        Self {
            inner: domain.iter(),
        }
    }
}

impl<'a, A, V> Iterator for DomainIter<'a, A, V> {
    type Item = Point<'a, A, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, entry)| Point::new(entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A, V> DoubleEndedIterator for DomainIter<'_, A, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, entry)| Point::new(entry))
    }
}

impl<A, V> ExactSizeIterator for DomainIter<'_, A, V> {}

impl<A, V> FusedIterator for DomainIter<'_, A, V> {}

impl<A, V> Clone for DomainIter<'_, A, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Local maxima by descending value, ties by ascending argument.
pub struct MaximaIter<'a, A, V> {
    domain: &'a Domain<A, V>,
    inner: Iter<'a, Rank, Slot>,
}

impl<'a, A, V> MaximaIter<'a, A, V> {
    pub(crate) fn new(domain: &'a Domain<A, V>, maxima: &'a Maxima) -> Self {
        Self {
            domain,
            inner: maxima.iter(),
        }
    }
}

impl<'a, A, V> Iterator for MaximaIter<'a, A, V> {
    type Item = Point<'a, A, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, slot) = self.inner.next()?;
        Some(Point::new(self.domain.entry(*slot)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A, V> DoubleEndedIterator for MaximaIter<'_, A, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (_, slot) = self.inner.next_back()?;
        Some(Point::new(self.domain.entry(*slot)))
    }
}

impl<A, V> ExactSizeIterator for MaximaIter<'_, A, V> {}

impl<A, V> FusedIterator for MaximaIter<'_, A, V> {}

impl<A, V> Clone for MaximaIter<'_, A, V> {
    fn clone(&self) -> Self {
        Self {
            domain: self.domain,
            inner: self.inner.clone(),
        }
    }
}
