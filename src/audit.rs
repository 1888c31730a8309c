use thiserror::Error;

use crate::domain::{Entry, Slot};
use crate::error::ComparisonError;
use crate::eval::qualifies;
use crate::maxima::rank_order;
use crate::order::Compare;
use crate::FunctionMaxima;

/// An inconsistency found by [`FunctionMaxima::audit`].
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{index} index is malformed: {reason}")]
    Malformed {
        index: &'static str,
        reason: &'static str,
    },
    #[error("domain is not strictly ascending at position {0}")]
    Unordered(usize),
    #[error("point at position {0} links to a maxima node that does not rank it")]
    Dangling(usize),
    #[error("point at position {0} is a local maximum but is not ranked")]
    Missing(usize),
    #[error("point at position {0} is ranked but is not a local maximum")]
    Spurious(usize),
    #[error("maxima index holds {ranked} nodes for {linked} ranked points")]
    Unlinked { ranked: usize, linked: usize },
    #[error("maxima ranking is out of order at rank {0}")]
    Misranked(usize),
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
}

impl<A, V, C> FunctionMaxima<A, V, C>
where
    C: Compare<A> + Compare<V>,
{
    /// Check both indices against each other and against the local-maximum predicate.
    ///
    /// Runs in linear time and compares every neighbouring pair, so a failing comparator
    /// surfaces as [`AuditError::Comparison`].
    pub fn audit(&self) -> Result<(), AuditError> {
        self.domain
            .check()
            .map_err(|reason| AuditError::Malformed {
                index: "domain",
                reason,
            })?;
        self.maxima
            .check()
            .map_err(|reason| AuditError::Malformed {
                index: "maxima",
                reason,
            })?;

        let entries: Vec<(Slot, &Entry<A, V>)> = self.domain.iter().collect();
        let mut linked = 0;
        for (position, &(slot, entry)) in entries.iter().enumerate() {
            let left = position.checked_sub(1).map(|prev| entries[prev].1);
            let right = entries.get(position + 1).map(|&(_, next)| next);
            if let Some(left) = left {
                if !Compare::<A>::less(&self.cmp, &left.arg, &entry.arg)? {
                    return Err(AuditError::Unordered(position));
                }
            }

            let expected = qualifies(
                &self.cmp,
                left.map(|left| &left.value),
                &entry.value,
                right.map(|right| &right.value),
            )?;
            match entry.rank {
                Some(rank) => {
                    linked += 1;
                    if self.maxima.try_slot(rank) != Some(slot)
                        || self
                            .maxima
                            .find(&self.domain, &self.cmp, &entry.value, &entry.arg)?
                            != Some(rank)
                    {
                        return Err(AuditError::Dangling(position));
                    }
                    if !expected {
                        return Err(AuditError::Spurious(position));
                    }
                }
                None if expected => return Err(AuditError::Missing(position)),
                None => {}
            }
        }
        if linked != self.maxima.len() {
            return Err(AuditError::Unlinked {
                ranked: self.maxima.len(),
                linked,
            });
        }

        let mut ranked = self.maxima.iter().map(|(_, slot)| self.domain.entry(*slot));
        if let Some(mut prev) = ranked.next() {
            for (position, next) in ranked.enumerate() {
                let order = rank_order(
                    &self.cmp,
                    (&prev.value, &prev.arg),
                    (&next.value, &next.arg),
                )?;
                if order != std::cmp::Ordering::Less {
                    return Err(AuditError::Misranked(position + 1));
                }
                prev = next;
            }
        }
        Ok(())
    }
}
