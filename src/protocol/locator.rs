//! Range locator: maps a position range onto chain indices

use crate::config::Universe;
use crate::error::{ProtocolError, Result};

/// Inclusive index range into a position array, never empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    start: usize,
    end: usize,
}

impl IndexRange {
    /// `None` when `end < start`
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// One more index on each side, `None` if that would step below index 0
    pub fn widened(&self) -> Option<Self> {
        Some(Self {
            start: self.start.checked_sub(1)?,
            end: self.end.checked_add(1)?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RangeLocator {
    universe: Universe,
}

impl RangeLocator {
    pub fn new(universe: Universe) -> Self {
        Self { universe }
    }

    /// First index with `position >= start` and last index with `position <= end`
    ///
    /// `positions` must be strictly increasing. Returns `None` when no entry
    /// falls inside `[start, end]`.
    pub fn locate(&self, positions: &[u32], start: u32, end: u32) -> Result<Option<IndexRange>> {
        if start > end {
            return Err(ProtocolError::RangeViolation(format!(
                "query range start {} exceeds end {}",
                start, end
            )));
        }
        if end > self.universe.max_position() {
            return Err(ProtocolError::RangeViolation(format!(
                "query range end {} beyond universe of {}",
                end,
                self.universe.max_position()
            )));
        }

        let mut first = None;
        let mut last = None;
        for (i, &position) in positions.iter().enumerate() {
            if position > end {
                break;
            }
            if position >= start {
                first.get_or_insert(i);
                last = Some(i);
            }
        }

        Ok(match (first, last) {
            (Some(start), Some(end)) => Some(IndexRange { start, end }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> RangeLocator {
        RangeLocator::new(Universe::new(1000).unwrap())
    }

    #[test]
    fn test_covering_range() {
        let found = locator().locate(&[50, 100, 150], 0, 200).unwrap();
        assert_eq!(found, IndexRange::new(0, 2));
        assert_eq!(found.unwrap().len(), 3);
    }

    #[test]
    fn test_gap_yields_none() {
        assert_eq!(locator().locate(&[50, 100, 150], 120, 140).unwrap(), None);
        assert_eq!(locator().locate(&[50, 100, 150], 151, 900).unwrap(), None);
        assert_eq!(locator().locate(&[50, 100, 150], 1, 49).unwrap(), None);
        assert_eq!(locator().locate(&[], 1, 49).unwrap(), None);
    }

    #[test]
    fn test_inclusive_bounds() {
        let found = locator().locate(&[0, 50, 100, 150, 1001], 50, 100).unwrap();
        assert_eq!(found, IndexRange::new(1, 2));
        let single = locator().locate(&[0, 50, 100, 150, 1001], 60, 120).unwrap();
        assert_eq!(single, IndexRange::new(2, 2));
    }

    #[test]
    fn test_invalid_query_ranges() {
        assert!(matches!(
            locator().locate(&[50], 60, 40),
            Err(ProtocolError::RangeViolation(_))
        ));
        assert!(matches!(
            locator().locate(&[50], 1, 1001),
            Err(ProtocolError::RangeViolation(_))
        ));
    }

    #[test]
    fn test_index_range_rejects_reversed_bounds() {
        assert_eq!(IndexRange::new(3, 2), None);
        assert_eq!(IndexRange::new(0, usize::MAX).map(|r| r.len()), Some(usize::MAX));

        let single = IndexRange::new(4, 4).unwrap();
        assert_eq!((single.start(), single.end(), single.len()), (4, 4, 1));
        assert!(!single.is_empty());

        let widened = single.widened().unwrap();
        assert_eq!((widened.start(), widened.end(), widened.len()), (3, 5, 3));
        assert_eq!(IndexRange::new(0, 2).unwrap().widened(), None);
    }
}
