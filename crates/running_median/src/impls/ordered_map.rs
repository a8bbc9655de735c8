use tracing::debug;

use crate::policy::{Ascending, Comparator, Midpoint};
use crate::traits::RunningMedian;

/// Reference median tracker: distinct values with occurrence counts, kept sorted
/// under the comparator, median by a cumulative-count walk. Linear per query.
///
/// Values the comparator considers equivalent share one entry, and the first one
/// inserted represents them.
#[derive(Clone, Debug)]
pub struct OrderedMapMedian<T, C = Ascending> {
    counts: Vec<(T, usize)>,
    len: usize,
    compare: C,
}

impl<T> OrderedMapMedian<T> {
    pub fn new() -> Self {
        Self::with_comparator(Ascending)
    }
}

impl<T> Default for OrderedMapMedian<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> OrderedMapMedian<T, C> {
    pub fn with_comparator(compare: C) -> Self {
        Self {
            counts: Vec::new(),
            len: 0,
            compare,
        }
    }
}

impl<T, C: Comparator<T>> OrderedMapMedian<T, C> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn comparator(&self) -> &C {
        &self.compare
    }

    pub fn insert(&mut self, value: T) {
        self.len += 1;
        let at = self
            .counts
            .partition_point(|(key, _)| self.compare.precedes_or_equal(key, &value));
        if let Some(prev) = at.checked_sub(1) {
            let (key, count) = &mut self.counts[prev];
            if self.compare.precedes_or_equal(&value, &*key) {
                *count += 1;
                return;
            }
        }
        self.counts.insert(at, (value, 1));
    }

    pub fn clear(&mut self) {
        debug!(discarded = self.len, "clearing ordered map median");
        self.counts.clear();
        self.len = 0;
    }

    /// Elements of rank `(len - 1) / 2` and `len / 2` in comparator order.
    pub fn median_pair(&self) -> Option<(&T, &T)> {
        if self.len == 0 {
            return None;
        }
        let lo_rank = (self.len - 1) / 2;
        let hi_rank = self.len / 2;

        let mut seen = 0;
        let mut lo = None;
        for (value, count) in &self.counts {
            seen += count;
            if lo.is_none() && lo_rank < seen {
                lo = Some(value);
            }
            if hi_rank < seen {
                return lo.map(|lo| (lo, value));
            }
        }
        None
    }

    /// Distinct values with their counts, in comparator order.
    pub fn into_inner(self) -> Vec<(T, usize)> {
        self.counts
    }
}

impl<T: Midpoint, C: Comparator<T>> RunningMedian for OrderedMapMedian<T, C> {
    type Value = T;

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        OrderedMapMedian::clear(self);
    }

    fn insert(&mut self, value: T) {
        OrderedMapMedian::insert(self, value);
    }

    fn median(&self) -> Option<T> {
        let odd = self.len % 2 == 1;
        self.median_pair().map(|(lo, hi)| {
            if odd {
                lo.clone()
            } else {
                T::midpoint_of(lo, hi)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMapMedian;
    use crate::policy::Descending;
    use crate::traits::RunningMedian;

    #[test]
    fn duplicates_are_counted_once_per_insert() {
        let mut map = OrderedMapMedian::new();
        map.extend([2_i64, 2, 9, 2]);
        assert_eq!(map.len(), 4);
        assert_eq!(map.median_pair(), Some((&2, &2)));
        assert_eq!(map.median(), Some(2));
        assert_eq!(map.into_inner(), vec![(2, 3), (9, 1)]);
    }

    #[test]
    fn middle_pair_spans_distinct_keys() {
        let mut map = OrderedMapMedian::new();
        map.extend([3_i64, 1, 2, 2, 7, 9, 4, 6]);
        assert_eq!(map.median_pair(), Some((&3, &4)));
        assert_eq!(map.median(), Some(3));

        map.insert(5);
        assert_eq!(map.median(), Some(4));
    }

    #[test]
    fn floats_average_the_middle_pair() {
        let mut map = OrderedMapMedian::<f64, _>::with_comparator(Descending);
        map.extend([3.0, 1.0, 2.0, 2.0, 7.0, 9.0, 4.0, 6.0]);
        assert_eq!(map.median_pair(), Some((&4.0, &3.0)));
        assert_eq!(map.median(), Some(3.5));
        assert_eq!(
            map.into_inner(),
            vec![(9.0, 1), (7.0, 1), (6.0, 1), (4.0, 1), (3.0, 1), (2.0, 2), (1.0, 1)]
        );
    }

    #[test]
    fn equivalent_values_share_an_entry() {
        let by_magnitude = |a: &i64, b: &i64| a.abs() <= b.abs();
        let mut map = OrderedMapMedian::<i64, _>::with_comparator(by_magnitude);
        map.extend([-3, 1, 3, -1, 2]);
        assert_eq!(map.len(), 5);
        assert_eq!(map.median_pair(), Some((&2, &2)));
        assert_eq!(map.into_inner(), vec![(1, 2), (2, 1), (-3, 2)]);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut map = OrderedMapMedian::new();
        map.extend([1_u32, 2, 3]);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.median(), None);
    }
}
