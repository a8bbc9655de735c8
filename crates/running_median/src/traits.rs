/// Online median over a stream of insertions.
///
/// - `insert` always succeeds; duplicates are counted.
/// - `median` is `None` only when nothing has been inserted since the last `clear`.
/// - For an even count the median is the midpoint of the two middle elements.
pub trait RunningMedian {
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    fn insert(&mut self, value: Self::Value);

    fn median(&self) -> Option<Self::Value>;

    fn extend<I: IntoIterator<Item = Self::Value>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
