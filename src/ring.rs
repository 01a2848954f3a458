// Tiga Watch — Fixed-Capacity Ring Buffers
//
// `SampleRing` keeps a rolling window of sensor samples (always full,
// zero-initialised).  `BoundedLog` is an insertion-ordered record log that
// evicts its oldest entry once full.  Both index modulo capacity, so inserts
// are O(1) and nothing allocates after construction.

/// Fixed window of the most recent `N` samples.  Slots that were never
/// written hold `T::default()`.
#[derive(Debug, Clone)]
pub struct SampleRing<T, const N: usize> {
    slots: [T; N],
    cursor: usize,
}

impl<T: Copy + Default, const N: usize> SampleRing<T, N> {
    pub fn new() -> Self {
        Self {
            slots: [T::default(); N],
            cursor: 0,
        }
    }

    /// Overwrite the oldest slot with `sample`.
    pub fn push(&mut self, sample: T) {
        self.slots[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % N;
    }

    /// The most recently written sample.
    pub fn latest(&self) -> T {
        self.slots[(self.cursor + N - 1) % N]
    }

    /// All `N` slots in storage order.  Only suitable for order-independent
    /// reductions (sum, mean).
    pub fn slots(&self) -> &[T; N] {
        &self.slots
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<T: Copy + Default, const N: usize> Default for SampleRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Insertion-ordered log holding at most `N` entries.
#[derive(Debug, Clone)]
pub struct BoundedLog<T, const N: usize> {
    slots: [Option<T>; N],
    /// Index of the oldest entry.
    head: usize,
    len: usize,
}

impl<T, const N: usize> BoundedLog<T, N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    /// Append `entry`, returning the evicted oldest entry if the log was full.
    pub fn push(&mut self, entry: T) -> Option<T> {
        if N == 0 {
            return Some(entry);
        }
        if self.len < N {
            let idx = (self.head + self.len) % N;
            self.slots[idx] = Some(entry);
            self.len += 1;
            None
        } else {
            // Full: the oldest slot becomes the newest.
            let evicted = self.slots[self.head].replace(entry);
            self.head = (self.head + 1) % N;
            evicted
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        // Every slot inside the live range is occupied.
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % N].as_ref())
    }

    /// The last `k` entries (fewer if the log is shorter), oldest first.
    pub fn recent(&self, k: usize) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let skip = self.len.saturating_sub(k);
        (skip..self.len).filter_map(move |i| self.slots[(self.head + i) % N].as_ref())
    }

    pub fn latest(&self) -> Option<&T> {
        self.iter().next_back()
    }
}

impl<T, const N: usize> Default for BoundedLog<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_ring_starts_zeroed_and_wraps() {
        let mut ring: SampleRing<i32, 3> = SampleRing::new();
        assert_eq!(ring.slots(), &[0, 0, 0]);

        ring.push(1);
        ring.push(2);
        assert_eq!(ring.latest(), 2);
        assert_eq!(ring.slots(), &[1, 2, 0]);

        ring.push(3);
        ring.push(4);
        assert_eq!(ring.latest(), 4);
        assert_eq!(ring.slots(), &[4, 2, 3]);
    }

    #[test]
    fn sample_ring_holds_last_capacity_writes() {
        let mut ring: SampleRing<u32, 10> = SampleRing::new();
        for v in 1..=25 {
            ring.push(v);
        }
        let mut kept: Vec<u32> = ring.slots().to_vec();
        kept.sort_unstable();
        assert_eq!(kept, (16..=25).collect::<Vec<_>>());
    }

    #[test]
    fn log_evicts_oldest_on_overflow() {
        let mut log: BoundedLog<u32, 5> = BoundedLog::new();
        for v in 1..=5 {
            assert_eq!(log.push(v), None);
        }
        assert_eq!(log.len(), 5);

        assert_eq!(log.push(6), Some(1));
        assert_eq!(log.len(), 5);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn log_order_survives_many_wraps() {
        let mut log: BoundedLog<u32, 10> = BoundedLog::new();
        for v in 0..37 {
            log.push(v);
        }
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), (27..37).collect::<Vec<_>>());
        assert_eq!(log.latest(), Some(&36));
    }

    #[test]
    fn recent_returns_newest_k_oldest_first() {
        let mut log: BoundedLog<&str, 5> = BoundedLog::new();
        log.push("a");
        log.push("b");
        log.push("c");

        assert_eq!(log.recent(2).copied().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(log.recent(10).copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(log.recent(0).count(), 0);
    }

    #[test]
    fn iteration_after_wraparound_skips_no_entries() {
        let mut log: BoundedLog<u8, 3> = BoundedLog::new();
        for v in 1..=7 {
            log.push(v);
        }
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(log.iter().rev().copied().collect::<Vec<_>>(), vec![7, 6, 5]);
        assert_eq!(log.latest(), Some(&7));
    }
}
