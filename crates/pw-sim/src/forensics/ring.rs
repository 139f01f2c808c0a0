//! Fixed-capacity ring of snapshots, allocated once.

use super::snapshot::ForensicsSnapshot;

#[derive(Clone, Debug)]
pub struct ForensicsRing {
    slots: Box<[ForensicsSnapshot]>,
    head: usize,
    len: usize,
}

impl ForensicsRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![ForensicsSnapshot::default(); capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Overwrite the oldest slot once full.
    pub fn push(&mut self, snapshot: &ForensicsSnapshot) {
        self.slots[self.head] = *snapshot;
        self.head = (self.head + 1) % self.slots.len();
        self.len = (self.len + 1).min(self.slots.len());
    }

    /// Retained snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ForensicsSnapshot> {
        let cap = self.slots.len();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len).map(move |i| &self.slots[(start + i) % cap])
    }

    pub fn newest(&self) -> Option<&ForensicsSnapshot> {
        if self.len == 0 {
            return None;
        }
        let cap = self.slots.len();
        Some(&self.slots[(self.head + cap - 1) % cap])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tick: u64) -> ForensicsSnapshot {
        ForensicsSnapshot {
            tick,
            ..ForensicsSnapshot::default()
        }
    }

    #[test]
    fn partial_ring_in_insert_order() {
        let mut ring = ForensicsRing::new(4);
        assert!(ring.newest().is_none());
        ring.push(&snap(1));
        ring.push(&snap(2));
        let ticks: Vec<u64> = ring.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![1, 2]);
        assert_eq!(ring.newest().map(|s| s.tick), Some(2));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn keeps_last_capacity_entries_oldest_first(cap in 1usize..100, pushes in 0u64..400) {
                let mut ring = ForensicsRing::new(cap);
                for t in 0..pushes {
                    ring.push(&snap(t));
                }
                let ticks: Vec<u64> = ring.iter().map(|s| s.tick).collect();
                let first = pushes.saturating_sub(cap as u64);
                let expected: Vec<u64> = (first..pushes).collect();
                prop_assert_eq!(ticks, expected);
                prop_assert_eq!(ring.capacity(), cap);
            }
        }
    }
}
