//! Identifier allocation
//!
//! Every item and version in a graph instance draws its id from one shared counter, so an id
//! alone is enough to find the object it belongs to.

use std::collections::BTreeSet;

/// Numeric identifier of an item or a version
pub type Id = u64;

/// Issues unique, monotonically increasing ids for one graph instance
///
/// Not synchronized; callers sharing a graph across threads must serialize access to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    used: BTreeSet<Id>,
    // Always greater than every id in `used`.
    next: Id,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a previously unused id and record it as used
    pub fn allocate(&mut self) -> Id {
        let id = self.next;
        self.used.insert(id);
        self.next += 1;
        id
    }

    /// Record an id that was handed out by an earlier graph instance
    ///
    /// Returns `false` when the id was already registered. The next allocated id moves past
    /// the largest registered id.
    pub fn register(&mut self, id: Id) -> bool {
        if id >= self.next {
            self.next = id + 1;
        }
        self.used.insert(id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.used.contains(&id)
    }

    /// The id the next call to [`allocate`](Self::allocate) will return
    pub fn next_id(&self) -> Id {
        self.next
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Registered ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.used.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_contiguous_from_zero() {
        let mut ids = IdAllocator::new();
        let allocated: Vec<Id> = (0..100).map(|_| ids.allocate()).collect();

        assert_eq!(allocated, (0..100).collect::<Vec<_>>());
        assert_eq!(ids.len(), 100);
        assert!(!ids.contains(100));
        assert_eq!(ids.next_id(), 100);
    }

    #[test]
    fn test_register_moves_counter_past_max() {
        let mut ids = IdAllocator::new();
        assert!(ids.register(7));
        assert!(ids.register(3));
        assert!(!ids.register(7));

        assert_eq!(ids.next_id(), 8);
        assert_eq!(ids.allocate(), 8);
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![3, 7, 8]);
    }

    #[test]
    fn test_empty_allocator() {
        let ids = IdAllocator::default();
        assert!(ids.is_empty());
        assert_eq!(ids.next_id(), 0);
    }
}
