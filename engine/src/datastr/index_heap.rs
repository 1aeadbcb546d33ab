//! A priority queue implemented with a 4-ary heap and a position index.
//!
//! Every element maps to a unique index (see `Indexing`), so the position of an element
//! in the heap can be looked up in `O(1)` and its key decreased or increased in `O(log n)`.
//! This is the variant used in the hot loops of the Dijkstra searches and for the node priorities
//! during contraction. The witness searches use the simpler `float_heap`.
//!
//! # Examples
//!
//! ```
//! use ch_road_router::datastr::index_heap::{Indexing, IndexdMinHeap};
//!
//! #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
//! pub struct State {
//!     pub distance: usize,
//!     pub node: usize,
//! }
//!
//! impl Indexing for State {
//!     fn as_index(&self) -> usize {
//!         self.node
//!     }
//! }
//!
//! let mut heap = IndexdMinHeap::new(3);
//! heap.push(State { node: 0, distance: 42 });
//! heap.push(State { node: 1, distance: 23 });
//! heap.push(State { node: 2, distance: 50000 });
//! assert_eq!(heap.peek().cloned(), Some(State { node: 1, distance: 23 }));
//! heap.decrease_key(State { node: 0, distance: 1 });
//! assert_eq!(heap.pop(), Some(State { node: 0, distance: 1 }));
//! ```

use std::cmp::Ordering;

/// Maps heap elements to a unique index in `[0, max_id)`.
pub trait Indexing {
    fn as_index(&self) -> usize;
}

/// Min heap over elements with unique ids.
/// Ordering is defined by `Ord`, the smallest element is on top.
#[derive(Debug, Clone)]
pub struct IndexdMinHeap<T> {
    positions: Vec<usize>,
    data: Vec<T>,
}

const TREE_ARITY: usize = 4;
const INVALID_POSITION: usize = usize::MAX;

impl<T: Ord + Indexing> IndexdMinHeap<T> {
    /// Create an empty heap for elements with indices in `[0, max_id)`.
    pub fn new(max_id: usize) -> IndexdMinHeap<T> {
        IndexdMinHeap {
            positions: vec![INVALID_POSITION; max_id],
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Is an element with this index currently in the queue?
    pub fn contains_index(&self, id: usize) -> bool {
        self.positions[id] != INVALID_POSITION
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.data.get(self.positions[id])
    }

    /// Drops all elements. Only touches the positions of contained elements.
    pub fn clear(&mut self) {
        for element in &self.data {
            self.positions[element.as_index()] = INVALID_POSITION;
        }
        self.data.clear();
    }

    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Remove and return the smallest element.
    pub fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let last = self.data.len() - 1;
        self.swap_elements(0, last);
        let min = self.data.pop()?;
        self.positions[min.as_index()] = INVALID_POSITION;
        if !self.data.is_empty() {
            self.move_down_in_tree(0);
        }
        Some(min)
    }

    /// Push a new element. Panics if an element with the same index is already contained.
    pub fn push(&mut self, element: T) {
        assert!(!self.contains_index(element.as_index()));
        let position = self.data.len();
        self.positions[element.as_index()] = position;
        self.data.push(element);
        self.move_up_in_tree(position);
    }

    pub fn push_unless_contained(&mut self, element: T) {
        if !self.contains_index(element.as_index()) {
            self.push(element)
        }
    }

    /// Replace the element with the same index, no matter in which direction its key moved.
    /// Pushes the element if it is not contained yet.
    pub fn update_key(&mut self, element: T) {
        if !self.contains_index(element.as_index()) {
            self.push(element);
            return;
        }
        let position = self.positions[element.as_index()];
        match element.cmp(&self.data[position]) {
            Ordering::Less => self.decrease_key(element),
            Ordering::Greater => self.increase_key(element),
            Ordering::Equal => self.data[position] = element,
        }
    }

    /// Replace the element with the same index by a smaller one.
    pub fn decrease_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        debug_assert!(element <= self.data[position]);
        self.data[position] = element;
        self.move_up_in_tree(position);
    }

    /// Replace the element with the same index by a larger one.
    pub fn increase_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        debug_assert!(element >= self.data[position]);
        self.data[position] = element;
        self.move_down_in_tree(position);
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
        self.positions[self.data[a].as_index()] = a;
        self.positions[self.data[b].as_index()] = b;
    }

    fn move_up_in_tree(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / TREE_ARITY;
            if self.data[position] >= self.data[parent] {
                break;
            }
            self.swap_elements(position, parent);
            position = parent;
        }
    }

    fn move_down_in_tree(&mut self, mut position: usize) {
        loop {
            let first_child = TREE_ARITY * position + 1;
            if first_child >= self.data.len() {
                break;
            }
            let last_child = (first_child + TREE_ARITY).min(self.data.len());
            let mut smallest = first_child;
            for child in first_child + 1..last_child {
                if self.data[child] < self.data[smallest] {
                    smallest = child;
                }
            }
            if self.data[smallest] >= self.data[position] {
                break;
            }
            self.swap_elements(position, smallest);
            position = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
    struct Entry {
        key: u32,
        id: usize,
    }

    impl Indexing for Entry {
        fn as_index(&self) -> usize {
            self.id
        }
    }

    #[test]
    fn pops_in_ascending_order_after_key_updates() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut heap = IndexdMinHeap::new(100);
        let mut keys = vec![None; 100];

        for _ in 0..1000 {
            let id = rng.gen_range(0..100);
            let key = rng.gen_range(0..1000);
            heap.update_key(Entry { key, id });
            keys[id] = Some(key);
        }

        let mut last = 0;
        let mut popped = 0;
        while let Some(Entry { key, id }) = heap.pop() {
            assert!(key >= last);
            assert_eq!(keys[id], Some(key));
            last = key;
            popped += 1;
        }
        assert_eq!(popped, keys.iter().filter(|k| k.is_some()).count());
    }

    #[test]
    fn clear_resets_positions() {
        let mut heap = IndexdMinHeap::new(4);
        heap.push(Entry { key: 3, id: 2 });
        heap.push(Entry { key: 1, id: 0 });
        heap.clear();
        assert!(heap.is_empty());
        assert!(!heap.contains_index(2));
        heap.push(Entry { key: 5, id: 2 });
        assert_eq!(heap.pop(), Some(Entry { key: 5, id: 2 }));
    }
}
