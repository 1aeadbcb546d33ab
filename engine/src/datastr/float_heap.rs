//! Binary min heap of `u32` elements keyed by `f32`.
//!
//! The array is 1-indexed, slot 0 holds a sentinel key of negative infinity so percolating up
//! never needs a bounds check. Capacity doubles when the heap runs full.
//!
//! There is no position index: `decrease_or_update` finds the element by a linear scan, so it
//! costs O(n) in the heap size. The witness searches during contraction use this heap and stop
//! after `max_poll_factor_contraction` polls, but their queues can still grow to thousands of
//! elements on dense neighborhoods. The heap trades those slower updates for needing no
//! per-node position array. Searches on the full graph use `index_heap::IndexdMinHeap` instead.

#[derive(Debug, Clone)]
pub struct IntFloatBinaryHeap {
    keys: Vec<f32>,
    elements: Vec<u32>,
    size: usize,
}

impl Default for IntFloatBinaryHeap {
    fn default() -> Self {
        Self::new(16)
    }
}

impl IntFloatBinaryHeap {
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(1);
        let mut keys = vec![0.0; capacity + 1];
        keys[0] = f32::NEG_INFINITY;
        IntFloatBinaryHeap {
            keys,
            elements: vec![u32::MAX; capacity + 1],
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.keys.len() - 1
    }

    pub fn clear(&mut self) {
        self.size = 0;
    }

    pub fn insert(&mut self, key: f32, element: u32) {
        if self.size == self.capacity() {
            let new_len = self.capacity() * 2 + 1;
            self.keys.resize(new_len, 0.0);
            self.elements.resize(new_len, u32::MAX);
        }
        self.size += 1;
        self.percolate_up(self.size, key, element);
    }

    pub fn peek_min(&self) -> Option<(f32, u32)> {
        if self.is_empty() {
            None
        } else {
            Some((self.keys[1], self.elements[1]))
        }
    }

    pub fn peek_key(&self) -> Option<f32> {
        self.peek_min().map(|(key, _)| key)
    }

    pub fn peek_element(&self) -> Option<u32> {
        self.peek_min().map(|(_, element)| element)
    }

    /// Remove the element with the smallest key.
    pub fn extract_min(&mut self) -> Option<u32> {
        if self.is_empty() {
            return None;
        }
        let min = self.elements[1];
        let last_key = self.keys[self.size];
        let last_element = self.elements[self.size];
        self.size -= 1;
        if self.size > 0 {
            self.percolate_down(1, last_key, last_element);
        }
        Some(min)
    }

    /// Set the key of `element`, inserting it if it is not contained.
    /// The key may move in either direction.
    pub fn decrease_or_update(&mut self, element: u32, key: f32) {
        match (1..=self.size).find(|&i| self.elements[i] == element) {
            None => self.insert(key, element),
            Some(position) => {
                if key < self.keys[position] {
                    self.percolate_up(position, key, element);
                } else {
                    self.percolate_down(position, key, element);
                }
            }
        }
    }

    pub fn contains(&self, element: u32) -> bool {
        self.elements[1..=self.size].contains(&element)
    }

    /// Does every parent key compare less or equal to its children?
    pub fn is_valid(&self) -> bool {
        (2..=self.size).all(|i| self.keys[i / 2] <= self.keys[i])
    }

    fn percolate_up(&mut self, mut hole: usize, key: f32, element: u32) {
        // the sentinel at 0 stops the loop
        while key < self.keys[hole / 2] {
            self.keys[hole] = self.keys[hole / 2];
            self.elements[hole] = self.elements[hole / 2];
            hole /= 2;
        }
        self.keys[hole] = key;
        self.elements[hole] = element;
    }

    fn percolate_down(&mut self, mut hole: usize, key: f32, element: u32) {
        loop {
            let mut child = hole * 2;
            if child > self.size {
                break;
            }
            if child != self.size && self.keys[child + 1] < self.keys[child] {
                child += 1;
            }
            if self.keys[child] < key {
                self.keys[hole] = self.keys[child];
                self.elements[hole] = self.elements[child];
                hole = child;
            } else {
                break;
            }
        }
        self.keys[hole] = key;
        self.elements[hole] = element;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::collections::HashMap;

    #[test]
    fn extracts_sorted() {
        let mut heap = IntFloatBinaryHeap::new(2);
        for (element, key) in [(3, 4.5), (1, 0.5), (7, 2.0), (2, 9.0), (5, 2.0)] {
            heap.insert(key, element);
        }
        assert_eq!(heap.len(), 5);
        assert!(heap.capacity() >= 5);
        assert_eq!(heap.peek_min(), Some((0.5, 1)));

        let mut last = f32::NEG_INFINITY;
        while let Some(key) = heap.peek_key() {
            assert!(key >= last);
            last = key;
            heap.extract_min();
        }
        assert!(heap.is_empty());
        assert_eq!(heap.extract_min(), None);
    }

    #[test]
    fn decrease_or_update_moves_both_ways() {
        let mut heap = IntFloatBinaryHeap::default();
        heap.insert(1.0, 10);
        heap.insert(2.0, 20);
        heap.insert(3.0, 30);

        heap.decrease_or_update(30, 0.5);
        assert_eq!(heap.peek_element(), Some(30));
        heap.decrease_or_update(30, 5.0);
        assert_eq!(heap.peek_element(), Some(10));
        heap.decrease_or_update(40, 0.1);
        assert_eq!(heap.peek_min(), Some((0.1, 40)));
        assert!(heap.contains(30));
        assert!(!heap.contains(50));
        assert!(heap.is_valid());
    }

    #[test]
    fn heap_property_holds_after_random_operations() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut heap = IntFloatBinaryHeap::new(1);
        let mut current: HashMap<u32, f32> = HashMap::new();

        for _ in 0..2000 {
            match rng.gen_range(0..3) {
                0 => {
                    let element = rng.gen_range(0..200);
                    let key = rng.gen_range(0.0..1000.0);
                    heap.decrease_or_update(element, key);
                    current.insert(element, key);
                }
                1 => {
                    if let Some((key, element)) = heap.peek_min() {
                        assert!(current.values().all(|&k| k >= key));
                        assert_eq!(heap.extract_min(), Some(element));
                        current.remove(&element);
                    }
                }
                _ => {
                    if rng.gen_bool(0.01) {
                        heap.clear();
                        current.clear();
                    }
                }
            }
            assert!(heap.is_valid());
            assert_eq!(heap.len(), current.len());
        }
    }
}
