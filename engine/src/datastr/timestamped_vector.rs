//! A vector which can be reset to a default value in amortized constant time.

use std::ops::{Index, IndexMut};

/// Resettable vector based on 32bit timestamps.
/// An entry is only valid if its timestamp equals the current one, otherwise the default is returned.
/// Used for all per query search data, so reusing the data for the next query is cheap.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    timestamps: Vec<u32>,
    current: u32,
    default: T,
}

impl<T: Clone> TimestampedVector<T> {
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default.clone(); size],
            timestamps: vec![0; size],
            current: 0,
            default,
        }
    }

    /// Invalidate all entries.
    pub fn reset(&mut self) {
        self.current = self.current.wrapping_add(1);
        // old timestamps become valid again after an overflow
        if self.current == 0 {
            self.timestamps.iter_mut().for_each(|t| *t = u32::MAX);
            self.current = 1;
            for element in &mut self.data {
                *element = self.default.clone();
            }
        }
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    /// Was the entry written since the last reset?
    pub fn is_set(&self, index: usize) -> bool {
        self.timestamps[index] == self.current
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Clone> Index<usize> for TimestampedVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        if self.timestamps[index] == self.current {
            &self.data[index]
        } else {
            &self.default
        }
    }
}

impl<T: Clone> IndexMut<usize> for TimestampedVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        if self.timestamps[index] != self.current {
            self.set(index, self.default.clone());
        }
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_default() {
        let mut vec = TimestampedVector::new(3, 7u32);
        vec[1] = 3;
        vec.set(2, 9);
        assert_eq!((vec[0], vec[1], vec[2]), (7, 3, 9));
        assert!(vec.is_set(1));

        vec.reset();
        assert_eq!((vec[0], vec[1], vec[2]), (7, 7, 7));
        assert!(!vec.is_set(1));
    }

    #[test]
    fn survives_timestamp_overflow() {
        let mut vec = TimestampedVector::new(2, 0u8);
        vec.current = u32::MAX;
        vec[0] = 5;
        vec.reset();
        assert_eq!(vec[0], 0);
        vec[1] = 1;
        assert_eq!(vec[1], 1);
    }
}
