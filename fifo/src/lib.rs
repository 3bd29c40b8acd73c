//! Bounded history buffer used by the Pulay mixer.
//!
//! Index 0 is the oldest entry; the newest one is at `len() - 1`.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct FIFO<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> FIFO<T> {
    pub fn new(capacity: usize) -> Self {
        FIFO {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `elem`, evicting the oldest entry when full.
    /// A zero-capacity buffer stays empty.
    pub fn push(&mut self, elem: T) {
        if self.capacity == 0 {
            return;
        }

        if self.data.len() == self.capacity {
            self.data.pop_front();
        }

        self.data.push_back(elem);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.data.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T> std::ops::Index<usize> for FIFO<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.data[idx]
    }
}

#[test]
fn test_fifo_evicts_oldest() {
    let mut fq = FIFO::<i32>::new(3);

    assert!(fq.is_empty());
    assert!(fq.last().is_none());

    for v in 0..5 {
        fq.push(v);
    }

    assert_eq!(fq.len(), 3);
    assert_eq!(fq[0], 2);
    assert_eq!(fq[2], 4);
    assert_eq!(fq.last(), Some(&4));
    assert_eq!(fq.iter().copied().collect::<Vec<i32>>(), vec![2, 3, 4]);
}

#[test]
fn test_fifo_zero_capacity() {
    let mut fq = FIFO::<f64>::new(0);

    fq.push(1.0);

    assert!(fq.is_empty());
    assert_eq!(fq.capacity(), 0);
}
