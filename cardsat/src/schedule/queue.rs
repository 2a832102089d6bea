//! Moving averages over a window of recent values.
use std::collections::VecDeque;

/// Queue keeping the sum of its last `capacity` values.
#[derive(Default)]
pub struct BoundedQueue {
    values: VecDeque<u64>,
    sum: u64,
    capacity: usize,
}

impl BoundedQueue {
    /// Change the window size. Clears the queue.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.fast_clear();
    }

    /// Add a value, dropping the oldest one if the window is full.
    pub fn push(&mut self, value: u64) {
        if self.values.len() == self.capacity {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
            }
        }
        if self.capacity > 0 {
            self.values.push_back(value);
            self.sum += value;
        }
    }

    /// Whether the window is completely filled.
    pub fn valid(&self) -> bool {
        self.capacity > 0 && self.values.len() == self.capacity
    }

    /// Average of the values in the window.
    pub fn avg(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum as f64 / self.values.len() as f64
        }
    }

    pub fn fast_clear(&mut self) {
        self.values.clear();
        self.sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_average() {
        let mut queue = BoundedQueue::default();
        queue.set_capacity(3);

        queue.push(4);
        queue.push(8);
        assert!(!queue.valid());
        assert_eq!(queue.avg(), 6.0);

        queue.push(3);
        queue.push(1);
        assert!(queue.valid());
        assert_eq!(queue.avg(), 4.0);

        queue.fast_clear();
        assert!(!queue.valid());
        assert_eq!(queue.avg(), 0.0);
    }
}
