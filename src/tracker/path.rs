use crate::*;
use nalgebra::DVector;
use std::collections::VecDeque;

/// One accepted point of a traced path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRecord {
    pub step: usize,
    /// Arc length.
    pub s: ArcLength,
    pub t: Parameter,
    /// Step size the tracker held after accepting this point.
    pub ds: ArcLength,
    pub y: DVector<f64>,
    pub tangent: DVector<f64>,
}

/// Bounded ring of path records, oldest evicted first.
///
/// Capacity is fixed at construction and never grows.
#[derive(Debug, Clone)]
pub struct PathBuffer {
    records: VecDeque<PathRecord>,
    capacity: usize,
    evicted: bool,
}

impl PathBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            evicted: false,
        }
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: PathRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            if !self.evicted {
                log::warn!("path buffer full at {} records, evicting oldest", self.capacity);
                self.evicted = true;
            }
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Drop everything after the latest record of step `n` and return it, if held.
    pub fn truncate(&mut self, n: usize) -> Option<&PathRecord> {
        let position = self.records.iter().rposition(|r| r.step == n)?;
        self.records.truncate(position + 1);
        self.records.back()
    }

    /// Forget every record, keeping the capacity.
    pub fn clear(&mut self) {
        self.records.clear();
        self.evicted = false;
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: usize) -> PathRecord {
        PathRecord {
            step,
            s: step as f64,
            t: step as f64 / 10.,
            ds: 0.1,
            y: DVector::zeros(2),
            tangent: DVector::zeros(2),
        }
    }

    #[test]
    fn evicts_oldest() {
        let mut buffer = PathBuffer::new(3);
        (0..5).map(record).for_each(|r| buffer.push(r));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.iter().next().map(|r| r.step), Some(2));
    }

    #[test]
    fn truncates_to_step() {
        let mut buffer = PathBuffer::new(10);
        (0..6).map(record).for_each(|r| buffer.push(r));
        assert_eq!(buffer.truncate(3).map(|r| r.step), Some(3));
        assert_eq!(buffer.len(), 4);
        assert!(buffer.truncate(7).is_none());
    }

    #[test]
    fn truncates_to_latest_of_repeated_step() {
        let mut buffer = PathBuffer::new(10);
        (0..4).map(record).for_each(|r| buffer.push(r));
        let mut again = record(2);
        again.s = 42.;
        buffer.push(again);
        buffer.push(record(3));
        assert_eq!(buffer.truncate(2).map(|r| r.s), Some(42.));
        assert_eq!(buffer.len(), 5);
    }
}
