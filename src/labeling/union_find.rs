//! Capacity-bounded disjoint-set forest over provisional labels.
//!
//! Labels are `1..=capacity`; `0` is background and never stored. Once every
//! label has been issued, further requests reuse the last slot and bump a
//! saturation counter. Reuse can merge unrelated blobs (undercount), so the
//! counter is the observable signal that accuracy has degraded.
use crate::error::{PipelineError, Stage};
use crate::image::mask::try_zeroed;

pub struct LabelForest {
    parent: Vec<u32>,
    capacity: u32,
    next: u32,
    saturated: usize,
}

impl LabelForest {
    pub fn new(capacity: u32) -> Result<Self, PipelineError> {
        let capacity = capacity.max(1);
        let parent = try_zeroed::<u32>(capacity as usize + 1, Stage::Labeling)?;
        Ok(Self {
            parent,
            capacity,
            next: 1,
            saturated: 0,
        })
    }

    /// Issue a fresh label, or the last slot once the space is exhausted.
    pub fn issue(&mut self) -> u32 {
        if self.next <= self.capacity {
            let label = self.next;
            self.parent[label as usize] = label;
            self.next += 1;
            label
        } else {
            self.saturated += 1;
            self.capacity
        }
    }

    /// Root of `label`, halving the path on the way up.
    pub fn find(&mut self, label: u32) -> u32 {
        let mut x = label as usize;
        while self.parent[x] as usize != x {
            let grand = self.parent[self.parent[x] as usize];
            self.parent[x] = grand;
            x = grand as usize;
        }
        x as u32
    }

    /// Merge the sets of `a` and `b`; the smaller root survives.
    pub fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        let (root, child) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[child as usize] = root;
        root
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of distinct labels handed out so far.
    pub fn issued(&self) -> u32 {
        self.next - 1
    }

    /// Label requests served by reusing the last slot.
    pub fn saturated(&self) -> usize {
        self.saturated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_merges_to_smallest_root() {
        let mut f = LabelForest::new(8).unwrap();
        let a = f.issue();
        let b = f.issue();
        let c = f.issue();
        assert_eq!((a, b, c), (1, 2, 3));
        f.union(c, b);
        assert_eq!(f.find(c), 2);
        f.union(b, a);
        assert_eq!(f.find(c), 1);
        assert_eq!(f.find(b), 1);
    }

    #[test]
    fn exhausted_space_reuses_last_label() {
        let mut f = LabelForest::new(2).unwrap();
        assert_eq!(f.issue(), 1);
        assert_eq!(f.issue(), 2);
        assert_eq!(f.issue(), 2);
        assert_eq!(f.issue(), 2);
        assert_eq!(f.issued(), 2);
        assert_eq!(f.saturated(), 2);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut f = LabelForest::new(0).unwrap();
        assert_eq!(f.capacity(), 1);
        assert_eq!(f.issue(), 1);
        assert_eq!(f.issue(), 1);
    }
}
