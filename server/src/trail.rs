//! Rolling history of a player's sampled positions and loop-closure detection.

use crate::vec2::{self, Vec2};
use std::collections::VecDeque;

/// Bounded FIFO of sampled positions, oldest first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Vec2>,
    max_len: usize,
    /// Ticks since the last sample
    sample_counter: u32,
}

impl Trail {
    pub fn new(max_len: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(max_len),
            max_len: max_len.max(1),
            sample_counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[cfg(test)]
    pub fn points(&self) -> impl Iterator<Item = &Vec2> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Append a sample, dropping the oldest once full.
    pub fn push(&mut self, p: Vec2) {
        if self.points.len() == self.max_len {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    /// Count one tick and record `p` on every `stride`-th call. Returns whether a sample was taken.
    pub fn tick(&mut self, p: Vec2, stride: u32) -> bool {
        self.sample_counter += 1;
        if self.sample_counter < stride.max(1) {
            return false;
        }
        self.sample_counter = 0;
        self.push(p);
        true
    }

    /// Look for a closed loop ending at the newest sample.
    ///
    /// The head is compared against every sample at least `min_gap` positions older, oldest first.
    /// The first one within `radius` closes the loop, which is returned from that sample through
    /// the head. Nothing is scanned until the trail holds more than `min_gap` samples.
    pub fn find_loop(&self, radius: f64, min_gap: usize) -> Option<Vec<Vec2>> {
        let n = self.points.len();
        if n <= min_gap {
            return None;
        }
        let head_index = n - 1;
        let head = self.points[head_index];
        let start = (0..=head_index - min_gap)
            .find(|&i| vec2::distance(self.points[i], head) <= radius)?;
        Some(self.points.range(start..).copied().collect())
    }
}
