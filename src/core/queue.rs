//! Round-robin assignment of rules to hardware receive queues
//!
//! Each artifact gets its own [`QueueDistributor`]. The counter starts at 0
//! and advances once per rule, so the indices across one artifact are
//! `0, 1, .., Q-1, 0, 1, ..` whatever the rules contain.

use crate::core::error::{Error, Result};
use std::ops::RangeInclusive;

/// Queue index for the rule at `position` (0-based) when striping over
/// `queue_count` queues.
pub const fn queue_index(position: usize, queue_count: u16) -> u16 {
    // result < queue_count, so it always fits
    #[allow(clippy::cast_possible_truncation)]
    let index = (position % queue_count as usize) as u16;
    index
}

/// Per-artifact queue counter.
#[derive(Debug, Clone)]
pub struct QueueDistributor {
    queue_count: u16,
    position: usize,
}

impl QueueDistributor {
    pub fn new(queue_count: u16) -> Result<Self> {
        if queue_count == 0 {
            return Err(Error::config(
                "queues.target",
                "the number of hardware queues must be at least 1",
            ));
        }
        Ok(Self {
            queue_count,
            position: 0,
        })
    }

    /// Queue for the next rule.
    pub fn next_queue(&mut self) -> u16 {
        let index = queue_index(self.position, self.queue_count);
        self.position += 1;
        index
    }
}

impl Iterator for QueueDistributor {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        Some(self.next_queue())
    }
}

/// Queue counts to emit one artifact for: `1..=target` when iterative,
/// otherwise just `target`.
pub fn sweep(target: u16, iterative: bool) -> RangeInclusive<u16> {
    let start = if iterative { 1.min(target) } else { target };
    start..=target
}
