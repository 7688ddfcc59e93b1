use serde::Serialize;

use crate::events::AbilityId;

/// A span during which a buff was active with a constant stack count.
///
/// `end` is exclusive; `None` means the buff is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuffInterval {
    pub ability_id: AbilityId,
    pub stacks: u32,
    pub start: i64,
    pub end: Option<i64>,
}

impl BuffInterval {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && self.end.is_none_or(|end| timestamp < end)
    }

    /// Milliseconds of this interval that lie before `timestamp`
    pub fn active_ms_until(&self, timestamp: i64) -> i64 {
        if timestamp <= self.start {
            return 0;
        }
        let end = self.end.map_or(timestamp, |end| end.min(timestamp));
        end - self.start
    }
}

/// Ordered, non-overlapping intervals for one (actor, buff) pair.
#[derive(Debug, Clone, Default)]
pub(super) struct BuffTimeline {
    intervals: Vec<BuffInterval>,
}

impl BuffTimeline {
    pub fn intervals(&self) -> &[BuffInterval] {
        &self.intervals
    }

    pub fn open_stacks(&self) -> Option<u32> {
        self.intervals
            .last()
            .filter(|i| i.is_open())
            .map(|i| i.stacks)
    }

    /// Open a new interval, closing any open one at the same instant.
    /// No-op when the open interval already has `stacks`.
    pub fn set_stacks(&mut self, ability_id: AbilityId, stacks: u32, timestamp: i64) {
        if self.open_stacks() == Some(stacks) {
            return;
        }
        self.close(timestamp);
        self.intervals.push(BuffInterval {
            ability_id,
            stacks,
            start: timestamp,
            end: None,
        });
    }

    /// Close the open interval, if any. Returns false when nothing was open.
    /// Zero-length intervals are dropped rather than kept.
    pub fn close(&mut self, timestamp: i64) -> bool {
        let Some(last) = self.intervals.last_mut().filter(|i| i.is_open()) else {
            return false;
        };
        if timestamp <= last.start {
            self.intervals.pop();
        } else {
            last.end = Some(timestamp);
        }
        true
    }

    pub fn stacks_at(&self, timestamp: i64) -> u32 {
        let idx = self.intervals.partition_point(|i| i.start <= timestamp);
        idx.checked_sub(1)
            .map(|i| &self.intervals[i])
            .filter(|i| i.contains(timestamp))
            .map_or(0, |i| i.stacks)
    }

    pub fn uptime_until(&self, timestamp: i64) -> i64 {
        self.intervals
            .iter()
            .take_while(|i| i.start < timestamp)
            .map(|i| i.active_ms_until(timestamp))
            .sum()
    }

    /// Stack-weighted active time (stack-milliseconds) up to `timestamp`
    pub fn stack_ms_until(&self, timestamp: i64) -> i64 {
        self.intervals
            .iter()
            .take_while(|i| i.start < timestamp)
            .map(|i| i.active_ms_until(timestamp) * i64::from(i.stacks))
            .sum()
    }

    pub fn max_stacks(&self) -> u32 {
        self.intervals.iter().map(|i| i.stacks).max().unwrap_or(0)
    }
}
