//! Cooperative fixed-timestep interval scheduler
//!
//! One event-loop thread drives every periodic concern (think ticks,
//! network flushes) through a single registry. `tick` reports, in
//! registration order, which tasks are due and how many whole periods
//! each must replay. A stalled interval catches up by firing once per
//! elapsed period, bounded by `max_catchup`; anything beyond the bound is
//! dropped rather than burst-replayed after a long stall.

use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalId(u64);

#[derive(Debug)]
struct Interval<T> {
    id: IntervalId,
    owner: Option<Uuid>,
    task: T,
    period: Duration,
    next_fire: Instant,
    run_once: bool,
}

/// One due task and the number of times its callback must run.
#[derive(Debug, Clone, PartialEq)]
pub struct Firing<T> {
    pub task: T,
    pub times: u32,
}

#[derive(Debug)]
pub struct Timers<T> {
    intervals: Vec<Interval<T>>,
    next_id: u64,
    max_catchup: u32,
}

impl<T: Clone> Timers<T> {
    pub fn new(max_catchup: u32) -> Self {
        assert!(max_catchup >= 1, "catch-up bound must allow at least one firing");
        Self {
            intervals: Vec::new(),
            next_id: 0,
            max_catchup,
        }
    }

    /// Register a periodic task. A zero period is a logic defect, not
    /// recoverable input.
    pub fn add_interval(
        &mut self,
        owner: Option<Uuid>,
        task: T,
        period: Duration,
        run_once: bool,
        now: Instant,
    ) -> IntervalId {
        assert!(!period.is_zero(), "interval period must be positive");
        let id = IntervalId(self.next_id);
        self.next_id += 1;
        self.intervals.push(Interval {
            id,
            owner,
            task,
            period,
            next_fire: now + period,
            run_once,
        });
        id
    }

    /// Takes effect before the interval's next invocation.
    pub fn remove_interval(&mut self, id: IntervalId) {
        self.intervals.retain(|interval| interval.id != id);
    }

    /// Drop every interval registered under an owner; used when an entity
    /// is destroyed.
    pub fn remove_owner(&mut self, owner: Uuid) {
        self.intervals.retain(|interval| interval.owner != Some(owner));
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Collect due tasks in registration order. Each interval catches up
    /// on whole elapsed periods, bounded by `max_catchup`.
    pub fn tick(&mut self, now: Instant) -> Vec<Firing<T>> {
        let mut firings = Vec::new();
        let mut expired = Vec::new();
        for interval in &mut self.intervals {
            let mut times = 0u32;
            while now >= interval.next_fire && times < self.max_catchup {
                times += 1;
                interval.next_fire += interval.period;
                if interval.run_once {
                    break;
                }
            }
            if times == self.max_catchup && now >= interval.next_fire {
                // Still behind after the bound: skip ahead instead of
                // replaying an unbounded burst.
                debug!(
                    "interval stalled past catch-up bound, dropping backlog ({:?} behind)",
                    now - interval.next_fire
                );
                interval.next_fire = now + interval.period;
            }
            if times > 0 {
                firings.push(Firing {
                    task: interval.task.clone(),
                    times,
                });
                if interval.run_once {
                    expired.push(interval.id);
                }
            }
        }
        self.intervals
            .retain(|interval| !expired.contains(&interval.id));
        firings
    }
}
