// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Daily run slots.
//!
//! Each configured time of day is a slot that fires at most once per
//! calendar day, on the first poll at or after its time. Slots whose time
//! has already passed when the scheduler starts wait until the next day.

use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    time: NaiveTime,
    last_run: Option<NaiveDate>,
}

/// Fires run slots at fixed times of day.
#[derive(Debug, Clone)]
pub struct Scheduler {
    slots: Vec<Slot>,
    poll_interval: Duration,
}

impl Scheduler {
    /// Creates a scheduler started at `now`.
    pub fn new(times: &[NaiveTime], poll_interval: Duration, now: NaiveDateTime) -> Self {
        let today = now.date();
        let slots = times
            .iter()
            .map(|&time| Slot {
                time,
                last_run: (time <= now.time()).then_some(today),
            })
            .collect();
        Self {
            slots,
            poll_interval,
        }
    }

    /// The configured times, in configuration order.
    pub fn times(&self) -> Vec<NaiveTime> {
        self.slots.iter().map(|s| s.time).collect()
    }

    /// Marks every slot due at `now` as run and returns how many there were.
    pub fn tick(&mut self, now: NaiveDateTime) -> usize {
        let today = now.date();
        let mut due = 0;
        for slot in &mut self.slots {
            if slot.time <= now.time() && slot.last_run != Some(today) {
                slot.last_run = Some(today);
                due += 1;
            }
        }
        due
    }

    /// Polls the local clock forever, calling `job` once per due slot.
    pub fn run_forever<F: FnMut()>(&mut self, mut job: F) -> ! {
        loop {
            for _ in 0..self.tick(Local::now().naive_local()) {
                job();
            }
            thread::sleep(self.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn scheduler(now: NaiveDateTime) -> Scheduler {
        Scheduler::new(&[time(8, 0), time(18, 0)], Duration::from_secs(30), now)
    }

    #[test]
    fn test_slot_fires_once_per_day() {
        let mut scheduler = scheduler(at(18, 7, 0));
        assert_eq!(scheduler.tick(at(18, 7, 59)), 0);
        assert_eq!(scheduler.tick(at(18, 8, 0)), 1);
        assert_eq!(scheduler.tick(at(18, 8, 0)), 0);
        assert_eq!(scheduler.tick(at(18, 12, 0)), 0);
        assert_eq!(scheduler.tick(at(18, 18, 1)), 1);
        assert_eq!(scheduler.tick(at(19, 8, 0)), 1);
    }

    #[test]
    fn test_past_slots_wait_until_next_day() {
        let mut scheduler = scheduler(at(18, 9, 0));
        assert_eq!(scheduler.tick(at(18, 9, 0)), 0);
        assert_eq!(scheduler.tick(at(18, 18, 0)), 1);
        assert_eq!(scheduler.tick(at(19, 7, 0)), 0);
        assert_eq!(scheduler.tick(at(19, 8, 0)), 1);
    }

    #[test]
    fn test_missed_slots_fire_together() {
        let mut scheduler = scheduler(at(18, 0, 0));
        assert_eq!(scheduler.tick(at(18, 23, 0)), 2);
        assert_eq!(scheduler.times(), vec![time(8, 0), time(18, 0)]);
    }
}
