//! Daily trigger for the recommendation pipeline.
//!
//! The scheduler only decides *when* to run; the pipeline itself is the same
//! one a user triggers by hand.

use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};

#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// First occurrence of the scheduled time strictly after `now`.
    pub fn next_run_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut date = now.date_naive();
        if now.time() >= self.at {
            date = date.checked_add_days(Days::new(1)).unwrap_or(date);
        }

        loop {
            // earliest() skips times that do not exist on DST change days
            if let Some(next) = tz.from_local_datetime(&date.and_time(self.at)).earliest() {
                if next > *now {
                    return next;
                }
            }
            date = match date.checked_add_days(Days::new(1)) {
                Some(d) => d,
                None => return now.clone(),
            };
        }
    }

    pub fn delay_until_next(&self, now: &DateTime<Local>) -> (DateTime<Local>, Duration) {
        let next = self.next_run_after(now);
        let delay = (next.clone() - now.clone()).to_std().unwrap_or_default();
        (next, delay)
    }
}
