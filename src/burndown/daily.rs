//! Count-based daily burndown.

use crate::error::{BurndownError, Result};
use crate::models::Issue;
use chrono::NaiveDate;

/// Cumulative counts at the end of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub created_count: u64,
    pub closed_count: u64,
    /// Negative only when issues were closed before they were created.
    pub remaining_count: i64,
}

/// Dense day-by-day series spanning the first to the last issue event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBurndown {
    buckets: Vec<DailyBucket>,
}

impl DailyBurndown {
    pub fn buckets(&self) -> &[DailyBucket] {
        &self.buckets
    }

    pub fn first_date(&self) -> NaiveDate {
        self.buckets[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.buckets[self.buckets.len() - 1].date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.buckets.iter().map(|b| b.date).collect()
    }

    pub fn created(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.created_count).collect()
    }

    pub fn closed(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.closed_count).collect()
    }

    pub fn remaining(&self) -> Vec<i64> {
        self.buckets.iter().map(|b| b.remaining_count).collect()
    }
}

/// Builds the cumulative created/closed/remaining series, one bucket per day.
///
/// The window runs from the earliest to the latest creation or closing day,
/// both inclusive, with no gaps.
pub fn aggregate(issues: &[Issue]) -> Result<DailyBurndown> {
    let events = issues
        .iter()
        .flat_map(|issue| std::iter::once(issue.created_on()).chain(issue.closed_on()));
    let (first, last) = events
        .fold(None, |window: Option<(NaiveDate, NaiveDate)>, day| match window {
            None => Some((day, day)),
            Some((lo, hi)) => Some((lo.min(day), hi.max(day))),
        })
        .ok_or(BurndownError::EmptyInput)?;

    let days = (last - first).num_days() as usize + 1;
    let mut created = vec![0u64; days];
    let mut closed = vec![0u64; days];
    let slot = |day: NaiveDate| (day - first).num_days() as usize;

    for issue in issues {
        created[slot(issue.created_on())] += 1;
        if let Some(day) = issue.closed_on() {
            closed[slot(day)] += 1;
        }
    }

    let mut created_total = 0;
    let mut closed_total = 0;
    let buckets = first
        .iter_days()
        .zip(created.into_iter().zip(closed))
        .map(|(date, (created_today, closed_today))| {
            created_total += created_today;
            closed_total += closed_today;
            DailyBucket {
                date,
                created_count: created_total,
                closed_count: closed_total,
                remaining_count: created_total as i64 - closed_total as i64,
            }
        })
        .collect::<Vec<_>>();

    log::debug!("daily burndown: {first} .. {last}, {} buckets", buckets.len());
    Ok(DailyBurndown { buckets })
}
