//! Period resolution (pure date math, no I/O).
//!
//! Turns a `PeriodRequest` into a concrete half-open `[start, end)` window and
//! the whole-month count used for target scaling. "Today" is always passed in
//! by the caller so resolution is deterministic.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;
use crate::types::DateRange;

/// Average Gregorian month length used to convert custom ranges to months.
pub const AVG_DAYS_PER_MONTH: f64 = 30.44;

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PeriodRequest {
    /// Both dates inclusive.
    Explicit { start: NaiveDate, end: NaiveDate },
    /// 0 = the reference date's calendar month, N = N months back.
    RelativeMonth { offset: u32 },
    /// July 1 through December 31 of `year`, whatever the reference date.
    FixedHalfYear { year: i32 },
    /// January 1 through December 31 of `year`.
    Yearly { year: i32 },
}

impl FromStr for PeriodRequest {
    type Err = PeriodError;

    /// Accepts `current`, `relative:N`, `half-year:YYYY`, `yearly:YYYY` and
    /// `YYYY-MM-DD..YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "current" {
            return Ok(PeriodRequest::RelativeMonth { offset: 0 });
        }
        if let Some((start, end)) = s.split_once("..") {
            return Ok(PeriodRequest::Explicit {
                start: parse_date(start)?,
                end: parse_date(end)?,
            });
        }
        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| PeriodError::UnknownPeriodType(s.to_string()))?;
        let number = |arg: &str| {
            arg.trim()
                .parse::<i64>()
                .map_err(|_| PeriodError::UnknownPeriodType(s.to_string()))
        };
        match kind.trim() {
            "relative" => {
                let offset = u32::try_from(number(arg)?)
                    .map_err(|_| PeriodError::UnknownPeriodType(s.to_string()))?;
                Ok(PeriodRequest::RelativeMonth { offset })
            }
            "half-year" => Ok(PeriodRequest::FixedHalfYear {
                year: year_arg(number(arg)?, s)?,
            }),
            "yearly" => Ok(PeriodRequest::Yearly {
                year: year_arg(number(arg)?, s)?,
            }),
            _ => Err(PeriodError::UnknownPeriodType(s.to_string())),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| PeriodError::InvalidDate(s.trim().to_string()))
}

fn year_arg(n: i64, raw: &str) -> Result<i32, PeriodError> {
    i32::try_from(n).map_err(|_| PeriodError::OutOfRange(raw.to_string()))
}

/// A resolved reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    /// Whole months used for target scaling, never below 1.
    pub month_count: u32,
    pub label: String,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Calendar months (year, month) overlapping the window, in order.
    pub fn calendar_months(&self) -> Vec<(i32, u32)> {
        let mut months = Vec::new();
        let mut cursor = (self.start.year(), self.start.month());
        while let Some(first) = NaiveDate::from_ymd_opt(cursor.0, cursor.1, 1) {
            if first >= self.end {
                break;
            }
            months.push(cursor);
            cursor = next_month(cursor.0, cursor.1);
        }
        months
    }

    /// True when the window starts and ends on month boundaries.
    pub fn is_whole_months(&self) -> bool {
        self.start.day() == 1 && self.end.day() == 1
    }
}

/// Resolve a request against the injected reference date.
pub fn resolve(request: &PeriodRequest, today: NaiveDate) -> Result<Period, PeriodError> {
    match *request {
        PeriodRequest::Explicit { start, end } => resolve_explicit(start, end),
        PeriodRequest::RelativeMonth { offset } => {
            let (year, month) = shift_months(today.year(), today.month(), -(offset as i64))
                .ok_or_else(|| PeriodError::OutOfRange(format!("relative:{}", offset)))?;
            let start = first_of_month(year, month)?;
            let (ny, nm) = next_month(year, month);
            let end = first_of_month(ny, nm)?;
            Ok(Period {
                start,
                end,
                month_count: 1,
                label: start.format("%B %Y").to_string(),
            })
        }
        PeriodRequest::FixedHalfYear { year } => Ok(Period {
            start: first_of_month(year, 7)?,
            end: first_of_month(year + 1, 1)?,
            month_count: 6,
            label: format!("Jul-Dec {}", year),
        }),
        PeriodRequest::Yearly { year } => Ok(Period {
            start: first_of_month(year, 1)?,
            end: first_of_month(year + 1, 1)?,
            month_count: 12,
            label: year.to_string(),
        }),
    }
}

fn resolve_explicit(start: NaiveDate, end: NaiveDate) -> Result<Period, PeriodError> {
    if end < start {
        return Err(PeriodError::EndBeforeStart { start, end });
    }
    let exclusive_end = end
        .succ_opt()
        .ok_or_else(|| PeriodError::OutOfRange(end.to_string()))?;
    let days_inclusive = (end - start).num_days() + 1;
    Ok(Period {
        start,
        end: exclusive_end,
        month_count: month_count_for_days(days_inclusive),
        label: format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
    })
}

/// `max(1, round(days / 30.44))`.
pub fn month_count_for_days(days_inclusive: i64) -> u32 {
    let months = (days_inclusive as f64 / AVG_DAYS_PER_MONTH).round();
    (months as u32).max(1)
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, PeriodError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| PeriodError::OutOfRange(format!("{}-{:02}", year, month)))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn shift_months(year: i32, month: u32, delta: i64) -> Option<(i32, u32)> {
    let index = year as i64 * 12 + (month as i64 - 1) + delta;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = (index.rem_euclid(12) + 1) as u32;
    Some((year, month))
}
