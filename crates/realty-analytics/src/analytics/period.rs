use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::service::AnalyticsError;
use crate::store::DateRange;

/// Earliest year an explicit bound may name.
pub const MIN_YEAR: i32 = 1;
/// Latest year an explicit bound may name. Stored timestamps carry four-digit years.
pub const MAX_YEAR: i32 = 9999;

/// Symbolic reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Month,
    Quarter,
    Year,
    All,
    /// First of the current month through the end of today.
    MonthToDate,
}

impl Period {
    /// Parses a period tag. Unrecognized tags fall back to month-to-date.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "month" => Self::Month,
            "quarter" => Self::Quarter,
            "year" => Self::Year,
            "all" => Self::All,
            _ => Self::MonthToDate,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
            Self::MonthToDate => "month_to_date",
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::Month
    }
}

/// A period tag plus the optional explicit bounds that override it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodRequest {
    pub period: Period,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PeriodRequest {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            start: None,
            end: None,
        }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            period: Period::default(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Rejects explicit bounds outside [`MIN_YEAR`]..=[`MAX_YEAR`] or in
    /// reverse order.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        for date in [self.start, self.end].into_iter().flatten() {
            check_year(date)?;
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(AnalyticsError::InvalidInput(format!(
                    "start {start} is after end {end}"
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn check_year(date: NaiveDate) -> Result<NaiveDate, AnalyticsError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(AnalyticsError::InvalidInput(format!(
            "date {date} is outside the years {MIN_YEAR} to {MAX_YEAR}"
        )))
    }
}

/// Maps period requests to concrete inclusive date-time ranges.
#[derive(Debug, Clone, Copy)]
pub struct PeriodResolver {
    epoch: NaiveDate,
}

impl PeriodResolver {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn resolve(&self, request: &PeriodRequest, now: NaiveDateTime) -> DateRange {
        if let (Some(start), Some(end)) = (request.start, request.end) {
            return DateRange::new(start_of_day(start), end_of_day(end));
        }

        let today = now.date();
        let month_start = first_of_month(today);
        match request.period {
            Period::Month => DateRange::new(
                start_of_day(month_start),
                end_of_day(last_of_month(month_start)),
            ),
            Period::Quarter => {
                let mut quarter_start = month_start;
                for _ in 0..(today.month0() % 3) {
                    quarter_start = previous_month(quarter_start);
                }
                let quarter_end = quarter_start
                    .checked_add_months(Months::new(2))
                    .map_or(NaiveDate::MAX, last_of_month);
                DateRange::new(start_of_day(quarter_start), end_of_day(quarter_end))
            }
            Period::Year => {
                let year_start = today.with_ordinal(1).unwrap_or(today);
                let year_end =
                    NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(NaiveDate::MAX);
                DateRange::new(start_of_day(year_start), end_of_day(year_end))
            }
            // Ends with the current month so `all` always covers `month`.
            Period::All => DateRange::new(
                start_of_day(self.epoch),
                end_of_day(last_of_month(month_start)),
            ),
            Period::MonthToDate => DateRange::new(start_of_day(month_start), end_of_day(today)),
        }
    }
}

impl Default for PeriodResolver {
    fn default() -> Self {
        Self::new(default_epoch())
    }
}

/// 2020-01-01, the first day the CRM holds data for.
pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub(crate) fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub(crate) fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of_day(date))
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the following month; `None` past the last representable month.
pub(crate) fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date).checked_add_months(Months::new(1))
}

fn previous_month(first: NaiveDate) -> NaiveDate {
    first.pred_opt().map_or(first, first_of_month)
}

pub(crate) fn last_of_month(date: NaiveDate) -> NaiveDate {
    next_month(date)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
