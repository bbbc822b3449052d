//! Monthly dashboard aggregation
//!
//! Composes the read-only sub-queries (totals, count, category grouping,
//! top expenses, daily totals) into one `Dashboard` value for a reference
//! month. The arithmetic here is pure `Decimal`; rounding happens only at
//! the documented output points.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CategorySpending, Dashboard};
use crate::money;

/// How many expenses the "largest expenses" panel shows
const TOP_EXPENSES: i64 = 5;

/// A calendar month used as the dashboard reference period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidData(format!("Invalid month: {}", month)));
        }
        // Keep chrono's date construction infallible downstream
        if !(1..=9999).contains(&year) {
            return Err(Error::InvalidData(format!("Invalid year: {}", year)));
        }
        Ok(Self { year, month })
    }

    /// Parse "YYYY-MM"
    pub fn parse(s: &str) -> Result<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}", s)))?;
        let year = year
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid month: {}", s)))?;
        let month = month
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid month: {}", s)))?;
        Self::new(year, month)
    }

    /// The month containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The previous calendar month, rolling the year back over January
    pub fn prior(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Inclusive [first day, last day] range of the month
    pub fn range(self) -> (NaiveDate, NaiveDate) {
        // Month is validated at construction, so these cannot fail
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("validated year-month");
        let next = self.next_month_first();
        let last = next.pred_opt().expect("day before a month start");
        (first, last)
    }

    fn next_month_first(self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).expect("validated year-month")
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Month-over-month variance in percent, 2 fraction digits
///
/// A zero prior month has no true percentage, so the value saturates:
/// 100 when the current month spent anything, 0 otherwise. Otherwise the
/// ratio is carried at 4 fraction digits half-up, scaled by 100 and
/// rescaled to 2 half-up.
pub fn percent_variance(current: Decimal, prior: Decimal) -> Decimal {
    if prior == Decimal::ZERO {
        return if current > Decimal::ZERO {
            Decimal::new(100_00, 2)
        } else {
            Decimal::new(0, 2)
        };
    }
    let ratio = money::round_half_up((current - prior) / prior, 4);
    money::round_half_up(ratio * Decimal::from(100), 2)
}

/// Mean expense amount, 2 fraction digits half-up; zero when count is zero
pub fn average_ticket(total: Decimal, count: i64) -> Decimal {
    if count <= 0 {
        return Decimal::new(0, 2);
    }
    money::round_half_up(total / Decimal::from(count), 2)
}

impl Database {
    /// Compute the dashboard for one owner and reference month
    ///
    /// Each sub-query is an independent read; no ordering between them
    /// matters, they are only composed at the end.
    pub fn dashboard(&self, owner_id: i64, reference: YearMonth) -> Result<Dashboard> {
        debug!(user_id = owner_id, month = %reference, "Computing dashboard");

        let (from, to) = reference.range();
        let (prior_from, prior_to) = reference.prior().range();

        let current_total = self.sum_for_period(owner_id, from, to)?;
        let prior_total = self.sum_for_period(owner_id, prior_from, prior_to)?;
        let count = self.count_for_period(owner_id, from, to)?;

        let by_category = self
            .spending_by_category(owner_id, from, to)?
            .into_iter()
            .map(|row| CategorySpending {
                percent: money::percent_of(row.total, current_total),
                name: row.name,
                color: row.color,
                total: row.total,
                count: row.count,
            })
            .collect();

        let top_expenses = self.top_expenses(owner_id, from, to, TOP_EXPENSES)?;
        let daily_totals = self.spending_by_day(owner_id, from, to)?;

        Ok(Dashboard {
            percent_variance: percent_variance(current_total, prior_total),
            average_ticket: average_ticket(current_total, count),
            current_total,
            prior_total,
            count,
            by_category,
            top_expenses,
            daily_totals,
        })
    }
}
