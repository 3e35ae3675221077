//! # 5-field Cron Expressions
//!
//! ```text
//! ┌──────── minute        0-59
//! │ ┌────── hour          0-23
//! │ │ ┌──── day of month  1-31
//! │ │ │ ┌── month         1-12 or jan-dec
//! │ │ │ │ ┌ day of week   0-7 or sun-sat (0 and 7 are Sunday)
//! * * * * *
//! ```
//!
//! Each field is a comma list of `*`, `n`, `a-b`, `*/s`, `a-b/s` or `n/s`
//! (from `n` to the field maximum in steps of `s`).
//!
//! When neither day field starts with `*`, a day matches if *either* does,
//! as in classic cron. Otherwise both must match, so `*/2` in a day field
//! still filters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};

use crate::error::DotmateError;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const WEEKDAYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Search horizon for `next_after`; every valid pattern recurs within it.
const SEARCH_YEARS: i32 = 5;

/// Bit set of allowed values for one field (values 0-63).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(self, v: u32) -> bool {
        v < 64 && self.0 & (1 << v) != 0
    }

    fn insert(&mut self, v: u32) {
        self.0 |= 1 << v;
    }
}

struct FieldKind {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    /// Offset added to a name's index (months start at 1).
    name_base: u32,
}

const MINUTE: FieldKind = FieldKind { name: "minute", min: 0, max: 59, names: &[], name_base: 0 };
const HOUR: FieldKind = FieldKind { name: "hour", min: 0, max: 23, names: &[], name_base: 0 };
const DAY_OF_MONTH: FieldKind = FieldKind { name: "day-of-month", min: 1, max: 31, names: &[], name_base: 0 };
const MONTH: FieldKind = FieldKind { name: "month", min: 1, max: 12, names: &MONTHS, name_base: 1 };
const DAY_OF_WEEK: FieldKind = FieldKind { name: "day-of-week", min: 0, max: 7, names: &WEEKDAYS, name_base: 0 };

impl FieldKind {
    fn value(&self, token: &str) -> Result<u32, String> {
        let lower = token.to_ascii_lowercase();
        if let Some(i) = self.names.iter().position(|n| *n == lower) {
            return Ok(i as u32 + self.name_base);
        }
        let v: u32 = token
            .parse()
            .map_err(|_| format!("invalid {} value '{}'", self.name, token))?;
        if v < self.min || v > self.max {
            return Err(format!(
                "{} value {} out of range {}-{}",
                self.name, v, self.min, self.max
            ));
        }
        Ok(v)
    }

    /// Parse a field. Returns the set and whether it starts with `*`
    /// (which makes the day fields join with AND).
    fn parse(&self, field: &str) -> Result<(FieldSet, bool), String> {
        let mut set = FieldSet(0);
        for item in field.split(',') {
            let (range, step) = match item.split_once('/') {
                Some((r, s)) => {
                    let step: u32 = s
                        .parse()
                        .map_err(|_| format!("invalid {} step '{}'", self.name, s))?;
                    if step == 0 {
                        return Err(format!("{} step must be positive", self.name));
                    }
                    (r, Some(step))
                }
                None => (item, None),
            };

            let (lo, hi) = if range == "*" {
                (self.min, self.max)
            } else if let Some((a, b)) = range.split_once('-') {
                (self.value(a)?, self.value(b)?)
            } else {
                let v = self.value(range)?;
                // `n/s` runs from n to the end of the field
                (v, if step.is_some() { self.max } else { v })
            };
            if lo > hi {
                return Err(format!("{} range {}-{} is reversed", self.name, lo, hi));
            }

            let mut v = lo;
            while v <= hi {
                set.insert(v);
                v += step.unwrap_or(1);
            }
        }
        Ok((set, field.starts_with('*')))
    }
}

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    source: String,
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
    dom_any: bool,
    dow_any: bool,
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<Self, DotmateError> {
        let invalid = |reason: String| DotmateError::InvalidCronExpression {
            spec: expr.to_string(),
            reason,
        };

        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        }

        let (minutes, _) = MINUTE.parse(fields[0]).map_err(invalid)?;
        let (hours, _) = HOUR.parse(fields[1]).map_err(invalid)?;
        let (days_of_month, dom_any) = DAY_OF_MONTH.parse(fields[2]).map_err(invalid)?;
        let (months, _) = MONTH.parse(fields[3]).map_err(invalid)?;
        let (mut days_of_week, dow_any) = DAY_OF_WEEK.parse(fields[4]).map_err(invalid)?;
        if days_of_week.contains(7) {
            days_of_week.insert(0);
        }

        let cron = Self {
            source: fields.join(" "),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            dom_any,
            dow_any,
        };
        if !cron.can_fire() {
            return Err(invalid("expression never fires".to_string()));
        }
        Ok(cron)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Some month must contain an allowed day of month (Feb 29 counts).
    fn can_fire(&self) -> bool {
        if !self.dom_any && !self.dow_any {
            return true; // either day rule can match
        }
        const MONTH_DAYS: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        (1..=12).any(|m| {
            self.months.contains(m)
                && (1..=MONTH_DAYS[m as usize - 1]).any(|d| self.days_of_month.contains(d))
        })
    }

    /// A `*`-prefixed day field (including `*/n`) joins with AND, two
    /// explicit day fields join with OR.
    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(date.day());
        let dow = self.days_of_week.contains(date.weekday().num_days_from_sunday());
        if self.dom_any || self.dow_any { dom && dow } else { dom || dow }
    }

    /// Whether the minute containing `t` is a firing minute.
    pub fn matches<Tz: TimeZone>(&self, t: &DateTime<Tz>) -> bool {
        self.minutes.contains(t.minute())
            && self.hours.contains(t.hour())
            && self.months.contains(t.month())
            && self.day_matches(t.date_naive())
    }

    /// The first firing minute strictly after `after`.
    ///
    /// Days and hours that cannot match are skipped whole. Local minutes
    /// that do not exist (DST gaps) are skipped; ambiguous ones take the
    /// earlier instant.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = after.timezone();
        let start = after.naive_local().with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);
        let last_day = start.date() + Duration::days(366 * SEARCH_YEARS as i64);

        let mut date = start.date();
        while date <= last_day {
            if self.months.contains(date.month()) && self.day_matches(date) {
                let first_day = date == start.date();
                let (h0, m0) = if first_day { (start.hour(), start.minute()) } else { (0, 0) };
                for h in (h0..24).filter(|&h| self.hours.contains(h)) {
                    let m_start = if h == h0 { m0 } else { 0 };
                    for m in (m_start..60).filter(|&m| self.minutes.contains(m)) {
                        let naive = date.and_hms_opt(h, m, 0)?;
                        if let Some(t) = tz.from_local_datetime(&naive).earliest()
                            && t > *after
                        {
                            return Some(t);
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

impl FromStr for CronExpr {
    type Err = DotmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
