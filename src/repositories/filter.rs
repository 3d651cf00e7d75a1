//! Translation of sparse, optional filter fields into a SeaORM [`Condition`].
//!
//! Every builder method ignores `None`, so request DTOs can be mapped field by field.
//! Ranges are inclusive: both bounds give `BETWEEN`, a lone lower bound gives `>=`, a
//! lone upper bound gives `<=`. Calendar-date upper bounds cover the whole day.

use chrono::{Duration, NaiveDate, NaiveTime};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, Condition, Value};

#[derive(Debug, Clone)]
pub struct FilterBuilder {
    condition: Condition,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self {
            condition: Condition::all(),
        }
    }

    /// Exact match, for enums and foreign keys.
    pub fn eq<C, V>(mut self, column: C, value: Option<V>) -> Self
    where
        C: ColumnTrait,
        V: Into<Value>,
    {
        if let Some(value) = value {
            self.condition = self.condition.add(column.eq(value));
        }
        self
    }

    /// Partial text match (`LIKE %value%`). Blank strings are ignored.
    pub fn contains<C: ColumnTrait>(mut self, column: C, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.condition = self.condition.add(column.contains(value));
        }
        self
    }

    /// Inclusive range over a numeric or timestamp column.
    pub fn range<C, V>(mut self, column: C, start: Option<V>, end: Option<V>) -> Self
    where
        C: ColumnTrait,
        V: Into<Value>,
    {
        let expr = match (start, end) {
            (Some(start), Some(end)) => Some(column.between(start, end)),
            (Some(start), None) => Some(column.gte(start)),
            (None, Some(end)) => Some(column.lte(end)),
            (None, None) => None,
        };
        if let Some(expr) = expr {
            self.condition = self.condition.add(expr);
        }
        self
    }

    /// Inclusive calendar-date range over a timestamp column, in UTC.
    ///
    /// The lower bound starts at midnight; the upper bound ends at `23:59:59.999`.
    pub fn date_range<C: ColumnTrait>(
        self,
        column: C,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        self.range(column, start.map(start_of_day), end.map(end_of_day))
    }

    /// Adds an arbitrary predicate.
    pub fn and(mut self, condition: Condition) -> Self {
        self.condition = self.condition.add(condition);
        self
    }

    pub fn build(self) -> Condition {
        self.condition
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTimeWithTimeZone {
    date.and_time(NaiveTime::MIN).and_utc().into()
}

/// Last millisecond of `date` in UTC.
pub fn end_of_day(date: NaiveDate) -> DateTimeWithTimeZone {
    let next_midnight = date.and_time(NaiveTime::MIN) + Duration::days(1);
    (next_midnight - Duration::milliseconds(1)).and_utc().into()
}
