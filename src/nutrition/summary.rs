// ABOUTME: Daily, weekly and monthly nutrition summaries over a user's food journal
// ABOUTME: Computes local calendar boundaries in the configured UTC offset and rounds averages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Journal summaries
//!
//! "Today", "this week" and "this month" are calendar periods in the server's
//! configured UTC offset. Weeks start on Sunday. Averages are the mean of the
//! per-day totals of days that have at least one entry.

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::NutrientTotals;
use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Period selectable through `?period=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for SummaryPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(AppError::invalid_input(format!(
                "Invalid period '{other}'. Expected daily, weekly or monthly"
            ))),
        }
    }
}

/// Half-open UTC interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodBounds {
    /// Whether an instant falls inside the period
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Calendar helper bound to a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct JournalCalendar {
    offset: FixedOffset,
}

impl JournalCalendar {
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar in UTC
    #[must_use]
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Local calendar date of an instant
    #[must_use]
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// UTC instant of local midnight at the start of `date`
    #[must_use]
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        (local - self.offset).and_utc()
    }

    /// The local day containing `now`
    #[must_use]
    pub fn day(&self, now: DateTime<Utc>) -> PeriodBounds {
        let date = self.local_date(now);
        self.span(date, date + Days::new(1))
    }

    /// The Sunday-based week containing `now`
    #[must_use]
    pub fn week(&self, now: DateTime<Utc>) -> PeriodBounds {
        let date = self.local_date(now);
        let sunday = date - Days::new(u64::from(date.weekday().num_days_from_sunday()));
        self.span(sunday, sunday + Days::new(7))
    }

    /// The calendar month containing `now`
    #[must_use]
    pub fn month(&self, now: DateTime<Utc>) -> PeriodBounds {
        let date = self.local_date(now);
        let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
        let next = first
            .checked_add_months(Months::new(1))
            .unwrap_or(first + Days::new(31));
        self.span(first, next)
    }

    /// Bounds for a selectable period
    #[must_use]
    pub fn period(&self, period: SummaryPeriod, now: DateTime<Utc>) -> PeriodBounds {
        match period {
            SummaryPeriod::Daily => self.day(now),
            SummaryPeriod::Weekly => self.week(now),
            SummaryPeriod::Monthly => self.month(now),
        }
    }

    /// Minutes east of UTC
    #[must_use]
    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    fn span(&self, start: NaiveDate, end: NaiveDate) -> PeriodBounds {
        PeriodBounds {
            start: self.start_of(start),
            end: self.start_of(end),
        }
    }
}

/// Today's raw totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTotals {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

/// Rounded mean of per-day totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAverages {
    pub avg_calories: i64,
    pub avg_protein: i64,
    pub avg_carbs: i64,
    pub avg_fat: i64,
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

impl From<NutrientTotals> for TodayTotals {
    fn from(totals: NutrientTotals) -> Self {
        Self {
            total_calories: totals.calories,
            total_protein: totals.protein,
            total_carbs: totals.carbs,
            total_fat: totals.fat,
        }
    }
}

impl From<NutrientTotals> for DailyAverages {
    fn from(avg: NutrientTotals) -> Self {
        Self {
            avg_calories: round(avg.calories),
            avg_protein: round(avg.protein),
            avg_carbs: round(avg.carbs),
            avg_fat: round(avg.fat),
        }
    }
}

/// Response of `GET /api/foods/summary` without a period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionSummary {
    pub today: TodayTotals,
    pub weekly: DailyAverages,
    pub monthly: DailyAverages,
}

/// Totals for one selectable period
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: SummaryPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: f64,
    pub salt: f64,
}

/// Today's totals plus weekly and monthly daily averages
///
/// # Errors
///
/// Returns an error if a database query fails
pub async fn nutrition_summary(
    database: &Database,
    calendar: &JournalCalendar,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<NutritionSummary> {
    let today = calendar.day(now);
    let week = calendar.week(now);
    let month = calendar.month(now);
    let offset = calendar.offset_minutes();

    let (today_totals, weekly, monthly) = tokio::try_join!(
        database.sum_food_nutrients(user_id, today.start, today.end),
        database.average_daily_food_nutrients(user_id, week.start, offset),
        database.average_daily_food_nutrients(user_id, month.start, offset),
    )?;

    Ok(NutritionSummary {
        today: today_totals.into(),
        weekly: weekly.into(),
        monthly: monthly.into(),
    })
}

/// Totals of every nutrient within the selected period
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn period_summary(
    database: &Database,
    calendar: &JournalCalendar,
    user_id: Uuid,
    period: SummaryPeriod,
    now: DateTime<Utc>,
) -> AppResult<PeriodSummary> {
    let bounds = calendar.period(period, now);
    let totals = database
        .sum_food_nutrients(user_id, bounds.start, bounds.end)
        .await?;

    Ok(PeriodSummary {
        period,
        start_date: bounds.start,
        end_date: bounds.end,
        calories: totals.calories,
        protein: totals.protein,
        carbs: totals.carbs,
        fat: totals.fat,
        sugar: totals.sugar,
        salt: totals.salt,
    })
}
