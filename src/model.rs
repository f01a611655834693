use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-(date, subject, student) mark on the daily register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Justified,
    Unmarked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Class,
    Holiday,
    Institutional,
    Exam,
}

impl EventKind {
    /// Only holidays and institutional suspensions exclude a date from the
    /// class-count calculation.
    pub fn suspends_classes(self) -> bool {
        matches!(self, EventKind::Holiday | EventKind::Institutional)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub kind: EventKind,
    pub date: NaiveDate,
    pub title: String,
}

/// School-year bounds and the optional winter-break interval. All fields
/// start out null and are overwritten wholesale by `schoolYear.set`. Ordering
/// is not validated; an inverted range just yields zero classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolYearConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub winter_break_start_date: Option<NaiveDate>,
    pub winter_break_end_date: Option<NaiveDate>,
}

impl SchoolYearConfig {
    pub fn in_winter_break(&self, date: NaiveDate) -> bool {
        match (self.winter_break_start_date, self.winter_break_end_date) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }
}

/// A taught subject: its weekly schedule string plus the static totals used
/// as a fallback when the schedule cannot be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub schedule: String,
    pub total_classes: u32,
    pub max_absences: u32,
}
