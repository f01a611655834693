use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::HashSet;

use crate::model::{SchoolYearConfig, Subject};

/// Fixed Spanish day-abbreviation table. Schedule lines are matched on their
/// first three characters; anything else is dropped.
const DAY_ABBREVIATIONS: [(&str, Weekday); 7] = [
    ("Dom", Weekday::Sun),
    ("Lun", Weekday::Mon),
    ("Mar", Weekday::Tue),
    ("Mie", Weekday::Wed),
    ("Jue", Weekday::Thu),
    ("Vie", Weekday::Fri),
    ("Sáb", Weekday::Sat),
];

/// Weekdays named by a schedule string like `"Lun 18:20 a 20:20"`, one entry
/// per line. Duplicates are kept: a subject can meet twice on one weekday.
pub fn schedule_weekdays(schedule: &str) -> Vec<Weekday> {
    schedule
        .lines()
        .filter_map(|line| {
            let prefix: String = line.chars().take(3).collect();
            DAY_ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == prefix)
                .map(|(_, weekday)| *weekday)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalsSource {
    /// Counted from the parsed weekly schedule.
    Schedule,
    /// The schedule named no recognizable weekday; the subject's stored
    /// totals were returned unchanged.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTotals {
    pub total_classes: u32,
    pub max_absences: u32,
    pub source: TotalsSource,
}

/// 25% absence allowance, floored.
fn max_absences_for(total_classes: u32) -> u32 {
    total_classes / 4
}

/// Count the subject's class occurrences between `start` and `end` inclusive,
/// skipping excluded dates and the winter-break interval, and derive the
/// absence allowance. Falls back to the subject's static totals when no
/// schedule line parses. An inverted range yields zero occurrences.
pub fn class_totals(
    subject: &Subject,
    start: NaiveDate,
    end: NaiveDate,
    excluded: &HashSet<NaiveDate>,
    school_year: &SchoolYearConfig,
) -> ClassTotals {
    let weekdays = schedule_weekdays(&subject.schedule);
    if weekdays.is_empty() {
        return ClassTotals {
            total_classes: subject.total_classes,
            max_absences: subject.max_absences,
            source: TotalsSource::Static,
        };
    }

    let mut total: u32 = 0;
    for day in start.iter_days().take_while(|d| *d <= end) {
        if excluded.contains(&day) || school_year.in_winter_break(day) {
            continue;
        }
        total += weekdays.iter().filter(|w| **w == day.weekday()).count() as u32;
    }

    ClassTotals {
        total_classes: total,
        max_absences: max_absences_for(total),
        source: TotalsSource::Schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn subject(schedule: &str) -> Subject {
        Subject {
            name: "Matemática".to_string(),
            schedule: schedule.to_string(),
            total_classes: 64,
            max_absences: 16,
        }
    }

    #[test]
    fn parses_known_day_prefixes_and_drops_the_rest() {
        let days = schedule_weekdays("Lun 18:20 a 20:20\nMie 19:20 a 20:20\nXyz 10:00\nSáb 09:00");
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Sat]);
    }

    #[test]
    fn duplicate_weekday_lines_are_kept() {
        let days = schedule_weekdays("Lun 08:00 a 10:00\nLun 18:20 a 20:20");
        assert_eq!(days, vec![Weekday::Mon, Weekday::Mon]);
    }

    #[test]
    fn four_mondays_and_four_wednesdays_make_eight_classes() {
        // 2025-04-07 is a Monday; 2025-05-02 closes the 4th week.
        let totals = class_totals(
            &subject("Lun 18:20 a 20:20\nMie 19:20 a 20:20"),
            d("2025-04-07"),
            d("2025-05-02"),
            &HashSet::new(),
            &SchoolYearConfig::default(),
        );
        assert_eq!(totals.total_classes, 8);
        assert_eq!(totals.max_absences, 2);
        assert_eq!(totals.source, TotalsSource::Schedule);
    }

    #[test]
    fn subject_meeting_twice_on_one_weekday_counts_twice() {
        let totals = class_totals(
            &subject("Lun 08:00 a 10:00\nLun 18:20 a 20:20"),
            d("2025-04-07"),
            d("2025-04-13"),
            &HashSet::new(),
            &SchoolYearConfig::default(),
        );
        assert_eq!(totals.total_classes, 2);
    }

    #[test]
    fn excluded_date_contributes_zero_even_on_a_scheduled_weekday() {
        let excluded = HashSet::from([d("2025-04-14")]);
        let totals = class_totals(
            &subject("Lun 18:20 a 20:20"),
            d("2025-04-07"),
            d("2025-04-21"),
            &excluded,
            &SchoolYearConfig::default(),
        );
        assert_eq!(totals.total_classes, 2);
    }

    #[test]
    fn winter_break_bounds_are_inclusive() {
        let year = SchoolYearConfig {
            start_date: Some(d("2025-03-03")),
            end_date: Some(d("2025-11-28")),
            winter_break_start_date: Some(d("2025-07-14")),
            winter_break_end_date: Some(d("2025-07-28")),
        };
        // Mondays 2025-07-07 .. 2025-08-04; the 14th, 21st and 28th fall
        // inside the break.
        let totals = class_totals(
            &subject("Lun 18:20 a 20:20"),
            d("2025-07-07"),
            d("2025-08-04"),
            &HashSet::new(),
            &year,
        );
        assert_eq!(totals.total_classes, 2);
    }

    #[test]
    fn unparseable_schedule_falls_back_to_static_totals() {
        let totals = class_totals(
            &subject("a convenir"),
            d("2025-04-07"),
            d("2025-05-02"),
            &HashSet::new(),
            &SchoolYearConfig::default(),
        );
        assert_eq!(totals.total_classes, 64);
        assert_eq!(totals.max_absences, 16);
        assert_eq!(totals.source, TotalsSource::Static);
    }

    #[test]
    fn inverted_range_counts_nothing() {
        let totals = class_totals(
            &subject("Lun 18:20 a 20:20"),
            d("2025-05-02"),
            d("2025-04-07"),
            &HashSet::new(),
            &SchoolYearConfig::default(),
        );
        assert_eq!(totals.total_classes, 0);
        assert_eq!(totals.max_absences, 0);
    }

    #[test]
    fn max_absences_is_a_quarter_floored() {
        for (total, expected) in [(0u32, 0u32), (1, 0), (3, 0), (4, 1), (7, 1), (8, 2), (30, 7)] {
            assert_eq!(max_absences_for(total), expected, "total={total}");
        }
    }
}
