use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::model::{AttendanceStatus, CalendarEvent, SchoolYearConfig, Subject};

/// One pending "flagged absent" notice for a student, awaiting a
/// late-arrival acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceNotice {
    pub date: NaiveDate,
    pub subject: String,
}

/// All daemon state. Lives for the process lifetime; nothing is persisted.
/// Constructed explicitly and handed to the request loop so tests can build
/// their own instances.
#[derive(Debug, Default)]
pub struct Store {
    school_year: SchoolYearConfig,
    subjects: HashMap<String, Subject>,
    calendar: Vec<CalendarEvent>,
    holiday_cache: HashMap<i32, Vec<CalendarEvent>>,
    // date -> subject -> student -> status
    attendance: HashMap<NaiveDate, HashMap<String, HashMap<i64, AttendanceStatus>>>,
    // date -> subject -> student -> free-text reason
    late_reasons: HashMap<NaiveDate, HashMap<String, HashMap<i64, String>>>,
    closed_registers: HashSet<(NaiveDate, String)>,
    // student -> pending notices
    notifications: HashMap<i64, Vec<AbsenceNotice>>,
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // --- school year ---

    pub fn set_school_year(&mut self, config: SchoolYearConfig) {
        self.school_year = config;
    }

    pub fn school_year(&self) -> &SchoolYearConfig {
        &self.school_year
    }

    // --- subjects ---

    pub fn upsert_subject(&mut self, subject: Subject) {
        self.subjects.insert(subject.name.clone(), subject);
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.get(name)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    // --- calendar ---

    pub fn add_event(&mut self, event: CalendarEvent) {
        self.calendar.push(event);
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.calendar
    }

    /// Dates on which no class is counted: holiday and institutional events,
    /// plus any cached national holidays for the given years.
    pub fn excluded_dates(&self, years: impl IntoIterator<Item = i32>) -> HashSet<NaiveDate> {
        let mut out: HashSet<NaiveDate> = self
            .calendar
            .iter()
            .filter(|e| e.kind.suspends_classes())
            .map(|e| e.date)
            .collect();
        for year in years {
            if let Some(holidays) = self.holiday_cache.get(&year) {
                out.extend(holidays.iter().map(|e| e.date));
            }
        }
        out
    }

    pub fn cached_holidays(&self, year: i32) -> Option<&[CalendarEvent]> {
        self.holiday_cache.get(&year).map(|v| v.as_slice())
    }

    pub fn cache_holidays(&mut self, year: i32, holidays: Vec<CalendarEvent>) {
        self.holiday_cache.insert(year, holidays);
    }

    // --- daily attendance ---

    /// Merge-write: statuses for students not named in `marks` are kept.
    pub fn set_attendance(
        &mut self,
        date: NaiveDate,
        subject: &str,
        marks: HashMap<i64, AttendanceStatus>,
    ) {
        self.attendance
            .entry(date)
            .or_default()
            .entry(subject.to_string())
            .or_default()
            .extend(marks);
    }

    pub fn attendance(&self, date: NaiveDate, subject: &str) -> HashMap<i64, AttendanceStatus> {
        self.attendance
            .get(&date)
            .and_then(|by_subject| by_subject.get(subject))
            .cloned()
            .unwrap_or_default()
    }

    // --- late reasons ---

    pub fn set_late_reason(&mut self, date: NaiveDate, subject: &str, student: i64, reason: String) {
        self.late_reasons
            .entry(date)
            .or_default()
            .entry(subject.to_string())
            .or_default()
            .insert(student, reason);
    }

    pub fn late_reasons(&self, date: NaiveDate, subject: &str) -> HashMap<i64, String> {
        self.late_reasons
            .get(&date)
            .and_then(|by_subject| by_subject.get(subject))
            .cloned()
            .unwrap_or_default()
    }

    pub fn delete_late_reason(&mut self, date: NaiveDate, subject: &str, student: i64) -> bool {
        self.late_reasons
            .get_mut(&date)
            .and_then(|by_subject| by_subject.get_mut(subject))
            .map(|reasons| reasons.remove(&student).is_some())
            .unwrap_or(false)
    }

    // --- closed registers ---

    /// Closing is final: there is no unmarking within the process lifetime.
    pub fn close_register(&mut self, date: NaiveDate, subject: &str) {
        self.closed_registers.insert((date, subject.to_string()));
    }

    pub fn is_register_closed(&self, date: NaiveDate, subject: &str) -> bool {
        self.closed_registers
            .contains(&(date, subject.to_string()))
    }

    // --- absence notifications ---

    pub fn notify_absent(&mut self, date: NaiveDate, subject: &str, students: &[i64]) {
        for &student in students {
            let notices = self.notifications.entry(student).or_default();
            let notice = AbsenceNotice {
                date,
                subject: subject.to_string(),
            };
            if !notices.contains(&notice) {
                notices.push(notice);
            }
        }
    }

    pub fn notices_for_student(&self, student: i64) -> &[AbsenceNotice] {
        self.notifications
            .get(&student)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The acknowledgment clears the student's whole pending set.
    pub fn clear_notifications(&mut self, student: i64) -> usize {
        self.notifications.remove(&student).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn attendance_merge_keeps_existing_marks() {
        let mut store = Store::new();
        let date = d("2025-04-07");
        store.set_attendance(
            date,
            "Matemática",
            HashMap::from([(1, AttendanceStatus::Present), (2, AttendanceStatus::Absent)]),
        );
        store.set_attendance(date, "Matemática", HashMap::from([(2, AttendanceStatus::Late)]));

        let marks = store.attendance(date, "Matemática");
        assert_eq!(marks.get(&1), Some(&AttendanceStatus::Present));
        assert_eq!(marks.get(&2), Some(&AttendanceStatus::Late));
        assert!(store.attendance(date, "Historia").is_empty());
    }

    #[test]
    fn register_closed_only_for_exact_pair() {
        let mut store = Store::new();
        let date = d("2025-04-07");
        assert!(!store.is_register_closed(date, "Matemática"));
        store.close_register(date, "Matemática");
        assert!(store.is_register_closed(date, "Matemática"));
        assert!(!store.is_register_closed(date, "Historia"));
        assert!(!store.is_register_closed(d("2025-04-08"), "Matemática"));
    }

    #[test]
    fn late_reason_roundtrip_and_delete() {
        let mut store = Store::new();
        let date = d("2025-04-07");
        store.set_late_reason(date, "Historia", 3, "tren demorado".to_string());
        assert_eq!(
            store.late_reasons(date, "Historia").get(&3).map(String::as_str),
            Some("tren demorado")
        );
        assert!(store.delete_late_reason(date, "Historia", 3));
        assert!(!store.delete_late_reason(date, "Historia", 3));
        assert!(store.late_reasons(date, "Historia").is_empty());
    }

    #[test]
    fn notifications_dedupe_and_clear() {
        let mut store = Store::new();
        let date = d("2025-04-07");
        store.notify_absent(date, "Matemática", &[5, 6]);
        store.notify_absent(date, "Matemática", &[5]);
        assert_eq!(store.notices_for_student(5).len(), 1);
        assert_eq!(store.notices_for_student(6).len(), 1);
        assert_eq!(store.clear_notifications(5), 1);
        assert!(store.notices_for_student(5).is_empty());
        assert_eq!(store.clear_notifications(5), 0);
    }

    #[test]
    fn excluded_dates_union_calendar_and_cache() {
        let mut store = Store::new();
        store.add_event(CalendarEvent {
            kind: crate::model::EventKind::Institutional,
            date: d("2025-05-02"),
            title: "Jornada docente".to_string(),
        });
        store.add_event(CalendarEvent {
            kind: crate::model::EventKind::Exam,
            date: d("2025-05-05"),
            title: "Parcial".to_string(),
        });
        store.cache_holidays(
            2025,
            vec![CalendarEvent {
                kind: crate::model::EventKind::Holiday,
                date: d("2025-05-01"),
                title: "Día del Trabajador".to_string(),
            }],
        );

        let excluded = store.excluded_dates([2025]);
        assert!(excluded.contains(&d("2025-05-01")));
        assert!(excluded.contains(&d("2025-05-02")));
        // exam days do not suspend classes
        assert!(!excluded.contains(&d("2025-05-05")));
    }
}
