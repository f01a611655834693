pub mod attendance;
pub mod calendar;
pub mod core;
pub mod notifications;
pub mod school_year;
pub mod subjects;
