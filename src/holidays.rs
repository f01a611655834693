use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{CalendarEvent, EventKind};
use crate::store::Store;

/// Country the institution operates in; the upstream API is queried for this
/// code only.
const COUNTRY_CODE: &str = "AR";

const DEFAULT_BASE_URL: &str = "https://date.nager.at/api/v3/PublicHolidays";

/// Where a holiday list came from. `Unavailable` means the upstream fetch
/// failed and the year degrades to "no holidays recognized" — callers can
/// warn instead of silently over-counting classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    Cache,
    Network,
    Unavailable,
}

/// Upstream lookup for one year's national holidays. Trait-shaped so tests
/// can stub the network and count calls.
pub trait HolidaySource {
    fn fetch(&self, year: i32) -> anyhow::Result<Vec<CalendarEvent>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHoliday {
    date: NaiveDate,
    local_name: String,
}

/// Blocking client for the Nager.Date public-holiday API.
pub struct NagerClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NagerClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl HolidaySource for NagerClient {
    fn fetch(&self, year: i32) -> anyhow::Result<Vec<CalendarEvent>> {
        let url = format!("{}/{}/{}", self.base_url, year, COUNTRY_CODE);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let holidays: Vec<ApiHoliday> = response.json().context("decode holiday response")?;
        Ok(holidays
            .into_iter()
            .map(|h| CalendarEvent {
                kind: EventKind::Holiday,
                date: h.date,
                title: h.local_name,
            })
            .collect())
    }
}

/// Cached lookup of one year's national holidays. A fetch failure degrades to
/// an empty list tagged `Unavailable` and is not cached, so a later call
/// retries the upstream.
pub fn fetch_national_holidays(
    store: &mut Store,
    source: &dyn HolidaySource,
    year: i32,
) -> (Vec<CalendarEvent>, FetchSource) {
    if let Some(cached) = store.cached_holidays(year) {
        return (cached.to_vec(), FetchSource::Cache);
    }
    match source.fetch(year) {
        Ok(holidays) => {
            store.cache_holidays(year, holidays.clone());
            (holidays, FetchSource::Network)
        }
        Err(e) => {
            eprintln!("preceptord: holiday fetch for {year} failed: {e:#}");
            (Vec::new(), FetchSource::Unavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubSource {
        calls: Cell<u32>,
        fail: bool,
    }

    impl StubSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl HolidaySource for StubSource {
        fn fetch(&self, year: i32) -> anyhow::Result<Vec<CalendarEvent>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(vec![CalendarEvent {
                kind: EventKind::Holiday,
                date: NaiveDate::from_ymd_opt(year, 5, 1).unwrap(),
                title: "Día del Trabajador".to_string(),
            }])
        }
    }

    #[test]
    fn second_fetch_for_same_year_is_served_from_cache() {
        let mut store = Store::new();
        let source = StubSource::new(false);

        let (first, tag) = fetch_national_holidays(&mut store, &source, 2025);
        assert_eq!(first.len(), 1);
        assert_eq!(tag, FetchSource::Network);

        let (second, tag) = fetch_national_holidays(&mut store, &source, 2025);
        assert_eq!(second.len(), 1);
        assert_eq!(tag, FetchSource::Cache);
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn distinct_years_fetch_separately() {
        let mut store = Store::new();
        let source = StubSource::new(false);
        fetch_national_holidays(&mut store, &source, 2025);
        fetch_national_holidays(&mut store, &source, 2026);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn failure_degrades_to_empty_and_is_not_cached() {
        let mut store = Store::new();
        let source = StubSource::new(true);

        let (holidays, tag) = fetch_national_holidays(&mut store, &source, 2025);
        assert!(holidays.is_empty());
        assert_eq!(tag, FetchSource::Unavailable);

        // no poisoned cache entry; the next call retries
        let (_, tag) = fetch_national_holidays(&mut store, &source, 2025);
        assert_eq!(tag, FetchSource::Unavailable);
        assert_eq!(source.calls.get(), 2);
    }
}
