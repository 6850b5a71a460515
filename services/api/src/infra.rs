use chrono::{Local, NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use semaforo::config::AppConfig;
use semaforo::workflows::onboarding::{
    CsvRecordStore, HolidayCalendar, LocalArchiveSink, OnboardingService, Product, Semaphore,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type FileBackedService = OnboardingService<CsvRecordStore, LocalArchiveSink>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service over the configured CSV table and local archive directory.
pub(crate) fn build_service(config: &AppConfig) -> FileBackedService {
    let store = Arc::new(CsvRecordStore::new(&config.store.path));
    let sink = Arc::new(LocalArchiveSink::new(&config.archive.directory));
    let calendar = HolidayCalendar::new(config.calendar.holidays.iter().copied());

    OnboardingService::new(store, sink, calendar, config.archive.policy)
        .with_rows_per_page(config.report.rows_per_page)
}

/// Wall-clock time, moved onto `today` when one is supplied.
pub(crate) fn resolve_now(today: Option<NaiveDate>) -> NaiveDateTime {
    let now = Local::now().naive_local();
    match today {
        Some(date) => date.and_time(now.time()),
        None => now,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_product(raw: &str) -> Result<Product, String> {
    Product::from_code(raw).ok_or_else(|| {
        let known: Vec<_> = Product::ordered().iter().map(|product| product.code()).collect();
        format!("unknown product '{raw}' (expected one of {})", known.join(", "))
    })
}

pub(crate) fn parse_status(raw: &str) -> Result<Semaphore, String> {
    Semaphore::parse(raw).ok_or_else(|| format!("unknown status '{raw}'"))
}
