use std::fs;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use semaforo::workflows::onboarding::{
    ArchiveKind, ArchivePolicy, CsvRecordStore, HolidayCalendar, LocalArchiveSink,
    OnboardingService, OperatorContext, NewCustomer, Product, RecordFilter, RecordStore,
    Semaphore,
};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 12).expect("valid date")
}

fn at(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(10, 0, 0).expect("valid time")
}

fn customer(call_center: &str, name: &str) -> NewCustomer {
    NewCustomer {
        call_center_id: Some(call_center.to_string()),
        sales_agent: "Marta".to_string(),
        customer_name: name.to_string(),
    }
}

#[test]
fn csv_backed_lifecycle_archives_and_purges_expired_blocks() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let store_path = workspace.path().join("data").join("semaforo.csv");
    let archive_dir = workspace.path().join("archive");

    let store = Arc::new(CsvRecordStore::new(&store_path));
    let sink = Arc::new(LocalArchiveSink::new(&archive_dir));
    // Same holidays the default configuration ships with.
    let calendar = HolidayCalendar::new([
        NaiveDate::from_ymd_opt(2025, 5, 17).expect("valid date"),
        NaiveDate::from_ymd_opt(2025, 5, 19).expect("valid date"),
    ]);
    let service = OnboardingService::new(store.clone(), sink, calendar, ArchivePolicy::default());
    let admin = OperatorContext::administrator("console");

    // Thursday insert: Thu, Fri, then Monday is a holiday so Tuesday.
    let thursday = monday() + Duration::days(3);
    let rows = service
        .insert_customer(&admin, customer("CALL-1", "ACME"), at(thursday))
        .expect("insert ACME");
    let dates: Vec<_> = rows.iter().map(|row| row.scheduled_date).collect();
    assert_eq!(
        dates,
        vec![
            thursday,
            thursday + Duration::days(1),
            thursday + Duration::days(5),
        ]
    );

    service
        .insert_customer(&admin, customer("CALL-2", "BETA"), at(thursday))
        .expect("insert BETA");
    for product in Product::ordered() {
        service
            .toggle_product(&admin, "ACME", thursday, product, at(thursday))
            .expect("mark ACME");
    }

    let persisted = store.load_all().expect("store reloads");
    assert_eq!(persisted.len(), 6);
    assert!(persisted
        .iter()
        .filter(|row| row.customer_name == "ACME" && row.scheduled_date == thursday)
        .all(|row| row.product_marks.is_complete() && row.status == Semaphore::BlueFinalized));

    // Expiry: Thu -> Fri -> (weekend, holiday) Tue -> Wed.
    let expiry = thursday + Duration::days(6);
    let before = service
        .evaluate(at(expiry - Duration::days(1)))
        .expect("evaluation before expiry");
    assert!(before.purged.is_empty());
    assert_eq!(before.table.len(), 6);

    let outcome = service.evaluate(at(expiry)).expect("evaluation on expiry");
    assert_eq!(outcome.purged.len(), 2);
    assert!(outcome.export_failures.is_empty());
    assert!(store.load_all().expect("store reloads").is_empty());

    let finalized = outcome
        .archived
        .iter()
        .find(|receipt| receipt.kind == ArchiveKind::Finalized)
        .expect("finalized batch exported");
    let archived = CsvRecordStore::new(&finalized.location)
        .load_all()
        .expect("archive parses");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].customer_name, "ACME");

    let closed = outcome
        .archived
        .iter()
        .find(|receipt| receipt.kind == ArchiveKind::Closed)
        .expect("closed batch exported");
    assert!(closed.label.starts_with("closed_"));
    assert_eq!(fs::read_dir(&archive_dir).expect("archive dir").count(), 2);
}

#[test]
fn legacy_spreadsheet_export_loads_with_spanish_headers() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let path = workspace.path().join("legacy.csv");
    fs::write(
        &path,
        "CALL,COMERCIAL,CLIENTE,DIA,F2025,F2026,HL,VIGILANCIA,IMPLANT,DENUNCIAS,SEMAFORO\n\
         CALL-1,Marta,ACME,12/05/2025,✔,❌,❌,❌,❌,❌,VERDE\n\
         CALL-1,Marta,ACME,2025-05-13 00:00:00,❌,❌,❌,❌,❌,❌,AMARILLO\n\
         CALL-1,Marta,ACME,2025-05-14,❌,❌,❌,❌,❌,❌,\n",
    )
    .expect("write legacy file");

    let store = CsvRecordStore::new(&path);
    let rows = store.load_all().expect("legacy rows load");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].scheduled_date, monday());
    assert!(rows[0].product_marks.is_marked(Product::F2025));
    assert_eq!(rows[0].status, Semaphore::Green);
    assert_eq!(rows[1].status, Semaphore::Yellow);
    assert_eq!(rows[2].status, Semaphore::Pending);

    let service = OnboardingService::new(
        Arc::new(store),
        Arc::new(LocalArchiveSink::new(workspace.path().join("archive"))),
        HolidayCalendar::default(),
        ArchivePolicy::default(),
    );
    let board = service
        .board(
            &OperatorContext::administrator("console"),
            &RecordFilter::default(),
            at(monday() + Duration::days(2)),
        )
        .expect("board evaluates");
    let statuses: Vec<_> = board.records.iter().map(|row| row.status).collect();
    assert_eq!(
        statuses,
        vec![Semaphore::Green, Semaphore::Yellow, Semaphore::Red]
    );
}
