use super::domain::{CustomerRecord, Product, ProductMarks, Semaphore};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const MARKED: &str = "✔";
const UNMARKED: &str = "❌";

/// Load-all/save-all persistence of the flat customer table.
pub trait RecordStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError>;
    fn save_all(&self, records: &[CustomerRecord]) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("record store csv failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed row {row}: {detail}")]
    Malformed { row: usize, detail: String },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// CSV-file backed store. A missing file reads as an empty table.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for CsvRecordStore {
    fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "record store missing, starting empty");
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        read_records(file)
    }

    fn save_all(&self, records: &[CustomerRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so readers never observe a partial table.
        let staging = self.path.with_extension("csv.tmp");
        {
            let file = fs::File::create(&staging)?;
            write_records(file, records)?;
        }
        fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), rows = records.len(), "record store saved");
        Ok(())
    }
}

pub(crate) fn read_records<R: Read>(reader: R) -> Result<Vec<CustomerRecord>, StoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<StoredRow>()
        .enumerate()
        .map(|(idx, row)| {
            let row = row?;
            // Header occupies line 1.
            row.into_record().map_err(|detail| StoreError::Malformed {
                row: idx + 2,
                detail,
            })
        })
        .collect()
}

pub(crate) fn write_records<W: Write>(writer: W, records: &[CustomerRecord]) -> Result<(), StoreError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(StoredRow::from_record(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Column layout of the backing table.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    #[serde(alias = "CALL")]
    call_center_id: String,
    #[serde(alias = "COMERCIAL")]
    sales_agent: String,
    #[serde(alias = "CLIENTE")]
    customer_name: String,
    #[serde(alias = "DIA")]
    scheduled_date: String,
    #[serde(rename = "F2025", default, deserialize_with = "mark_flag")]
    f2025: String,
    #[serde(rename = "F2026", default, deserialize_with = "mark_flag")]
    f2026: String,
    #[serde(rename = "HL", default, deserialize_with = "mark_flag")]
    hl: String,
    #[serde(rename = "VIGILANCIA", default, deserialize_with = "mark_flag")]
    vigilancia: String,
    #[serde(rename = "IMPLANT", default, deserialize_with = "mark_flag")]
    implant: String,
    #[serde(rename = "DENUNCIAS", default, deserialize_with = "mark_flag")]
    denuncias: String,
    #[serde(alias = "SEMAFORO", default)]
    status: String,
}

impl StoredRow {
    fn from_record(record: &CustomerRecord) -> Self {
        let flag = |product| {
            if record.product_marks.is_marked(product) {
                MARKED.to_string()
            } else {
                UNMARKED.to_string()
            }
        };

        Self {
            call_center_id: record.call_center_id.clone(),
            sales_agent: record.sales_agent.clone(),
            customer_name: record.customer_name.clone(),
            scheduled_date: record.scheduled_date.format("%Y-%m-%d").to_string(),
            f2025: flag(Product::F2025),
            f2026: flag(Product::F2026),
            hl: flag(Product::Hl),
            vigilancia: flag(Product::Vigilancia),
            implant: flag(Product::Implant),
            denuncias: flag(Product::Denuncias),
            status: record.status.code().to_string(),
        }
    }

    fn into_record(self) -> Result<CustomerRecord, String> {
        let scheduled_date = parse_scheduled_date(&self.scheduled_date)?;
        let status = Semaphore::parse(&self.status)
            .ok_or_else(|| format!("unknown status '{}'", self.status))?;

        let mut product_marks = ProductMarks::default();
        for (product, raw) in [
            (Product::F2025, &self.f2025),
            (Product::F2026, &self.f2026),
            (Product::Hl, &self.hl),
            (Product::Vigilancia, &self.vigilancia),
            (Product::Implant, &self.implant),
            (Product::Denuncias, &self.denuncias),
        ] {
            let marked = parse_mark(raw)
                .ok_or_else(|| format!("unknown mark '{raw}' for {product}"))?;
            product_marks.set(product, marked);
        }

        Ok(CustomerRecord {
            call_center_id: self.call_center_id,
            sales_agent: self.sales_agent,
            customer_name: self.customer_name,
            scheduled_date,
            product_marks,
            status,
        })
    }
}

fn mark_flag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

fn parse_mark(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        MARKED | "x" | "true" | "1" | "yes" => Some(true),
        UNMARKED | "" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Accepts ISO dates, spreadsheet timestamps and day-first dates.
fn parse_scheduled_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(|_| format!("invalid scheduled date '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 6).expect("valid date")
    }

    #[test]
    fn reads_legacy_spreadsheet_export() {
        let csv = "CALL,COMERCIAL,CLIENTE,DIA,F2025,F2026,HL,VIGILANCIA,IMPLANT,DENUNCIAS,SEMAFORO\n\
                   NORTE,Ana,ACME,2025-10-06 00:00:00,✔,❌,❌,❌,❌,❌,VERDE\n\
                   NORTE,Ana,ACME,2025-10-07,❌,❌,❌,❌,❌,❌,\n";

        let records = read_records(Cursor::new(csv)).expect("legacy rows parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].call_center_id, "NORTE");
        assert_eq!(records[0].scheduled_date, monday());
        assert!(records[0].product_marks.is_marked(Product::F2025));
        assert_eq!(records[0].status, Semaphore::Green);
        assert_eq!(records[1].status, Semaphore::Pending);
    }

    #[test]
    fn reports_malformed_rows_with_line_number() {
        let csv = "call_center_id,sales_agent,customer_name,scheduled_date,F2025,F2026,HL,VIGILANCIA,IMPLANT,DENUNCIAS,status\n\
                   N,Ana,ACME,2025-10-06,,,,,,,\n\
                   N,Ana,ACME,not-a-date,,,,,,,\n";

        match read_records(Cursor::new(csv)) {
            Err(StoreError::Malformed { row, detail }) => {
                assert_eq!(row, 3);
                assert!(detail.contains("not-a-date"));
            }
            other => panic!("expected malformed row, got {other:?}"),
        }
    }

    #[test]
    fn writes_canonical_columns() {
        let mut record = CustomerRecord::new("N", "Ana", "ACME", monday());
        record.product_marks.set(Product::Implant, true);
        record.status = Semaphore::BlueFinalized;

        let mut buffer = Vec::new();
        write_records(&mut buffer, &[record]).expect("write succeeds");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("call_center_id,sales_agent,customer_name,scheduled_date,F2025,F2026,HL,VIGILANCIA,IMPLANT,DENUNCIAS,status")
        );
        assert_eq!(
            lines.next(),
            Some("N,Ana,ACME,2025-10-06,❌,❌,❌,❌,✔,❌,BLUE_FINALIZED")
        );
    }

    #[test]
    fn missing_file_loads_empty_and_save_creates_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvRecordStore::new(dir.path().join("nested").join("board.csv"));
        assert!(store.load_all().expect("load").is_empty());

        let record = CustomerRecord::new("N", "Ana", "ACME", monday());
        store.save_all(&[record.clone()]).expect("save");
        assert_eq!(store.load_all().expect("reload"), vec![record]);
        assert!(!store.path().with_extension("csv.tmp").exists());
    }
}
