use super::super::domain::Semaphore;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportRowView {
    pub call_center_id: String,
    pub sales_agent: String,
    pub customer_name: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusGroupView {
    pub status: Semaphore,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<&'static str>,
    pub rows: Vec<ReportRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCountEntry {
    pub status: Semaphore,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPage {
    pub number: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub generated_label: String,
    pub groups: Vec<StatusGroupView>,
    pub summary: Vec<StatusCountEntry>,
    pub pages: Vec<ReportPage>,
}

impl ReportDocument {
    /// Pages joined with form feeds, ready to print or save.
    pub fn to_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\u{c}\n")
    }
}
