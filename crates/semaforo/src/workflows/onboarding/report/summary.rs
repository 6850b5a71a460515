use super::super::domain::{CustomerRecord, Semaphore};
use super::super::table::{CustomerTable, RecordFilter};
use super::render::paginate;
use super::views::{ReportDocument, ReportRowView, StatusCountEntry, StatusGroupView};
use chrono::NaiveDateTime;
use std::collections::HashMap;

const TITLE: &str = "Customer Report - Semaphore";

/// Rows of a filtered board grouped by status for printing.
#[derive(Debug)]
pub struct SemaphoreReport {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub groups: HashMap<Semaphore, Vec<CustomerRecord>>,
}

impl SemaphoreReport {
    /// Groups the (already filtered) table. Pending rows are not reported.
    pub fn build(table: &CustomerTable, filter: &RecordFilter, generated_at: NaiveDateTime) -> Self {
        let mut groups: HashMap<Semaphore, Vec<CustomerRecord>> = HashMap::new();
        for record in table.records() {
            if record.status.is_pending() {
                continue;
            }
            groups.entry(record.status).or_default().push(record.clone());
        }

        Self {
            title: report_title(filter),
            generated_at,
            groups,
        }
    }

    pub fn count(&self, status: Semaphore) -> usize {
        self.groups.get(&status).map_or(0, Vec::len)
    }

    pub fn group_views(&self) -> Vec<StatusGroupView> {
        Semaphore::ordered()
            .into_iter()
            .filter_map(|status| {
                self.groups.get(&status).map(|rows| {
                    let colors = status.colors();
                    StatusGroupView {
                        status,
                        status_label: status.label(),
                        background: colors.map(|(background, _)| background),
                        foreground: colors.map(|(_, foreground)| foreground),
                        rows: rows.iter().map(row_view).collect(),
                    }
                })
            })
            .collect()
    }

    /// Non-zero counts in report order.
    pub fn summary(&self) -> Vec<StatusCountEntry> {
        Semaphore::ordered()
            .into_iter()
            .map(|status| StatusCountEntry {
                status,
                status_label: status.label(),
                count: self.count(status),
            })
            .filter(|entry| entry.count > 0)
            .collect()
    }

    pub fn document(&self, rows_per_page: usize) -> ReportDocument {
        let groups = self.group_views();
        let summary = self.summary();
        let generated_label = self.generated_at.format("%d/%m/%Y %H:%M").to_string();
        let pages = paginate(&self.title, &generated_label, &groups, &summary, rows_per_page);

        ReportDocument {
            title: self.title.clone(),
            generated_at: self.generated_at,
            generated_label,
            groups,
            summary,
            pages,
        }
    }
}

fn row_view(record: &CustomerRecord) -> ReportRowView {
    ReportRowView {
        call_center_id: record.call_center_id.clone(),
        sales_agent: record.sales_agent.clone(),
        customer_name: record.customer_name.clone(),
        scheduled_date: record.scheduled_date,
        scheduled_label: record.scheduled_date.format("%d/%m/%Y").to_string(),
    }
}

fn report_title(filter: &RecordFilter) -> String {
    let mut title = TITLE.to_string();
    if let Some(call_center) = filter.call_center.as_deref().filter(|v| !v.trim().is_empty()) {
        title.push_str(&format!(" | CALL: {}", call_center.trim()));
    }
    if let Some(agent) = filter.sales_agent.as_deref().filter(|v| !v.trim().is_empty()) {
        title.push_str(&format!(" | AGENT: {}", agent.trim()));
    }
    title
}
