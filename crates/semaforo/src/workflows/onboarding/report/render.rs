use super::views::{ReportPage, StatusCountEntry, StatusGroupView};

const COLUMN_WIDTH: usize = 24;
const COLUMNS: [&str; 4] = ["CALL", "AGENT", "CUSTOMER", "DAY"];

/// Lays the report out on fixed-height text pages.
///
/// A status heading is never left at the bottom of a page without its column header and first row.
pub fn paginate(
    title: &str,
    generated_label: &str,
    groups: &[StatusGroupView],
    summary: &[StatusCountEntry],
    rows_per_page: usize,
) -> Vec<ReportPage> {
    let mut pages = PageBuilder::new(rows_per_page.max(4));

    pages.push(title.to_string());
    pages.push(format!("Generated {generated_label}"));
    pages.push(String::new());

    for group in groups {
        pages.reserve(3);
        pages.push(group.status_label.to_uppercase());
        pages.push(columns(&COLUMNS));
        for row in &group.rows {
            pages.push(columns(&[
                row.call_center_id.as_str(),
                row.sales_agent.as_str(),
                row.customer_name.as_str(),
                row.scheduled_label.as_str(),
            ]));
        }
        pages.push(String::new());
    }

    pages.reserve(2);
    pages.push("Summary by status:".to_string());
    for entry in summary {
        pages.push(format!("{}: {} customers", entry.status_label, entry.count));
    }

    pages.finish()
}

fn columns(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|cell| {
            let clipped: String = cell.chars().take(COLUMN_WIDTH - 1).collect();
            format!("{clipped:<width$}", width = COLUMN_WIDTH)
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

struct PageBuilder {
    capacity: usize,
    pages: Vec<ReportPage>,
    current: Vec<String>,
}

impl PageBuilder {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Breaks the page early when fewer than `lines` remain.
    fn reserve(&mut self, lines: usize) {
        if self.capacity - self.current.len() < lines {
            self.break_page();
        }
    }

    fn push(&mut self, line: String) {
        if self.current.len() == self.capacity {
            self.break_page();
        }
        // Blank lines are dropped at the top of a page.
        if line.is_empty() && self.current.is_empty() {
            return;
        }
        self.current.push(line);
    }

    fn break_page(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let number = self.pages.len() + 1;
        self.pages.push(ReportPage {
            number,
            lines: std::mem::take(&mut self.current),
        });
    }

    fn finish(mut self) -> Vec<ReportPage> {
        self.break_page();
        self.pages
    }
}
