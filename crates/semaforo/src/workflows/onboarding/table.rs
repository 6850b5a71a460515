use super::calendar::HolidayCalendar;
use super::domain::{CustomerRecord, OnboardingError, Product, Semaphore};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// The live flat table of customer rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerTable {
    records: Vec<CustomerRecord>,
}

/// Positions of one customer's rows inside the table, ordered by scheduled date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockIndex {
    pub(crate) customer_name: String,
    pub(crate) rows: Vec<usize>,
}

/// Borrowed view of a customer's rows, ordered by scheduled date.
#[derive(Debug, Clone)]
pub struct CustomerBlock<'a> {
    pub customer_name: &'a str,
    pub rows: Vec<&'a CustomerRecord>,
}

impl CustomerBlock<'_> {
    pub fn is_complete_window(&self) -> bool {
        self.rows.len() == super::calendar::WINDOW_DAYS
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.rows.first().map(|row| row.scheduled_date)
    }

    pub fn last_row(&self) -> Option<&CustomerRecord> {
        self.rows.last().copied()
    }
}

impl CustomerTable {
    pub fn new(records: Vec<CustomerRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CustomerRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_customer(&self, customer_name: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.customer_name == customer_name)
    }

    /// Distinct customers in the table.
    pub fn customer_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.customer_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Blocks in first-appearance order; each block's rows sorted by date.
    pub(crate) fn block_indices(&self) -> Vec<BlockIndex> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut blocks: Vec<BlockIndex> = Vec::new();

        for (idx, record) in self.records.iter().enumerate() {
            match positions.get(record.customer_name.as_str()) {
                Some(&block) => blocks[block].rows.push(idx),
                None => {
                    positions.insert(record.customer_name.as_str(), blocks.len());
                    blocks.push(BlockIndex {
                        customer_name: record.customer_name.clone(),
                        rows: vec![idx],
                    });
                }
            }
        }

        for block in &mut blocks {
            block
                .rows
                .sort_by_key(|idx| self.records[*idx].scheduled_date);
        }

        blocks
    }

    pub fn blocks(&self) -> Vec<CustomerBlock<'_>> {
        self.block_indices()
            .into_iter()
            .map(|block| CustomerBlock {
                customer_name: self.records[block.rows[0]].customer_name.as_str(),
                rows: block.rows.iter().map(|idx| &self.records[*idx]).collect(),
            })
            .collect()
    }

    pub(crate) fn set_status(&mut self, idx: usize, status: Semaphore) {
        self.records[idx].status = status;
    }

    /// Creates the full three-row block for a new customer starting from `today`.
    pub fn insert_block(
        &mut self,
        call_center_id: &str,
        sales_agent: &str,
        customer_name: &str,
        calendar: &HolidayCalendar,
        today: NaiveDate,
    ) -> Result<Vec<CustomerRecord>, OnboardingError> {
        let call_center_id = required(call_center_id, "call_center_id")?;
        let sales_agent = required(sales_agent, "sales_agent")?;
        let customer_name = required(customer_name, "customer_name")?;

        if self.contains_customer(customer_name) {
            return Err(OnboardingError::DuplicateCustomer(customer_name.to_string()));
        }

        let rows: Vec<CustomerRecord> = calendar
            .schedule_window(today)
            .into_iter()
            .map(|day| CustomerRecord::new(call_center_id, sales_agent, customer_name, day))
            .collect();

        self.records.extend(rows.iter().cloned());
        Ok(rows)
    }

    /// Flips one product mark on the row scheduled for `today`.
    pub fn toggle_mark(
        &mut self,
        customer_name: &str,
        scheduled_date: NaiveDate,
        product: Product,
        today: NaiveDate,
    ) -> Result<bool, OnboardingError> {
        if !self.contains_customer(customer_name) {
            return Err(OnboardingError::CustomerNotFound(customer_name.to_string()));
        }

        if scheduled_date != today {
            return Err(OnboardingError::NotCurrentDay {
                customer_name: customer_name.to_string(),
                requested: scheduled_date,
                today,
            });
        }

        let record = self
            .records
            .iter_mut()
            .find(|record| {
                record.customer_name == customer_name && record.scheduled_date == scheduled_date
            })
            .ok_or_else(|| OnboardingError::RowNotFound {
                customer_name: customer_name.to_string(),
                date: scheduled_date,
            })?;

        Ok(record.product_marks.toggle(product))
    }

    /// Drops every row belonging to the named customers.
    pub fn remove_customers(&mut self, customers: &HashSet<String>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|record| !customers.contains(&record.customer_name));
        before - self.records.len()
    }

    pub fn filtered<F>(&self, predicate: F) -> CustomerTable
    where
        F: Fn(&CustomerRecord) -> bool,
    {
        CustomerTable {
            records: self
                .records
                .iter()
                .filter(|record| predicate(record))
                .cloned()
                .collect(),
        }
    }
}

/// Search filters applied to the board view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub call_center: Option<String>,
    #[serde(default)]
    pub sales_agent: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    /// Blank means "any status"; legacy labels are accepted.
    #[serde(default, deserialize_with = "status_filter")]
    pub status: Option<Semaphore>,
}

impl RecordFilter {
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        contains_ignore_case(&record.call_center_id, self.call_center.as_deref())
            && contains_ignore_case(&record.sales_agent, self.sales_agent.as_deref())
            && contains_ignore_case(&record.customer_name, self.customer.as_deref())
            && self.status.map_or(true, |status| record.status == status)
    }

    pub fn is_empty(&self) -> bool {
        blank(self.call_center.as_deref())
            && blank(self.sales_agent.as_deref())
            && blank(self.customer.as_deref())
            && self.status.is_none()
    }
}

fn status_filter<'de, D>(deserializer: D) -> Result<Option<Semaphore>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Semaphore::parse(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status '{value}'"))),
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, OnboardingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(OnboardingError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 6).expect("valid date")
    }

    #[test]
    fn insert_builds_three_business_days() {
        let mut table = CustomerTable::default();
        let rows = table
            .insert_block(" CALL-1 ", "Ana", "ACME", &HolidayCalendar::default(), monday())
            .expect("insert succeeds");

        let dates: Vec<_> = rows.iter().map(|row| row.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![
                monday(),
                monday() + chrono::Duration::days(1),
                monday() + chrono::Duration::days(2)
            ]
        );
        assert!(rows.iter().all(|row| row.call_center_id == "CALL-1"));
        assert!(rows.iter().all(|row| row.status == Semaphore::Pending));
        assert!(rows.iter().all(|row| row.product_marks.marked_count() == 0));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn insert_rejects_blank_fields_and_duplicates() {
        let calendar = HolidayCalendar::default();
        let mut table = CustomerTable::default();
        assert_eq!(
            table.insert_block("CALL-1", "  ", "ACME", &calendar, monday()),
            Err(OnboardingError::MissingField("sales_agent"))
        );
        table
            .insert_block("CALL-1", "Ana", "ACME", &calendar, monday())
            .expect("first insert");
        assert_eq!(
            table.insert_block("CALL-2", "Luis", "ACME", &calendar, monday()),
            Err(OnboardingError::DuplicateCustomer("ACME".to_string()))
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn blocks_are_sorted_by_date() {
        let day = monday();
        let table = CustomerTable::new(vec![
            CustomerRecord::new("C", "A", "BETA", day + chrono::Duration::days(2)),
            CustomerRecord::new("C", "A", "ACME", day),
            CustomerRecord::new("C", "A", "BETA", day),
            CustomerRecord::new("C", "A", "BETA", day + chrono::Duration::days(1)),
        ]);

        let blocks = table.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].customer_name, "BETA");
        assert_eq!(blocks[0].first_day(), Some(day));
        assert_eq!(
            blocks[0].last_row().map(|row| row.scheduled_date),
            Some(day + chrono::Duration::days(2))
        );
        assert!(blocks[0].is_complete_window());
        assert!(!blocks[1].is_complete_window());
        assert_eq!(table.customer_count(), 2);
    }

    #[test]
    fn filter_matches_substrings_case_insensitively() {
        let record = CustomerRecord::new("CALL-NORTH", "Ana Ruiz", "Acme Corp", monday());
        let filter = RecordFilter {
            call_center: Some("north".to_string()),
            customer: Some("ACME".to_string()),
            ..RecordFilter::default()
        };
        assert!(filter.matches(&record));

        let status_filter = RecordFilter {
            status: Some(Semaphore::Red),
            ..RecordFilter::default()
        };
        assert!(!status_filter.matches(&record));
        assert!(RecordFilter::default().is_empty());
    }
}
