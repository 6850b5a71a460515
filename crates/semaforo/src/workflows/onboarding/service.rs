use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::access::OperatorContext;
use super::archive::{ArchivePolicy, ArchiveReceipt, ExportFailure, ExportSink};
use super::calendar::HolidayCalendar;
use super::domain::{CustomerRecord, NewCustomer, OnboardingError, Product};
use super::expiry::{self, PurgedBlock};
use super::report::views::ReportDocument;
use super::report::SemaphoreReport;
use super::status::recompute;
use super::store::{RecordStore, StoreError};
use super::table::{CustomerTable, RecordFilter};

/// Outcome of one load → recompute → expire → persist → archive pass.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub table: CustomerTable,
    pub purged: Vec<PurgedBlock>,
    pub archived: Vec<ArchiveReceipt>,
    pub export_failures: Vec<ExportFailure>,
}

/// Filtered, scope-restricted board as shown to an operator.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub records: Vec<CustomerRecord>,
    pub shown_customers: usize,
    pub total_customers: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_failures: Vec<ExportFailure>,
}

/// Service composing the record store, status engine, expiry engine, and export sink.
pub struct OnboardingService<S, E> {
    store: Arc<S>,
    sink: Arc<E>,
    calendar: HolidayCalendar,
    policy: ArchivePolicy,
    rows_per_page: usize,
    transaction: Mutex<()>,
}

impl<S, E> OnboardingService<S, E>
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    pub fn new(store: Arc<S>, sink: Arc<E>, calendar: HolidayCalendar, policy: ArchivePolicy) -> Self {
        Self {
            store,
            sink,
            calendar,
            policy,
            rows_per_page: 40,
            transaction: Mutex::new(()),
        }
    }

    pub fn with_rows_per_page(mut self, rows_per_page: usize) -> Self {
        self.rows_per_page = rows_per_page.max(1);
        self
    }

    /// Runs the full evaluation transaction against the backing store.
    pub fn evaluate(&self, now: NaiveDateTime) -> Result<EvaluationOutcome, OnboardingServiceError> {
        let _guard = self.begin();
        self.evaluate_locked(now)
    }

    /// Evaluates the board and returns the rows the operator may see that match `filter`.
    pub fn board(
        &self,
        context: &OperatorContext,
        filter: &RecordFilter,
        now: NaiveDateTime,
    ) -> Result<BoardView, OnboardingServiceError> {
        let outcome = self.evaluate(now)?;
        let visible = outcome.table.filtered(|record| context.can_view(record));
        let shown = visible.filtered(|record| filter.matches(record));

        Ok(BoardView {
            shown_customers: shown.customer_count(),
            total_customers: visible.customer_count(),
            records: shown.into_records(),
            export_failures: outcome.export_failures,
        })
    }

    /// Creates the three-row block of a new customer starting today.
    pub fn insert_customer(
        &self,
        context: &OperatorContext,
        customer: NewCustomer,
        now: NaiveDateTime,
    ) -> Result<Vec<CustomerRecord>, OnboardingServiceError> {
        let today = now.date();
        let call_center_id = context.resolve_call_center(customer.call_center_id.as_deref())?;

        let _guard = self.begin();
        let mut table = CustomerTable::new(self.store.load_all()?);
        let rows = table.insert_block(
            &call_center_id,
            &customer.sales_agent,
            &customer.customer_name,
            &self.calendar,
            today,
        )?;

        let table = recompute(table, today);
        self.store.save_all(table.records())?;

        info!(
            operator = %context.operator,
            customer = %customer.customer_name.trim(),
            call_center = %call_center_id,
            first_day = %rows[0].scheduled_date,
            "customer block inserted"
        );

        let inserted = table
            .records()
            .iter()
            .filter(|record| record.customer_name == rows[0].customer_name)
            .cloned()
            .collect();
        Ok(inserted)
    }

    /// Flips one product mark on the customer's row for today.
    pub fn toggle_product(
        &self,
        context: &OperatorContext,
        customer_name: &str,
        scheduled_date: NaiveDate,
        product: Product,
        now: NaiveDateTime,
    ) -> Result<CustomerRecord, OnboardingServiceError> {
        let today = now.date();
        let _guard = self.begin();
        let mut table = CustomerTable::new(self.store.load_all()?);

        if let Some(record) = table
            .records()
            .iter()
            .find(|record| record.customer_name == customer_name)
        {
            if !context.can_view(record) {
                return Err(OnboardingError::OutOfScope(record.call_center_id.clone()).into());
            }
        }

        let marked = match table.toggle_mark(customer_name, scheduled_date, product, today) {
            Ok(marked) => marked,
            Err(err) => {
                debug!(operator = %context.operator, customer = %customer_name, %err, "toggle rejected");
                return Err(err.into());
            }
        };

        let table = recompute(table, today);
        self.store.save_all(table.records())?;

        info!(
            operator = %context.operator,
            customer = %customer_name,
            %product,
            marked,
            "product mark toggled"
        );

        table
            .records()
            .iter()
            .find(|record| {
                record.customer_name == customer_name && record.scheduled_date == scheduled_date
            })
            .cloned()
            .ok_or_else(|| {
                OnboardingError::RowNotFound {
                    customer_name: customer_name.to_string(),
                    date: scheduled_date,
                }
                .into()
            })
    }

    /// Builds the printable report for the operator's filtered board.
    pub fn report(
        &self,
        context: &OperatorContext,
        filter: &RecordFilter,
        now: NaiveDateTime,
    ) -> Result<ReportDocument, OnboardingServiceError> {
        let board = self.board(context, filter, now)?;
        let table = CustomerTable::new(board.records);
        Ok(SemaphoreReport::build(&table, filter, now).document(self.rows_per_page))
    }

    fn begin(&self) -> MutexGuard<'_, ()> {
        self.transaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn evaluate_locked(&self, now: NaiveDateTime) -> Result<EvaluationOutcome, OnboardingServiceError> {
        let today = now.date();
        let table = recompute(CustomerTable::new(self.store.load_all()?), today);
        let sweep = expiry::sweep(table, &self.calendar, today, self.policy, now);

        // Purge must be durable before any batch leaves the process.
        self.store.save_all(sweep.survivors.records())?;

        if !sweep.purged.is_empty() {
            info!(purged = sweep.purged.len(), remaining = sweep.survivors.len(), "expired blocks removed");
        }

        let mut archived = Vec::new();
        let mut export_failures = Vec::new();
        for batch in &sweep.batches {
            let label = batch.label();
            match self.sink.archive(batch) {
                Ok(location) => {
                    info!(%label, rows = batch.rows.len(), %location, "archive batch exported");
                    archived.push(ArchiveReceipt {
                        kind: batch.kind,
                        label,
                        rows: batch.rows.len(),
                        location,
                    });
                }
                Err(err) => {
                    warn!(%label, rows = batch.rows.len(), error = %err, "archive export failed; expired rows are purged regardless");
                    export_failures.push(ExportFailure {
                        kind: batch.kind,
                        label,
                        rows: batch.rows.len(),
                        error: err.to_string(),
                    });
                }
            }
        }

        for block in sweep.purged.iter().filter(|block| block.archived_as.is_none()) {
            warn!(
                customer = %block.customer_name,
                status = %block.final_status,
                "expired block purged without archival export"
            );
        }

        Ok(EvaluationOutcome {
            table: sweep.survivors,
            purged: sweep.purged,
            archived,
            export_failures,
        })
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingServiceError {
    #[error(transparent)]
    Validation(#[from] OnboardingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
