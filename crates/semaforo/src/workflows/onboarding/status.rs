//! Derives each row's semaphore from its product marks and the current date.
//!
//! The derivation is total and stateless: every status is rebuilt from scratch on each pass, so
//! evaluating the same table twice yields the same result.

use super::domain::{CustomerRecord, Semaphore};
use super::table::CustomerTable;
use chrono::NaiveDate;

/// Recomputes the status of every row in `table` as of `today`.
pub fn recompute(mut table: CustomerTable, today: NaiveDate) -> CustomerTable {
    for block in table.block_indices() {
        let rows: Vec<&CustomerRecord> = block.rows.iter().map(|idx| &table.records()[*idx]).collect();
        let statuses = block_statuses(&rows, today);

        for (idx, status) in block.rows.iter().zip(statuses) {
            table.set_status(*idx, status);
        }
    }

    table
}

/// Statuses for one block whose rows are ordered by scheduled date.
pub(crate) fn block_statuses(rows: &[&CustomerRecord], today: NaiveDate) -> Vec<Semaphore> {
    let finalized = rows.iter().any(|row| row.product_marks.is_complete());

    rows.iter()
        .enumerate()
        .map(|(position, row)| {
            if !row.is_due(today) {
                Semaphore::Pending
            } else if finalized {
                Semaphore::BlueFinalized
            } else {
                positional_status(position, row)
            }
        })
        .collect()
}

fn positional_status(position: usize, row: &CustomerRecord) -> Semaphore {
    let checks = row.product_marks.marked_count();
    let crosses = row.product_marks.unmarked_count();

    match position {
        0 if checks >= 1 => Semaphore::Green,
        1 if crosses >= 1 => Semaphore::Yellow,
        2 if crosses >= 1 => Semaphore::Red,
        _ => Semaphore::Pending,
    }
}
