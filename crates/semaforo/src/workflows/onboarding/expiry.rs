use super::archive::{ArchiveBatch, ArchiveKind, ArchivePolicy};
use super::calendar::HolidayCalendar;
use super::domain::{CustomerRecord, Semaphore};
use super::table::CustomerTable;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A block removed from the live table by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgedBlock {
    pub customer_name: String,
    pub expiry_date: NaiveDate,
    pub final_status: Semaphore,
    /// `None` when the block was dropped without an archival export.
    pub archived_as: Option<ArchiveKind>,
}

/// Result of aging out a status-recomputed table.
#[derive(Debug, Clone)]
pub struct ExpirySweep {
    pub survivors: CustomerTable,
    pub purged: Vec<PurgedBlock>,
    pub batches: Vec<ArchiveBatch>,
}

/// Routes the day-3 status of an expired block to an archive kind.
pub fn route(final_status: Semaphore, policy: ArchivePolicy) -> Option<ArchiveKind> {
    match final_status {
        Semaphore::Red => Some(ArchiveKind::Closed),
        Semaphore::BlueFinalized => Some(ArchiveKind::Finalized),
        _ if policy.archive_unrouted => Some(ArchiveKind::Expired),
        _ => None,
    }
}

/// Purges every complete block whose window has elapsed as of `today`.
///
/// Blocks that do not have exactly three rows are left untouched. Each expired block contributes
/// its last row to the batch of its archive kind; batches are stamped with `generated_at`.
pub fn sweep(
    table: CustomerTable,
    calendar: &HolidayCalendar,
    today: NaiveDate,
    policy: ArchivePolicy,
    generated_at: NaiveDateTime,
) -> ExpirySweep {
    let mut expired: HashSet<String> = HashSet::new();
    let mut purged = Vec::new();
    let mut routed: BTreeMap<ArchiveKind, Vec<CustomerRecord>> = BTreeMap::new();

    for block in table.blocks() {
        if !block.is_complete_window() {
            continue;
        }
        let (Some(first_day), Some(last_row)) = (block.first_day(), block.last_row()) else {
            continue;
        };

        let expiry_date = calendar.expiry_date(first_day);
        if today < expiry_date {
            continue;
        }

        let archived_as = route(last_row.status, policy);
        if let Some(kind) = archived_as {
            routed.entry(kind).or_default().push(last_row.clone());
        }

        expired.insert(block.customer_name.to_string());
        purged.push(PurgedBlock {
            customer_name: block.customer_name.to_string(),
            expiry_date,
            final_status: last_row.status,
            archived_as,
        });
    }

    let mut survivors = table;
    survivors.remove_customers(&expired);

    let batches = routed
        .into_iter()
        .map(|(kind, rows)| ArchiveBatch {
            kind,
            generated_at,
            rows,
        })
        .collect();

    ExpirySweep {
        survivors,
        purged,
        batches,
    }
}
