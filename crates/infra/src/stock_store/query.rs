//! Transaction log query interface.
//!
//! Read-only filtering and paging over the append-only stock transaction log.
//! Reporting collaborators (stock-movement report, dashboards) consume this
//! and must treat results as read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use upkeep_core::{LocationId, PartId};
use upkeep_ledger::{TransactionEntry, TransactionKind};

/// Pagination parameters for transaction queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of entries to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// Filter criteria for transaction queries.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Filter by part (optional).
    pub part_id: Option<PartId>,
    /// Filter by transaction kind (optional).
    pub kind: Option<TransactionKind>,
    /// Filter by location; matches either side of a transfer (optional).
    pub location_id: Option<LocationId>,
    /// Entries that occurred at or after this time (optional).
    pub occurred_after: Option<DateTime<Utc>>,
    /// Entries that occurred at or before this time (optional).
    pub occurred_before: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn for_part(part_id: PartId) -> Self {
        Self {
            part_id: Some(part_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &TransactionEntry) -> bool {
        if let Some(part_id) = self.part_id {
            if entry.part_id != part_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if entry.kind != kind {
                return false;
            }
        }
        if let Some(location_id) = self.location_id {
            let touches = entry.source_location_id == Some(location_id)
                || entry.destination_location_id == Some(location_id);
            if !touches {
                return false;
            }
        }
        if let Some(after) = self.occurred_after {
            if entry.occurred_at < after {
                return false;
            }
        }
        if let Some(before) = self.occurred_before {
            if entry.occurred_at > before {
                return false;
            }
        }
        true
    }
}

/// Paginated transaction query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    /// The entries matching the query, newest first.
    pub entries: Vec<TransactionEntry>,
    /// Total number of entries matching the filter (across all pages).
    pub total: u64,
    /// Pagination parameters used.
    pub pagination: Pagination,
    /// Whether there are more entries available.
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use upkeep_core::UserId;

    #[test]
    fn pagination_caps_limit() {
        let pagination = Pagination::new(Some(5000), None);
        assert_eq!(pagination.limit, 1000);
        assert_eq!(pagination.offset, 0);
    }

    #[test]
    fn location_filter_matches_either_transfer_side() {
        let part = PartId::new();
        let from = LocationId::new();
        let to = LocationId::new();
        let entry =
            TransactionEntry::transfer(part, from, to, 5, None, UserId::new(), Utc::now());

        let by_source = TransactionFilter {
            location_id: Some(from),
            ..Default::default()
        };
        let by_destination = TransactionFilter {
            location_id: Some(to),
            ..Default::default()
        };
        let by_other = TransactionFilter {
            location_id: Some(LocationId::new()),
            ..Default::default()
        };

        assert!(by_source.matches(&entry));
        assert!(by_destination.matches(&entry));
        assert!(!by_other.matches(&entry));
    }
}
