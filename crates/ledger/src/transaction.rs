use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use upkeep_core::{DomainError, DomainResult, LocationId, Money, PartId, UserId};

/// Kind of a stock transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Receive,
    Issue,
    Adjust,
    Transfer,
    Reserve,
    Unreserve,
}

impl TransactionKind {
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Receive => "stock.receive",
            TransactionKind::Issue => "stock.issue",
            TransactionKind::Adjust => "stock.adjust",
            TransactionKind::Transfer => "stock.transfer",
            TransactionKind::Reserve => "stock.reserve",
            TransactionKind::Unreserve => "stock.unreserve",
        }
    }

    /// Parse a stored kind code. Unknown values are rejected at the boundary
    /// rather than defaulted.
    pub fn from_code(code: &str) -> DomainResult<Self> {
        match code {
            "stock.receive" => Ok(TransactionKind::Receive),
            "stock.issue" => Ok(TransactionKind::Issue),
            "stock.adjust" => Ok(TransactionKind::Adjust),
            "stock.transfer" => Ok(TransactionKind::Transfer),
            "stock.reserve" => Ok(TransactionKind::Reserve),
            "stock.unreserve" => Ok(TransactionKind::Unreserve),
            other => Err(DomainError::validation(format!(
                "unknown transaction kind: {other}"
            ))),
        }
    }
}

/// Kind of business event a transaction can point back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    WorkOrder,
    AssetConsumption,
    PurchaseOrder,
    ManualCount,
}

impl ReferenceKind {
    pub fn code(&self) -> &'static str {
        match self {
            ReferenceKind::WorkOrder => "work_order",
            ReferenceKind::AssetConsumption => "asset_consumption",
            ReferenceKind::PurchaseOrder => "purchase_order",
            ReferenceKind::ManualCount => "manual_count",
        }
    }

    pub fn from_code(code: &str) -> DomainResult<Self> {
        match code {
            "work_order" => Ok(ReferenceKind::WorkOrder),
            "asset_consumption" => Ok(ReferenceKind::AssetConsumption),
            "purchase_order" => Ok(ReferenceKind::PurchaseOrder),
            "manual_count" => Ok(ReferenceKind::ManualCount),
            other => Err(DomainError::validation(format!(
                "unknown reference kind: {other}"
            ))),
        }
    }
}

/// Pointer to the business event that caused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub id: Uuid,
}

/// One immutable entry in the append-only stock transaction log.
///
/// Entries are never updated or deleted once committed; they are the audit
/// trail from which current ledger state is reconstructible. `quantity` is
/// the signed delta as applied; for transfers it is the (positive) moved
/// magnitude with both location ids set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub entry_id: Uuid,
    pub part_id: PartId,
    pub source_location_id: Option<LocationId>,
    pub destination_location_id: Option<LocationId>,
    pub kind: TransactionKind,
    pub quantity: i64,
    /// Unit cost captured at entry time (catalog cost or explicit override).
    pub unit_cost: Option<Money>,
    pub reference: Option<Reference>,
    pub note: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionEntry {
    /// Entry for a single-location movement (receive/issue/adjust/reserve/unreserve).
    #[allow(clippy::too_many_arguments)]
    pub fn movement(
        part_id: PartId,
        location_id: LocationId,
        kind: TransactionKind,
        signed_quantity: i64,
        unit_cost: Option<Money>,
        reference: Option<Reference>,
        note: Option<String>,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id: Uuid::now_v7(),
            part_id,
            source_location_id: Some(location_id),
            destination_location_id: None,
            kind,
            quantity: signed_quantity,
            unit_cost,
            reference,
            note,
            actor,
            occurred_at,
        }
    }

    /// Single entry for a paired debit/credit transfer between two locations.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        part_id: PartId,
        from_location_id: LocationId,
        to_location_id: LocationId,
        quantity: i64,
        note: Option<String>,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id: Uuid::now_v7(),
            part_id,
            source_location_id: Some(from_location_id),
            destination_location_id: Some(to_location_id),
            kind: TransactionKind::Transfer,
            quantity,
            unit_cost: None,
            reference: None,
            note,
            actor,
            occurred_at,
        }
    }

    /// Signed effect of this entry on one location's on-hand count.
    ///
    /// Replaying this over a part's full log from zero reproduces the current
    /// on-hand for that (part, location). Reserve/unreserve entries exist for
    /// audit only and contribute nothing here.
    pub fn on_hand_delta(&self, location_id: LocationId) -> i64 {
        match self.kind {
            TransactionKind::Transfer => {
                if self.source_location_id == Some(location_id) {
                    -self.quantity
                } else if self.destination_location_id == Some(location_id) {
                    self.quantity
                } else {
                    0
                }
            }
            TransactionKind::Reserve | TransactionKind::Unreserve => 0,
            TransactionKind::Receive | TransactionKind::Issue | TransactionKind::Adjust => {
                if self.source_location_id == Some(location_id) {
                    self.quantity
                } else {
                    0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> UserId {
        UserId::new()
    }

    #[test]
    fn kind_codes_round_trip_and_reject_unknown() {
        for kind in [
            TransactionKind::Receive,
            TransactionKind::Issue,
            TransactionKind::Adjust,
            TransactionKind::Transfer,
            TransactionKind::Reserve,
            TransactionKind::Unreserve,
        ] {
            assert_eq!(TransactionKind::from_code(kind.code()).unwrap(), kind);
        }
        assert!(TransactionKind::from_code("stock.shrinkage").is_err());
    }

    #[test]
    fn reference_kind_codes_round_trip() {
        for kind in [
            ReferenceKind::WorkOrder,
            ReferenceKind::AssetConsumption,
            ReferenceKind::PurchaseOrder,
            ReferenceKind::ManualCount,
        ] {
            assert_eq!(ReferenceKind::from_code(kind.code()).unwrap(), kind);
        }
        assert!(ReferenceKind::from_code("invoice").is_err());
    }

    #[test]
    fn transfer_entry_affects_both_sides() {
        let part = PartId::new();
        let from = LocationId::new();
        let to = LocationId::new();
        let elsewhere = LocationId::new();

        let entry = TransactionEntry::transfer(part, from, to, 20, None, actor(), Utc::now());

        assert_eq!(entry.kind, TransactionKind::Transfer);
        assert_eq!(entry.on_hand_delta(from), -20);
        assert_eq!(entry.on_hand_delta(to), 20);
        assert_eq!(entry.on_hand_delta(elsewhere), 0);
    }

    #[test]
    fn reserve_entries_do_not_move_on_hand() {
        let part = PartId::new();
        let location = LocationId::new();

        let entry = TransactionEntry::movement(
            part,
            location,
            TransactionKind::Reserve,
            30,
            None,
            None,
            None,
            actor(),
            Utc::now(),
        );

        assert_eq!(entry.on_hand_delta(location), 0);
    }

    #[test]
    fn issue_entry_carries_negative_delta() {
        let part = PartId::new();
        let location = LocationId::new();

        let entry = TransactionEntry::movement(
            part,
            location,
            TransactionKind::Issue,
            -5,
            Some(Money::from_minor_units(1250)),
            None,
            None,
            actor(),
            Utc::now(),
        );

        assert_eq!(entry.on_hand_delta(location), -5);
        assert_eq!(entry.on_hand_delta(LocationId::new()), 0);
    }
}
