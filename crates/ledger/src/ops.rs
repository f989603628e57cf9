//! Validated stock operations.
//!
//! These are the inputs the stock operations service accepts. `validate()`
//! checks the caller-correctable shape of a request (signs, distinct
//! locations); the quantity invariants themselves are enforced by the row
//! transitions at apply time, against the freshly read row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use upkeep_core::{AssetId, DomainError, DomainResult, LocationId, Money, PartId, UserId, WorkOrderId};

use crate::transaction::{Reference, TransactionKind};

/// Single-location mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Receive,
    Issue,
    Adjust,
}

impl AdjustmentKind {
    pub fn transaction_kind(&self) -> TransactionKind {
        match self {
            AdjustmentKind::Receive => TransactionKind::Receive,
            AdjustmentKind::Issue => TransactionKind::Issue,
            AdjustmentKind::Adjust => TransactionKind::Adjust,
        }
    }
}

/// Receive, issue, or correct stock at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub part_id: PartId,
    pub location_id: LocationId,
    pub kind: AdjustmentKind,
    /// Positive for receive/issue; signed for adjust.
    pub quantity: i64,
    pub unit_cost: Option<Money>,
    pub reference: Option<Reference>,
    pub note: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl StockAdjustment {
    pub fn validate(&self) -> DomainResult<()> {
        match self.kind {
            AdjustmentKind::Receive | AdjustmentKind::Issue => {
                if self.quantity <= 0 {
                    return Err(DomainError::validation("quantity must be positive"));
                }
            }
            AdjustmentKind::Adjust => {
                if self.quantity == 0 {
                    return Err(DomainError::validation("adjustment delta cannot be zero"));
                }
            }
        }
        if let Some(cost) = self.unit_cost {
            if cost.is_negative() {
                return Err(DomainError::validation("unit cost cannot be negative"));
            }
        }
        Ok(())
    }

    /// Signed on-hand delta this operation applies when it succeeds.
    pub fn signed_delta(&self) -> i64 {
        match self.kind {
            AdjustmentKind::Receive => self.quantity,
            AdjustmentKind::Issue => -self.quantity,
            AdjustmentKind::Adjust => self.quantity,
        }
    }
}

/// Move stock between two locations for the same part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransfer {
    pub part_id: PartId,
    pub from_location_id: LocationId,
    pub to_location_id: LocationId,
    pub quantity: i64,
    pub note: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl StockTransfer {
    pub fn validate(&self) -> DomainResult<()> {
        if self.from_location_id == self.to_location_id {
            return Err(DomainError::validation(
                "source and destination locations must differ",
            ));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }
}

/// Place or release a soft hold on stock at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation {
    pub part_id: PartId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub reference: Option<Reference>,
    pub note: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl StockReservation {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }
}

/// Use part quantity on an asset: an issue plus a historical-cost usage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConsumption {
    pub asset_id: AssetId,
    pub part_id: PartId,
    pub location_id: LocationId,
    pub quantity: i64,
    /// Overrides the catalog's current unit cost for the usage snapshot.
    pub unit_cost_override: Option<Money>,
    pub work_order_id: Option<WorkOrderId>,
    pub note: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl AssetConsumption {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if let Some(cost) = self.unit_cost_override {
            if cost.is_negative() {
                return Err(DomainError::validation("unit cost cannot be negative"));
            }
        }
        Ok(())
    }
}
