use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use upkeep_core::{AssetId, DomainResult, LocationId, Money, PartId, UserId, WorkOrderId};

/// Record that part quantity was physically used on an asset.
///
/// The unit cost here is a snapshot taken at time of use. It deliberately
/// diverges from the catalog's current cost as prices change later; usage
/// history must keep reporting what the consumption actually cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConsumptionRecord {
    pub record_id: Uuid,
    pub asset_id: AssetId,
    pub part_id: PartId,
    pub location_id: LocationId,
    pub work_order_id: Option<WorkOrderId>,
    pub quantity: i64,
    pub unit_cost_at_use: Money,
    pub note: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl AssetConsumptionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        asset_id: AssetId,
        part_id: PartId,
        location_id: LocationId,
        work_order_id: Option<WorkOrderId>,
        quantity: i64,
        unit_cost_at_use: Money,
        note: Option<String>,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            asset_id,
            part_id,
            location_id,
            work_order_id,
            quantity,
            unit_cost_at_use,
            note,
            actor,
            occurred_at,
        }
    }

    /// Quantity times the captured unit cost.
    pub fn total_cost(&self) -> DomainResult<Money> {
        self.unit_cost_at_use.times(self.quantity)
    }
}
