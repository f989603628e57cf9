use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use upkeep_core::{DomainError, DomainResult, Money, PartId};

/// Part lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartStatus {
    Active,
    Inactive,
    Discontinued,
}

impl PartStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PartStatus::Active => "active",
            PartStatus::Inactive => "inactive",
            PartStatus::Discontinued => "discontinued",
        }
    }

    /// Parse a stored status code. Unknown values are rejected at the
    /// boundary rather than defaulted.
    pub fn from_code(code: &str) -> DomainResult<Self> {
        match code {
            "active" => Ok(PartStatus::Active),
            "inactive" => Ok(PartStatus::Inactive),
            "discontinued" => Ok(PartStatus::Discontinued),
            other => Err(DomainError::validation(format!(
                "unknown part status: {other}"
            ))),
        }
    }
}

/// Catalog entry for a spare part.
///
/// Owned by the catalog; the ledger references parts by id and reads the
/// current unit cost and reorder thresholds, never mutating them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub sku: String,
    pub name: String,
    /// Current catalog unit cost; mutations snapshot this at entry time.
    pub unit_cost: Money,
    /// Available at or below this (and above `min_stock_level`) classifies as Low.
    pub reorder_point: i64,
    /// Suggested replenishment quantity once at or below the reorder point.
    pub reorder_quantity: i64,
    /// Available at or below this (and above zero) classifies as Critical.
    pub min_stock_level: i64,
    pub max_stock_level: Option<i64>,
    pub unit_of_measure: String,
    pub status: PartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for registering a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPart {
    pub sku: String,
    pub name: String,
    pub unit_cost: Money,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
    pub min_stock_level: i64,
    pub max_stock_level: Option<i64>,
    pub unit_of_measure: String,
}

impl Part {
    /// Register a new, active part from validated input.
    pub fn register(id: PartId, input: NewPart, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if input.unit_cost.is_negative() {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }
        if input.min_stock_level < 0 || input.reorder_point < 0 || input.reorder_quantity < 0 {
            return Err(DomainError::validation(
                "stock thresholds cannot be negative",
            ));
        }
        if input.min_stock_level > input.reorder_point {
            return Err(DomainError::validation(
                "min stock level cannot exceed reorder point",
            ));
        }
        if let Some(max) = input.max_stock_level {
            if max < input.reorder_point {
                return Err(DomainError::validation(
                    "max stock level cannot be below reorder point",
                ));
            }
        }

        Ok(Self {
            id,
            sku: input.sku,
            name: input.name,
            unit_cost: input.unit_cost,
            reorder_point: input.reorder_point,
            reorder_quantity: input.reorder_quantity,
            min_stock_level: input.min_stock_level,
            max_stock_level: input.max_stock_level,
            unit_of_measure: input.unit_of_measure,
            status: PartStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the ledger accepts new stock mutations for this part.
    pub fn accepts_stock(&self) -> bool {
        self.status == PartStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewPart {
        NewPart {
            sku: "FLT-100".to_string(),
            name: "Hydraulic filter".to_string(),
            unit_cost: Money::from_minor_units(1250),
            reorder_point: 25,
            reorder_quantity: 50,
            min_stock_level: 10,
            max_stock_level: Some(120),
            unit_of_measure: "each".to_string(),
        }
    }

    #[test]
    fn register_creates_active_part() {
        let part = Part::register(PartId::new(), input(), Utc::now()).unwrap();
        assert_eq!(part.status, PartStatus::Active);
        assert!(part.accepts_stock());
    }

    #[test]
    fn register_rejects_empty_sku() {
        let mut bad = input();
        bad.sku = "   ".to_string();
        let err = Part::register(PartId::new(), bad, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn register_rejects_min_level_above_reorder_point() {
        let mut bad = input();
        bad.min_stock_level = 30;
        bad.reorder_point = 25;
        let err = Part::register(PartId::new(), bad, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn register_rejects_negative_unit_cost() {
        let mut bad = input();
        bad.unit_cost = Money::from_minor_units(-1);
        let err = Part::register(PartId::new(), bad, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn inactive_parts_do_not_accept_stock() {
        let mut part = Part::register(PartId::new(), input(), Utc::now()).unwrap();
        part.status = PartStatus::Discontinued;
        assert!(!part.accepts_stock());
    }

    #[test]
    fn status_codes_round_trip_and_reject_unknown() {
        for status in [
            PartStatus::Active,
            PartStatus::Inactive,
            PartStatus::Discontinued,
        ] {
            assert_eq!(PartStatus::from_code(status.code()).unwrap(), status);
        }
        assert!(PartStatus::from_code("retired").is_err());
    }
}
