//! Reorder policy evaluation.
//!
//! Pure classification over a part's aggregated availability; consumed by
//! dashboards and the low-stock report. No side effects, no persistence.

use serde::{Deserialize, Serialize};

/// How urgently a part needs replenishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderStatus {
    OutOfStock,
    Critical,
    Low,
    Ok,
}

impl ReorderStatus {
    pub fn code(&self) -> &'static str {
        match self {
            ReorderStatus::OutOfStock => "out_of_stock",
            ReorderStatus::Critical => "critical",
            ReorderStatus::Low => "low",
            ReorderStatus::Ok => "ok",
        }
    }

    /// Whether this status should appear on the low-stock report.
    pub fn needs_attention(&self) -> bool {
        !matches!(self, ReorderStatus::Ok)
    }
}

/// A part's replenishment thresholds, lifted off the catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderPolicy {
    pub min_stock_level: i64,
    pub reorder_point: i64,
}

impl ReorderPolicy {
    pub fn new(min_stock_level: i64, reorder_point: i64) -> Self {
        Self {
            min_stock_level,
            reorder_point,
        }
    }

    /// Classify an aggregated available quantity.
    pub fn classify(&self, available: i64) -> ReorderStatus {
        if available <= 0 {
            ReorderStatus::OutOfStock
        } else if available <= self.min_stock_level {
            ReorderStatus::Critical
        } else if available <= self.reorder_point {
            ReorderStatus::Low
        } else {
            ReorderStatus::Ok
        }
    }
}
