use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use upkeep_core::{DomainError, DomainResult, LocationId, PartId};

/// Current stock position for one part at one location.
///
/// Identity is the `(part_id, location_id)` pair; rows are created lazily the
/// first time a location receives stock for a part. Quantities are only
/// reachable through the guarded transitions below, so
/// `0 <= reserved <= on_hand` holds after every committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    part_id: PartId,
    location_id: LocationId,
    quantity_on_hand: i64,
    quantity_reserved: i64,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl StockRow {
    /// Open an empty row (lazy creation on first receipt/transfer-in).
    pub fn open(part_id: PartId, location_id: LocationId, now: DateTime<Utc>) -> Self {
        Self {
            part_id,
            location_id,
            quantity_on_hand: 0,
            quantity_reserved: 0,
            is_active: true,
            updated_at: now,
        }
    }

    /// Rebuild a row from persisted state, re-checking the quantity invariants.
    ///
    /// Storage backends use this when loading; a violation here means the
    /// backing store was mutated outside the ledger.
    pub fn restore(
        part_id: PartId,
        location_id: LocationId,
        quantity_on_hand: i64,
        quantity_reserved: i64,
        is_active: bool,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity_on_hand < 0 {
            return Err(DomainError::validation("on-hand quantity is negative"));
        }
        if quantity_reserved < 0 || quantity_reserved > quantity_on_hand {
            return Err(DomainError::validation(
                "reserved quantity outside [0, on_hand]",
            ));
        }
        Ok(Self {
            part_id,
            location_id,
            quantity_on_hand,
            quantity_reserved,
            is_active,
            updated_at,
        })
    }

    pub fn part_id(&self) -> PartId {
        self.part_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn on_hand(&self) -> i64 {
        self.quantity_on_hand
    }

    pub fn reserved(&self) -> i64 {
        self.quantity_reserved
    }

    /// On-hand minus reserved.
    pub fn available(&self) -> i64 {
        self.quantity_on_hand - self.quantity_reserved
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::invalid_operation(
                "stock row has been deactivated",
            ));
        }
        Ok(())
    }

    fn ensure_positive(quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }

    /// Add received stock.
    pub fn receive(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        Self::ensure_positive(quantity)?;
        self.quantity_on_hand = self
            .quantity_on_hand
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("on-hand quantity overflow"))?;
        self.updated_at = now;
        Ok(())
    }

    /// Remove issued stock. Reserved quantity is untouchable: issuing more
    /// than `available()` fails even if on-hand would stay non-negative.
    pub fn issue(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        Self::ensure_positive(quantity)?;
        if quantity > self.available() {
            return Err(DomainError::insufficient_stock(quantity, self.available()));
        }
        self.quantity_on_hand -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Apply a signed count correction. A downward correction is limited by
    /// the unreserved quantity, keeping both quantity invariants intact.
    pub fn adjust(&mut self, delta: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        if delta == 0 {
            return Err(DomainError::validation("adjustment delta cannot be zero"));
        }
        if delta < 0 {
            let magnitude = delta
                .checked_neg()
                .ok_or_else(|| DomainError::validation("adjustment delta out of range"))?;
            if magnitude > self.available() {
                return Err(DomainError::insufficient_stock(magnitude, self.available()));
            }
        }
        self.quantity_on_hand = self
            .quantity_on_hand
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("on-hand quantity overflow"))?;
        self.updated_at = now;
        Ok(())
    }

    /// Place a soft hold on stock.
    pub fn reserve(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        Self::ensure_positive(quantity)?;
        if quantity > self.available() {
            return Err(DomainError::insufficient_stock(quantity, self.available()));
        }
        self.quantity_reserved += quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Release a soft hold.
    pub fn unreserve(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        Self::ensure_positive(quantity)?;
        if quantity > self.quantity_reserved {
            return Err(DomainError::invalid_operation(format!(
                "cannot unreserve {quantity}, only {} reserved",
                self.quantity_reserved
            )));
        }
        self.quantity_reserved -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Debit side of a transfer. Reserved stock cannot be transferred away.
    pub fn transfer_out(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        Self::ensure_positive(quantity)?;
        if quantity > self.available() {
            return Err(DomainError::insufficient_stock(quantity, self.available()));
        }
        self.quantity_on_hand -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Credit side of a transfer.
    pub fn transfer_in(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        Self::ensure_positive(quantity)?;
        self.quantity_on_hand = self
            .quantity_on_hand
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("on-hand quantity overflow"))?;
        self.updated_at = now;
        Ok(())
    }

    /// Soft-deactivate the row. Rows are never deleted while transactions
    /// reference them; an emptied row can be taken out of circulation instead.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.quantity_on_hand != 0 || self.quantity_reserved != 0 {
            return Err(DomainError::invalid_operation(
                "cannot deactivate a row holding stock",
            ));
        }
        self.is_active = false;
        self.updated_at = now;
        Ok(())
    }
}

/// Aggregated availability for a part across locations.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub on_hand: i64,
    pub reserved: i64,
    pub available: i64,
}

impl StockLevel {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a StockRow>) -> Self {
        let mut level = StockLevel::default();
        for row in rows {
            level.on_hand += row.on_hand();
            level.reserved += row.reserved();
        }
        level.available = level.on_hand - level.reserved;
        level
    }
}
