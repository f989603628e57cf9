//! Integration tests for the full stock operations pipeline.
//!
//! Operation → StockService → lookup collaborators → InMemoryStockStore →
//! transaction log.

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;

use upkeep_catalog::{AssetRegistry, LocationDirectory, NewPart, Part, PartCatalog, PartStatus};
use upkeep_core::{AssetId, DomainError, LocationId, Money, PartId, UserId};
use upkeep_ledger::{
    AdjustmentKind, AssetConsumption, ReorderStatus, StockAdjustment, StockReservation,
    StockTransfer, TransactionKind,
};

use crate::lookups::{InMemoryAssetRegistry, InMemoryLocationDirectory, InMemoryPartCatalog};
use crate::stock_service::{ServiceError, StockService};
use crate::stock_store::{InMemoryStockStore, Pagination, StockStore, TransactionFilter};

struct Fixture {
    service: StockService<Arc<InMemoryStockStore>>,
    store: Arc<InMemoryStockStore>,
    catalog: Arc<InMemoryPartCatalog>,
    part_id: PartId,
    l1: LocationId,
    l2: LocationId,
    asset: AssetId,
    actor: UserId,
}

fn test_part(part_id: PartId) -> Part {
    Part::register(
        part_id,
        NewPart {
            sku: "FLT-100".to_string(),
            name: "Hydraulic filter".to_string(),
            unit_cost: Money::from_minor_units(1250),
            reorder_point: 25,
            reorder_quantity: 50,
            min_stock_level: 10,
            max_stock_level: Some(200),
            unit_of_measure: "each".to_string(),
        },
        Utc::now(),
    )
    .unwrap()
}

fn setup() -> Fixture {
    let store = Arc::new(InMemoryStockStore::new());
    let catalog = Arc::new(InMemoryPartCatalog::new());
    let locations = Arc::new(InMemoryLocationDirectory::new());
    let assets = Arc::new(InMemoryAssetRegistry::new());

    let part_id = PartId::new();
    catalog.upsert(test_part(part_id)).unwrap();

    let l1 = LocationId::new();
    let l2 = LocationId::new();
    locations.register(l1).unwrap();
    locations.register(l2).unwrap();

    let asset = AssetId::new();
    assets.register(asset).unwrap();

    let catalog_dyn: Arc<dyn PartCatalog> = catalog.clone();
    let locations_dyn: Arc<dyn LocationDirectory> = locations;
    let assets_dyn: Arc<dyn AssetRegistry> = assets;
    let service = StockService::new(store.clone(), catalog_dyn, locations_dyn, assets_dyn);

    Fixture {
        service,
        store,
        catalog,
        part_id,
        l1,
        l2,
        asset,
        actor: UserId::new(),
    }
}

fn adjustment(
    fx: &Fixture,
    location_id: LocationId,
    kind: AdjustmentKind,
    quantity: i64,
) -> StockAdjustment {
    StockAdjustment {
        part_id: fx.part_id,
        location_id,
        kind,
        quantity,
        unit_cost: None,
        reference: None,
        note: None,
        actor: fx.actor,
        occurred_at: Utc::now(),
    }
}

fn reservation(fx: &Fixture, location_id: LocationId, quantity: i64) -> StockReservation {
    StockReservation {
        part_id: fx.part_id,
        location_id,
        quantity,
        reference: None,
        note: None,
        actor: fx.actor,
        occurred_at: Utc::now(),
    }
}

fn transfer(fx: &Fixture, quantity: i64) -> StockTransfer {
    StockTransfer {
        part_id: fx.part_id,
        from_location_id: fx.l1,
        to_location_id: fx.l2,
        quantity,
        note: None,
        actor: fx.actor,
        occurred_at: Utc::now(),
    }
}

fn consumption(fx: &Fixture, quantity: i64, override_cost: Option<Money>) -> AssetConsumption {
    AssetConsumption {
        asset_id: fx.asset,
        part_id: fx.part_id,
        location_id: fx.l1,
        quantity,
        unit_cost_override: override_cost,
        work_order_id: None,
        note: None,
        actor: fx.actor,
        occurred_at: Utc::now(),
    }
}

#[tokio::test]
async fn reserve_then_issue_exhausts_availability() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 100))
        .await
        .unwrap();

    let row = fx.service.reserve(reservation(&fx, fx.l1, 30)).await.unwrap();
    assert_eq!(row.on_hand(), 100);
    assert_eq!(row.reserved(), 30);
    assert_eq!(row.available(), 70);

    let row = fx
        .service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Issue, 70))
        .await
        .unwrap();
    assert_eq!(row.on_hand(), 30);
    assert_eq!(row.reserved(), 30);
    assert_eq!(row.available(), 0);

    let err = fx
        .service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Issue, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InsufficientStock {
            requested: 1,
            available: 0
        })
    ));
}

#[tokio::test]
async fn reserve_unreserve_round_trip_restores_reserved() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 50))
        .await
        .unwrap();
    fx.service.reserve(reservation(&fx, fx.l1, 20)).await.unwrap();
    let row = fx
        .service
        .unreserve(reservation(&fx, fx.l1, 20))
        .await
        .unwrap();

    assert_eq!(row.reserved(), 0);
    assert_eq!(row.on_hand(), 50);
}

#[tokio::test]
async fn transfer_conserves_total_and_writes_one_entry() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 30))
        .await
        .unwrap();

    let outcome = fx.service.transfer(transfer(&fx, 20)).await.unwrap();
    assert_eq!(outcome.from_row.on_hand(), 10);
    assert_eq!(outcome.to_row.on_hand(), 20);

    let level = fx.store.aggregate(fx.part_id).await.unwrap();
    assert_eq!(level.on_hand, 30);

    let page = fx
        .service
        .list_transactions(
            TransactionFilter {
                part_id: Some(fx.part_id),
                kind: Some(TransactionKind::Transfer),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    let entry = &page.entries[0];
    assert_eq!(entry.source_location_id, Some(fx.l1));
    assert_eq!(entry.destination_location_id, Some(fx.l2));
    assert_eq!(entry.quantity, 20);
}

#[tokio::test]
async fn failed_transfer_leaves_both_rows_untouched() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 10))
        .await
        .unwrap();
    fx.service.reserve(reservation(&fx, fx.l1, 5)).await.unwrap();

    // Reserved stock cannot be transferred away: available is 5.
    let err = fx.service.transfer(transfer(&fx, 7)).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InsufficientStock {
            requested: 7,
            available: 5
        })
    ));

    let from = fx.store.get_row(fx.part_id, fx.l1).await.unwrap().unwrap();
    assert_eq!(from.on_hand(), 10);
    assert_eq!(from.reserved(), 5);
    assert!(fx.store.get_row(fx.part_id, fx.l2).await.unwrap().is_none());

    let page = fx
        .service
        .list_transactions(
            TransactionFilter {
                part_id: Some(fx.part_id),
                kind: Some(TransactionKind::Transfer),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn consumption_snapshots_catalog_cost() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 20))
        .await
        .unwrap();

    let record = fx
        .service
        .use_part_on_asset(consumption(&fx, 5, None))
        .await
        .unwrap();

    assert_eq!(record.unit_cost_at_use, Money::from_minor_units(1250));
    assert_eq!(record.total_cost().unwrap(), Money::from_minor_units(6250));
    assert_eq!(record.asset_id, fx.asset);

    let row = fx.store.get_row(fx.part_id, fx.l1).await.unwrap().unwrap();
    assert_eq!(row.on_hand(), 15);

    // The paired issue entry carries the snapshot cost and the asset reference.
    let page = fx
        .service
        .list_transactions(
            TransactionFilter {
                part_id: Some(fx.part_id),
                kind: Some(TransactionKind::Issue),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let entry = &page.entries[0];
    assert_eq!(entry.quantity, -5);
    assert_eq!(entry.unit_cost, Some(Money::from_minor_units(1250)));
    let reference = entry.reference.unwrap();
    assert_eq!(reference.id, *fx.asset.as_uuid());

    // A later catalog price change must not rewrite the usage snapshot.
    let mut repriced = test_part(fx.part_id);
    repriced.unit_cost = Money::from_minor_units(9900);
    fx.catalog.upsert(repriced).unwrap();

    let records = fx.store.consumptions().unwrap();
    assert_eq!(records[0].unit_cost_at_use, Money::from_minor_units(1250));
}

#[tokio::test]
async fn consumption_honors_cost_override() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 10))
        .await
        .unwrap();

    let record = fx
        .service
        .use_part_on_asset(consumption(&fx, 2, Some(Money::from_minor_units(800))))
        .await
        .unwrap();

    assert_eq!(record.unit_cost_at_use, Money::from_minor_units(800));
    assert_eq!(record.total_cost().unwrap(), Money::from_minor_units(1600));
}

#[tokio::test]
async fn failed_consumption_writes_nothing() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 3))
        .await
        .unwrap();

    let err = fx
        .service
        .use_part_on_asset(consumption(&fx, 4, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InsufficientStock { .. })
    ));

    let row = fx.store.get_row(fx.part_id, fx.l1).await.unwrap().unwrap();
    assert_eq!(row.on_hand(), 3);
    assert!(fx.store.consumptions().unwrap().is_empty());

    let page = fx
        .service
        .list_transactions(
            TransactionFilter {
                part_id: Some(fx.part_id),
                kind: Some(TransactionKind::Issue),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn adjustment_snapshots_catalog_cost_when_omitted() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 4))
        .await
        .unwrap();

    let page = fx
        .service
        .list_transactions(TransactionFilter::for_part(fx.part_id), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.entries[0].unit_cost, Some(Money::from_minor_units(1250)));
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let fx = setup();

    let mut unknown_part = adjustment(&fx, fx.l1, AdjustmentKind::Receive, 5);
    unknown_part.part_id = PartId::new();
    let err = fx.service.adjust(unknown_part).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::NotFound("part"))
    ));

    let mut unknown_location = adjustment(&fx, fx.l1, AdjustmentKind::Receive, 5);
    unknown_location.location_id = LocationId::new();
    let err = fx.service.adjust(unknown_location).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::NotFound("location"))
    ));

    let mut unknown_asset = consumption(&fx, 1, None);
    unknown_asset.asset_id = AssetId::new();
    let err = fx.service.use_part_on_asset(unknown_asset).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::NotFound("asset"))
    ));
}

#[tokio::test]
async fn discontinued_parts_reject_mutations() {
    let fx = setup();

    let mut discontinued = test_part(fx.part_id);
    discontinued.status = PartStatus::Discontinued;
    fx.catalog.upsert(discontinued).unwrap();

    let err = fx
        .service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn transfer_to_same_location_is_a_validation_error() {
    let fx = setup();

    let mut op = transfer(&fx, 5);
    op.to_location_id = op.from_location_id;
    let err = fx.service.transfer(op).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn unreserving_more_than_reserved_is_invalid() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 10))
        .await
        .unwrap();
    fx.service.reserve(reservation(&fx, fx.l1, 4)).await.unwrap();

    let err = fx
        .service
        .unreserve(reservation(&fx, fx.l1, 5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn low_stock_report_lists_everything_below_ok() {
    let fx = setup();

    // FLT-100 ends up Critical: 8 available against min level 10.
    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 8))
        .await
        .unwrap();

    // A healthy part stays off the report.
    let healthy_id = PartId::new();
    let mut healthy = test_part(healthy_id);
    healthy.sku = "BRG-200".to_string();
    fx.catalog.upsert(healthy).unwrap();
    let mut stock_up = adjustment(&fx, fx.l1, AdjustmentKind::Receive, 100);
    stock_up.part_id = healthy_id;
    fx.service.adjust(stock_up).await.unwrap();

    // A part with no stock at all is out of stock.
    let empty_id = PartId::new();
    let mut empty = test_part(empty_id);
    empty.sku = "SEA-300".to_string();
    fx.catalog.upsert(empty).unwrap();

    let report = fx.service.low_stock_report().await.unwrap();
    assert_eq!(report.len(), 2);

    // Most urgent first.
    assert_eq!(report[0].part.id, empty_id);
    assert_eq!(report[0].status, ReorderStatus::OutOfStock);
    assert_eq!(report[1].part.id, fx.part_id);
    assert_eq!(report[1].status, ReorderStatus::Critical);
    assert_eq!(report[1].level.available, 8);
    assert_eq!(report[1].valuation, Money::from_minor_units(8 * 1250));
}

#[tokio::test]
async fn part_stock_status_aggregates_across_locations() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 30))
        .await
        .unwrap();
    fx.service
        .adjust(adjustment(&fx, fx.l2, AdjustmentKind::Receive, 20))
        .await
        .unwrap();
    fx.service.reserve(reservation(&fx, fx.l2, 10)).await.unwrap();

    let status = fx.service.part_stock_status(fx.part_id).await.unwrap();
    assert_eq!(status.level.on_hand, 50);
    assert_eq!(status.level.reserved, 10);
    assert_eq!(status.level.available, 40);
    assert_eq!(status.status, ReorderStatus::Ok);
    assert_eq!(status.valuation, Money::from_minor_units(50 * 1250));
}

#[tokio::test]
async fn valuation_covers_only_parts_holding_stock() {
    let fx = setup();

    // Second catalog part that never receives stock.
    let idle_id = PartId::new();
    let mut idle = test_part(idle_id);
    idle.sku = "BRG-200".to_string();
    fx.catalog.upsert(idle).unwrap();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 12))
        .await
        .unwrap();

    let report = fx.service.inventory_valuation().await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].part.id, fx.part_id);
    assert_eq!(report[0].valuation, Money::from_minor_units(12 * 1250));
}

#[tokio::test]
async fn transactions_are_filtered_and_paginated() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 10))
        .await
        .unwrap();
    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 20))
        .await
        .unwrap();
    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Issue, 5))
        .await
        .unwrap();
    fx.service.reserve(reservation(&fx, fx.l1, 3)).await.unwrap();

    let receives = fx
        .service
        .list_transactions(
            TransactionFilter {
                part_id: Some(fx.part_id),
                kind: Some(TransactionKind::Receive),
                ..Default::default()
            },
            Pagination::new(Some(1), None),
        )
        .await
        .unwrap();
    assert_eq!(receives.total, 2);
    assert_eq!(receives.entries.len(), 1);
    assert!(receives.has_more);

    let second_page = fx
        .service
        .list_transactions(
            TransactionFilter {
                part_id: Some(fx.part_id),
                kind: Some(TransactionKind::Receive),
                ..Default::default()
            },
            Pagination::new(Some(1), Some(1)),
        )
        .await
        .unwrap();
    assert_eq!(second_page.entries.len(), 1);
    assert!(!second_page.has_more);
    assert_ne!(receives.entries[0].entry_id, second_page.entries[0].entry_id);

    let everything = fx
        .service
        .list_transactions(TransactionFilter::for_part(fx.part_id), Pagination::default())
        .await
        .unwrap();
    assert_eq!(everything.total, 4);
}

#[tokio::test]
async fn emptied_rows_can_be_deactivated_but_holding_rows_cannot() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 5))
        .await
        .unwrap();

    let err = fx
        .service
        .deactivate_row(fx.part_id, fx.l1, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidOperation(_))
    ));

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Issue, 5))
        .await
        .unwrap();
    let row = fx
        .service
        .deactivate_row(fx.part_id, fx.l1, Utc::now())
        .await
        .unwrap();
    assert!(!row.is_active());

    let err = fx
        .service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn replaying_a_fixed_log_reproduces_on_hand() {
    let fx = setup();

    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Receive, 100))
        .await
        .unwrap();
    fx.service.reserve(reservation(&fx, fx.l1, 30)).await.unwrap();
    fx.service
        .adjust(adjustment(&fx, fx.l1, AdjustmentKind::Issue, 25))
        .await
        .unwrap();
    fx.service.transfer(transfer(&fx, 40)).await.unwrap();
    fx.service
        .unreserve(reservation(&fx, fx.l1, 10))
        .await
        .unwrap();
    fx.service
        .adjust(adjustment(&fx, fx.l2, AdjustmentKind::Adjust, -3))
        .await
        .unwrap();

    let page = fx
        .service
        .list_transactions(
            TransactionFilter::for_part(fx.part_id),
            Pagination::new(Some(1000), None),
        )
        .await
        .unwrap();

    for location in [fx.l1, fx.l2] {
        let replayed: i64 = page
            .entries
            .iter()
            .map(|entry| entry.on_hand_delta(location))
            .sum();
        let on_hand = fx
            .store
            .get_row(fx.part_id, location)
            .await
            .unwrap()
            .map(|row| row.on_hand())
            .unwrap_or(0);
        assert_eq!(replayed, on_hand);
    }
}

fn store_op(
    part_id: PartId,
    location_id: LocationId,
    kind: AdjustmentKind,
    quantity: i64,
    actor: UserId,
) -> StockAdjustment {
    StockAdjustment {
        part_id,
        location_id,
        kind,
        quantity,
        unit_cost: None,
        reference: None,
        note: None,
        actor,
        occurred_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: after any sequence of operations, replaying the log's signed
    /// deltas from zero reproduces each location's on-hand count.
    #[test]
    fn replaying_random_logs_reproduces_on_hand(
        ops in prop::collection::vec((0u8..6, 1i64..50), 1..40)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let results = rt.block_on(async {
            let store = InMemoryStockStore::new();
            let part_id = PartId::new();
            let l1 = LocationId::new();
            let l2 = LocationId::new();
            let actor = UserId::new();

            for (op, qty) in ops {
                let _ = match op {
                    0 => store
                        .apply_adjustment(&store_op(part_id, l1, AdjustmentKind::Receive, qty, actor))
                        .await
                        .map(|_| ()),
                    1 => store
                        .apply_adjustment(&store_op(part_id, l1, AdjustmentKind::Issue, qty, actor))
                        .await
                        .map(|_| ()),
                    2 => store
                        .apply_adjustment(&store_op(part_id, l1, AdjustmentKind::Adjust, -qty, actor))
                        .await
                        .map(|_| ()),
                    3 => store
                        .apply_reserve(&StockReservation {
                            part_id,
                            location_id: l1,
                            quantity: qty,
                            reference: None,
                            note: None,
                            actor,
                            occurred_at: Utc::now(),
                        })
                        .await
                        .map(|_| ()),
                    4 => store
                        .apply_unreserve(&StockReservation {
                            part_id,
                            location_id: l1,
                            quantity: qty,
                            reference: None,
                            note: None,
                            actor,
                            occurred_at: Utc::now(),
                        })
                        .await
                        .map(|_| ()),
                    _ => store
                        .apply_transfer(&StockTransfer {
                            part_id,
                            from_location_id: l1,
                            to_location_id: l2,
                            quantity: qty,
                            note: None,
                            actor,
                            occurred_at: Utc::now(),
                        })
                        .await
                        .map(|_| ()),
                };
            }

            let page = store
                .query_transactions(
                    TransactionFilter::for_part(part_id),
                    Pagination::new(Some(1000), None),
                )
                .await
                .unwrap();

            let mut results = Vec::new();
            for location in [l1, l2] {
                let replayed: i64 = page
                    .entries
                    .iter()
                    .map(|entry| entry.on_hand_delta(location))
                    .sum();
                let on_hand = store
                    .get_row(part_id, location)
                    .await
                    .unwrap()
                    .map(|row| row.on_hand())
                    .unwrap_or(0);
                results.push((replayed, on_hand));
            }
            results
        });

        for (replayed, on_hand) in results {
            prop_assert_eq!(replayed, on_hand);
            prop_assert!(on_hand >= 0);
        }
    }
}
