// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use reparto_app::{
    ItemId, ReferrerRole, RouteId, VisitId, VisitKind, VisitStatus, visit_schema,
};
use reparto_db::{
    NewItem, NewReferrer, NewRoute, NewVisit, ReferrerStore, Store, VisitStore, validate_db_path,
};
use reparto_grid::{
    CellValue, EditSession, GridController, Notifier, RecordStore, ReorderOutcome,
};
use time::{Date, Month};

fn new_route(number: i64, name: &str) -> NewRoute {
    NewRoute {
        number,
        name: name.to_owned(),
        driver: "Avery".to_owned(),
        notes: String::new(),
    }
}

fn new_visit(number: i64, buyer: &str, route_id: Option<RouteId>, order: Option<i64>) -> NewVisit {
    NewVisit {
        number,
        buyer_name: buyer.to_owned(),
        address: format!("{number} Cedar St"),
        kind: VisitKind::Delivery,
        status: VisitStatus::Pending,
        visit_date: None,
        phone_mobile: String::new(),
        phone_home: String::new(),
        phone_work: String::new(),
        route_id,
        route_order: order,
        item_ids: Vec::new(),
        referrer_id: None,
        notes: String::new(),
    }
}

fn new_referrer(number: i64, name: &str, role: ReferrerRole) -> NewReferrer {
    NewReferrer {
        number,
        name: name.to_owned(),
        phone: String::new(),
        role,
        access_enabled: false,
        notes: String::new(),
    }
}

#[derive(Debug, Default)]
struct CollectingNotifier {
    messages: Vec<String>,
}

impl Notifier for CollectingNotifier {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("/tmp/reparto.db").is_ok());
}

#[test]
fn bootstrap_creates_schema() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    // Idempotent on a fresh run.
    store.bootstrap()?;

    assert!(store.list_visits()?.is_empty());
    assert!(store.list_routes()?.is_empty());
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.raw_connection().execute_batch(
        "
        ALTER TABLE visits RENAME TO visits_old;
        CREATE TABLE visits (
          id INTEGER PRIMARY KEY,
          number INTEGER NOT NULL,
          buyer_name TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        DROP TABLE visits_old;
        ",
    )?;

    let error = store.bootstrap().expect_err("schema verification fails");
    let message = error.to_string();
    assert!(message.contains("table `visits` is missing required columns"));
    assert!(message.contains("route_order"));
    Ok(())
}

#[test]
fn open_respects_memory_path() -> Result<()> {
    let store = Store::open(std::path::Path::new(":memory:"))?;
    store.bootstrap()?;
    Ok(())
}

#[test]
fn visit_listing_orders_by_route_then_order_then_buyer() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let north = store.create_route(&new_route(1, "North Loop"))?;
    let harbor = store.create_route(&new_route(2, "Harbor"))?;

    store.create_visit(&new_visit(1, "Walker", None, None))?;
    store.create_visit(&new_visit(2, "Evans", Some(harbor), Some(2)))?;
    store.create_visit(&new_visit(3, "Diaz", Some(harbor), Some(1)))?;
    store.create_visit(&new_visit(4, "Brooks", Some(north), Some(1)))?;
    store.create_visit(&new_visit(5, "Adams", None, None))?;

    let visits = store.list_visits()?;
    let buyers: Vec<&str> = visits.iter().map(|visit| visit.buyer_name.as_str()).collect();
    assert_eq!(buyers, vec!["Brooks", "Diaz", "Evans", "Adams", "Walker"]);
    Ok(())
}

#[test]
fn field_patch_updates_one_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let id = store.create_visit(&new_visit(1, "Walker", None, None))?;
    let updated = store.update_visit_fields(
        id,
        &[("status", CellValue::Text("completed".to_owned()))],
    )?;
    assert_eq!(updated.status, VisitStatus::Completed);
    assert_eq!(updated.buyer_name, "Walker");
    Ok(())
}

#[test]
fn field_patch_rejects_unknown_keys() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let id = store.create_visit(&new_visit(1, "Walker", None, None))?;
    let error = store
        .update_visit_fields(id, &[("shoe_size", CellValue::Integer(44))])
        .expect_err("unknown key");
    assert!(error.to_string().contains("no column for key"));
    Ok(())
}

#[test]
fn field_patch_on_missing_row_fails() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let error = store
        .update_visit_fields(
            VisitId::new(99),
            &[("status", CellValue::Text("completed".to_owned()))],
        )
        .expect_err("missing row");
    assert!(error.to_string().contains("not found"));
    Ok(())
}

#[test]
fn visit_date_and_item_ids_round_trip() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let mut draft = new_visit(1, "Walker", None, None);
    draft.visit_date = Some(Date::from_calendar_date(2026, Month::June, 2)?);
    draft.item_ids = vec![ItemId::new(4), ItemId::new(9)];
    let id = store.create_visit(&draft)?;

    let stored = store.get_visit(id)?;
    assert_eq!(stored.visit_date, draft.visit_date);
    assert_eq!(stored.item_ids, draft.item_ids);

    let cleared = store.update_visit_fields(
        id,
        &[
            ("date", CellValue::Null),
            ("items", CellValue::IdList(vec![7])),
        ],
    )?;
    assert_eq!(cleared.visit_date, None);
    assert_eq!(cleared.item_ids, vec![ItemId::new(7)]);
    Ok(())
}

#[test]
fn assigning_a_missing_route_violates_foreign_keys() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let id = store.create_visit(&new_visit(1, "Walker", None, None))?;
    let result = store.update_visit_fields(id, &[("route", CellValue::Integer(99))]);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn delete_removes_the_row() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let id = store.create_visit(&new_visit(1, "Walker", None, None))?;
    store.delete_visit(id)?;
    assert!(store.list_visits()?.is_empty());
    assert!(store.delete_visit(id).is_err());
    Ok(())
}

#[test]
fn duplicate_route_names_are_rejected() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.create_route(&new_route(1, "North Loop"))?;
    assert!(store.create_route(&new_route(2, "North Loop")).is_err());
    Ok(())
}

#[test]
fn bulk_update_is_scoped_to_the_matching_rows() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.create_referrer(&new_referrer(1, "Ana", ReferrerRole::Ref))?;
    store.create_referrer(&new_referrer(2, "Bram", ReferrerRole::Ref))?;
    store.create_referrer(&new_referrer(3, "Cleo", ReferrerRole::Ref))?;
    store.create_referrer(&new_referrer(4, "Drew", ReferrerRole::Admin))?;

    let written = store.update_referrers_where(
        "role",
        &CellValue::Text("ref".to_owned()),
        &[("access", CellValue::Bool(true))],
    )?;
    assert_eq!(written, 3);

    let referrers = store.list_referrers()?;
    let enabled = referrers.iter().filter(|r| r.access_enabled).count();
    assert_eq!(enabled, 3);
    let admin = referrers
        .iter()
        .find(|r| r.role == ReferrerRole::Admin)
        .expect("admin row");
    assert!(!admin.access_enabled);
    Ok(())
}

#[test]
fn referrer_access_select_edit_stores_a_boolean() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let id = store.create_referrer(&new_referrer(1, "Ana", ReferrerRole::Ref))?;
    let mut adapter = ReferrerStore::new(&store);
    let updated = adapter.update(id.get(), &[("access", CellValue::Text("yes".to_owned()))])?;
    assert!(updated.access_enabled);

    let updated = adapter.update(id.get(), &[("access", CellValue::Text("no".to_owned()))])?;
    assert!(!updated.access_enabled);
    Ok(())
}

#[test]
fn export_json_includes_all_entities() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.create_route(&new_route(1, "North Loop"))?;
    store.create_item(&NewItem {
        number: 1,
        name: "Bookshelf".to_owned(),
        price_cents: Some(45_000),
        notes: String::new(),
    })?;
    store.create_visit(&new_visit(1, "Walker", None, None))?;

    let export = store.export_json()?;
    assert!(export.contains("North Loop"));
    assert!(export.contains("Bookshelf"));
    assert!(export.contains("Walker"));
    Ok(())
}

#[test]
fn grid_reorder_persists_through_the_adapter() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let route = store.create_route(&new_route(1, "North Loop"))?;
    let a = store.create_visit(&new_visit(1, "A", Some(route), Some(1)))?;
    let b = store.create_visit(&new_visit(2, "B", Some(route), Some(2)))?;
    let c = store.create_visit(&new_visit(3, "C", Some(route), Some(3)))?;

    let mut adapter = VisitStore::new(&store);
    let mut controller = GridController::new(visit_schema())?;
    controller.refresh(&mut adapter)?;
    let mut notifier = CollectingNotifier::default();

    let outcome = controller.reorder(&mut adapter, &mut notifier, c.get(), a.get());
    assert_eq!(
        outcome,
        ReorderOutcome::Applied {
            written: 3,
            failures: 0
        }
    );

    assert_eq!(store.get_visit(c)?.route_order, Some(1));
    assert_eq!(store.get_visit(a)?.route_order, Some(2));
    assert_eq!(store.get_visit(b)?.route_order, Some(3));
    assert!(notifier.messages.is_empty());
    Ok(())
}

#[test]
fn grid_partition_edit_moves_a_visit_between_routes() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let north = store.create_route(&new_route(1, "North Loop"))?;
    let harbor = store.create_route(&new_route(2, "Harbor"))?;
    let moved = store.create_visit(&new_visit(1, "Walker", Some(north), Some(1)))?;
    store.create_visit(&new_visit(2, "Evans", Some(harbor), Some(1)))?;

    let mut adapter = VisitStore::new(&store);
    let mut controller = GridController::new(visit_schema())?;
    controller.refresh(&mut adapter)?;
    let mut session = EditSession::default();
    let mut notifier = CollectingNotifier::default();

    assert!(controller.begin_edit(&mut session, moved.get(), "route"));
    session.replace_buffer(harbor.get().to_string());
    assert!(controller.commit_edit(&mut session, &mut adapter, &mut notifier));

    let stored = store.get_visit(moved)?;
    assert_eq!(stored.route_id, Some(harbor));
    assert_eq!(stored.route_order, Some(2));

    // And back out of any route: both fields null in one write.
    assert!(controller.begin_edit(&mut session, moved.get(), "route"));
    session.replace_buffer(String::new());
    assert!(controller.commit_edit(&mut session, &mut adapter, &mut notifier));
    let stored = store.get_visit(moved)?;
    assert_eq!(stored.route_id, None);
    assert_eq!(stored.route_order, None);
    Ok(())
}

#[test]
fn grid_toggle_all_flips_only_ref_rows() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.create_referrer(&new_referrer(1, "Ana", ReferrerRole::Ref))?;
    store.create_referrer(&new_referrer(2, "Bram", ReferrerRole::Ref))?;
    store.create_referrer(&new_referrer(3, "Cleo", ReferrerRole::Ref))?;
    store.create_referrer(&new_referrer(4, "Drew", ReferrerRole::Admin))?;

    let mut adapter = ReferrerStore::new(&store);
    let mut controller = GridController::new(reparto_app::referrer_schema())?;
    controller.refresh(&mut adapter)?;
    let mut notifier = CollectingNotifier::default();

    let patched = controller.toggle_all(
        &mut adapter,
        &mut notifier,
        "role",
        &CellValue::Text("ref".to_owned()),
        &[("access", CellValue::Bool(true))],
    );
    assert_eq!(patched, 3);

    let enabled = store
        .list_referrers()?
        .iter()
        .filter(|r| r.access_enabled)
        .count();
    assert_eq!(enabled, 3);
    Ok(())
}

#[test]
fn adapter_insert_assigns_ids_and_stamps() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let mut adapter = VisitStore::new(&store);
    let draft = {
        let visits = adapter.select_all()?;
        assert!(visits.is_empty());
        reparto_app::Visit {
            id: VisitId::new(0),
            number: 1,
            buyer_name: "Walker".to_owned(),
            address: String::new(),
            kind: VisitKind::Delivery,
            status: VisitStatus::Pending,
            visit_date: None,
            phone_mobile: String::new(),
            phone_home: String::new(),
            phone_work: String::new(),
            route_id: None,
            route_order: None,
            item_ids: Vec::new(),
            referrer_id: None,
            notes: String::new(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            updated_at: time::OffsetDateTime::UNIX_EPOCH,
        }
    };
    let stored = adapter.insert(&draft)?;
    assert!(stored.id.get() > 0);
    assert!(stored.created_at > time::OffsetDateTime::UNIX_EPOCH);
    Ok(())
}
