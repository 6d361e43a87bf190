// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use reparto_grid::{
    CellValue, ColumnKind, ColumnSpec, FilterCategory, FilterRule, FilterSpec, GridRecord,
    GridSchema, RecordStore,
};

use crate::{
    CatalogItem, DeliveryRoute, ItemId, Referrer, ReferrerId, ReferrerRole, RouteId, Visit,
    VisitKind, VisitStatus,
};

const VISIT_KIND_OPTIONS: &[&str] = &["delivery", "pickup", "follow-up"];
const VISIT_STATUS_OPTIONS: &[&str] = &["pending", "scheduled", "completed", "canceled"];
const REFERRER_ROLE_OPTIONS: &[&str] = &["ref", "admin"];
const ACCESS_OPTIONS: &[&str] = &["yes", "no"];

impl GridRecord for Visit {
    fn id(&self) -> i64 {
        self.id.get()
    }

    fn label(&self) -> String {
        self.buyer_name.clone()
    }

    fn value(&self, key: &str) -> CellValue {
        match key {
            "number" => CellValue::Integer(self.number),
            "buyer" => CellValue::Text(self.buyer_name.clone()),
            "address" => CellValue::Text(self.address.clone()),
            "kind" => CellValue::Text(self.kind.as_str().to_owned()),
            "status" => CellValue::Text(self.status.as_str().to_owned()),
            "date" => self.visit_date.map_or(CellValue::Null, CellValue::Date),
            "phones" => CellValue::Text(joined_phones(self, " / ")),
            "phone_mobile" => CellValue::Text(self.phone_mobile.clone()),
            "phone_home" => CellValue::Text(self.phone_home.clone()),
            "phone_work" => CellValue::Text(self.phone_work.clone()),
            "route" => self
                .route_id
                .map_or(CellValue::Null, |route| CellValue::Integer(route.get())),
            "order" => self.route_order.map_or(CellValue::Null, CellValue::Integer),
            "items" => CellValue::IdList(self.item_ids.iter().map(|item| item.get()).collect()),
            "referrer" => self
                .referrer_id
                .map_or(CellValue::Null, |referrer| {
                    CellValue::Integer(referrer.get())
                }),
            "notes" => CellValue::Text(self.notes.clone()),
            _ => CellValue::Null,
        }
    }

    fn apply(&mut self, key: &str, value: &CellValue) -> Result<()> {
        match (key, value) {
            ("buyer", CellValue::Text(text)) => self.buyer_name = text.clone(),
            ("address", CellValue::Text(text)) => self.address = text.clone(),
            ("kind", CellValue::Text(text)) => match VisitKind::parse(text) {
                Some(kind) => self.kind = kind,
                None => bail!("unknown visit kind {text:?}"),
            },
            ("status", CellValue::Text(text)) => match VisitStatus::parse(text) {
                Some(status) => self.status = status,
                None => bail!("unknown visit status {text:?}"),
            },
            ("date", CellValue::Date(day)) => self.visit_date = Some(*day),
            ("date", CellValue::Null) => self.visit_date = None,
            ("phone_mobile", CellValue::Text(text)) => self.phone_mobile = text.clone(),
            ("phone_home", CellValue::Text(text)) => self.phone_home = text.clone(),
            ("phone_work", CellValue::Text(text)) => self.phone_work = text.clone(),
            ("route", CellValue::Integer(route)) => self.route_id = Some(RouteId::new(*route)),
            ("route", CellValue::Null) => self.route_id = None,
            ("order", CellValue::Integer(order)) => self.route_order = Some(*order),
            ("order", CellValue::Null) => self.route_order = None,
            ("items", CellValue::IdList(ids)) => {
                self.item_ids = ids.iter().copied().map(ItemId::new).collect();
            }
            ("referrer", CellValue::Integer(referrer)) => {
                self.referrer_id = Some(ReferrerId::new(*referrer));
            }
            ("referrer", CellValue::Null) => self.referrer_id = None,
            ("notes", CellValue::Text(text)) => self.notes = text.clone(),
            _ => bail!("visit has no field {key:?} for {value:?}"),
        }
        Ok(())
    }

    fn partition(&self) -> Option<i64> {
        self.route_id.map(RouteId::get)
    }

    fn order(&self) -> Option<i64> {
        self.route_order
    }
}

fn joined_phones(visit: &Visit, separator: &str) -> String {
    [
        visit.phone_mobile.as_str(),
        visit.phone_home.as_str(),
        visit.phone_work.as_str(),
    ]
    .iter()
    .filter(|phone| !phone.is_empty())
    .copied()
    .collect::<Vec<&str>>()
    .join(separator)
}

/// Seeds the phone cell with one line per underlying phone field, blanks
/// preserved so each line keeps its meaning.
fn seed_visit_phones(visit: &Visit) -> String {
    [
        visit.phone_mobile.as_str(),
        visit.phone_home.as_str(),
        visit.phone_work.as_str(),
    ]
    .join("\n")
}

/// Splits the confirmed buffer back into the three phone columns and
/// persists them in one write.
fn commit_visit_phones(
    store: &mut dyn RecordStore<Visit>,
    visit: &Visit,
    buffer: &str,
) -> Result<Visit> {
    let mut lines = buffer.lines();
    let mobile = lines.next().unwrap_or("").trim().to_owned();
    let home = lines.next().unwrap_or("").trim().to_owned();
    let work = lines.next().unwrap_or("").trim().to_owned();
    store.update(
        GridRecord::id(visit),
        &[
            ("phone_mobile", CellValue::Text(mobile)),
            ("phone_home", CellValue::Text(home)),
            ("phone_work", CellValue::Text(work)),
        ],
    )
}

fn seed_visit_items(visit: &Visit) -> String {
    visit
        .item_ids
        .iter()
        .map(|item| item.get().to_string())
        .collect::<Vec<String>>()
        .join(",")
}

fn commit_visit_items(
    store: &mut dyn RecordStore<Visit>,
    visit: &Visit,
    buffer: &str,
) -> Result<Visit> {
    let mut ids = Vec::new();
    for token in buffer.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => bail!("items expects comma-separated item ids, got {token:?}"),
        }
    }
    store.update(GridRecord::id(visit), &[("items", CellValue::IdList(ids))])
}

fn visit_missing_phone(visit: &Visit) -> bool {
    visit.phone_mobile.is_empty() && visit.phone_home.is_empty() && visit.phone_work.is_empty()
}

fn visit_with_items(visit: &Visit) -> bool {
    !visit.item_ids.is_empty()
}

fn visit_kind_filter(kind: VisitKind) -> FilterSpec<Visit> {
    let rule: fn(&Visit) -> bool = match kind {
        VisitKind::Delivery => |visit: &Visit| visit.kind == VisitKind::Delivery,
        VisitKind::Pickup => |visit: &Visit| visit.kind == VisitKind::Pickup,
        VisitKind::FollowUp => |visit: &Visit| visit.kind == VisitKind::FollowUp,
    };
    FilterSpec {
        key: format!("kind-{}", kind.as_str()),
        label: kind.as_str().to_owned(),
        category: FilterCategory::Kind,
        rule: FilterRule::Predicate(rule),
    }
}

fn visit_status_filter(status: VisitStatus) -> FilterSpec<Visit> {
    let rule: fn(&Visit) -> bool = match status {
        VisitStatus::Pending => |visit: &Visit| visit.status == VisitStatus::Pending,
        VisitStatus::Scheduled => |visit: &Visit| visit.status == VisitStatus::Scheduled,
        VisitStatus::Completed => |visit: &Visit| visit.status == VisitStatus::Completed,
        VisitStatus::Canceled => |visit: &Visit| visit.status == VisitStatus::Canceled,
    };
    FilterSpec {
        key: format!("status-{}", status.as_str()),
        label: status.as_str().to_owned(),
        category: FilterCategory::Status,
        rule: FilterRule::Predicate(rule),
    }
}

pub fn visit_schema() -> GridSchema<Visit> {
    let mut filters: Vec<FilterSpec<Visit>> = Vec::new();
    filters.extend(VisitKind::ALL.into_iter().map(visit_kind_filter));
    filters.extend(VisitStatus::ALL.into_iter().map(visit_status_filter));
    filters.push(FilterSpec {
        key: "missing-phone".to_owned(),
        label: "missing phone".to_owned(),
        category: FilterCategory::Regular,
        rule: FilterRule::Predicate(visit_missing_phone),
    });
    filters.push(FilterSpec {
        key: "with-items".to_owned(),
        label: "with items".to_owned(),
        category: FilterCategory::Regular,
        rule: FilterRule::Predicate(visit_with_items),
    });

    let mut schema = GridSchema::new(
        "visits",
        vec![
            ColumnSpec::plain("number", "no.", false, ColumnKind::Number),
            ColumnSpec::plain("buyer", "buyer", true, ColumnKind::Text),
            ColumnSpec::plain("address", "address", true, ColumnKind::Text),
            ColumnSpec {
                options: VISIT_KIND_OPTIONS,
                ..ColumnSpec::plain("kind", "kind", true, ColumnKind::Select)
            },
            ColumnSpec {
                options: VISIT_STATUS_OPTIONS,
                ..ColumnSpec::plain("status", "status", true, ColumnKind::Select)
            },
            ColumnSpec::plain("date", "date", true, ColumnKind::Date),
            ColumnSpec {
                seed: Some(seed_visit_phones),
                commit: Some(commit_visit_phones),
                ..ColumnSpec::plain("phones", "phones", true, ColumnKind::Custom)
            },
            ColumnSpec::plain("route", "route", true, ColumnKind::Number),
            ColumnSpec::plain("order", "order", false, ColumnKind::Number),
            ColumnSpec {
                seed: Some(seed_visit_items),
                commit: Some(commit_visit_items),
                ..ColumnSpec::plain("items", "items", true, ColumnKind::Custom)
            },
            ColumnSpec::plain("referrer", "referrer", true, ColumnKind::Number),
            ColumnSpec::plain("notes", "notes", true, ColumnKind::Text),
        ],
        filters,
    );
    schema.date_column = Some("date");
    schema.partition_column = Some("route");
    schema.order_column = Some("order");
    schema
}

/// Route filters follow the route list: one per route plus the
/// unassigned bucket. Rebuilt whenever routes change.
pub fn visit_route_filters(routes: &[DeliveryRoute]) -> Vec<FilterSpec<Visit>> {
    let mut filters = vec![FilterSpec {
        key: "no-route".to_owned(),
        label: "no route".to_owned(),
        category: FilterCategory::Route,
        rule: FilterRule::PartitionMissing,
    }];
    filters.extend(routes.iter().map(|route| FilterSpec {
        key: format!("route-{}", route.id.get()),
        label: route.name.clone(),
        category: FilterCategory::Route,
        rule: FilterRule::PartitionEquals(route.id.get()),
    }));
    filters
}

impl GridRecord for Referrer {
    fn id(&self) -> i64 {
        self.id.get()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn value(&self, key: &str) -> CellValue {
        match key {
            "number" => CellValue::Integer(self.number),
            "name" => CellValue::Text(self.name.clone()),
            "phone" => CellValue::Text(self.phone.clone()),
            "role" => CellValue::Text(self.role.as_str().to_owned()),
            "access" => CellValue::Bool(self.access_enabled),
            "notes" => CellValue::Text(self.notes.clone()),
            _ => CellValue::Null,
        }
    }

    fn apply(&mut self, key: &str, value: &CellValue) -> Result<()> {
        match (key, value) {
            ("name", CellValue::Text(text)) => self.name = text.clone(),
            ("phone", CellValue::Text(text)) => self.phone = text.clone(),
            ("role", CellValue::Text(text)) => match ReferrerRole::parse(text) {
                Some(role) => self.role = role,
                None => bail!("unknown referrer role {text:?}"),
            },
            ("access", CellValue::Bool(enabled)) => self.access_enabled = *enabled,
            ("access", CellValue::Text(text)) => match text.as_str() {
                "yes" => self.access_enabled = true,
                "no" => self.access_enabled = false,
                _ => bail!("access expects yes or no, got {text:?}"),
            },
            ("notes", CellValue::Text(text)) => self.notes = text.clone(),
            _ => bail!("referrer has no field {key:?} for {value:?}"),
        }
        Ok(())
    }
}

fn referrer_role_filter(role: ReferrerRole) -> FilterSpec<Referrer> {
    let rule: fn(&Referrer) -> bool = match role {
        ReferrerRole::Ref => |referrer: &Referrer| referrer.role == ReferrerRole::Ref,
        ReferrerRole::Admin => |referrer: &Referrer| referrer.role == ReferrerRole::Admin,
    };
    FilterSpec {
        key: format!("role-{}", role.as_str()),
        label: role.as_str().to_owned(),
        category: FilterCategory::Kind,
        rule: FilterRule::Predicate(rule),
    }
}

fn referrer_access_on(referrer: &Referrer) -> bool {
    referrer.access_enabled
}

fn referrer_access_off(referrer: &Referrer) -> bool {
    !referrer.access_enabled
}

pub fn referrer_schema() -> GridSchema<Referrer> {
    let mut filters: Vec<FilterSpec<Referrer>> = ReferrerRole::ALL
        .into_iter()
        .map(referrer_role_filter)
        .collect();
    filters.push(FilterSpec {
        key: "access-on".to_owned(),
        label: "access on".to_owned(),
        category: FilterCategory::Regular,
        rule: FilterRule::Predicate(referrer_access_on),
    });
    filters.push(FilterSpec {
        key: "access-off".to_owned(),
        label: "access off".to_owned(),
        category: FilterCategory::Regular,
        rule: FilterRule::Predicate(referrer_access_off),
    });

    GridSchema::new(
        "referrers",
        vec![
            ColumnSpec::plain("number", "no.", false, ColumnKind::Number),
            ColumnSpec::plain("name", "name", true, ColumnKind::Text),
            ColumnSpec::plain("phone", "phone", true, ColumnKind::Text),
            ColumnSpec {
                options: REFERRER_ROLE_OPTIONS,
                ..ColumnSpec::plain("role", "role", true, ColumnKind::Select)
            },
            ColumnSpec {
                options: ACCESS_OPTIONS,
                ..ColumnSpec::plain("access", "access", true, ColumnKind::Select)
            },
            ColumnSpec::plain("notes", "notes", true, ColumnKind::Text),
        ],
        filters,
    )
}

impl GridRecord for DeliveryRoute {
    fn id(&self) -> i64 {
        self.id.get()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn value(&self, key: &str) -> CellValue {
        match key {
            "number" => CellValue::Integer(self.number),
            "name" => CellValue::Text(self.name.clone()),
            "driver" => CellValue::Text(self.driver.clone()),
            "notes" => CellValue::Text(self.notes.clone()),
            _ => CellValue::Null,
        }
    }

    fn apply(&mut self, key: &str, value: &CellValue) -> Result<()> {
        match (key, value) {
            ("name", CellValue::Text(text)) => self.name = text.clone(),
            ("driver", CellValue::Text(text)) => self.driver = text.clone(),
            ("notes", CellValue::Text(text)) => self.notes = text.clone(),
            _ => bail!("route has no field {key:?} for {value:?}"),
        }
        Ok(())
    }
}

pub fn route_schema() -> GridSchema<DeliveryRoute> {
    GridSchema::new(
        "routes",
        vec![
            ColumnSpec::plain("number", "no.", false, ColumnKind::Number),
            ColumnSpec::plain("name", "name", true, ColumnKind::Text),
            ColumnSpec::plain("driver", "driver", true, ColumnKind::Text),
            ColumnSpec::plain("notes", "notes", true, ColumnKind::Text),
        ],
        Vec::new(),
    )
}

impl GridRecord for CatalogItem {
    fn id(&self) -> i64 {
        self.id.get()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn value(&self, key: &str) -> CellValue {
        match key {
            "number" => CellValue::Integer(self.number),
            "name" => CellValue::Text(self.name.clone()),
            "price" => self.price_cents.map_or(CellValue::Null, CellValue::Money),
            "notes" => CellValue::Text(self.notes.clone()),
            _ => CellValue::Null,
        }
    }

    fn apply(&mut self, key: &str, value: &CellValue) -> Result<()> {
        match (key, value) {
            ("name", CellValue::Text(text)) => self.name = text.clone(),
            ("price", CellValue::Money(cents)) => self.price_cents = Some(*cents),
            ("price", CellValue::Null) => self.price_cents = None,
            ("notes", CellValue::Text(text)) => self.notes = text.clone(),
            _ => bail!("item has no field {key:?} for {value:?}"),
        }
        Ok(())
    }
}

pub fn item_schema() -> GridSchema<CatalogItem> {
    GridSchema::new(
        "items",
        vec![
            ColumnSpec::plain("number", "no.", false, ColumnKind::Number),
            ColumnSpec::plain("name", "name", true, ColumnKind::Text),
            ColumnSpec::plain("price", "price", true, ColumnKind::Money),
            ColumnSpec::plain("notes", "notes", true, ColumnKind::Text),
        ],
        Vec::new(),
    )
}
