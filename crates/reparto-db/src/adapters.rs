// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use reparto_app::{
    CatalogItem, DeliveryRoute, ItemId, Referrer, ReferrerId, RouteId, Visit, VisitId,
};
use reparto_grid::{CellValue, FieldWrite, RecordStore};

use crate::{NewItem, NewReferrer, NewRoute, NewVisit, Store};

/// Grid-facing view of the visits table. Drafts arrive with id 0; the
/// store assigns the rowid and both audit stamps.
pub struct VisitStore<'a> {
    store: &'a Store,
}

impl<'a> VisitStore<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl RecordStore<Visit> for VisitStore<'_> {
    fn select_all(&mut self) -> Result<Vec<Visit>> {
        self.store.list_visits()
    }

    fn insert(&mut self, draft: &Visit) -> Result<Visit> {
        let id = self.store.create_visit(&NewVisit {
            number: draft.number,
            buyer_name: draft.buyer_name.clone(),
            address: draft.address.clone(),
            kind: draft.kind,
            status: draft.status,
            visit_date: draft.visit_date,
            phone_mobile: draft.phone_mobile.clone(),
            phone_home: draft.phone_home.clone(),
            phone_work: draft.phone_work.clone(),
            route_id: draft.route_id,
            route_order: draft.route_order,
            item_ids: draft.item_ids.clone(),
            referrer_id: draft.referrer_id,
            notes: draft.notes.clone(),
        })?;
        self.store.get_visit(id)
    }

    fn update(&mut self, id: i64, patch: &[FieldWrite]) -> Result<Visit> {
        self.store.update_visit_fields(VisitId::new(id), patch)
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        self.store.delete_visit(VisitId::new(id))
    }

    fn update_where(
        &mut self,
        key: &'static str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.store.update_visits_where(key, equals, patch)
    }
}

pub struct RouteStore<'a> {
    store: &'a Store,
}

impl<'a> RouteStore<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl RecordStore<DeliveryRoute> for RouteStore<'_> {
    fn select_all(&mut self) -> Result<Vec<DeliveryRoute>> {
        self.store.list_routes()
    }

    fn insert(&mut self, draft: &DeliveryRoute) -> Result<DeliveryRoute> {
        let id = self.store.create_route(&NewRoute {
            number: draft.number,
            name: draft.name.clone(),
            driver: draft.driver.clone(),
            notes: draft.notes.clone(),
        })?;
        self.store.get_route(id)
    }

    fn update(&mut self, id: i64, patch: &[FieldWrite]) -> Result<DeliveryRoute> {
        self.store.update_route_fields(RouteId::new(id), patch)
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        self.store.delete_route(RouteId::new(id))
    }

    fn update_where(
        &mut self,
        key: &'static str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.store.update_routes_where(key, equals, patch)
    }
}

pub struct ReferrerStore<'a> {
    store: &'a Store,
}

impl<'a> ReferrerStore<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

/// The access column edits as a yes/no select; the table stores a
/// boolean.
fn normalize_referrer_patch(patch: &[FieldWrite]) -> Vec<FieldWrite> {
    patch
        .iter()
        .map(|(key, value)| match (*key, value) {
            ("access", CellValue::Text(text)) => ("access", CellValue::Bool(text == "yes")),
            _ => (*key, value.clone()),
        })
        .collect()
}

impl RecordStore<Referrer> for ReferrerStore<'_> {
    fn select_all(&mut self) -> Result<Vec<Referrer>> {
        self.store.list_referrers()
    }

    fn insert(&mut self, draft: &Referrer) -> Result<Referrer> {
        let id = self.store.create_referrer(&NewReferrer {
            number: draft.number,
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            role: draft.role,
            access_enabled: draft.access_enabled,
            notes: draft.notes.clone(),
        })?;
        self.store.get_referrer(id)
    }

    fn update(&mut self, id: i64, patch: &[FieldWrite]) -> Result<Referrer> {
        self.store
            .update_referrer_fields(ReferrerId::new(id), &normalize_referrer_patch(patch))
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        self.store.delete_referrer(ReferrerId::new(id))
    }

    fn update_where(
        &mut self,
        key: &'static str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.store
            .update_referrers_where(key, equals, &normalize_referrer_patch(patch))
    }
}

pub struct ItemStore<'a> {
    store: &'a Store,
}

impl<'a> ItemStore<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl RecordStore<CatalogItem> for ItemStore<'_> {
    fn select_all(&mut self) -> Result<Vec<CatalogItem>> {
        self.store.list_items()
    }

    fn insert(&mut self, draft: &CatalogItem) -> Result<CatalogItem> {
        let id = self.store.create_item(&NewItem {
            number: draft.number,
            name: draft.name.clone(),
            price_cents: draft.price_cents,
            notes: draft.notes.clone(),
        })?;
        self.store.get_item(id)
    }

    fn update(&mut self, id: i64, patch: &[FieldWrite]) -> Result<CatalogItem> {
        self.store.update_item_fields(ItemId::new(id), patch)
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        self.store.delete_item(ItemId::new(id))
    }

    fn update_where(
        &mut self,
        key: &'static str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.store.update_items_where(key, equals, patch)
    }
}
