// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use reparto_app::{CatalogItem, DeliveryRoute, Referrer, Visit};
use reparto_db::{ItemStore, ReferrerStore, RouteStore, Store, VisitStore};
use reparto_grid::RecordStore;
use reparto_tui::ConsoleRuntime;

/// Hands the console one persistence adapter per grid, all backed by the
/// same SQLite store.
pub struct DbRuntime<'a> {
    visits: VisitStore<'a>,
    routes: RouteStore<'a>,
    referrers: ReferrerStore<'a>,
    items: ItemStore<'a>,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            visits: VisitStore::new(store),
            routes: RouteStore::new(store),
            referrers: ReferrerStore::new(store),
            items: ItemStore::new(store),
        }
    }
}

impl ConsoleRuntime for DbRuntime<'_> {
    fn visits(&mut self) -> &mut dyn RecordStore<Visit> {
        &mut self.visits
    }

    fn routes(&mut self) -> &mut dyn RecordStore<DeliveryRoute> {
        &mut self.routes
    }

    fn referrers(&mut self) -> &mut dyn RecordStore<Referrer> {
        &mut self.referrers
    }

    fn items(&mut self) -> &mut dyn RecordStore<CatalogItem> {
        &mut self.items
    }
}
