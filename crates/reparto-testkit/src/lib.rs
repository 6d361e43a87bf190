// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use reparto_app::{ItemId, ReferrerId, ReferrerRole, VisitKind, VisitStatus};
use reparto_db::{NewItem, NewReferrer, NewRoute, NewVisit, Store};
use time::{Date, Duration, Month};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];

const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const STREET_NAMES: [&str; 14] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Sunset", "Ridge",
    "Valley", "Lakeview", "Hillcrest", "Meadow",
];

const ROUTE_NAMES: [&str; 10] = [
    "North Loop",
    "Harbor",
    "Old Town",
    "Riverside",
    "Foothills",
    "Market District",
    "Sunset Hills",
    "Depot Row",
    "East Gate",
    "Orchard",
];

const ITEM_NAMES: [&str; 12] = [
    "Bookshelf",
    "Standing Desk",
    "Mattress",
    "Sofa",
    "Dining Table",
    "Wardrobe",
    "Crib",
    "Recliner",
    "Bed Frame",
    "Dresser",
    "Nightstand",
    "Office Chair",
];

/// Fixture dates anchor here so generated data never depends on the
/// clock.
fn reference_day() -> Date {
    Date::from_calendar_date(2026, Month::June, 1).expect("valid reference date")
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, out_of: u64) -> bool {
        self.next_u64() % out_of == 0
    }
}

/// Deterministic generator of plausible delivery-console fixtures.
#[derive(Debug, Clone)]
pub struct DeliveryFaker {
    rng: DeterministicRng,
}

impl DeliveryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }

    fn phone(&mut self) -> String {
        format!("555-{:04}", self.rng.int_n(10_000))
    }

    fn person_name(&mut self) -> String {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        format!("{first} {last}")
    }

    pub fn route(&mut self, number: i64) -> NewRoute {
        let name = ROUTE_NAMES[(number as usize - 1) % ROUTE_NAMES.len()];
        NewRoute {
            number,
            name: name.to_owned(),
            driver: self.person_name(),
            notes: String::new(),
        }
    }

    pub fn referrer(&mut self, number: i64) -> NewReferrer {
        let role = if self.rng.chance(4) {
            ReferrerRole::Admin
        } else {
            ReferrerRole::Ref
        };
        NewReferrer {
            number,
            name: self.person_name(),
            phone: self.phone(),
            role,
            access_enabled: role == ReferrerRole::Admin,
            notes: String::new(),
        }
    }

    pub fn item(&mut self, number: i64) -> NewItem {
        let name = ITEM_NAMES[(number as usize - 1) % ITEM_NAMES.len()];
        NewItem {
            number,
            name: name.to_owned(),
            price_cents: Some(((self.rng.int_n(190) + 10) * 500) as i64),
            notes: String::new(),
        }
    }

    /// A visit with plausible contact data, a random item basket and a
    /// date near the reference day. Route assignment and the matching
    /// order are the caller's job since orders are per-partition.
    pub fn visit(
        &mut self,
        number: i64,
        items: &[ItemId],
        referrers: &[ReferrerId],
    ) -> NewVisit {
        let status = match self.rng.int_n(4) {
            0 => VisitStatus::Completed,
            1 => VisitStatus::Scheduled,
            2 => VisitStatus::Canceled,
            _ => VisitStatus::Pending,
        };
        let kind = match self.rng.int_n(6) {
            0 => VisitKind::Pickup,
            1 => VisitKind::FollowUp,
            _ => VisitKind::Delivery,
        };
        let visit_date = if self.rng.chance(5) {
            None
        } else {
            Some(reference_day() + Duration::days(self.rng.int_n(60) as i64 - 30))
        };

        let mut item_ids = Vec::new();
        if !items.is_empty() {
            for _ in 0..self.rng.int_n(3) {
                item_ids.push(items[self.rng.int_n(items.len())]);
            }
            item_ids.dedup();
        }

        NewVisit {
            number,
            buyer_name: self.person_name(),
            address: {
                let house = self.rng.int_n(9_900) + 100;
                let street = self.pick(&STREET_NAMES);
                format!("{house} {street} St")
            },
            kind,
            status,
            visit_date,
            phone_mobile: self.phone(),
            phone_home: if self.rng.chance(2) {
                self.phone()
            } else {
                String::new()
            },
            phone_work: String::new(),
            route_id: None,
            route_order: None,
            item_ids,
            referrer_id: if referrers.is_empty() || self.rng.chance(3) {
                None
            } else {
                Some(referrers[self.rng.int_n(referrers.len())])
            },
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoCounts {
    pub routes: usize,
    pub referrers: usize,
    pub items: usize,
    pub visits: usize,
}

impl Default for DemoCounts {
    fn default() -> Self {
        Self {
            routes: 4,
            referrers: 6,
            items: 10,
            visits: 24,
        }
    }
}

/// Fill a bootstrapped store with deterministic demo data. Roughly two
/// thirds of the visits land on a route, with contiguous per-route
/// orders.
pub fn seed_demo(store: &Store, seed: u64, counts: &DemoCounts) -> Result<()> {
    let mut faker = DeliveryFaker::new(seed);

    let mut routes = Vec::new();
    for number in 1..=counts.routes {
        routes.push(store.create_route(&faker.route(number as i64))?);
    }
    let mut referrers = Vec::new();
    for number in 1..=counts.referrers {
        referrers.push(store.create_referrer(&faker.referrer(number as i64))?);
    }
    let mut items = Vec::new();
    for number in 1..=counts.items {
        items.push(store.create_item(&faker.item(number as i64))?);
    }

    let mut next_order: Vec<i64> = vec![1; routes.len()];
    for number in 1..=counts.visits {
        let mut visit = faker.visit(number as i64, &items, &referrers);
        if !routes.is_empty() && !faker.rng.chance(3) {
            let slot = faker.rng.int_n(routes.len());
            visit.route_id = Some(routes[slot]);
            visit.route_order = Some(next_order[slot]);
            next_order[slot] += 1;
        }
        store.create_visit(&visit)?;
    }
    Ok(())
}

/// Convenience used by `--demo`: an in-memory store with the default
/// fixture volume.
pub fn demo_store(seed: u64) -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    seed_demo(&store, seed, &DemoCounts::default())?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::{DeliveryFaker, DemoCounts, demo_store, seed_demo};
    use anyhow::Result;
    use reparto_db::Store;
    use std::collections::BTreeMap;

    #[test]
    fn faker_is_deterministic_for_a_fixed_seed() {
        let mut left = DeliveryFaker::new(11);
        let mut right = DeliveryFaker::new(11);
        for number in 1..=5 {
            assert_eq!(left.referrer(number), right.referrer(number));
            assert_eq!(left.visit(number, &[], &[]), right.visit(number, &[], &[]));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut left = DeliveryFaker::new(11);
        let mut right = DeliveryFaker::new(12);
        let same = (1..=8).all(|n| left.visit(n, &[], &[]) == right.visit(n, &[], &[]));
        assert!(!same);
    }

    #[test]
    fn seed_demo_populates_every_table() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        seed_demo(&store, 7, &DemoCounts::default())?;

        assert_eq!(store.list_routes()?.len(), 4);
        assert_eq!(store.list_referrers()?.len(), 6);
        assert_eq!(store.list_items()?.len(), 10);
        assert_eq!(store.list_visits()?.len(), 24);
        Ok(())
    }

    #[test]
    fn seeded_route_orders_are_contiguous_per_route() -> Result<()> {
        let store = demo_store(3)?;

        let mut orders: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for visit in store.list_visits()? {
            if let (Some(route), Some(order)) = (visit.route_id, visit.route_order) {
                orders.entry(route.get()).or_default().push(order);
            }
        }
        assert!(!orders.is_empty());
        for (_route, mut route_orders) in orders {
            route_orders.sort_unstable();
            let expected: Vec<i64> = (1..=route_orders.len() as i64).collect();
            assert_eq!(route_orders, expected);
        }
        Ok(())
    }
}
