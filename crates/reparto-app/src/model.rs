// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitKind {
    Delivery,
    Pickup,
    FollowUp,
}

impl VisitKind {
    pub const ALL: [Self; 3] = [Self::Delivery, Self::Pickup, Self::FollowUp];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
            Self::FollowUp => "follow-up",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "delivery" => Some(Self::Delivery),
            "pickup" => Some(Self::Pickup),
            "follow-up" => Some(Self::FollowUp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitStatus {
    Pending,
    Scheduled,
    Completed,
    Canceled,
}

impl VisitStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Scheduled,
        Self::Completed,
        Self::Canceled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferrerRole {
    Ref,
    Admin,
}

impl ReferrerRole {
    pub const ALL: [Self; 2] = [Self::Ref, Self::Admin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ref => "ref",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ref" => Some(Self::Ref),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Visits,
    Routes,
    Referrers,
    Items,
}

impl TabKind {
    pub const ALL: [Self; 4] = [Self::Visits, Self::Routes, Self::Referrers, Self::Items];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Visits => "visits",
            Self::Routes => "routes",
            Self::Referrers => "referrers",
            Self::Items => "items",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Visit,
    Route,
    Referrer,
    Item,
}

impl FormKind {
    pub const fn for_tab(tab: TabKind) -> Self {
        match tab {
            TabKind::Visits => Self::Visit,
            TabKind::Routes => Self::Route,
            TabKind::Referrers => Self::Referrer,
            TabKind::Items => Self::Item,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Edit,
    Search,
    Confirm,
    Move,
    Form(FormKind),
}

/// A delivery stop: the order-bearing record. `route_id` is the
/// partition; `route_order` is meaningful only while assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub number: i64,
    pub buyer_name: String,
    pub address: String,
    pub kind: VisitKind,
    pub status: VisitStatus,
    pub visit_date: Option<Date>,
    pub phone_mobile: String,
    pub phone_home: String,
    pub phone_work: String,
    pub route_id: Option<RouteId>,
    pub route_order: Option<i64>,
    pub item_ids: Vec<ItemId>,
    pub referrer_id: Option<ReferrerId>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    pub id: ReferrerId,
    pub number: i64,
    pub name: String,
    pub phone: String,
    pub role: ReferrerRole,
    pub access_enabled: bool,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRoute {
    pub id: RouteId,
    pub number: i64,
    pub name: String,
    pub driver: String,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub number: i64,
    pub name: String,
    pub price_cents: Option<i64>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::{ReferrerRole, VisitKind, VisitStatus};

    #[test]
    fn visit_status_round_trips_through_storage_form() {
        for status in VisitStatus::ALL {
            assert_eq!(VisitStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VisitStatus::parse("done"), None);
    }

    #[test]
    fn visit_kind_round_trips_through_storage_form() {
        for kind in VisitKind::ALL {
            assert_eq!(VisitKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn referrer_role_round_trips_through_storage_form() {
        for role in ReferrerRole::ALL {
            assert_eq!(ReferrerRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(ReferrerRole::parse("Ref"), None);
    }
}
