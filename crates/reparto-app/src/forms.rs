// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::Date;

use crate::{FormKind, ItemId, ReferrerId, ReferrerRole, RouteId, VisitKind, VisitStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitFormInput {
    pub buyer_name: String,
    pub address: String,
    pub kind: VisitKind,
    pub status: VisitStatus,
    pub visit_date: Option<Date>,
    pub phone_mobile: String,
    pub phone_home: String,
    pub phone_work: String,
    pub route_id: Option<RouteId>,
    pub item_ids: Vec<ItemId>,
    pub referrer_id: Option<ReferrerId>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFormInput {
    pub name: String,
    pub driver: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerFormInput {
    pub name: String,
    pub phone: String,
    pub role: ReferrerRole,
    pub access_enabled: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFormInput {
    pub name: String,
    pub price_cents: Option<i64>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Visit(VisitFormInput),
    Route(RouteFormInput),
    Referrer(ReferrerFormInput),
    Item(ItemFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Visit(_) => FormKind::Visit,
            Self::Route(_) => FormKind::Route,
            Self::Referrer(_) => FormKind::Referrer,
            Self::Item(_) => FormKind::Item,
        }
    }

    pub fn blank_for(kind: FormKind) -> Self {
        match kind {
            FormKind::Visit => Self::Visit(VisitFormInput {
                buyer_name: String::new(),
                address: String::new(),
                kind: VisitKind::Delivery,
                status: VisitStatus::Pending,
                visit_date: None,
                phone_mobile: String::new(),
                phone_home: String::new(),
                phone_work: String::new(),
                route_id: None,
                item_ids: Vec::new(),
                referrer_id: None,
                notes: String::new(),
            }),
            FormKind::Route => Self::Route(RouteFormInput {
                name: String::new(),
                driver: String::new(),
                notes: String::new(),
            }),
            FormKind::Referrer => Self::Referrer(ReferrerFormInput {
                name: String::new(),
                phone: String::new(),
                role: ReferrerRole::Ref,
                access_enabled: false,
                notes: String::new(),
            }),
            FormKind::Item => Self::Item(ItemFormInput {
                name: String::new(),
                price_cents: None,
                notes: String::new(),
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Visit(visit) => visit.validate(),
            Self::Route(route) => route.validate(),
            Self::Referrer(referrer) => referrer.validate(),
            Self::Item(item) => item.validate(),
        }
    }
}

impl VisitFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.buyer_name.trim().is_empty() {
            bail!("buyer name is required -- enter a buyer and retry");
        }
        Ok(())
    }
}

impl RouteFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("route name is required -- enter a route name and retry");
        }
        Ok(())
    }
}

impl ReferrerFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("referrer name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl ItemFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("item name is required -- enter an item name and retry");
        }
        if let Some(price) = self.price_cents
            && price < 0
        {
            bail!("item price cannot be negative");
        }
        Ok(())
    }
}
