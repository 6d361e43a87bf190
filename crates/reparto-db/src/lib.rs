// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod adapters;

pub use adapters::{ItemStore, ReferrerStore, RouteStore, VisitStore};

use anyhow::{Context, Result, anyhow, bail};
use reparto_app::{
    CatalogItem, DeliveryRoute, ItemId, Referrer, ReferrerId, ReferrerRole, RouteId, Visit,
    VisitId, VisitKind, VisitStatus,
};
use reparto_grid::{CellValue, FieldWrite, format_day, parse_day};
use rusqlite::types::{Null, ToSql};
use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "reparto";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "routes",
        &[
            "id",
            "number",
            "name",
            "driver",
            "notes",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "referrers",
        &[
            "id",
            "number",
            "name",
            "phone",
            "role",
            "access_enabled",
            "notes",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "items",
        &[
            "id",
            "number",
            "name",
            "price_cents",
            "notes",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "visits",
        &[
            "id",
            "number",
            "buyer_name",
            "address",
            "kind",
            "status",
            "visit_date",
            "phone_mobile",
            "phone_home",
            "phone_work",
            "route_id",
            "route_order",
            "item_ids",
            "referrer_id",
            "notes",
            "created_at",
            "updated_at",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_routes_name",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_routes_name ON routes (name);",
    },
    RequiredIndex {
        name: "idx_referrers_role",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_referrers_role ON referrers (role);",
    },
    RequiredIndex {
        name: "idx_visits_route_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_route_id ON visits (route_id);",
    },
    RequiredIndex {
        name: "idx_visits_status",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_status ON visits (status);",
    },
    RequiredIndex {
        name: "idx_visits_referrer_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_referrer_id ON visits (referrer_id);",
    },
    RequiredIndex {
        name: "idx_visits_visit_date",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_visit_date ON visits (visit_date);",
    },
];

const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS routes (
  id INTEGER PRIMARY KEY,
  number INTEGER NOT NULL,
  name TEXT NOT NULL,
  driver TEXT NOT NULL DEFAULT '',
  notes TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS referrers (
  id INTEGER PRIMARY KEY,
  number INTEGER NOT NULL,
  name TEXT NOT NULL,
  phone TEXT NOT NULL DEFAULT '',
  role TEXT NOT NULL,
  access_enabled INTEGER NOT NULL DEFAULT 0,
  notes TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
  id INTEGER PRIMARY KEY,
  number INTEGER NOT NULL,
  name TEXT NOT NULL,
  price_cents INTEGER,
  notes TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS visits (
  id INTEGER PRIMARY KEY,
  number INTEGER NOT NULL,
  buyer_name TEXT NOT NULL,
  address TEXT NOT NULL DEFAULT '',
  kind TEXT NOT NULL,
  status TEXT NOT NULL,
  visit_date TEXT,
  phone_mobile TEXT NOT NULL DEFAULT '',
  phone_home TEXT NOT NULL DEFAULT '',
  phone_work TEXT NOT NULL DEFAULT '',
  route_id INTEGER REFERENCES routes (id),
  route_order INTEGER,
  item_ids TEXT NOT NULL DEFAULT '[]',
  referrer_id INTEGER REFERENCES referrers (id),
  notes TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
";

/// Reject sqlite URI forms and query strings; the store opens plain
/// filesystem paths only.
pub fn validate_db_path(path: &str) -> Result<()> {
    if path.contains("://") || path.starts_with("file:") {
        bail!("db path {path:?} must be a plain file path, not a URI");
    }
    if path.contains('?') {
        bail!("db path {path:?} must not carry query parameters");
    }
    Ok(())
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("REPARTO_DB_PATH") {
        return Ok(PathBuf::from(path));
    }
    let data_root = dirs::data_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory; set REPARTO_DB_PATH"))?;
    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("reparto.db"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    pub number: i64,
    pub buyer_name: String,
    pub address: String,
    pub kind: VisitKind,
    pub status: VisitStatus,
    pub visit_date: Option<time::Date>,
    pub phone_mobile: String,
    pub phone_home: String,
    pub phone_work: String,
    pub route_id: Option<RouteId>,
    pub route_order: Option<i64>,
    pub item_ids: Vec<ItemId>,
    pub referrer_id: Option<ReferrerId>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoute {
    pub number: i64,
    pub name: String,
    pub driver: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReferrer {
    pub number: i64,
    pub name: String,
    pub phone: String,
    pub role: ReferrerRole,
    pub access_enabled: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub number: i64,
    pub name: String,
    pub price_cents: Option<i64>,
    pub notes: String,
}

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if path.to_str() == Some(":memory:") {
            return Self::open_memory();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open database {}", path.display()))?;
        conn.pragma_update(None, "foreign_keys", true)
            .context("enable foreign keys")?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        conn.pragma_update(None, "foreign_keys", true)
            .context("enable foreign keys")?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Create missing tables and indexes, then verify every required
    /// column is present so a foreign or migrated database fails loudly.
    pub fn bootstrap(&self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_SCHEMA)
            .context("create schema")?;
        self.verify_schema()?;
        for index in REQUIRED_INDEXES {
            self.conn
                .execute_batch(index.create_sql)
                .with_context(|| format!("create index {}", index.name))?;
        }
        Ok(())
    }

    fn verify_schema(&self) -> Result<()> {
        for (table, required) in REQUIRED_SCHEMA {
            let mut stmt = self
                .conn
                .prepare(&format!("PRAGMA table_info({table})"))
                .with_context(|| format!("inspect table `{table}`"))?;
            let present: Vec<String> = stmt
                .query_map([], |row| row.get::<_, String>(1))
                .with_context(|| format!("read columns of `{table}`"))?
                .collect::<rusqlite::Result<_>>()?;
            if present.is_empty() {
                bail!("table `{table}` is missing");
            }
            let missing: Vec<&str> = required
                .iter()
                .filter(|column| !present.iter().any(|have| have == *column))
                .copied()
                .collect();
            if !missing.is_empty() {
                bail!(
                    "table `{table}` is missing required columns: {}",
                    missing.join(", ")
                );
            }
        }
        Ok(())
    }

    pub fn export_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Export {
            routes: Vec<DeliveryRoute>,
            referrers: Vec<Referrer>,
            items: Vec<CatalogItem>,
            visits: Vec<Visit>,
        }
        let export = Export {
            routes: self.list_routes()?,
            referrers: self.list_referrers()?,
            items: self.list_items()?,
            visits: self.list_visits()?,
        };
        serde_json::to_string_pretty(&export).context("serialize export")
    }

    // ---- visits ----

    pub fn list_visits(&self) -> Result<Vec<Visit>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, number, buyer_name, address, kind, status, visit_date,
                       phone_mobile, phone_home, phone_work, route_id, route_order,
                       item_ids, referrer_id, notes, created_at, updated_at
                FROM visits
                ORDER BY route_id IS NULL, route_id, route_order IS NULL, route_order,
                         LOWER(buyer_name)
                ",
            )
            .context("prepare visit list")?;
        let rows = stmt
            .query_map([], raw_visit)
            .context("list visits")?;
        let mut visits = Vec::new();
        for raw in rows {
            visits.push(visit_from_raw(raw?)?);
        }
        Ok(visits)
    }

    pub fn get_visit(&self, visit_id: VisitId) -> Result<Visit> {
        let raw = self
            .conn
            .query_row(
                "
                SELECT id, number, buyer_name, address, kind, status, visit_date,
                       phone_mobile, phone_home, phone_work, route_id, route_order,
                       item_ids, referrer_id, notes, created_at, updated_at
                FROM visits WHERE id = ?
                ",
                params![visit_id.get()],
                raw_visit,
            )
            .with_context(|| format!("visit {} not found", visit_id.get()))?;
        visit_from_raw(raw)
    }

    pub fn create_visit(&self, new_visit: &NewVisit) -> Result<VisitId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO visits (
                  number, buyer_name, address, kind, status, visit_date,
                  phone_mobile, phone_home, phone_work, route_id, route_order,
                  item_ids, referrer_id, notes, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    new_visit.number,
                    new_visit.buyer_name,
                    new_visit.address,
                    new_visit.kind.as_str(),
                    new_visit.status.as_str(),
                    new_visit.visit_date.map(format_day),
                    new_visit.phone_mobile,
                    new_visit.phone_home,
                    new_visit.phone_work,
                    new_visit.route_id.map(RouteId::get),
                    new_visit.route_order,
                    encode_item_ids(&new_visit.item_ids)?,
                    new_visit.referrer_id.map(ReferrerId::get),
                    new_visit.notes,
                    now,
                    now,
                ],
            )
            .context("insert visit")?;
        Ok(VisitId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_visit_fields(&self, visit_id: VisitId, patch: &[FieldWrite]) -> Result<Visit> {
        self.apply_patch("visits", visit_id.get(), patch, visit_column)?;
        self.get_visit(visit_id)
    }

    pub fn delete_visit(&self, visit_id: VisitId) -> Result<()> {
        self.delete_row("visits", visit_id.get())
    }

    pub fn update_visits_where(
        &self,
        key: &str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.apply_patch_where("visits", key, equals, patch, visit_column)
    }

    // ---- routes ----

    pub fn list_routes(&self) -> Result<Vec<DeliveryRoute>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, number, name, driver, notes, created_at, updated_at
                FROM routes ORDER BY LOWER(name)
                ",
            )
            .context("prepare route list")?;
        let rows = stmt.query_map([], raw_route).context("list routes")?;
        let mut routes = Vec::new();
        for raw in rows {
            routes.push(route_from_raw(raw?)?);
        }
        Ok(routes)
    }

    pub fn get_route(&self, route_id: RouteId) -> Result<DeliveryRoute> {
        let raw = self
            .conn
            .query_row(
                "
                SELECT id, number, name, driver, notes, created_at, updated_at
                FROM routes WHERE id = ?
                ",
                params![route_id.get()],
                raw_route,
            )
            .with_context(|| format!("route {} not found", route_id.get()))?;
        route_from_raw(raw)
    }

    pub fn create_route(&self, new_route: &NewRoute) -> Result<RouteId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO routes (number, name, driver, notes, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    new_route.number,
                    new_route.name,
                    new_route.driver,
                    new_route.notes,
                    now,
                    now,
                ],
            )
            .context("insert route")?;
        Ok(RouteId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_route_fields(
        &self,
        route_id: RouteId,
        patch: &[FieldWrite],
    ) -> Result<DeliveryRoute> {
        self.apply_patch("routes", route_id.get(), patch, route_column)?;
        self.get_route(route_id)
    }

    pub fn delete_route(&self, route_id: RouteId) -> Result<()> {
        self.delete_row("routes", route_id.get())
    }

    pub fn update_routes_where(
        &self,
        key: &str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.apply_patch_where("routes", key, equals, patch, route_column)
    }

    // ---- referrers ----

    pub fn list_referrers(&self) -> Result<Vec<Referrer>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, number, name, phone, role, access_enabled, notes,
                       created_at, updated_at
                FROM referrers ORDER BY LOWER(name)
                ",
            )
            .context("prepare referrer list")?;
        let rows = stmt.query_map([], raw_referrer).context("list referrers")?;
        let mut referrers = Vec::new();
        for raw in rows {
            referrers.push(referrer_from_raw(raw?)?);
        }
        Ok(referrers)
    }

    pub fn get_referrer(&self, referrer_id: ReferrerId) -> Result<Referrer> {
        let raw = self
            .conn
            .query_row(
                "
                SELECT id, number, name, phone, role, access_enabled, notes,
                       created_at, updated_at
                FROM referrers WHERE id = ?
                ",
                params![referrer_id.get()],
                raw_referrer,
            )
            .with_context(|| format!("referrer {} not found", referrer_id.get()))?;
        referrer_from_raw(raw)
    }

    pub fn create_referrer(&self, new_referrer: &NewReferrer) -> Result<ReferrerId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO referrers (number, name, phone, role, access_enabled,
                                       notes, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    new_referrer.number,
                    new_referrer.name,
                    new_referrer.phone,
                    new_referrer.role.as_str(),
                    new_referrer.access_enabled,
                    new_referrer.notes,
                    now,
                    now,
                ],
            )
            .context("insert referrer")?;
        Ok(ReferrerId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_referrer_fields(
        &self,
        referrer_id: ReferrerId,
        patch: &[FieldWrite],
    ) -> Result<Referrer> {
        self.apply_patch("referrers", referrer_id.get(), patch, referrer_column)?;
        self.get_referrer(referrer_id)
    }

    pub fn delete_referrer(&self, referrer_id: ReferrerId) -> Result<()> {
        self.delete_row("referrers", referrer_id.get())
    }

    pub fn update_referrers_where(
        &self,
        key: &str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.apply_patch_where("referrers", key, equals, patch, referrer_column)
    }

    // ---- items ----

    pub fn list_items(&self) -> Result<Vec<CatalogItem>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, number, name, price_cents, notes, created_at, updated_at
                FROM items ORDER BY LOWER(name)
                ",
            )
            .context("prepare item list")?;
        let rows = stmt.query_map([], raw_item).context("list items")?;
        let mut items = Vec::new();
        for raw in rows {
            items.push(item_from_raw(raw?)?);
        }
        Ok(items)
    }

    pub fn get_item(&self, item_id: ItemId) -> Result<CatalogItem> {
        let raw = self
            .conn
            .query_row(
                "
                SELECT id, number, name, price_cents, notes, created_at, updated_at
                FROM items WHERE id = ?
                ",
                params![item_id.get()],
                raw_item,
            )
            .with_context(|| format!("item {} not found", item_id.get()))?;
        item_from_raw(raw)
    }

    pub fn create_item(&self, new_item: &NewItem) -> Result<ItemId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO items (number, name, price_cents, notes, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    new_item.number,
                    new_item.name,
                    new_item.price_cents,
                    new_item.notes,
                    now,
                    now,
                ],
            )
            .context("insert item")?;
        Ok(ItemId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_item_fields(
        &self,
        item_id: ItemId,
        patch: &[FieldWrite],
    ) -> Result<CatalogItem> {
        self.apply_patch("items", item_id.get(), patch, item_column)?;
        self.get_item(item_id)
    }

    pub fn delete_item(&self, item_id: ItemId) -> Result<()> {
        self.delete_row("items", item_id.get())
    }

    pub fn update_items_where(
        &self,
        key: &str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize> {
        self.apply_patch_where("items", key, equals, patch, item_column)
    }

    // ---- shared patch machinery ----

    fn apply_patch(
        &self,
        table: &str,
        id: i64,
        patch: &[FieldWrite],
        column_for: fn(&str) -> Result<&'static str>,
    ) -> Result<()> {
        if patch.is_empty() {
            bail!("empty field patch for {table} row {id}");
        }
        let mut assignments = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        for (key, value) in patch {
            let column = column_for(key)?;
            assignments.push(format!("{column} = ?"));
            values.push(sql_value(value)?);
        }
        assignments.push("updated_at = ?".to_owned());
        values.push(Box::new(now_rfc3339()?));
        values.push(Box::new(id));

        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let rows_affected = self
            .conn
            .execute(&sql, params_from_iter(values))
            .with_context(|| format!("update {table} row {id}"))?;
        if rows_affected == 0 {
            bail!("{table} row {id} not found -- refresh and retry");
        }
        Ok(())
    }

    fn apply_patch_where(
        &self,
        table: &str,
        key: &str,
        equals: &CellValue,
        patch: &[FieldWrite],
        column_for: fn(&str) -> Result<&'static str>,
    ) -> Result<usize> {
        if patch.is_empty() {
            bail!("empty field patch for {table}");
        }
        let match_column = column_for(key)?;
        let mut assignments = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        for (patch_key, value) in patch {
            let column = column_for(patch_key)?;
            assignments.push(format!("{column} = ?"));
            values.push(sql_value(value)?);
        }
        assignments.push("updated_at = ?".to_owned());
        values.push(Box::new(now_rfc3339()?));

        let condition = if equals.is_null() {
            format!("{match_column} IS NULL")
        } else {
            values.push(sql_value(equals)?);
            format!("{match_column} = ?")
        };
        let sql = format!(
            "UPDATE {table} SET {} WHERE {condition}",
            assignments.join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(values))
            .with_context(|| format!("bulk update {table}"))
    }

    fn delete_row(&self, table: &str, id: i64) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?"), params![id])
            .with_context(|| format!("delete {table} row {id}"))?;
        if rows_affected == 0 {
            bail!("{table} row {id} not found -- refresh and retry");
        }
        Ok(())
    }
}

fn visit_column(key: &str) -> Result<&'static str> {
    Ok(match key {
        "number" => "number",
        "buyer" => "buyer_name",
        "address" => "address",
        "kind" => "kind",
        "status" => "status",
        "date" => "visit_date",
        "phone_mobile" => "phone_mobile",
        "phone_home" => "phone_home",
        "phone_work" => "phone_work",
        "route" => "route_id",
        "order" => "route_order",
        "items" => "item_ids",
        "referrer" => "referrer_id",
        "notes" => "notes",
        _ => bail!("visits have no column for key {key:?}"),
    })
}

fn route_column(key: &str) -> Result<&'static str> {
    Ok(match key {
        "number" => "number",
        "name" => "name",
        "driver" => "driver",
        "notes" => "notes",
        _ => bail!("routes have no column for key {key:?}"),
    })
}

fn referrer_column(key: &str) -> Result<&'static str> {
    Ok(match key {
        "number" => "number",
        "name" => "name",
        "phone" => "phone",
        "role" => "role",
        "access" => "access_enabled",
        "notes" => "notes",
        _ => bail!("referrers have no column for key {key:?}"),
    })
}

fn item_column(key: &str) -> Result<&'static str> {
    Ok(match key {
        "number" => "number",
        "name" => "name",
        "price" => "price_cents",
        "notes" => "notes",
        _ => bail!("items have no column for key {key:?}"),
    })
}

fn sql_value(value: &CellValue) -> Result<Box<dyn ToSql>> {
    Ok(match value {
        CellValue::Null => Box::new(Null),
        CellValue::Text(text) => Box::new(text.clone()),
        CellValue::Integer(number) => Box::new(*number),
        CellValue::Money(cents) => Box::new(*cents),
        CellValue::Date(day) => Box::new(format_day(*day)),
        CellValue::Bool(flag) => Box::new(*flag),
        CellValue::IdList(ids) => Box::new(serde_json::to_string(ids).context("encode id list")?),
    })
}

fn encode_item_ids(ids: &[ItemId]) -> Result<String> {
    let raw: Vec<i64> = ids.iter().map(|item| item.get()).collect();
    serde_json::to_string(&raw).context("encode item ids")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format timestamp")
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .with_context(|| format!("parse timestamp {raw:?}"))
}

struct RawVisit {
    id: i64,
    number: i64,
    buyer_name: String,
    address: String,
    kind: String,
    status: String,
    visit_date: Option<String>,
    phone_mobile: String,
    phone_home: String,
    phone_work: String,
    route_id: Option<i64>,
    route_order: Option<i64>,
    item_ids: String,
    referrer_id: Option<i64>,
    notes: String,
    created_at: String,
    updated_at: String,
}

fn raw_visit(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVisit> {
    Ok(RawVisit {
        id: row.get(0)?,
        number: row.get(1)?,
        buyer_name: row.get(2)?,
        address: row.get(3)?,
        kind: row.get(4)?,
        status: row.get(5)?,
        visit_date: row.get(6)?,
        phone_mobile: row.get(7)?,
        phone_home: row.get(8)?,
        phone_work: row.get(9)?,
        route_id: row.get(10)?,
        route_order: row.get(11)?,
        item_ids: row.get(12)?,
        referrer_id: row.get(13)?,
        notes: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn visit_from_raw(raw: RawVisit) -> Result<Visit> {
    let kind = VisitKind::parse(&raw.kind)
        .ok_or_else(|| anyhow!("visit {} has unknown kind {:?}", raw.id, raw.kind))?;
    let status = VisitStatus::parse(&raw.status)
        .ok_or_else(|| anyhow!("visit {} has unknown status {:?}", raw.id, raw.status))?;
    let visit_date = match raw.visit_date.as_deref() {
        Some(day) => Some(
            parse_day(day)
                .ok_or_else(|| anyhow!("visit {} has invalid date {day:?}", raw.id))?,
        ),
        None => None,
    };
    let item_ids: Vec<i64> = serde_json::from_str(&raw.item_ids)
        .with_context(|| format!("visit {} has invalid item list", raw.id))?;
    Ok(Visit {
        id: VisitId::new(raw.id),
        number: raw.number,
        buyer_name: raw.buyer_name,
        address: raw.address,
        kind,
        status,
        visit_date,
        phone_mobile: raw.phone_mobile,
        phone_home: raw.phone_home,
        phone_work: raw.phone_work,
        route_id: raw.route_id.map(RouteId::new),
        route_order: raw.route_order,
        item_ids: item_ids.into_iter().map(ItemId::new).collect(),
        referrer_id: raw.referrer_id.map(ReferrerId::new),
        notes: raw.notes,
        created_at: parse_timestamp(&raw.created_at)?,
        updated_at: parse_timestamp(&raw.updated_at)?,
    })
}

struct RawRoute {
    id: i64,
    number: i64,
    name: String,
    driver: String,
    notes: String,
    created_at: String,
    updated_at: String,
}

fn raw_route(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRoute> {
    Ok(RawRoute {
        id: row.get(0)?,
        number: row.get(1)?,
        name: row.get(2)?,
        driver: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn route_from_raw(raw: RawRoute) -> Result<DeliveryRoute> {
    Ok(DeliveryRoute {
        id: RouteId::new(raw.id),
        number: raw.number,
        name: raw.name,
        driver: raw.driver,
        notes: raw.notes,
        created_at: parse_timestamp(&raw.created_at)?,
        updated_at: parse_timestamp(&raw.updated_at)?,
    })
}

struct RawReferrer {
    id: i64,
    number: i64,
    name: String,
    phone: String,
    role: String,
    access_enabled: bool,
    notes: String,
    created_at: String,
    updated_at: String,
}

fn raw_referrer(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawReferrer> {
    Ok(RawReferrer {
        id: row.get(0)?,
        number: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        role: row.get(4)?,
        access_enabled: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn referrer_from_raw(raw: RawReferrer) -> Result<Referrer> {
    let role = ReferrerRole::parse(&raw.role)
        .ok_or_else(|| anyhow!("referrer {} has unknown role {:?}", raw.id, raw.role))?;
    Ok(Referrer {
        id: ReferrerId::new(raw.id),
        number: raw.number,
        name: raw.name,
        phone: raw.phone,
        role,
        access_enabled: raw.access_enabled,
        notes: raw.notes,
        created_at: parse_timestamp(&raw.created_at)?,
        updated_at: parse_timestamp(&raw.updated_at)?,
    })
}

struct RawItem {
    id: i64,
    number: i64,
    name: String,
    price_cents: Option<i64>,
    notes: String,
    created_at: String,
    updated_at: String,
}

fn raw_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get(0)?,
        number: row.get(1)?,
        name: row.get(2)?,
        price_cents: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn item_from_raw(raw: RawItem) -> Result<CatalogItem> {
    Ok(CatalogItem {
        id: ItemId::new(raw.id),
        number: raw.number,
        name: raw.name,
        price_cents: raw.price_cents,
        notes: raw.notes,
        created_at: parse_timestamp(&raw.created_at)?,
        updated_at: parse_timestamp(&raw.updated_at)?,
    })
}
