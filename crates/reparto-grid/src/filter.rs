// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

use crate::record::GridRecord;
use crate::schema::{ColumnKind, FilterCategory, GridSchema};

/// Inclusive day range; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, day: Date) -> bool {
        if let Some(start) = self.start
            && day < start
        {
            return false;
        }
        if let Some(end) = self.end
            && day > end
        {
            return false;
        }
        true
    }
}

/// All active filtering input for one grid: the free-text search term,
/// the per-category filter selections, the per-column filter values and
/// the date range. Collapse state lives on the controller so collapsing
/// a section never disturbs what is selected here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    search: String,
    selected: BTreeMap<FilterCategory, String>,
    column_filters: BTreeMap<String, String>,
    date_range: DateRange,
}

impl FilterState {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn selected_in(&self, category: FilterCategory) -> Option<&str> {
        self.selected.get(&category).map(String::as_str)
    }

    /// Select a filter within its category, replacing whatever that
    /// category had selected. Re-selecting the active filter clears the
    /// category. Keys not present in the schema are ignored.
    pub fn select<R: GridRecord>(&mut self, schema: &GridSchema<R>, key: &str) {
        let Some(spec) = schema.filter(key) else {
            return;
        };
        if self.selected_in(spec.category) == Some(key) {
            self.selected.remove(&spec.category);
        } else {
            self.selected.insert(spec.category, key.to_owned());
        }
    }

    pub fn clear_category(&mut self, category: FilterCategory) {
        self.selected.remove(&category);
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.selected.clear();
        self.column_filters.clear();
        self.date_range = DateRange::default();
    }

    pub fn column_filter(&self, key: &str) -> Option<&str> {
        self.column_filters.get(key).map(String::as_str)
    }

    /// Set a column filter value; an empty value removes the filter.
    pub fn set_column_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.column_filters.remove(&key);
        } else {
            self.column_filters.insert(key, value);
        }
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
    }

    pub fn is_default(&self) -> bool {
        self.search.is_empty()
            && self.selected.is_empty()
            && self.column_filters.is_empty()
            && self.date_range.is_unbounded()
    }
}

/// Pure visibility check: search AND category filters AND column filters
/// AND date range. Identical inputs always yield identical results.
pub fn is_visible<R: GridRecord>(
    record: &R,
    schema: &GridSchema<R>,
    state: &FilterState,
) -> bool {
    matches_search(record, schema, state.search())
        && matches_categories(record, schema, state)
        && matches_columns(record, schema, state)
        && matches_date(record, schema, state)
}

fn matches_search<R: GridRecord>(record: &R, schema: &GridSchema<R>, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    schema.columns.iter().any(|column| {
        record
            .value(column.key)
            .search_text()
            .is_some_and(|text| text.to_lowercase().contains(&term))
    })
}

fn matches_categories<R: GridRecord>(
    record: &R,
    schema: &GridSchema<R>,
    state: &FilterState,
) -> bool {
    FilterCategory::ALL.iter().all(|category| {
        let Some(selected) = state.selected_in(*category) else {
            return true;
        };
        // A stale selection (filter list rebuilt without it) matches nothing.
        schema
            .filter(selected)
            .is_some_and(|spec| spec.rule.matches(record))
    })
}

fn matches_columns<R: GridRecord>(
    record: &R,
    schema: &GridSchema<R>,
    state: &FilterState,
) -> bool {
    schema.columns.iter().all(|column| {
        let Some(filter) = state.column_filter(column.key) else {
            return true;
        };
        let value = record.value(column.key);
        if value.is_null() {
            return false;
        }
        match column.kind {
            ColumnKind::Select => value.display() == filter,
            _ => value
                .display()
                .to_lowercase()
                .contains(&filter.to_lowercase()),
        }
    })
}

fn matches_date<R: GridRecord>(record: &R, schema: &GridSchema<R>, state: &FilterState) -> bool {
    let Some(date_column) = schema.date_column else {
        return true;
    };
    let range = state.date_range();
    if range.is_unbounded() {
        return true;
    }
    match record.value(date_column) {
        crate::value::CellValue::Date(day) => range.contains(day),
        _ => false,
    }
}
