// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::record::GridRecord;
use crate::store::RecordStore;
use crate::value::{CellValue, parse_cents, parse_day};

/// How a column's value is typed for editing and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Number,
    Money,
    Date,
    Select,
    Custom,
}

/// Seeds the edit buffer for composite columns instead of the plain
/// `value(key).display()` default.
pub type SeedFn<R> = fn(&R) -> String;

/// Owns the whole persistence path for a custom column: receives the
/// store, the current record and the confirmed buffer, and returns the
/// updated record, which replaces the local one verbatim.
pub type CommitFn<R> = fn(&mut dyn RecordStore<R>, &R, &str) -> Result<R>;

#[derive(Debug, Clone)]
pub struct ColumnSpec<R> {
    pub key: &'static str,
    pub header: &'static str,
    pub editable: bool,
    pub filterable: bool,
    pub kind: ColumnKind,
    pub options: &'static [&'static str],
    pub seed: Option<SeedFn<R>>,
    pub commit: Option<CommitFn<R>>,
}

impl<R> ColumnSpec<R> {
    pub const fn plain(
        key: &'static str,
        header: &'static str,
        editable: bool,
        kind: ColumnKind,
    ) -> Self {
        Self {
            key,
            header,
            editable,
            filterable: true,
            kind,
            options: &[],
            seed: None,
            commit: None,
        }
    }

    /// Parse a confirmed edit buffer into the value this column stores.
    /// An empty buffer clears optional columns to null.
    pub fn parse_input(&self, input: &str) -> Result<CellValue> {
        let trimmed = input.trim();
        match self.kind {
            ColumnKind::Text => Ok(CellValue::Text(trimmed.to_owned())),
            ColumnKind::Number => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                match trimmed.parse::<i64>() {
                    Ok(value) => Ok(CellValue::Integer(value)),
                    Err(_) => bail!("{} expects a whole number, got {trimmed:?}", self.header),
                }
            }
            ColumnKind::Money => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                match parse_cents(trimmed) {
                    Some(cents) => Ok(CellValue::Money(cents)),
                    None => bail!("{} expects a money amount, got {trimmed:?}", self.header),
                }
            }
            ColumnKind::Date => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                match parse_day(trimmed) {
                    Some(day) => Ok(CellValue::Date(day)),
                    None => bail!("{} expects YYYY-MM-DD, got {trimmed:?}", self.header),
                }
            }
            ColumnKind::Select => {
                match self
                    .options
                    .iter()
                    .find(|option| option.eq_ignore_ascii_case(trimmed))
                {
                    Some(option) => Ok(CellValue::Text((*option).to_owned())),
                    None => bail!(
                        "{} must be one of: {}",
                        self.header,
                        self.options.join(", ")
                    ),
                }
            }
            ColumnKind::Custom => {
                bail!("{} edits are handled by its commit hook", self.header)
            }
        }
    }
}

/// Filter grouping. At most one filter per category is selected at a
/// time; selections across categories are ANDed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum FilterCategory {
    Regular,
    Kind,
    Status,
    Route,
}

impl FilterCategory {
    pub const ALL: [Self; 4] = [Self::Regular, Self::Kind, Self::Status, Self::Route];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Regular => "filters",
            Self::Kind => "kind",
            Self::Status => "status",
            Self::Route => "route",
        }
    }
}

/// Match rule for a filter. Partition rules are data-driven so per-route
/// filters can be rebuilt as routes come and go, without closures.
#[derive(Debug, Clone, Copy)]
pub enum FilterRule<R> {
    Predicate(fn(&R) -> bool),
    PartitionEquals(i64),
    PartitionMissing,
}

impl<R: GridRecord> FilterRule<R> {
    pub fn matches(&self, record: &R) -> bool {
        match self {
            Self::Predicate(predicate) => predicate(record),
            Self::PartitionEquals(partition) => record.partition() == Some(*partition),
            Self::PartitionMissing => record.partition().is_none(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterSpec<R> {
    pub key: String,
    pub label: String,
    pub category: FilterCategory,
    pub rule: FilterRule<R>,
}

/// Per-entity grid description: the column set, the filter set, and the
/// designated date/partition/order columns where the entity has them.
#[derive(Debug, Clone)]
pub struct GridSchema<R> {
    pub entity: &'static str,
    pub columns: Vec<ColumnSpec<R>>,
    pub filters: Vec<FilterSpec<R>>,
    pub date_column: Option<&'static str>,
    pub partition_column: Option<&'static str>,
    pub order_column: Option<&'static str>,
}

impl<R: GridRecord> GridSchema<R> {
    pub fn new(
        entity: &'static str,
        columns: Vec<ColumnSpec<R>>,
        filters: Vec<FilterSpec<R>>,
    ) -> Self {
        Self {
            entity,
            columns,
            filters,
            date_column: None,
            partition_column: None,
            order_column: None,
        }
    }

    pub fn column(&self, key: &str) -> Option<&ColumnSpec<R>> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterSpec<R>> {
        self.filters.iter().find(|filter| filter.key == key)
    }

    pub fn validate(&self) -> Result<()> {
        for (index, column) in self.columns.iter().enumerate() {
            if self.columns[..index].iter().any(|prior| prior.key == column.key) {
                bail!("{} grid declares column {:?} twice", self.entity, column.key);
            }
            if column.kind == ColumnKind::Select && column.options.is_empty() {
                bail!(
                    "{} column {:?} is a select with no options",
                    self.entity,
                    column.key
                );
            }
            if column.kind != ColumnKind::Select && !column.options.is_empty() {
                bail!(
                    "{} column {:?} has options but is not a select",
                    self.entity,
                    column.key
                );
            }
            if column.kind == ColumnKind::Custom && column.editable && column.commit.is_none() {
                bail!(
                    "{} column {:?} is custom-editable without a commit hook",
                    self.entity,
                    column.key
                );
            }
        }
        for (index, filter) in self.filters.iter().enumerate() {
            if self.filters[..index].iter().any(|prior| prior.key == filter.key) {
                bail!("{} grid declares filter {:?} twice", self.entity, filter.key);
            }
        }
        for designated in [self.date_column, self.partition_column, self.order_column]
            .into_iter()
            .flatten()
        {
            if self.column(designated).is_none() {
                bail!(
                    "{} grid designates unknown column {designated:?}",
                    self.entity
                );
            }
        }
        if self.partition_column.is_some() != self.order_column.is_some() {
            bail!(
                "{} grid must designate partition and order columns together",
                self.entity
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnKind, ColumnSpec, FilterCategory, FilterRule, FilterSpec, GridSchema};
    use crate::record::GridRecord;
    use crate::value::CellValue;
    use anyhow::Result;

    #[derive(Debug, Clone)]
    struct Row {
        id: i64,
        name: String,
    }

    impl GridRecord for Row {
        fn id(&self) -> i64 {
            self.id
        }

        fn label(&self) -> String {
            self.name.clone()
        }

        fn value(&self, key: &str) -> CellValue {
            match key {
                "name" => CellValue::Text(self.name.clone()),
                _ => CellValue::Null,
            }
        }

        fn apply(&mut self, key: &str, value: &CellValue) -> Result<()> {
            if key == "name"
                && let CellValue::Text(text) = value
            {
                self.name = text.clone();
            }
            Ok(())
        }
    }

    fn schema_with(columns: Vec<ColumnSpec<Row>>) -> GridSchema<Row> {
        GridSchema::new("rows", columns, Vec::new())
    }

    #[test]
    fn select_without_options_is_rejected() {
        let schema = schema_with(vec![ColumnSpec::plain(
            "status",
            "status",
            true,
            ColumnKind::Select,
        )]);
        let error = schema.validate().expect_err("select needs options");
        assert!(error.to_string().contains("no options"));
    }

    #[test]
    fn duplicate_column_keys_are_rejected() {
        let schema = schema_with(vec![
            ColumnSpec::plain("name", "name", true, ColumnKind::Text),
            ColumnSpec::plain("name", "name again", false, ColumnKind::Text),
        ]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn partition_without_order_column_is_rejected() {
        let mut schema = schema_with(vec![ColumnSpec::plain(
            "route",
            "route",
            true,
            ColumnKind::Number,
        )]);
        schema.partition_column = Some("route");
        let error = schema.validate().expect_err("order column required");
        assert!(error.to_string().contains("together"));
    }

    #[test]
    fn select_parse_matches_options_case_insensitively() {
        let column = ColumnSpec::<Row> {
            options: &["pending", "completed"],
            ..ColumnSpec::plain("status", "status", true, ColumnKind::Select)
        };
        assert_eq!(
            column.parse_input("Completed").expect("valid option"),
            CellValue::Text("completed".to_owned())
        );
        assert!(column.parse_input("done").is_err());
    }

    #[test]
    fn number_parse_clears_to_null_on_empty() {
        let column = ColumnSpec::<Row>::plain("route", "route", true, ColumnKind::Number);
        assert_eq!(column.parse_input("  ").expect("empty"), CellValue::Null);
        assert_eq!(
            column.parse_input("12").expect("number"),
            CellValue::Integer(12)
        );
        assert!(column.parse_input("twelve").is_err());
    }

    #[test]
    fn partition_rules_match_against_record_partition() {
        let spec = FilterSpec::<Row> {
            key: "no-route".to_owned(),
            label: "no route".to_owned(),
            category: FilterCategory::Route,
            rule: FilterRule::PartitionMissing,
        };
        let row = Row {
            id: 1,
            name: "a".to_owned(),
        };
        assert!(spec.rule.matches(&row));
    }
}
