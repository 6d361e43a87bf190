// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::value::CellValue;

/// The record shape the grid engine is generic over. A record is an id
/// plus a set of named fields exposed as [`CellValue`]s; the concrete
/// struct stays typed and owns the mapping both ways.
///
/// `partition` and `order` back the partitioned-ordering engine. Kinds
/// that carry no ordering keep the defaults.
pub trait GridRecord: Clone {
    fn id(&self) -> i64;

    /// Human-readable label; final sort fallback and status-line subject.
    fn label(&self) -> String;

    /// Field lookup by column key. Unknown keys return [`CellValue::Null`].
    fn value(&self, key: &str) -> CellValue;

    /// Patch one field in place from a cell value. Fails on unknown keys
    /// or a value the field cannot hold.
    fn apply(&mut self, key: &str, value: &CellValue) -> Result<()>;

    fn partition(&self) -> Option<i64> {
        None
    }

    fn order(&self) -> Option<i64> {
        None
    }
}
