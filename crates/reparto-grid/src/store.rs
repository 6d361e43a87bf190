// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::record::GridRecord;
use crate::value::CellValue;

/// A named field update. Patches are slices of these.
pub type FieldWrite = (&'static str, CellValue);

/// Persistence collaborator for one record kind. Object-safe so custom
/// column commit hooks can take `&mut dyn RecordStore<R>`.
///
/// Every call may fail with a transport or validation error; the grid
/// controller catches failures at the operation boundary and reports
/// them instead of propagating into rendering.
pub trait RecordStore<R: GridRecord> {
    fn select_all(&mut self) -> Result<Vec<R>>;

    /// Persist a new record built from `draft`'s fields. The store assigns
    /// the id and audit stamps and returns the stored record.
    fn insert(&mut self, draft: &R) -> Result<R>;

    /// Apply a field patch to the record with `id` and return the updated
    /// record. Fails if the record no longer exists.
    fn update(&mut self, id: i64, patch: &[FieldWrite]) -> Result<R>;

    fn delete(&mut self, id: i64) -> Result<()>;

    /// Apply `patch` to every record whose `key` field equals `equals`,
    /// as a single bulk write. Returns the number of rows written.
    fn update_where(
        &mut self,
        key: &'static str,
        equals: &CellValue,
        patch: &[FieldWrite],
    ) -> Result<usize>;
}

/// Fire-and-forget operator feedback. The production impl is the console
/// status line; tests collect messages.
pub trait Notifier {
    fn report(&mut self, message: &str);
}
