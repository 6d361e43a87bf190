// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::edit::{EditCell, EditSession};
use crate::filter::{DateRange, FilterState, is_visible};
use crate::record::GridRecord;
use crate::reorder::{self, ReorderPlan, sort_for_display};
use crate::schema::{FilterCategory, FilterSpec, GridSchema};
use crate::store::{FieldWrite, Notifier, RecordStore};
use crate::value::CellValue;

/// What a reorder request amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Cross-partition drop, or the grid carries no ordering.
    Rejected,
    /// Nothing moved; zero writes issued.
    Unchanged,
    /// Orders were reassigned locally and `written` single-row writes
    /// were issued, of which `failures` failed and were reported.
    Applied { written: usize, failures: usize },
}

/// One grid over one record kind: owns the authoritative in-memory
/// records, the schema and the filter state, and mediates every store
/// call. Failures never escape an operation; they are reported through
/// the [`Notifier`] and the grid stays interactive.
///
/// `reorder` is eventually consistent by contract: the local sequence
/// updates before persistence and per-row write failures are reported
/// without rolling the local sequence back.
#[derive(Debug, Clone)]
pub struct GridController<R: GridRecord> {
    schema: GridSchema<R>,
    records: Vec<R>,
    filter: FilterState,
    collapsed: bool,
}

impl<R: GridRecord> GridController<R> {
    pub fn new(schema: GridSchema<R>) -> Result<Self> {
        schema.validate()?;
        Ok(Self {
            schema,
            records: Vec::new(),
            filter: FilterState::default(),
            collapsed: false,
        })
    }

    pub fn schema(&self) -> &GridSchema<R> {
        &self.schema
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn record(&self, id: i64) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.set_search(term);
    }

    pub fn select_filter(&mut self, key: &str) {
        self.filter.select(&self.schema, key);
    }

    pub fn set_column_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.filter.set_column_filter(key, value);
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.filter.set_date_range(range);
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    /// Swap out one category's filter set, e.g. rebuilding the per-route
    /// filters after routes change. A selection that no longer resolves
    /// is cleared.
    pub fn replace_filters(&mut self, category: FilterCategory, specs: Vec<FilterSpec<R>>) {
        self.schema.filters.retain(|spec| spec.category != category);
        self.schema.filters.extend(specs);
        if let Some(selected) = self.filter.selected_in(category)
            && self.schema.filter(selected).is_none()
        {
            self.filter.clear_category(category);
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Collapse suppresses all rows without touching the filter state, so
    /// expanding restores exactly the previous view.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    pub fn visible(&self) -> Vec<&R> {
        if self.collapsed {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|record| is_visible(*record, &self.schema, &self.filter))
            .collect()
    }

    pub fn refresh(&mut self, store: &mut dyn RecordStore<R>) -> Result<()> {
        let mut records = store.select_all()?;
        sort_for_display(&mut records);
        self.records = records;
        Ok(())
    }

    /// Next synthetic label for the numeric `key` column.
    pub fn next_number(&self, key: &str) -> i64 {
        1 + self
            .records
            .iter()
            .filter_map(|record| match record.value(key) {
                CellValue::Integer(number) => Some(number),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn next_order_in(&self, partition: i64) -> i64 {
        reorder::next_order_in(&self.records, partition)
    }

    /// Add a record built by `build`, which receives the controller for
    /// the `next_number`/`next_order_in` helpers. A `build` error is a
    /// validation rejection: reported, no store call, no state change.
    pub fn add_with<F>(
        &mut self,
        store: &mut dyn RecordStore<R>,
        notifier: &mut dyn Notifier,
        build: F,
    ) -> Option<i64>
    where
        F: FnOnce(&Self) -> Result<R>,
    {
        let draft = match build(self) {
            Ok(draft) => draft,
            Err(error) => {
                notifier.report(&format!("{error:#}"));
                return None;
            }
        };
        match store.insert(&draft) {
            Ok(stored) => {
                let id = stored.id();
                self.records.push(stored);
                sort_for_display(&mut self.records);
                Some(id)
            }
            Err(error) => {
                notifier.report(&format!("add failed: {error:#}"));
                None
            }
        }
    }

    /// Delete a record the operator already confirmed. No cascade checks
    /// here; referential integrity belongs to the store.
    pub fn delete(
        &mut self,
        store: &mut dyn RecordStore<R>,
        notifier: &mut dyn Notifier,
        id: i64,
    ) -> bool {
        match store.delete(id) {
            Ok(()) => {
                self.records.retain(|record| record.id() != id);
                true
            }
            Err(error) => {
                notifier.report(&format!("delete failed: {error:#}"));
                false
            }
        }
    }

    /// Flip fields across the subset matching `match_key == match_value`
    /// as one bulk store write, then mirror the patch locally. Returns
    /// the number of local records patched.
    pub fn toggle_all(
        &mut self,
        store: &mut dyn RecordStore<R>,
        notifier: &mut dyn Notifier,
        match_key: &'static str,
        match_value: &CellValue,
        patch: &[FieldWrite],
    ) -> usize {
        if let Err(error) = store.update_where(match_key, match_value, patch) {
            notifier.report(&format!("bulk update failed: {error:#}"));
            return 0;
        }
        let mut patched = 0;
        for record in &mut self.records {
            if record.value(match_key) != *match_value {
                continue;
            }
            for (key, value) in patch {
                if let Err(error) = record.apply(key, value) {
                    notifier.report(&format!("{error:#}"));
                }
            }
            patched += 1;
        }
        patched
    }

    /// Begin editing a cell. Seeds the buffer from the record's current
    /// value, or the column's seed hook for composite columns. Any prior
    /// edit in the shared session is discarded, whichever grid owned it.
    pub fn begin_edit(&self, session: &mut EditSession, row_id: i64, key: &str) -> bool {
        if session.is_saving() {
            return false;
        }
        let Some(column) = self.schema.column(key) else {
            return false;
        };
        if !column.editable {
            return false;
        }
        let Some(record) = self.record(row_id) else {
            return false;
        };
        let seed = match column.seed {
            Some(seed) => seed(record),
            None => record.value(column.key).display(),
        };
        session.begin(
            EditCell {
                entity: self.schema.entity,
                row_id,
                key: column.key,
            },
            seed,
        )
    }

    pub fn cancel_edit(&self, session: &mut EditSession) {
        session.cancel();
    }

    /// Confirm the in-flight edit. Custom columns delegate wholly to
    /// their commit hook; the partition column applies the
    /// cross-partition reassignment rule; everything else is a
    /// single-field update. A buffer that fails to parse keeps the cell
    /// in editing so the operator can fix it; a store failure resolves
    /// to idle with local state untouched.
    pub fn commit_edit(
        &mut self,
        session: &mut EditSession,
        store: &mut dyn RecordStore<R>,
        notifier: &mut dyn Notifier,
    ) -> bool {
        let Some(cell) = session.cell().cloned() else {
            return false;
        };
        if cell.entity != self.schema.entity {
            return false;
        }
        let Some(buffer) = session.buffer().map(str::to_owned) else {
            return false;
        };
        let Some(column) = self.schema.column(cell.key).cloned() else {
            session.cancel();
            return false;
        };
        let Some(index) = self
            .records
            .iter()
            .position(|record| record.id() == cell.row_id)
        else {
            session.cancel();
            notifier.report(&format!("{} row no longer exists", self.schema.entity));
            return false;
        };

        if let Some(commit) = column.commit {
            session.take_for_save();
            let committed = commit(store, &self.records[index], &buffer);
            session.settle();
            return match committed {
                Ok(updated) => {
                    self.records[index] = updated;
                    sort_for_display(&mut self.records);
                    true
                }
                Err(error) => {
                    notifier.report(&format!("save failed: {error:#}"));
                    false
                }
            };
        }

        if self.schema.partition_column == Some(cell.key) {
            return self.commit_partition_edit(session, store, notifier, index, &buffer);
        }

        let value = match column.parse_input(&buffer) {
            Ok(value) => value,
            Err(error) => {
                notifier.report(&format!("{error:#}"));
                return false;
            }
        };
        session.take_for_save();
        let written = store.update(cell.row_id, &[(column.key, value.clone())]);
        session.settle();
        match written {
            Ok(_) => {
                if let Err(error) = self.records[index].apply(column.key, &value) {
                    notifier.report(&format!("{error:#}"));
                }
                sort_for_display(&mut self.records);
                true
            }
            Err(error) => {
                notifier.report(&format!("save failed: {error:#}"));
                false
            }
        }
    }

    /// Assigning into a partition appends at `1 + max(order)`; clearing
    /// the cell unassigns and nulls the order. Both fields go in one
    /// write.
    fn commit_partition_edit(
        &mut self,
        session: &mut EditSession,
        store: &mut dyn RecordStore<R>,
        notifier: &mut dyn Notifier,
        index: usize,
        buffer: &str,
    ) -> bool {
        let (Some(partition_column), Some(order_column)) =
            (self.schema.partition_column, self.schema.order_column)
        else {
            session.cancel();
            return false;
        };

        let trimmed = buffer.trim();
        let target = if trimmed.is_empty() {
            None
        } else {
            match trimmed.parse::<i64>() {
                Ok(partition) => Some(partition),
                Err(_) => {
                    notifier.report(&format!(
                        "{partition_column} expects a whole number, got {trimmed:?}"
                    ));
                    return false;
                }
            }
        };

        if self.records[index].partition() == target {
            session.cancel();
            return true;
        }

        let patch: Vec<FieldWrite> = match target {
            Some(partition) => vec![
                (partition_column, CellValue::Integer(partition)),
                (
                    order_column,
                    CellValue::Integer(self.next_order_in(partition)),
                ),
            ],
            None => vec![
                (partition_column, CellValue::Null),
                (order_column, CellValue::Null),
            ],
        };

        let row_id = self.records[index].id();
        session.take_for_save();
        let written = store.update(row_id, &patch);
        session.settle();
        match written {
            Ok(updated) => {
                self.records[index] = updated;
                sort_for_display(&mut self.records);
                true
            }
            Err(error) => {
                notifier.report(&format!("save failed: {error:#}"));
                false
            }
        }
    }

    /// Apply an in-partition drag. Local order changes first; one store
    /// write per changed row follows, each failure reported and none
    /// rolled back.
    pub fn reorder(
        &mut self,
        store: &mut dyn RecordStore<R>,
        notifier: &mut dyn Notifier,
        dragged_id: i64,
        dropped_on_id: i64,
    ) -> ReorderOutcome {
        let Some(order_column) = self.schema.order_column else {
            return ReorderOutcome::Rejected;
        };
        match reorder::plan_move(&self.records, dragged_id, dropped_on_id) {
            ReorderPlan::CrossPartition => {
                notifier.report("rows must share a route to reorder");
                ReorderOutcome::Rejected
            }
            ReorderPlan::Unchanged => ReorderOutcome::Unchanged,
            ReorderPlan::Writes(writes) => {
                for write in &writes {
                    if let Some(record) = self
                        .records
                        .iter_mut()
                        .find(|record| record.id() == write.id)
                        && let Err(error) =
                            record.apply(order_column, &CellValue::Integer(write.order))
                    {
                        notifier.report(&format!("{error:#}"));
                    }
                }
                sort_for_display(&mut self.records);

                let mut failures = 0;
                for write in &writes {
                    let patch = [(order_column, CellValue::Integer(write.order))];
                    if let Err(error) = store.update(write.id, &patch) {
                        failures += 1;
                        notifier.report(&format!(
                            "order save failed for row {}: {error:#}",
                            write.id
                        ));
                    }
                }
                ReorderOutcome::Applied {
                    written: writes.len(),
                    failures,
                }
            }
        }
    }
}
