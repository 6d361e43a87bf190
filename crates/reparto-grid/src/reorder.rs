// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::record::GridRecord;

/// One row whose persisted order must change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite {
    pub id: i64,
    pub order: i64,
}

/// Outcome of planning an in-partition move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderPlan {
    /// The dragged row and the drop target do not share a partition, or
    /// either carries none. Rejected, nothing to do.
    CrossPartition,
    /// Every row already has its computed order; zero writes.
    Unchanged,
    /// Rows whose order changed, one write each.
    Writes(Vec<OrderWrite>),
}

/// Display ordering: partition ascending with unpartitioned rows last
/// (ties broken by the partition id), then order ascending, then the
/// case-insensitive label whenever order is absent on either side.
pub fn display_cmp<R: GridRecord>(left: &R, right: &R) -> Ordering {
    match (left.partition(), right.partition()) {
        (Some(a), Some(b)) if a != b => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => match (left.order(), right.order()) {
            (Some(a), Some(b)) if a != b => a.cmp(&b),
            _ => label_cmp(left, right),
        },
    }
}

fn label_cmp<R: GridRecord>(left: &R, right: &R) -> Ordering {
    left.label()
        .to_ascii_lowercase()
        .cmp(&right.label().to_ascii_lowercase())
}

pub fn sort_for_display<R: GridRecord>(rows: &mut [R]) {
    rows.sort_by(display_cmp);
}

/// Plan the order writes for dropping `dragged_id` onto `dropped_on_id`.
///
/// `rows` must be in display order. The dragged row is array-moved to
/// the drop target's index (remove, then insert), the result restricted
/// to the dragged row's partition, and orders reassigned as the 1-based
/// position within that restriction. Only rows whose order actually
/// changed are planned for writing, so dropping a row onto its own
/// position plans zero writes. Pre-existing duplicate orders inside the
/// partition come out renumbered into a contiguous sequence.
pub fn plan_move<R: GridRecord>(rows: &[R], dragged_id: i64, dropped_on_id: i64) -> ReorderPlan {
    let Some(from) = rows.iter().position(|row| row.id() == dragged_id) else {
        return ReorderPlan::Unchanged;
    };
    let Some(to) = rows.iter().position(|row| row.id() == dropped_on_id) else {
        return ReorderPlan::Unchanged;
    };

    let Some(partition) = rows[from].partition() else {
        return ReorderPlan::CrossPartition;
    };
    if rows[to].partition() != Some(partition) {
        return ReorderPlan::CrossPartition;
    }

    let mut sequence: Vec<&R> = rows.iter().collect();
    let moved = sequence.remove(from);
    sequence.insert(to, moved);

    let mut writes = Vec::new();
    let mut position = 0;
    for row in sequence {
        if row.partition() != Some(partition) {
            continue;
        }
        position += 1;
        if row.order() != Some(position) {
            writes.push(OrderWrite {
                id: row.id(),
                order: position,
            });
        }
    }

    if writes.is_empty() {
        ReorderPlan::Unchanged
    } else {
        ReorderPlan::Writes(writes)
    }
}

/// Order for a row entering `partition`: one past the highest existing
/// order, or 1 when the partition is empty.
pub fn next_order_in<R: GridRecord>(rows: &[R], partition: i64) -> i64 {
    1 + rows
        .iter()
        .filter(|row| row.partition() == Some(partition))
        .filter_map(GridRecord::order)
        .max()
        .unwrap_or(0)
}
