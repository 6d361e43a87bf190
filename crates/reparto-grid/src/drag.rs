// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Minimum pointer travel, in terminal cells, before a press becomes a
/// drag rather than a click.
pub const DRAG_ACTIVATION_CELLS: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GestureState {
    #[default]
    Idle,
    Armed {
        origin: (u16, u16),
        row_id: i64,
    },
    Dragging {
        row_id: i64,
    },
}

/// What a completed gesture meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// No press was in progress.
    Ignored,
    /// Released below the activation threshold.
    Click { row_id: i64 },
    /// A drag released over another row.
    Drop { dragged: i64, dropped_on: i64 },
    /// A drag released outside any row.
    Cancelled,
}

/// Pointer state machine turning press/move/release triples into clicks
/// and `(dragged, dropped_on)` pairs. Row hit-testing is the caller's
/// job; this only tracks travel against the activation threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragGesture {
    state: GestureState,
}

impl DragGesture {
    pub fn press(&mut self, column: u16, row: u16, row_id: Option<i64>) {
        self.state = match row_id {
            Some(row_id) => GestureState::Armed {
                origin: (column, row),
                row_id,
            },
            None => GestureState::Idle,
        };
    }

    pub fn moved(&mut self, column: u16, row: u16) {
        if let GestureState::Armed { origin, row_id } = self.state {
            let travel = origin.0.abs_diff(column).max(origin.1.abs_diff(row));
            if travel >= DRAG_ACTIVATION_CELLS {
                self.state = GestureState::Dragging { row_id };
            }
        }
    }

    pub fn release(&mut self, row_id_under_pointer: Option<i64>) -> DragOutcome {
        let outcome = match self.state {
            GestureState::Idle => DragOutcome::Ignored,
            GestureState::Armed { row_id, .. } => DragOutcome::Click { row_id },
            GestureState::Dragging { row_id } => match row_id_under_pointer {
                Some(dropped_on) => DragOutcome::Drop {
                    dragged: row_id,
                    dropped_on,
                },
                None => DragOutcome::Cancelled,
            },
        };
        self.state = GestureState::Idle;
        outcome
    }

    /// The row being dragged, for drop-target highlighting.
    pub fn dragging(&self) -> Option<i64> {
        match self.state {
            GestureState::Dragging { row_id } => Some(row_id),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }
}
