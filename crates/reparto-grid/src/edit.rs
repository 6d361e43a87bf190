// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Address of the cell being edited. `entity` disambiguates between the
/// grids sharing one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCell {
    pub entity: &'static str,
    pub row_id: i64,
    pub key: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditPhase {
    #[default]
    Idle,
    Editing {
        cell: EditCell,
        buffer: String,
    },
    Saving {
        cell: EditCell,
    },
}

/// The single inline-edit slot shared by every grid in the console. At
/// most one cell is ever editable; starting an edit elsewhere discards
/// the previous buffer without persisting it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditSession {
    phase: EditPhase,
}

impl EditSession {
    pub fn phase(&self) -> &EditPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, EditPhase::Idle)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.phase, EditPhase::Saving { .. })
    }

    /// The cell currently being edited or saved, if any.
    pub fn cell(&self) -> Option<&EditCell> {
        match &self.phase {
            EditPhase::Idle => None,
            EditPhase::Editing { cell, .. } | EditPhase::Saving { cell } => Some(cell),
        }
    }

    pub fn is_editing(&self, entity: &str, row_id: i64, key: &str) -> bool {
        matches!(
            &self.phase,
            EditPhase::Editing { cell, .. }
                if cell.entity == entity && cell.row_id == row_id && cell.key == key
        )
    }

    pub fn buffer(&self) -> Option<&str> {
        match &self.phase {
            EditPhase::Editing { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Begin editing `cell` with `seed` as the buffer. Any prior edit is
    /// resolved to idle first, its buffer discarded. Rejected while a
    /// save is in flight.
    pub fn begin(&mut self, cell: EditCell, seed: String) -> bool {
        if self.is_saving() {
            return false;
        }
        self.phase = EditPhase::Editing { cell, buffer: seed };
        true
    }

    pub fn replace_buffer(&mut self, value: String) {
        if let EditPhase::Editing { buffer, .. } = &mut self.phase {
            *buffer = value;
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let EditPhase::Editing { buffer, .. } = &mut self.phase {
            buffer.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let EditPhase::Editing { buffer, .. } = &mut self.phase {
            buffer.pop();
        }
    }

    /// Discard the buffer and return to idle. No persistence.
    pub fn cancel(&mut self) {
        if matches!(self.phase, EditPhase::Editing { .. }) {
            self.phase = EditPhase::Idle;
        }
    }

    /// Transition `Editing -> Saving`, yielding the cell and buffer for
    /// the commit path. Returns `None` unless editing.
    pub fn take_for_save(&mut self) -> Option<(EditCell, String)> {
        match std::mem::take(&mut self.phase) {
            EditPhase::Editing { cell, buffer } => {
                self.phase = EditPhase::Saving { cell: cell.clone() };
                Some((cell, buffer))
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Transition `Saving -> Idle` once the commit path resolves, whether
    /// it succeeded or failed.
    pub fn settle(&mut self) {
        if matches!(self.phase, EditPhase::Saving { .. }) {
            self.phase = EditPhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EditCell, EditPhase, EditSession};

    fn cell(entity: &'static str, row_id: i64, key: &'static str) -> EditCell {
        EditCell {
            entity,
            row_id,
            key,
        }
    }

    #[test]
    fn begin_seeds_the_buffer() {
        let mut session = EditSession::default();
        assert!(session.begin(cell("visits", 3, "buyer"), "John".to_owned()));
        assert!(session.is_editing("visits", 3, "buyer"));
        assert_eq!(session.buffer(), Some("John"));
    }

    #[test]
    fn beginning_elsewhere_discards_prior_buffer() {
        let mut session = EditSession::default();
        session.begin(cell("visits", 3, "buyer"), "half-typed".to_owned());
        session.begin(cell("referrers", 9, "name"), "Ana".to_owned());
        assert!(!session.is_editing("visits", 3, "buyer"));
        assert!(session.is_editing("referrers", 9, "name"));
        assert_eq!(session.buffer(), Some("Ana"));
    }

    #[test]
    fn cancel_discards_without_persisting() {
        let mut session = EditSession::default();
        session.begin(cell("visits", 3, "buyer"), "John".to_owned());
        session.cancel();
        assert!(session.is_idle());
        assert_eq!(session.buffer(), None);
    }

    #[test]
    fn take_for_save_moves_to_saving() {
        let mut session = EditSession::default();
        session.begin(cell("visits", 3, "buyer"), "John".to_owned());
        let (taken, buffer) = session.take_for_save().expect("was editing");
        assert_eq!(taken, cell("visits", 3, "buyer"));
        assert_eq!(buffer, "John");
        assert!(session.is_saving());

        session.settle();
        assert!(session.is_idle());
    }

    #[test]
    fn begin_is_rejected_while_saving() {
        let mut session = EditSession::default();
        session.begin(cell("visits", 3, "buyer"), "John".to_owned());
        session.take_for_save();
        assert!(!session.begin(cell("visits", 4, "buyer"), "Ana".to_owned()));
        assert!(session.is_saving());
    }

    #[test]
    fn take_for_save_on_idle_is_a_no_op() {
        let mut session = EditSession::default();
        assert!(session.take_for_save().is_none());
        assert_eq!(*session.phase(), EditPhase::Idle);
    }

    #[test]
    fn typing_edits_the_buffer() {
        let mut session = EditSession::default();
        session.begin(cell("items", 1, "name"), "Des".to_owned());
        session.push_char('k');
        assert_eq!(session.buffer(), Some("Desk"));
        session.pop_char();
        assert_eq!(session.buffer(), Some("Des"));
    }
}
