// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, FormKind, TabKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: TabKind::Visits,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    BeginEdit,
    BeginSearch,
    BeginConfirm,
    BeginMove,
    OpenForm(FormKind),
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    TabChanged(TabKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::BeginEdit => self.enter(AppMode::Edit),
            AppCommand::BeginSearch => self.enter(AppMode::Search),
            AppCommand::BeginConfirm => self.enter(AppMode::Confirm),
            AppCommand::BeginMove => self.enter(AppMode::Move),
            AppCommand::OpenForm(kind) => self.enter(AppMode::Form(kind)),
            AppCommand::ExitToNav => self.enter(AppMode::Nav),
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn enter(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        vec![AppEvent::ModeChanged(self.mode)]
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        vec![AppEvent::TabChanged(self.active_tab)]
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};
    use crate::{AppMode, FormKind, TabKind};

    #[test]
    fn tab_rotation_wraps() {
        let mut state = AppState {
            active_tab: TabKind::Items,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextTab);
        assert_eq!(state.active_tab, TabKind::Visits);
        assert_eq!(events, vec![AppEvent::TabChanged(TabKind::Visits)]);

        state.dispatch(AppCommand::PrevTab);
        assert_eq!(state.active_tab, TabKind::Items);
    }

    #[test]
    fn mode_transitions() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::BeginEdit);
        assert_eq!(state.mode, AppMode::Edit);

        state.dispatch(AppCommand::OpenForm(FormKind::Visit));
        assert_eq!(state.mode, AppMode::Form(FormKind::Visit));

        state.dispatch(AppCommand::ExitToNav);
        assert_eq!(state.mode, AppMode::Nav);
    }

    #[test]
    fn status_line_set_and_clear() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::SetStatus("saved".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("saved"));
        assert_eq!(events, vec![AppEvent::StatusUpdated("saved".to_owned())]);

        state.dispatch(AppCommand::ClearStatus);
        assert_eq!(state.status_line, None);
    }
}
