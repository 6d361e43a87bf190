// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use reparto_app::{
    AppCommand, AppMode, AppState, CatalogItem, DeliveryRoute, FormKind, FormPayload, ItemFormInput,
    ItemId, Referrer, ReferrerFormInput, ReferrerId, ReferrerRole, RouteFormInput, RouteId, TabKind,
    Visit, VisitFormInput, VisitId, VisitKind, VisitStatus, item_schema, referrer_schema,
    route_schema, visit_route_filters, visit_schema,
};
use reparto_grid::{
    CellValue, DateRange, DragGesture, DragOutcome, EditSession, FilterCategory, GridController,
    GridRecord, Notifier, RecordStore, ReorderOutcome, parse_cents, parse_day,
};
use std::io;
use std::time::Duration;
use time::OffsetDateTime;

/// First terminal row holding table data: three tab rows, the table's
/// top border and its header row. Mouse hit-testing counts from here.
const TABLE_TOP: u16 = 5;

/// Everything the console needs from its environment: one record store
/// per grid. Implementations hand out the concrete persistence
/// adapters.
pub trait ConsoleRuntime {
    fn visits(&mut self) -> &mut dyn RecordStore<Visit>;
    fn routes(&mut self) -> &mut dyn RecordStore<DeliveryRoute>;
    fn referrers(&mut self) -> &mut dyn RecordStore<Referrer>;
    fn items(&mut self) -> &mut dyn RecordStore<CatalogItem>;
}

/// Notifier that collects messages for the status line.
#[derive(Debug, Default)]
pub struct StatusNotifier {
    pub messages: Vec<String>,
}

impl Notifier for StatusNotifier {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }
}

/// The four grids plus the shared edit session and drag recognizer.
pub struct Console {
    pub visits: GridController<Visit>,
    pub routes: GridController<DeliveryRoute>,
    pub referrers: GridController<Referrer>,
    pub items: GridController<CatalogItem>,
    pub edit: EditSession,
    pub drag: DragGesture,
}

impl Console {
    pub fn new() -> Result<Self> {
        Ok(Self {
            visits: GridController::new(visit_schema())?,
            routes: GridController::new(route_schema())?,
            referrers: GridController::new(referrer_schema())?,
            items: GridController::new(item_schema())?,
            edit: EditSession::default(),
            drag: DragGesture::default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Cursor {
    row: usize,
    col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormField {
    label: &'static str,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    kind: FormKind,
    fields: Vec<FormField>,
    cursor: usize,
}

impl FormUiState {
    fn blank(kind: FormKind) -> Self {
        let labels: &[&'static str] = match kind {
            FormKind::Visit => &[
                "buyer",
                "address",
                "kind",
                "status",
                "date",
                "phone mobile",
                "phone home",
                "phone work",
                "route",
                "items",
                "referrer",
                "notes",
            ],
            FormKind::Route => &["name", "driver", "notes"],
            FormKind::Referrer => &["name", "phone", "role", "access", "notes"],
            FormKind::Item => &["name", "price", "notes"],
        };
        Self {
            kind,
            fields: labels
                .iter()
                .map(|label| FormField {
                    label: *label,
                    buffer: String::new(),
                })
                .collect(),
            cursor: 0,
        }
    }

    fn field(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map_or("", |field| field.buffer.as_str())
    }
}

/// Where search-mode keystrokes land: the free-text search or one
/// column's filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchTarget {
    Global,
    Column(&'static str),
}

/// Mutable view state around the grids: per-tab cursors and scroll
/// offsets, transient input buffers and the overlay states.
pub struct ViewData {
    pub console: Console,
    cursors: [Cursor; 4],
    scrolls: [usize; 4],
    filter_cursors: [usize; 4],
    search_input: String,
    search_target: SearchTarget,
    form: Option<FormUiState>,
    pending_delete: Option<i64>,
    grabbed_row: Option<i64>,
    viewport_rows: usize,
}

impl ViewData {
    pub fn new() -> Result<Self> {
        Ok(Self {
            console: Console::new()?,
            cursors: [Cursor::default(); 4],
            scrolls: [0; 4],
            filter_cursors: [0; 4],
            search_input: String::new(),
            search_target: SearchTarget::Global,
            form: None,
            pending_delete: None,
            grabbed_row: None,
            viewport_rows: 20,
        })
    }
}

fn tab_index(tab: TabKind) -> usize {
    TabKind::ALL
        .iter()
        .position(|candidate| *candidate == tab)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RowView {
    id: i64,
    cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableView {
    headers: Vec<&'static str>,
    rows: Vec<RowView>,
}

fn project<R: GridRecord>(grid: &GridController<R>) -> TableView {
    let headers: Vec<&'static str> = grid
        .schema()
        .columns
        .iter()
        .map(|column| column.header)
        .collect();
    let rows = grid
        .visible()
        .into_iter()
        .map(|record| RowView {
            id: record.id(),
            cells: grid
                .schema()
                .columns
                .iter()
                .map(|column| record.value(column.key).display())
                .collect(),
        })
        .collect();
    TableView { headers, rows }
}

fn table_view(view: &ViewData, tab: TabKind) -> TableView {
    match tab {
        TabKind::Visits => project(&view.console.visits),
        TabKind::Routes => project(&view.console.routes),
        TabKind::Referrers => project(&view.console.referrers),
        TabKind::Items => project(&view.console.items),
    }
}

fn column_count(view: &ViewData, tab: TabKind) -> usize {
    match tab {
        TabKind::Visits => view.console.visits.schema().columns.len(),
        TabKind::Routes => view.console.routes.schema().columns.len(),
        TabKind::Referrers => view.console.referrers.schema().columns.len(),
        TabKind::Items => view.console.items.schema().columns.len(),
    }
}

fn column_key(view: &ViewData, tab: TabKind, index: usize) -> Option<&'static str> {
    match tab {
        TabKind::Visits => view
            .console
            .visits
            .schema()
            .columns
            .get(index)
            .map(|column| column.key),
        TabKind::Routes => view
            .console
            .routes
            .schema()
            .columns
            .get(index)
            .map(|column| column.key),
        TabKind::Referrers => view
            .console
            .referrers
            .schema()
            .columns
            .get(index)
            .map(|column| column.key),
        TabKind::Items => view
            .console
            .items
            .schema()
            .columns
            .get(index)
            .map(|column| column.key),
    }
}

fn selected_row_id(view: &ViewData, tab: TabKind) -> Option<i64> {
    let rows = table_view(view, tab).rows;
    let cursor = view.cursors[tab_index(tab)];
    rows.get(cursor.row).map(|row| row.id)
}

fn clamp_cursor(view: &mut ViewData, tab: TabKind) {
    let row_count = table_view(view, tab).rows.len();
    let column_total = column_count(view, tab);
    let cursor = &mut view.cursors[tab_index(tab)];
    if row_count == 0 {
        cursor.row = 0;
    } else if cursor.row >= row_count {
        cursor.row = row_count - 1;
    }
    if column_total == 0 {
        cursor.col = 0;
    } else if cursor.col >= column_total {
        cursor.col = column_total - 1;
    }

    let scroll = &mut view.scrolls[tab_index(tab)];
    let page = view.viewport_rows.max(1);
    let row = view.cursors[tab_index(tab)].row;
    if row < *scroll {
        *scroll = row;
    } else if row >= *scroll + page {
        *scroll = row + 1 - page;
    }
}

/// Refresh every grid from its store and rebuild the per-route filters
/// to match the route list.
pub fn refresh_all<R: ConsoleRuntime>(runtime: &mut R, view: &mut ViewData) -> Result<()> {
    view.console.visits.refresh(runtime.visits())?;
    view.console.routes.refresh(runtime.routes())?;
    view.console.referrers.refresh(runtime.referrers())?;
    view.console.items.refresh(runtime.items())?;
    sync_route_filters(view);
    for tab in TabKind::ALL {
        clamp_cursor(view, tab);
    }
    Ok(())
}

fn sync_route_filters(view: &mut ViewData) {
    let routes: Vec<DeliveryRoute> = view.console.routes.records().to_vec();
    view.console
        .visits
        .replace_filters(FilterCategory::Route, visit_route_filters(&routes));
}

pub fn run_app<R: ConsoleRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view = ViewData::new()?;
    if let Err(error) = refresh_all(runtime, &mut view) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error:#}")));
    }

    let mut result = Ok(());
    loop {
        let size = terminal.size().context("terminal size")?;
        view.viewport_rows = usize::from(size.height.saturating_sub(9)).max(1);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if !has_event {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) => {
                if handle_key_event(state, runtime, &mut view, key) {
                    break;
                }
            }
            Event::Mouse(mouse) => handle_mouse_event(state, runtime, &mut view, mouse),
            Event::Resize(_, _) => {}
            _ => {}
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        terminal::LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("leave alternate screen")?;
    result
}

/// Route a key press by mode. Returns true when the app should quit.
pub fn handle_key_event<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    key: KeyEvent,
) -> bool {
    match state.mode {
        AppMode::Nav => handle_nav_key(state, runtime, view, key),
        AppMode::Edit => {
            handle_edit_key(state, runtime, view, key);
            false
        }
        AppMode::Search => {
            handle_search_key(state, view, key);
            false
        }
        AppMode::Confirm => {
            handle_confirm_key(state, runtime, view, key);
            false
        }
        AppMode::Move => {
            handle_move_key(state, runtime, view, key);
            false
        }
        AppMode::Form(_) => {
            handle_form_key(state, runtime, view, key);
            false
        }
    }
}

fn handle_nav_key<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    key: KeyEvent,
) -> bool {
    let tab = state.active_tab;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            state.dispatch(AppCommand::NextTab);
        }
        KeyCode::BackTab => {
            state.dispatch(AppCommand::PrevTab);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view.cursors[tab_index(tab)].row = view.cursors[tab_index(tab)].row.saturating_add(1);
            clamp_cursor(view, tab);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view.cursors[tab_index(tab)].row = view.cursors[tab_index(tab)].row.saturating_sub(1);
            clamp_cursor(view, tab);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view.cursors[tab_index(tab)].col = view.cursors[tab_index(tab)].col.saturating_sub(1);
            clamp_cursor(view, tab);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view.cursors[tab_index(tab)].col = view.cursors[tab_index(tab)].col.saturating_add(1);
            clamp_cursor(view, tab);
        }
        KeyCode::Char('g') => {
            view.cursors[tab_index(tab)].row = 0;
            clamp_cursor(view, tab);
        }
        KeyCode::Char('G') => {
            view.cursors[tab_index(tab)].row = usize::MAX;
            clamp_cursor(view, tab);
        }
        KeyCode::Char('e') | KeyCode::Enter => begin_edit_at_cursor(state, view),
        KeyCode::Char('a') => {
            let kind = FormKind::for_tab(tab);
            let mut form = FormUiState::blank(kind);
            // A new visit defaults onto the route currently filtered on.
            if tab == TabKind::Visits
                && let Some(selected) = view
                    .console
                    .visits
                    .filter()
                    .selected_in(FilterCategory::Route)
                && let Some(route) = selected.strip_prefix("route-")
                && let Some(field) = form.fields.iter_mut().find(|field| field.label == "route")
            {
                field.buffer = route.to_owned();
            }
            view.form = Some(form);
            state.dispatch(AppCommand::OpenForm(kind));
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected_row_id(view, tab) {
                view.pending_delete = Some(id);
                state.dispatch(AppCommand::BeginConfirm);
            }
        }
        KeyCode::Char('/') => {
            view.search_target = SearchTarget::Global;
            view.search_input = active_search(view, tab);
            state.dispatch(AppCommand::BeginSearch);
        }
        KeyCode::Char('=') => {
            if let Some(key) = column_key(view, tab, view.cursors[tab_index(tab)].col) {
                view.search_target = SearchTarget::Column(key);
                view.search_input = active_column_filter(view, tab, key);
                state.dispatch(AppCommand::BeginSearch);
            }
        }
        KeyCode::Char('D') => {
            if tab == TabKind::Visits {
                let today = OffsetDateTime::now_utc().date();
                let (range, label) =
                    next_date_scope(view.console.visits.filter().date_range(), today);
                view.console.visits.set_date_range(range);
                clamp_cursor(view, tab);
                state.dispatch(AppCommand::SetStatus(label.to_owned()));
            }
        }
        KeyCode::Char('f') => cycle_filter(state, view),
        KeyCode::Char('x') => {
            clear_filters(view, tab);
            state.dispatch(AppCommand::SetStatus("filters cleared".to_owned()));
        }
        KeyCode::Char('c') => {
            let collapsed = toggle_collapsed(view, tab);
            let label = if collapsed { "section collapsed" } else { "section expanded" };
            state.dispatch(AppCommand::SetStatus(label.to_owned()));
        }
        KeyCode::Char('m') => {
            if tab == TabKind::Visits
                && let Some(id) = selected_row_id(view, tab)
            {
                view.grabbed_row = Some(id);
                state.dispatch(AppCommand::BeginMove);
            }
        }
        KeyCode::Char('t') => {
            if tab == TabKind::Referrers {
                toggle_all_access(state, runtime, view);
            }
        }
        KeyCode::Char('r') => {
            let message = match refresh_all(runtime, view) {
                Ok(()) => "refreshed".to_owned(),
                Err(error) => format!("refresh failed: {error:#}"),
            };
            state.dispatch(AppCommand::SetStatus(message));
        }
        _ => {}
    }
    false
}

fn active_search(view: &ViewData, tab: TabKind) -> String {
    match tab {
        TabKind::Visits => view.console.visits.filter().search().to_owned(),
        TabKind::Routes => view.console.routes.filter().search().to_owned(),
        TabKind::Referrers => view.console.referrers.filter().search().to_owned(),
        TabKind::Items => view.console.items.filter().search().to_owned(),
    }
}

fn active_column_filter(view: &ViewData, tab: TabKind, key: &str) -> String {
    let value = match tab {
        TabKind::Visits => view.console.visits.filter().column_filter(key),
        TabKind::Routes => view.console.routes.filter().column_filter(key),
        TabKind::Referrers => view.console.referrers.filter().column_filter(key),
        TabKind::Items => view.console.items.filter().column_filter(key),
    };
    value.unwrap_or("").to_owned()
}

fn apply_search(view: &mut ViewData, tab: TabKind, term: &str) {
    match view.search_target {
        SearchTarget::Global => match tab {
            TabKind::Visits => view.console.visits.set_search(term),
            TabKind::Routes => view.console.routes.set_search(term),
            TabKind::Referrers => view.console.referrers.set_search(term),
            TabKind::Items => view.console.items.set_search(term),
        },
        SearchTarget::Column(key) => match tab {
            TabKind::Visits => view.console.visits.set_column_filter(key, term),
            TabKind::Routes => view.console.routes.set_column_filter(key, term),
            TabKind::Referrers => view.console.referrers.set_column_filter(key, term),
            TabKind::Items => view.console.items.set_column_filter(key, term),
        },
    }
    clamp_cursor(view, tab);
}

/// Cycle the visit date scope: everything, the week from `today`, the
/// thirty days from `today`, back to everything.
fn next_date_scope(current: DateRange, today: time::Date) -> (DateRange, &'static str) {
    let week = DateRange {
        start: Some(today),
        end: today.checked_add(time::Duration::days(6)),
    };
    let month = DateRange {
        start: Some(today),
        end: today.checked_add(time::Duration::days(29)),
    };
    if current.is_unbounded() {
        (week, "visits in the next 7 days")
    } else if current == week {
        (month, "visits in the next 30 days")
    } else {
        (DateRange::default(), "all visit dates")
    }
}

fn clear_filters(view: &mut ViewData, tab: TabKind) {
    match tab {
        TabKind::Visits => view.console.visits.clear_filters(),
        TabKind::Routes => view.console.routes.clear_filters(),
        TabKind::Referrers => view.console.referrers.clear_filters(),
        TabKind::Items => view.console.items.clear_filters(),
    }
    clamp_cursor(view, tab);
}

fn toggle_collapsed(view: &mut ViewData, tab: TabKind) -> bool {
    match tab {
        TabKind::Visits => {
            let collapsed = !view.console.visits.is_collapsed();
            view.console.visits.set_collapsed(collapsed);
            collapsed
        }
        TabKind::Routes => {
            let collapsed = !view.console.routes.is_collapsed();
            view.console.routes.set_collapsed(collapsed);
            collapsed
        }
        TabKind::Referrers => {
            let collapsed = !view.console.referrers.is_collapsed();
            view.console.referrers.set_collapsed(collapsed);
            collapsed
        }
        TabKind::Items => {
            let collapsed = !view.console.items.is_collapsed();
            view.console.items.set_collapsed(collapsed);
            collapsed
        }
    }
}

/// Walk the schema's filters one keypress at a time; each press selects
/// the next filter, replacing within its category.
fn cycle_filter(state: &mut AppState, view: &mut ViewData) {
    let tab = state.active_tab;
    let index = tab_index(tab);
    let (key, label) = {
        let (keys, labels): (Vec<String>, Vec<String>) = match tab {
            TabKind::Visits => filter_keys(&view.console.visits),
            TabKind::Routes => filter_keys(&view.console.routes),
            TabKind::Referrers => filter_keys(&view.console.referrers),
            TabKind::Items => filter_keys(&view.console.items),
        };
        if keys.is_empty() {
            state.dispatch(AppCommand::SetStatus("no filters on this tab".to_owned()));
            return;
        }
        let cursor = view.filter_cursors[index] % keys.len();
        view.filter_cursors[index] = cursor + 1;
        (keys[cursor].clone(), labels[cursor].clone())
    };
    match tab {
        TabKind::Visits => view.console.visits.select_filter(&key),
        TabKind::Routes => view.console.routes.select_filter(&key),
        TabKind::Referrers => view.console.referrers.select_filter(&key),
        TabKind::Items => view.console.items.select_filter(&key),
    }
    clamp_cursor(view, tab);
    state.dispatch(AppCommand::SetStatus(format!("filter: {label}")));
}

fn filter_keys<R: GridRecord>(grid: &GridController<R>) -> (Vec<String>, Vec<String>) {
    let keys = grid
        .schema()
        .filters
        .iter()
        .map(|filter| filter.key.clone())
        .collect();
    let labels = grid
        .schema()
        .filters
        .iter()
        .map(|filter| filter.label.clone())
        .collect();
    (keys, labels)
}

fn begin_edit_at_cursor(state: &mut AppState, view: &mut ViewData) {
    let tab = state.active_tab;
    let Some(row_id) = selected_row_id(view, tab) else {
        return;
    };
    let Some(key) = column_key(view, tab, view.cursors[tab_index(tab)].col) else {
        return;
    };
    let began = match tab {
        TabKind::Visits => {
            let Console { visits, edit, .. } = &mut view.console;
            visits.begin_edit(edit, row_id, key)
        }
        TabKind::Routes => {
            let Console { routes, edit, .. } = &mut view.console;
            routes.begin_edit(edit, row_id, key)
        }
        TabKind::Referrers => {
            let Console { referrers, edit, .. } = &mut view.console;
            referrers.begin_edit(edit, row_id, key)
        }
        TabKind::Items => {
            let Console { items, edit, .. } = &mut view.console;
            items.begin_edit(edit, row_id, key)
        }
    };
    if began {
        state.dispatch(AppCommand::BeginEdit);
    } else {
        state.dispatch(AppCommand::SetStatus("cell is not editable".to_owned()));
    }
}

fn handle_edit_key<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view.console.edit.cancel();
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Enter => commit_active_edit(state, runtime, view),
        KeyCode::Backspace => view.console.edit.pop_char(),
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            // Multi-line buffers (the phones column) take ctrl-n as a
            // line break.
            view.console.edit.push_char('\n');
        }
        KeyCode::Char(ch) => view.console.edit.push_char(ch),
        _ => {}
    }
}

fn commit_grid<R: GridRecord>(
    grid: &mut GridController<R>,
    session: &mut EditSession,
    store: &mut dyn RecordStore<R>,
) -> (bool, Vec<String>) {
    let mut notifier = StatusNotifier::default();
    let committed = grid.commit_edit(session, store, &mut notifier);
    (committed, notifier.messages)
}

fn commit_active_edit<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
) {
    let (committed, messages) = match state.active_tab {
        TabKind::Visits => {
            let Console { visits, edit, .. } = &mut view.console;
            commit_grid(visits, edit, runtime.visits())
        }
        TabKind::Routes => {
            let Console { routes, edit, .. } = &mut view.console;
            commit_grid(routes, edit, runtime.routes())
        }
        TabKind::Referrers => {
            let Console { referrers, edit, .. } = &mut view.console;
            commit_grid(referrers, edit, runtime.referrers())
        }
        TabKind::Items => {
            let Console { items, edit, .. } = &mut view.console;
            commit_grid(items, edit, runtime.items())
        }
    };

    let message = messages
        .into_iter()
        .next_back()
        .unwrap_or_else(|| if committed { "saved".to_owned() } else { String::new() });
    if !message.is_empty() {
        state.dispatch(AppCommand::SetStatus(message));
    }

    if state.active_tab == TabKind::Routes && committed {
        // Route names feed the visit filter labels.
        sync_route_filters(view);
    }
    if view.console.edit.is_idle() {
        state.dispatch(AppCommand::ExitToNav);
        clamp_cursor(view, state.active_tab);
    }
}

fn handle_search_key(state: &mut AppState, view: &mut ViewData, key: KeyEvent) {
    let tab = state.active_tab;
    match key.code {
        KeyCode::Esc => {
            view.search_input.clear();
            apply_search(view, tab, "");
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Backspace => {
            view.search_input.pop();
            let term = view.search_input.clone();
            apply_search(view, tab, &term);
        }
        KeyCode::Char(ch) => {
            view.search_input.push(ch);
            let term = view.search_input.clone();
            apply_search(view, tab, &term);
        }
        _ => {}
    }
}

fn handle_confirm_key<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    key: KeyEvent,
) {
    let pending = view.pending_delete.take();
    state.dispatch(AppCommand::ExitToNav);
    let Some(id) = pending else {
        return;
    };
    if key.code != KeyCode::Char('y') {
        state.dispatch(AppCommand::SetStatus("delete canceled".to_owned()));
        return;
    }

    let mut notifier = StatusNotifier::default();
    let deleted = match state.active_tab {
        TabKind::Visits => view
            .console
            .visits
            .delete(runtime.visits(), &mut notifier, id),
        TabKind::Routes => view
            .console
            .routes
            .delete(runtime.routes(), &mut notifier, id),
        TabKind::Referrers => {
            view.console
                .referrers
                .delete(runtime.referrers(), &mut notifier, id)
        }
        TabKind::Items => view.console.items.delete(runtime.items(), &mut notifier, id),
    };
    let message = notifier
        .messages
        .into_iter()
        .next_back()
        .unwrap_or_else(|| if deleted { "deleted".to_owned() } else { String::new() });
    if !message.is_empty() {
        state.dispatch(AppCommand::SetStatus(message));
    }
    if deleted && state.active_tab == TabKind::Routes {
        sync_route_filters(view);
    }
    clamp_cursor(view, state.active_tab);
}

fn handle_move_key<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    key: KeyEvent,
) {
    let tab = state.active_tab;
    match key.code {
        KeyCode::Esc => {
            view.grabbed_row = None;
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view.cursors[tab_index(tab)].row = view.cursors[tab_index(tab)].row.saturating_add(1);
            clamp_cursor(view, tab);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view.cursors[tab_index(tab)].row = view.cursors[tab_index(tab)].row.saturating_sub(1);
            clamp_cursor(view, tab);
        }
        KeyCode::Enter => {
            let grabbed = view.grabbed_row.take();
            state.dispatch(AppCommand::ExitToNav);
            let (Some(dragged), Some(dropped_on)) = (grabbed, selected_row_id(view, tab)) else {
                return;
            };
            apply_reorder(state, runtime, view, dragged, dropped_on);
        }
        _ => {}
    }
}

fn apply_reorder<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    dragged: i64,
    dropped_on: i64,
) {
    let mut notifier = StatusNotifier::default();
    let outcome = view
        .console
        .visits
        .reorder(runtime.visits(), &mut notifier, dragged, dropped_on);
    let message = match outcome {
        ReorderOutcome::Rejected => notifier
            .messages
            .into_iter()
            .next_back()
            .unwrap_or_else(|| "reorder rejected".to_owned()),
        ReorderOutcome::Unchanged => "order unchanged".to_owned(),
        ReorderOutcome::Applied { written, failures } if failures == 0 => {
            format!("order saved ({written} rows)")
        }
        ReorderOutcome::Applied { failures, .. } => notifier
            .messages
            .into_iter()
            .next_back()
            .unwrap_or_else(|| format!("{failures} order writes failed")),
    };
    state.dispatch(AppCommand::SetStatus(message));
    clamp_cursor(view, TabKind::Visits);
}

fn toggle_all_access<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
) {
    let enable = view
        .console
        .referrers
        .records()
        .iter()
        .any(|referrer| referrer.role == ReferrerRole::Ref && !referrer.access_enabled);
    let mut notifier = StatusNotifier::default();
    let patched = view.console.referrers.toggle_all(
        runtime.referrers(),
        &mut notifier,
        "role",
        &CellValue::Text("ref".to_owned()),
        &[("access", CellValue::Bool(enable))],
    );
    let message = notifier.messages.into_iter().next_back().unwrap_or_else(|| {
        let action = if enable { "enabled" } else { "disabled" };
        format!("access {action} for {patched} referrers")
    });
    state.dispatch(AppCommand::SetStatus(message));
}

fn handle_form_key<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view.form = None;
            state.dispatch(AppCommand::ExitToNav);
            state.dispatch(AppCommand::SetStatus("add canceled".to_owned()));
        }
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = &mut view.form {
                form.cursor = (form.cursor + 1) % form.fields.len();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = &mut view.form {
                form.cursor = (form.cursor + form.fields.len() - 1) % form.fields.len();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = &mut view.form {
                let cursor = form.cursor;
                form.fields[cursor].buffer.pop();
            }
        }
        KeyCode::Enter => submit_form(state, runtime, view),
        KeyCode::Char(ch) => {
            if let Some(form) = &mut view.form {
                let cursor = form.cursor;
                form.fields[cursor].buffer.push(ch);
            }
        }
        _ => {}
    }
}

fn submit_form<R: ConsoleRuntime>(state: &mut AppState, runtime: &mut R, view: &mut ViewData) {
    let Some(form) = view.form.clone() else {
        return;
    };
    let payload = match parse_form(&form) {
        Ok(payload) => payload,
        Err(error) => {
            state.dispatch(AppCommand::SetStatus(format!("{error:#}")));
            return;
        }
    };
    if let Err(error) = payload.validate() {
        state.dispatch(AppCommand::SetStatus(format!("{error:#}")));
        return;
    }

    let mut notifier = StatusNotifier::default();
    let added = match &payload {
        FormPayload::Visit(input) => {
            let Console { visits, .. } = &mut view.console;
            visits
                .add_with(runtime.visits(), &mut notifier, |grid| {
                    Ok(visit_draft(input, grid))
                })
                .is_some()
        }
        FormPayload::Route(input) => {
            let Console { routes, .. } = &mut view.console;
            routes
                .add_with(runtime.routes(), &mut notifier, |grid| {
                    Ok(route_draft(input, grid))
                })
                .is_some()
        }
        FormPayload::Referrer(input) => {
            let Console { referrers, .. } = &mut view.console;
            referrers
                .add_with(runtime.referrers(), &mut notifier, |grid| {
                    Ok(referrer_draft(input, grid))
                })
                .is_some()
        }
        FormPayload::Item(input) => {
            let Console { items, .. } = &mut view.console;
            items
                .add_with(runtime.items(), &mut notifier, |grid| {
                    Ok(item_draft(input, grid))
                })
                .is_some()
        }
    };

    if added {
        view.form = None;
        if payload.kind() == FormKind::Route {
            sync_route_filters(view);
        }
        state.dispatch(AppCommand::ExitToNav);
        state.dispatch(AppCommand::SetStatus("added".to_owned()));
        clamp_cursor(view, state.active_tab);
    } else if let Some(message) = notifier.messages.into_iter().next_back() {
        state.dispatch(AppCommand::SetStatus(message));
    }
}

fn parse_form(form: &FormUiState) -> Result<FormPayload> {
    match form.kind {
        FormKind::Visit => {
            let kind_raw = form.field("kind").trim();
            let kind = if kind_raw.is_empty() {
                VisitKind::Delivery
            } else {
                VisitKind::parse(kind_raw)
                    .ok_or_else(|| anyhow::anyhow!("unknown visit kind {kind_raw:?}"))?
            };
            let status_raw = form.field("status").trim();
            let status = if status_raw.is_empty() {
                VisitStatus::Pending
            } else {
                VisitStatus::parse(status_raw)
                    .ok_or_else(|| anyhow::anyhow!("unknown visit status {status_raw:?}"))?
            };
            let date_raw = form.field("date").trim();
            let visit_date = if date_raw.is_empty() {
                None
            } else {
                Some(
                    parse_day(date_raw)
                        .ok_or_else(|| anyhow::anyhow!("date expects YYYY-MM-DD"))?,
                )
            };
            Ok(FormPayload::Visit(VisitFormInput {
                buyer_name: form.field("buyer").trim().to_owned(),
                address: form.field("address").trim().to_owned(),
                kind,
                status,
                visit_date,
                phone_mobile: form.field("phone mobile").trim().to_owned(),
                phone_home: form.field("phone home").trim().to_owned(),
                phone_work: form.field("phone work").trim().to_owned(),
                route_id: parse_optional_id(form.field("route"))?.map(RouteId::new),
                item_ids: parse_id_list(form.field("items"))?
                    .into_iter()
                    .map(ItemId::new)
                    .collect(),
                referrer_id: parse_optional_id(form.field("referrer"))?.map(ReferrerId::new),
                notes: form.field("notes").to_owned(),
            }))
        }
        FormKind::Route => Ok(FormPayload::Route(RouteFormInput {
            name: form.field("name").trim().to_owned(),
            driver: form.field("driver").trim().to_owned(),
            notes: form.field("notes").to_owned(),
        })),
        FormKind::Referrer => {
            let role_raw = form.field("role").trim();
            let role = if role_raw.is_empty() {
                ReferrerRole::Ref
            } else {
                ReferrerRole::parse(role_raw)
                    .ok_or_else(|| anyhow::anyhow!("role must be ref or admin"))?
            };
            Ok(FormPayload::Referrer(ReferrerFormInput {
                name: form.field("name").trim().to_owned(),
                phone: form.field("phone").trim().to_owned(),
                role,
                access_enabled: matches!(form.field("access").trim(), "yes" | "y" | "true"),
                notes: form.field("notes").to_owned(),
            }))
        }
        FormKind::Item => {
            let price_raw = form.field("price").trim();
            let price_cents = if price_raw.is_empty() {
                None
            } else {
                Some(
                    parse_cents(price_raw)
                        .ok_or_else(|| anyhow::anyhow!("price expects a money amount"))?,
                )
            };
            Ok(FormPayload::Item(ItemFormInput {
                name: form.field("name").trim().to_owned(),
                price_cents,
                notes: form.field("notes").to_owned(),
            }))
        }
    }
}

fn parse_optional_id(raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| anyhow::anyhow!("expected a numeric id, got {trimmed:?}"))
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        ids.push(
            token
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("items expects comma-separated ids"))?,
        );
    }
    Ok(ids)
}

fn visit_draft(input: &VisitFormInput, grid: &GridController<Visit>) -> Visit {
    Visit {
        id: VisitId::new(0),
        number: grid.next_number("number"),
        buyer_name: input.buyer_name.clone(),
        address: input.address.clone(),
        kind: input.kind,
        status: input.status,
        visit_date: input.visit_date,
        phone_mobile: input.phone_mobile.clone(),
        phone_home: input.phone_home.clone(),
        phone_work: input.phone_work.clone(),
        route_id: input.route_id,
        route_order: input
            .route_id
            .map(|route| grid.next_order_in(route.get())),
        item_ids: input.item_ids.clone(),
        referrer_id: input.referrer_id,
        notes: input.notes.clone(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn route_draft(input: &RouteFormInput, grid: &GridController<DeliveryRoute>) -> DeliveryRoute {
    DeliveryRoute {
        id: RouteId::new(0),
        number: grid.next_number("number"),
        name: input.name.clone(),
        driver: input.driver.clone(),
        notes: input.notes.clone(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn referrer_draft(input: &ReferrerFormInput, grid: &GridController<Referrer>) -> Referrer {
    Referrer {
        id: ReferrerId::new(0),
        number: grid.next_number("number"),
        name: input.name.clone(),
        phone: input.phone.clone(),
        role: input.role,
        access_enabled: input.access_enabled,
        notes: input.notes.clone(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn item_draft(input: &ItemFormInput, grid: &GridController<CatalogItem>) -> CatalogItem {
    CatalogItem {
        id: ItemId::new(0),
        number: grid.next_number("number"),
        name: input.name.clone(),
        price_cents: input.price_cents,
        notes: input.notes.clone(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn handle_mouse_event<R: ConsoleRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view: &mut ViewData,
    mouse: MouseEvent,
) {
    if state.mode != AppMode::Nav {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let row_id = row_id_at(view, state.active_tab, mouse.row);
            view.console.drag.press(mouse.column, mouse.row, row_id);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            view.console.drag.moved(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let target = row_id_at(view, state.active_tab, mouse.row);
            match view.console.drag.release(target) {
                DragOutcome::Click { row_id } => select_row_by_id(view, state.active_tab, row_id),
                DragOutcome::Drop {
                    dragged,
                    dropped_on,
                } => {
                    if state.active_tab == TabKind::Visits {
                        apply_reorder(state, runtime, view, dragged, dropped_on);
                    }
                }
                DragOutcome::Cancelled | DragOutcome::Ignored => {}
            }
        }
        _ => {}
    }
}

fn row_id_at(view: &ViewData, tab: TabKind, screen_row: u16) -> Option<i64> {
    if screen_row < TABLE_TOP {
        return None;
    }
    let offset = usize::from(screen_row - TABLE_TOP);
    if offset >= view.viewport_rows {
        return None;
    }
    let index = view.scrolls[tab_index(tab)] + offset;
    table_view(view, tab).rows.get(index).map(|row| row.id)
}

fn select_row_by_id(view: &mut ViewData, tab: TabKind, row_id: i64) {
    if let Some(index) = table_view(view, tab)
        .rows
        .iter()
        .position(|row| row.id == row_id)
    {
        view.cursors[tab_index(tab)].row = index;
        clamp_cursor(view, tab);
    }
}

// ---- rendering ----

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = tab_index(state.active_tab);
    let tab_titles: Vec<String> = TabKind::ALL
        .iter()
        .map(|tab| {
            let count = table_view(view, *tab).rows.len();
            format!("{} ({count})", tab.label())
        })
        .collect();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("reparto").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    render_table(frame, layout[1], state, view);

    let status = Paragraph::new(status_text(state, view))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(form) = &view.form {
        let area = centered_rect(58, 70, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(render_form_text(form)).block(
            Block::default()
                .title(form_title(form.kind))
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(body, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view: &ViewData) {
    let tab = state.active_tab;
    let table = table_view(view, tab);
    let cursor = view.cursors[tab_index(tab)];
    let scroll = view.scrolls[tab_index(tab)];
    let editing = view.console.edit.cell().cloned();
    let dragging = view.console.drag.dragging();
    let grabbed = view.grabbed_row;

    let widths: Vec<Constraint> = table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let content_max = table
                .rows
                .iter()
                .map(|row| row.cells.get(col).map_or(0, String::len))
                .max()
                .unwrap_or(0);
            Constraint::Length((header.len().max(content_max)).clamp(4, 24) as u16)
        })
        .collect();

    let header = Row::new(
        table
            .headers
            .iter()
            .map(|header| Cell::from(*header))
            .collect::<Vec<Cell>>(),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let column_keys: Vec<Option<&'static str>> = (0..table.headers.len())
        .map(|col| column_key(view, tab, col))
        .collect();

    let rows: Vec<Row> = table
        .rows
        .iter()
        .enumerate()
        .skip(scroll)
        .take(view.viewport_rows)
        .map(|(row_index, row)| {
            let moved = dragging == Some(row.id) || grabbed == Some(row.id);
            let cells: Vec<Cell> = row
                .cells
                .iter()
                .enumerate()
                .map(|(col_index, value)| {
                    let is_edit_cell = editing.as_ref().is_some_and(|cell| {
                        cell.row_id == row.id && Some(cell.key) == column_keys[col_index]
                    });
                    let content = if is_edit_cell {
                        view.console
                            .edit
                            .buffer()
                            .unwrap_or("...")
                            .replace('\n', " | ")
                    } else {
                        value.clone()
                    };
                    let mut style = Style::default();
                    if row_index == cursor.row && col_index == cursor.col {
                        style = style.bg(Color::DarkGray);
                    }
                    if is_edit_cell {
                        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
                    }
                    Cell::from(content).style(style)
                })
                .collect();
            let mut row_widget = Row::new(cells);
            if moved {
                row_widget = row_widget.style(Style::default().fg(Color::Magenta));
            }
            row_widget
        })
        .collect();

    let widget = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(tab.label()),
    );
    frame.render_widget(widget, area);
}

fn status_text(state: &AppState, view: &ViewData) -> String {
    match state.mode {
        AppMode::Edit => {
            let buffer = view
                .console
                .edit
                .buffer()
                .unwrap_or("")
                .replace('\n', " | ");
            format!("edit: {buffer}  (enter saves, esc cancels, ctrl-n line break)")
        }
        AppMode::Search => match view.search_target {
            SearchTarget::Global => format!("search: {}", view.search_input),
            SearchTarget::Column(key) => format!("filter {key}: {}", view.search_input),
        },
        AppMode::Confirm => match view.pending_delete {
            Some(id) => format!("delete row {id}? y confirms, any other key cancels"),
            None => "nothing selected".to_owned(),
        },
        AppMode::Move => match view.grabbed_row {
            Some(id) => format!("moving row {id} -- enter drops on the selected row, esc cancels"),
            None => "nothing grabbed".to_owned(),
        },
        AppMode::Form(_) => "fill the form -- tab moves, enter submits, esc cancels".to_owned(),
        AppMode::Nav => state.status_line.clone().unwrap_or_else(|| {
            "tab switch · e edit · a add · d delete · / search · = column filter · f filter · D dates · m move · t access · q quit"
                .to_owned()
        }),
    }
}

fn form_title(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Visit => "new visit",
        FormKind::Route => "new route",
        FormKind::Referrer => "new referrer",
        FormKind::Item => "new item",
    }
}

fn render_form_text(form: &FormUiState) -> String {
    form.fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if index == form.cursor { ">" } else { " " };
            format!("{marker} {:<14} {}", field.label, field.buffer)
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::{
        ConsoleRuntime, TABLE_TOP, ViewData, handle_key_event, handle_mouse_event, refresh_all,
        status_text, tab_index, table_view,
    };
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use reparto_app::{
        AppMode, AppState, CatalogItem, DeliveryRoute, Referrer, ReferrerRole, RouteId, TabKind,
        Visit, VisitId, VisitKind, VisitStatus,
    };
    use reparto_db::{
        ItemStore, NewReferrer, NewRoute, NewVisit, ReferrerStore, RouteStore, Store, VisitStore,
    };
    use reparto_grid::RecordStore;

    struct TestRuntime<'a> {
        visits: VisitStore<'a>,
        routes: RouteStore<'a>,
        referrers: ReferrerStore<'a>,
        items: ItemStore<'a>,
    }

    impl<'a> TestRuntime<'a> {
        fn new(store: &'a Store) -> Self {
            Self {
                visits: VisitStore::new(store),
                routes: RouteStore::new(store),
                referrers: ReferrerStore::new(store),
                items: ItemStore::new(store),
            }
        }
    }

    impl ConsoleRuntime for TestRuntime<'_> {
        fn visits(&mut self) -> &mut dyn RecordStore<Visit> {
            &mut self.visits
        }

        fn routes(&mut self) -> &mut dyn RecordStore<DeliveryRoute> {
            &mut self.routes
        }

        fn referrers(&mut self) -> &mut dyn RecordStore<Referrer> {
            &mut self.referrers
        }

        fn items(&mut self) -> &mut dyn RecordStore<CatalogItem> {
            &mut self.items
        }
    }

    fn new_visit(number: i64, buyer: &str, route: Option<RouteId>, order: Option<i64>) -> NewVisit {
        NewVisit {
            number,
            buyer_name: buyer.to_owned(),
            address: format!("{number} Cedar St"),
            kind: VisitKind::Delivery,
            status: VisitStatus::Pending,
            visit_date: None,
            phone_mobile: String::new(),
            phone_home: String::new(),
            phone_work: String::new(),
            route_id: route,
            route_order: order,
            item_ids: Vec::new(),
            referrer_id: None,
            notes: String::new(),
        }
    }

    fn seeded_store() -> (Store, RouteId, [VisitId; 3]) {
        let store = Store::open_memory().expect("open store");
        store.bootstrap().expect("bootstrap");
        let route = store
            .create_route(&NewRoute {
                number: 1,
                name: "North Loop".to_owned(),
                driver: "Avery".to_owned(),
                notes: String::new(),
            })
            .expect("create route");
        let a = store
            .create_visit(&new_visit(1, "Ana Walker", Some(route), Some(1)))
            .expect("visit a");
        let b = store
            .create_visit(&new_visit(2, "Bram Diaz", Some(route), Some(2)))
            .expect("visit b");
        let c = store
            .create_visit(&new_visit(3, "Cleo Smith", Some(route), Some(3)))
            .expect("visit c");
        for (number, name, role) in [
            (1, "Ref One", ReferrerRole::Ref),
            (2, "Ref Two", ReferrerRole::Ref),
            (3, "Ref Three", ReferrerRole::Ref),
            (4, "Boss", ReferrerRole::Admin),
        ] {
            store
                .create_referrer(&NewReferrer {
                    number,
                    name: name.to_owned(),
                    phone: String::new(),
                    role,
                    access_enabled: false,
                    notes: String::new(),
                })
                .expect("create referrer");
        }
        (store, route, [a, b, c])
    }

    fn console_over(store: &Store) -> (AppState, TestRuntime<'_>, ViewData) {
        let mut runtime = TestRuntime::new(store);
        let mut view = ViewData::new().expect("view");
        refresh_all(&mut runtime, &mut view).expect("refresh");
        (AppState::default(), runtime, view)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(
        state: &mut AppState,
        runtime: &mut TestRuntime<'_>,
        view: &mut ViewData,
        code: KeyCode,
    ) -> bool {
        handle_key_event(state, runtime, view, key(code))
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime<'_>,
        view: &mut ViewData,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, runtime, view, KeyCode::Char(ch));
        }
    }

    #[test]
    fn tab_key_rotates_tabs() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Tab);
        assert_eq!(state.active_tab, TabKind::Routes);
        press(&mut state, &mut runtime, &mut view, KeyCode::BackTab);
        assert_eq!(state.active_tab, TabKind::Visits);
    }

    #[test]
    fn q_quits_from_nav() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);
        assert!(press(&mut state, &mut runtime, &mut view, KeyCode::Char('q')));
    }

    #[test]
    fn selection_clamps_to_the_visible_rows() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        for _ in 0..10 {
            press(&mut state, &mut runtime, &mut view, KeyCode::Char('j'));
        }
        assert_eq!(view.cursors[tab_index(TabKind::Visits)].row, 2);
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('g'));
        assert_eq!(view.cursors[tab_index(TabKind::Visits)].row, 0);
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('G'));
        assert_eq!(view.cursors[tab_index(TabKind::Visits)].row, 2);
    }

    #[test]
    fn edit_commit_persists_the_cell() {
        let (store, _route, [a, _b, _c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        // Column 1 is the buyer column; row 0 is Ana (order 1).
        view.cursors[tab_index(TabKind::Visits)].col = 1;
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('e'));
        assert_eq!(state.mode, AppMode::Edit);
        assert_eq!(view.console.edit.buffer(), Some("Ana Walker"));

        for _ in 0.."Ana Walker".len() {
            press(&mut state, &mut runtime, &mut view, KeyCode::Backspace);
        }
        type_text(&mut state, &mut runtime, &mut view, "Ana Reed");
        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);

        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(store.get_visit(a).expect("visit").buyer_name, "Ana Reed");
    }

    #[test]
    fn escape_cancels_the_edit_without_persisting() {
        let (store, _route, [a, _b, _c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        view.cursors[tab_index(TabKind::Visits)].col = 1;
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('e'));
        type_text(&mut state, &mut runtime, &mut view, "XYZ");
        press(&mut state, &mut runtime, &mut view, KeyCode::Esc);

        assert_eq!(state.mode, AppMode::Nav);
        assert!(view.console.edit.is_idle());
        assert_eq!(store.get_visit(a).expect("visit").buyer_name, "Ana Walker");
    }

    #[test]
    fn invalid_select_value_keeps_editing() {
        let (store, _route, [a, _b, _c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        // Column 4 is the status select.
        view.cursors[tab_index(TabKind::Visits)].col = 4;
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('e'));
        for _ in 0.."pending".len() {
            press(&mut state, &mut runtime, &mut view, KeyCode::Backspace);
        }
        type_text(&mut state, &mut runtime, &mut view, "done");
        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);

        // Parse rejection: still editing, nothing persisted.
        assert_eq!(state.mode, AppMode::Edit);
        assert_eq!(
            store.get_visit(a).expect("visit").status,
            VisitStatus::Pending
        );
    }

    #[test]
    fn search_filters_rows_live() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('/'));
        assert_eq!(state.mode, AppMode::Search);
        type_text(&mut state, &mut runtime, &mut view, "smith");
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 1);

        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 1);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('/'));
        press(&mut state, &mut runtime, &mut view, KeyCode::Esc);
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 3);
    }

    #[test]
    fn delete_requires_confirmation() {
        let (store, _route, [a, _b, _c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('d'));
        assert_eq!(state.mode, AppMode::Confirm);
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('n'));
        assert_eq!(state.mode, AppMode::Nav);
        assert!(store.get_visit(a).is_ok());

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('d'));
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('y'));
        assert!(store.get_visit(a).is_err());
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 2);
    }

    #[test]
    fn move_mode_reorders_and_persists() {
        let (store, _route, [a, b, _c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        // Grab Ana (row 0), drop on Bram (row 1): A and B swap orders.
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('m'));
        assert_eq!(state.mode, AppMode::Move);
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('j'));
        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);

        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(store.get_visit(b).expect("visit").route_order, Some(1));
        assert_eq!(store.get_visit(a).expect("visit").route_order, Some(2));
    }

    #[test]
    fn mouse_drag_reorders_visits() {
        let (store, _route, [a, b, c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        let down = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: TABLE_TOP + 2,
            modifiers: KeyModifiers::NONE,
        };
        let drag = MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: 10,
            row: TABLE_TOP,
            modifiers: KeyModifiers::NONE,
        };
        let up = MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 10,
            row: TABLE_TOP,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut state, &mut runtime, &mut view, down);
        handle_mouse_event(&mut state, &mut runtime, &mut view, drag);
        handle_mouse_event(&mut state, &mut runtime, &mut view, up);

        assert_eq!(store.get_visit(c).expect("visit").route_order, Some(1));
        assert_eq!(store.get_visit(a).expect("visit").route_order, Some(2));
        assert_eq!(store.get_visit(b).expect("visit").route_order, Some(3));
    }

    #[test]
    fn mouse_click_selects_without_reordering() {
        let (store, _route, [a, _b, c]) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        let down = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: TABLE_TOP + 2,
            modifiers: KeyModifiers::NONE,
        };
        let up = MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 10,
            row: TABLE_TOP + 2,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut state, &mut runtime, &mut view, down);
        handle_mouse_event(&mut state, &mut runtime, &mut view, up);

        assert_eq!(view.cursors[tab_index(TabKind::Visits)].row, 2);
        assert_eq!(store.get_visit(a).expect("visit").route_order, Some(1));
        assert_eq!(store.get_visit(c).expect("visit").route_order, Some(3));
    }

    #[test]
    fn form_adds_a_route_and_rebuilds_route_filters() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Tab);
        assert_eq!(state.active_tab, TabKind::Routes);
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('a'));
        assert!(matches!(state.mode, AppMode::Form(_)));

        type_text(&mut state, &mut runtime, &mut view, "Harbor");
        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);

        assert_eq!(state.mode, AppMode::Nav);
        let routes = store.list_routes().expect("routes");
        assert_eq!(routes.len(), 2);
        let harbor = routes
            .iter()
            .find(|route| route.name == "Harbor")
            .expect("harbor route");
        let filter_key = format!("route-{}", harbor.id.get());
        assert!(
            view.console
                .visits
                .schema()
                .filters
                .iter()
                .any(|filter| filter.key == filter_key)
        );
    }

    #[test]
    fn empty_form_submit_reports_validation_and_stays_open() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);

        assert!(matches!(state.mode, AppMode::Form(_)));
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("required"))
        );
        assert_eq!(store.list_visits().expect("visits").len(), 3);
    }

    #[test]
    fn toggle_access_flips_only_ref_rows() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        state.active_tab = TabKind::Referrers;
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('t'));

        let referrers = store.list_referrers().expect("referrers");
        assert_eq!(referrers.iter().filter(|r| r.access_enabled).count(), 3);
        assert!(
            referrers
                .iter()
                .filter(|r| r.role == ReferrerRole::Admin)
                .all(|r| !r.access_enabled)
        );
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("access enabled for 3"))
        );
    }

    #[test]
    fn collapse_suppresses_rows_but_keeps_search() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('/'));
        type_text(&mut state, &mut runtime, &mut view, "smith");
        press(&mut state, &mut runtime, &mut view, KeyCode::Enter);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('c'));
        assert!(table_view(&view, TabKind::Visits).rows.is_empty());
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('c'));
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 1);
        assert_eq!(view.console.visits.filter().search(), "smith");
    }

    #[test]
    fn column_filter_mode_filters_one_column() {
        let (store, _route, ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);
        store
            .update_visit_fields(
                ids[2],
                &[(
                    "status",
                    reparto_grid::CellValue::Text("completed".to_owned()),
                )],
            )
            .expect("mark completed");
        refresh_all(&mut runtime, &mut view).expect("refresh");

        // Column 4 is the status select; exact match required.
        view.cursors[tab_index(TabKind::Visits)].col = 4;
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('='));
        assert_eq!(state.mode, AppMode::Search);
        type_text(&mut state, &mut runtime, &mut view, "completed");
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 1);

        press(&mut state, &mut runtime, &mut view, KeyCode::Esc);
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 3);
    }

    #[test]
    fn date_scope_key_cycles_ranges() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('D'));
        assert!(!view.console.visits.filter().date_range().is_unbounded());
        // Seeded visits carry no date, so a bounded scope hides them all.
        assert!(table_view(&view, TabKind::Visits).rows.is_empty());

        press(&mut state, &mut runtime, &mut view, KeyCode::Char('D'));
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('D'));
        assert!(view.console.visits.filter().date_range().is_unbounded());
        assert_eq!(table_view(&view, TabKind::Visits).rows.len(), 3);
    }

    #[test]
    fn add_form_defaults_route_from_the_active_route_filter() {
        let (store, route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        view.console
            .visits
            .select_filter(&format!("route-{}", route.get()));
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('a'));

        let form = view.form.as_ref().expect("form open");
        assert_eq!(form.field("route"), route.get().to_string());
    }

    #[test]
    fn status_text_reflects_the_mode() {
        let (store, _route, _ids) = seeded_store();
        let (mut state, mut runtime, mut view) = console_over(&store);

        assert!(status_text(&state, &view).contains("q quit"));
        press(&mut state, &mut runtime, &mut view, KeyCode::Char('/'));
        assert!(status_text(&state, &view).starts_with("search:"));
    }
}
